// Define message types for the runtime

use serde::{Deserialize, Serialize};

use crate::drivetrain::{DriveMode, ShiftPhase};
use crate::hardware::SolenoidPosition;
use crate::input::Sticks;

/// Request from teleop/scripts -> runtime, tagged by "type"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DriveRequest {
    SetMode { mode: DriveMode },
    Arcade { x_speed: f32, z_rotation: f32 },
    Cartesian { x_speed: f32, y_speed: f32, z_rotation: f32 },
    /// Raw gamepad axes, shaped by the runtime's drive curve
    Sticks(Sticks),
    Enable,
    Disable,
}

/// Motion part of a request, re-applied every frame while fresh
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionCommand {
    Arcade { x_speed: f32, z_rotation: f32 },
    Cartesian { x_speed: f32, y_speed: f32, z_rotation: f32 },
    Sticks(Sticks),
}

/// Drivetrain state published every frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrivetrainTelemetry {
    pub mode: DriveMode,
    pub shift: ShiftPhase,
    /// FL, FR, BL, BR
    pub duty_cycles: [f32; 4],
    pub solenoids: [SolenoidPosition; 4],
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    CmdStale,
    Disabled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_requests() {
        let req: DriveRequest = serde_json::from_str(r#"{"type":"set_mode","mode":"mecanum"}"#).unwrap();
        assert_eq!(req, DriveRequest::SetMode { mode: DriveMode::Mecanum });

        let req: DriveRequest =
            serde_json::from_str(r#"{"type":"arcade","x_speed":0.5,"z_rotation":-0.25}"#).unwrap();
        assert_eq!(
            req,
            DriveRequest::Arcade {
                x_speed: 0.5,
                z_rotation: -0.25
            }
        );

        let req: DriveRequest =
            serde_json::from_str(r#"{"type":"sticks","left_x":0.0,"left_y":0.5,"right_x":0.0}"#).unwrap();
        assert!(matches!(req, DriveRequest::Sticks(_)));

        let req: DriveRequest = serde_json::from_str(r#"{"type":"enable"}"#).unwrap();
        assert_eq!(req, DriveRequest::Enable);
    }

    #[test]
    fn test_unknown_request_rejected() {
        assert!(serde_json::from_str::<DriveRequest>(r#"{"type":"swerve"}"#).is_err());
    }

    #[test]
    fn test_telemetry_json_shape() {
        let telemetry = DrivetrainTelemetry {
            mode: DriveMode::Differential,
            shift: ShiftPhase::Settling {
                target: DriveMode::Differential,
                frames_remaining: 3,
            },
            duty_cycles: [0.0; 4],
            solenoids: [SolenoidPosition::Forward; 4],
        };
        let value = serde_json::to_value(&telemetry).unwrap();
        assert_eq!(value["mode"], "differential");
        assert_eq!(value["shift"]["state"], "settling");
        assert_eq!(value["shift"]["frames_remaining"], 3);
        assert_eq!(value["solenoids"][0], "forward");
    }
}
