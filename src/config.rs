// Timeouts, topics, drivetrain geometry and channel bindings
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::drivetrain::kinematics::{MecanumKinematics, TRACK_WIDTH};
use crate::drivetrain::DriveMode;
use crate::input::DriveCurve;

// Runtime loop frequency
pub const LOOP_HZ: u64 = 50;

// Fastest loop whose period is still at least one microsecond
pub const MAX_LOOP_HZ: u64 = 1_000_000;

// Command timeout for watchdog
pub const CMD_TIMEOUT: Duration = Duration::from_millis(250);

// Time for the gear-shift cylinders to finish moving
pub const SHIFT_DELAY_SECS: f64 = 0.25;

// Zenoh topics
pub const TOPIC_CMD_DRIVE: &str = "octo/cmd/drive"; // commands
pub const TOPIC_STATE_DRIVETRAIN: &str = "octo/state/drivetrain"; // telemetry
pub const TOPIC_HEALTH: &str = "octo/state/health"; // health status

/// Channel bindings for one module
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub motor_id: u8,
    pub inverted: bool,
    pub solenoid_forward: u8,
    pub solenoid_reverse: u8,
}

// FL, FR, BL, BR. Right side motors are mounted mirrored.
const DEFAULT_MODULES: [ModuleConfig; 4] = [
    ModuleConfig { motor_id: 1, inverted: false, solenoid_forward: 0, solenoid_reverse: 1 },
    ModuleConfig { motor_id: 2, inverted: true, solenoid_forward: 2, solenoid_reverse: 3 },
    ModuleConfig { motor_id: 3, inverted: false, solenoid_forward: 4, solenoid_reverse: 5 },
    ModuleConfig { motor_id: 4, inverted: true, solenoid_forward: 6, solenoid_reverse: 7 },
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Drivetrain and runtime settings. Missing JSON fields take the defaults above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrivetrainConfig {
    pub loop_hz: u64,
    pub shift_delay_secs: f64,
    pub track_width: f32,
    pub mecanum: MecanumKinematics,
    pub modules: [ModuleConfig; 4],
    pub initial_mode: DriveMode,
    pub drive_curve: DriveCurve,
}

impl Default for DrivetrainConfig {
    fn default() -> Self {
        Self {
            loop_hz: LOOP_HZ,
            shift_delay_secs: SHIFT_DELAY_SECS,
            track_width: TRACK_WIDTH,
            mecanum: MecanumKinematics::default(),
            modules: DEFAULT_MODULES,
            initial_mode: DriveMode::Mecanum,
            drive_curve: DriveCurve::default(),
        }
    }
}

impl DrivetrainConfig {
    /// Load from a JSON file and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("Loading drivetrain config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.loop_hz == 0 || self.loop_hz > MAX_LOOP_HZ {
            return Err(ConfigError::Invalid(format!(
                "loop_hz must be in 1..={}, got {}",
                MAX_LOOP_HZ, self.loop_hz
            )));
        }
        if self.shift_delay_secs.is_nan() || self.shift_delay_secs < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "shift_delay_secs must be >= 0, got {}",
                self.shift_delay_secs
            )));
        }
        if self.track_width.is_nan() || self.track_width <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "track_width must be positive, got {}",
                self.track_width
            )));
        }
        let m = &self.mecanum;
        for offset in [m.front_left, m.front_right, m.back_left, m.back_right] {
            if !offset.x.is_finite() || !offset.y.is_finite() {
                return Err(ConfigError::Invalid("mecanum offsets must be finite".into()));
            }
        }
        for module in &self.modules {
            if module.solenoid_forward == module.solenoid_reverse {
                return Err(ConfigError::Invalid(format!(
                    "motor {} solenoid uses channel {} twice",
                    module.motor_id, module.solenoid_forward
                )));
            }
        }
        self.drive_curve.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }

    /// Control period
    pub fn period(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.loop_hz)
    }

    /// Shift delay expressed in control frames, rounded up
    pub fn settle_frames(&self) -> u32 {
        (self.shift_delay_secs * self.loop_hz as f64).ceil() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = DrivetrainConfig::default();
        config.validate().unwrap();
        assert_eq!(config.period(), Duration::from_millis(20));
    }

    #[test]
    fn test_settle_frames_rounds_up() {
        let config = DrivetrainConfig {
            loop_hz: 50,
            shift_delay_secs: 0.25,
            ..Default::default()
        };
        // 12.5 frames
        assert_eq!(config.settle_frames(), 13);

        let config = DrivetrainConfig {
            shift_delay_secs: 0.0,
            ..Default::default()
        };
        assert_eq!(config.settle_frames(), 0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DrivetrainConfig =
            serde_json::from_str(r#"{"shift_delay_secs": 0.5, "initial_mode": "differential"}"#).unwrap();
        assert_eq!(config.shift_delay_secs, 0.5);
        assert_eq!(config.initial_mode, DriveMode::Differential);
        assert_eq!(config.loop_hz, LOOP_HZ);
        assert_eq!(config.modules, DEFAULT_MODULES);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_rate = DrivetrainConfig {
            loop_hz: 0,
            ..Default::default()
        };
        assert!(matches!(zero_rate.validate(), Err(ConfigError::Invalid(_))));

        // Period would truncate to zero and the tick interval cannot be built
        let too_fast = DrivetrainConfig {
            loop_hz: 2_000_000,
            ..Default::default()
        };
        assert_eq!(too_fast.period(), Duration::ZERO);
        assert!(matches!(too_fast.validate(), Err(ConfigError::Invalid(_))));

        let fastest = DrivetrainConfig {
            loop_hz: MAX_LOOP_HZ,
            ..Default::default()
        };
        fastest.validate().unwrap();
        assert_eq!(fastest.period(), Duration::from_micros(1));

        let negative_delay = DrivetrainConfig {
            shift_delay_secs: -1.0,
            ..Default::default()
        };
        assert!(negative_delay.validate().is_err());

        let mut shared_channel = DrivetrainConfig::default();
        shared_channel.modules[2].solenoid_reverse = shared_channel.modules[2].solenoid_forward;
        assert!(shared_channel.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = DrivetrainConfig::load("/nonexistent/octo-drive.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
