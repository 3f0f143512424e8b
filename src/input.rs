// Operator input shaping
//
// Raw stick axes go through a cubic response curve with a deadband before
// they become drive commands. Small deflections give fine control and the
// output never reaches the +/-1.0 limit rejected by the drive commands.

use serde::{Deserialize, Serialize};

use crate::drivetrain::{DriveError, DriveMode, Drivetrain};
use crate::hardware::{BinaryActuator, MotorOutput};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriveCurve {
    pub scalar: f32,
    pub deadband: f32,
    pub max_magnitude: f32,
}

impl Default for DriveCurve {
    fn default() -> Self {
        Self {
            scalar: 1.0,
            deadband: 0.1,
            max_magnitude: 0.99,
        }
    }
}

impl DriveCurve {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.scalar.is_finite() && self.scalar > 0.0) {
            return Err(format!("scalar must be finite and positive, got {}", self.scalar));
        }
        if !(0.0..1.0).contains(&self.deadband) {
            return Err(format!("deadband must be in [0, 1), got {}", self.deadband));
        }
        if !(self.max_magnitude > 0.0 && self.max_magnitude < 1.0) {
            return Err(format!(
                "max_magnitude must be in (0, 1), got {}",
                self.max_magnitude
            ));
        }
        Ok(())
    }

    /// Shape one axis value
    pub fn apply(&self, raw: f32) -> f32 {
        if !raw.is_finite() {
            return 0.0;
        }
        let magnitude = raw.abs().min(1.0);
        if magnitude < self.deadband {
            return 0.0;
        }

        // Rescale so output starts from zero at the deadband edge
        let scaled = (magnitude - self.deadband) / (1.0 - self.deadband);
        let shaped = (self.scalar * scaled.powi(3)).min(self.max_magnitude);
        shaped.copysign(raw)
    }
}

/// Raw gamepad axes, forward and right positive
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Sticks {
    pub left_x: f32,
    pub left_y: f32,
    pub right_x: f32,
}

/// Turn stick axes into the drive command that fits the current mode.
///
/// Mecanum drives on all three axes, differential drives arcade-style, and a
/// disabled drivetrain gets nothing.
pub fn drive_with_sticks<M: MotorOutput, V: BinaryActuator>(
    drivetrain: &mut Drivetrain<M, V>,
    curve: &DriveCurve,
    sticks: &Sticks,
) -> Result<(), DriveError> {
    let forward = curve.apply(sticks.left_y);
    let strafe = curve.apply(sticks.left_x);
    // Stick right is a clockwise turn
    let rotate = curve.apply(-sticks.right_x);

    match drivetrain.mode() {
        DriveMode::Mecanum => drivetrain.cartesian_drive(forward, strafe, rotate),
        DriveMode::Differential => drivetrain.arcade_drive(forward, rotate),
        DriveMode::Disabled => Ok(()),
    }
}
