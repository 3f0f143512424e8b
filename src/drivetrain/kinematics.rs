// Inverse kinematics for the four-module drivetrain
// Converts a chassis command (forward, strafe, rotate) to per-wheel speeds for
// either gearing: differential (tank) or mecanum (omni).

use serde::{Deserialize, Serialize};

/// Distance between the left and right wheel contact lines (meters)
pub const TRACK_WIDTH: f32 = 0.56;

/// Default module offsets from the chassis center (meters)
pub const MODULE_OFFSET_X: f32 = 0.32;
pub const MODULE_OFFSET_Y: f32 = 0.28;

/// One control frame's requested motion, each axis in (-1.0, 1.0)
///
/// * `x_speed` - forward (positive = forward)
/// * `y_speed` - strafe (positive = right, matching the stick X axis)
/// * `z_rotation` - rotation (positive = counter-clockwise)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChassisCommand {
    pub x_speed: f32,
    pub y_speed: f32,
    pub z_rotation: f32,
}

impl ChassisCommand {
    pub fn new(x_speed: f32, y_speed: f32, z_rotation: f32) -> Self {
        Self {
            x_speed,
            y_speed,
            z_rotation,
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

/// Per-wheel speeds in the fixed physical order FL, FR, BL, BR
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WheelSpeeds {
    pub front_left: f32,
    pub front_right: f32,
    pub back_left: f32,
    pub back_right: f32,
}

impl WheelSpeeds {
    pub fn new(front_left: f32, front_right: f32, back_left: f32, back_right: f32) -> Self {
        Self {
            front_left,
            front_right,
            back_left,
            back_right,
        }
    }

    /// Returns speeds as array [front_left, front_right, back_left, back_right]
    pub fn as_array(&self) -> [f32; 4] {
        [
            self.front_left,
            self.front_right,
            self.back_left,
            self.back_right,
        ]
    }

    /// Scale all wheels down together if any exceeds `max`, keeping the ratios
    pub fn desaturate(self, max: f32) -> Self {
        let peak = self
            .as_array()
            .iter()
            .map(|speed| speed.abs())
            .fold(0.0f32, f32::max);

        if peak <= max {
            return self;
        }

        let scale = max / peak;
        Self::new(
            self.front_left * scale,
            self.front_right * scale,
            self.back_left * scale,
            self.back_right * scale,
        )
    }
}

/// Pure mapping from a chassis command to wheel speeds
pub trait Kinematics {
    fn to_wheel_speeds(&self, command: &ChassisCommand) -> WheelSpeeds;
}

/// Tank kinematics: the strafe axis is ignored
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifferentialKinematics {
    pub track_width: f32,
}

impl DifferentialKinematics {
    pub fn new(track_width: f32) -> Self {
        Self { track_width }
    }
}

impl Default for DifferentialKinematics {
    fn default() -> Self {
        Self::new(TRACK_WIDTH)
    }
}

impl Kinematics for DifferentialKinematics {
    fn to_wheel_speeds(&self, command: &ChassisCommand) -> WheelSpeeds {
        let half_track = self.track_width / 2.0;
        let left = command.x_speed - half_track * command.z_rotation;
        let right = command.x_speed + half_track * command.z_rotation;

        // Both modules on a side share the side's speed
        WheelSpeeds::new(left, right, left, right)
    }
}

/// Module position relative to the chassis center (x forward, y left), meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModuleOffset {
    pub x: f32,
    pub y: f32,
}

impl ModuleOffset {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Mecanum kinematics for four modules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MecanumKinematics {
    pub front_left: ModuleOffset,
    pub front_right: ModuleOffset,
    pub back_left: ModuleOffset,
    pub back_right: ModuleOffset,
}

impl MecanumKinematics {
    pub fn new(
        front_left: ModuleOffset,
        front_right: ModuleOffset,
        back_left: ModuleOffset,
        back_right: ModuleOffset,
    ) -> Self {
        Self {
            front_left,
            front_right,
            back_left,
            back_right,
        }
    }

    /// Rectangular layout with modules at (±x, ±y)
    pub fn rectangular(x: f32, y: f32) -> Self {
        Self::new(
            ModuleOffset::new(x, y),
            ModuleOffset::new(x, -y),
            ModuleOffset::new(-x, y),
            ModuleOffset::new(-x, -y),
        )
    }
}

impl Default for MecanumKinematics {
    fn default() -> Self {
        Self::rectangular(MODULE_OFFSET_X, MODULE_OFFSET_Y)
    }
}

impl Kinematics for MecanumKinematics {
    fn to_wheel_speeds(&self, command: &ChassisCommand) -> WheelSpeeds {
        let vx = command.x_speed;
        // Roller geometry is expressed with y pointing left
        let vy = -command.y_speed;
        let w = command.z_rotation;

        let fl = self.front_left;
        let fr = self.front_right;
        let bl = self.back_left;
        let br = self.back_right;

        WheelSpeeds {
            front_left: vx - vy - (fl.x + fl.y) * w,
            front_right: vx + vy + (fr.x - fr.y) * w,
            back_left: vx + vy + (bl.x - bl.y) * w,
            back_right: vx - vy - (br.x + br.y) * w,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn test_zero_command() {
        let wheels = MecanumKinematics::default().to_wheel_speeds(&ChassisCommand::zero());
        assert_eq!(wheels.as_array(), [0.0; 4]);

        let wheels = DifferentialKinematics::default().to_wheel_speeds(&ChassisCommand::zero());
        assert_eq!(wheels.as_array(), [0.0; 4]);
    }

    #[test]
    fn test_mecanum_forward_equal_on_all_wheels() {
        let wheels = MecanumKinematics::default().to_wheel_speeds(&ChassisCommand::new(0.5, 0.0, 0.0));
        for speed in wheels.as_array() {
            assert!(close(speed, 0.5), "expected 0.5, got {}", speed);
        }
    }

    #[test]
    fn test_mecanum_strafe_right() {
        let wheels = MecanumKinematics::default().to_wheel_speeds(&ChassisCommand::new(0.0, 0.5, 0.0));
        println!("Strafe: {:?}", wheels);

        // FL/BR push one way, FR/BL the other
        assert!(wheels.front_left > 0.0 && wheels.back_right > 0.0);
        assert!(wheels.front_right < 0.0 && wheels.back_left < 0.0);
        assert!(close(wheels.front_left, -wheels.front_right));
        assert!(close(wheels.front_left, -wheels.back_left));
        assert!(close(wheels.front_left, wheels.back_right));
    }

    #[test]
    fn test_mecanum_rotation_antisymmetric() {
        let wheels = MecanumKinematics::default().to_wheel_speeds(&ChassisCommand::new(0.0, 0.0, 0.5));
        println!("Rotation: {:?}", wheels);

        assert!(wheels.front_left != 0.0);
        assert!(close(wheels.front_left, wheels.back_left));
        assert!(close(wheels.front_right, wheels.back_right));
        assert!(close(wheels.front_right, -wheels.front_left));
        // Counter-clockwise spins the left side backwards
        assert!(wheels.front_left < 0.0);
    }

    #[test]
    fn test_differential_ignores_strafe() {
        let kin = DifferentialKinematics::default();
        let with_strafe = kin.to_wheel_speeds(&ChassisCommand::new(0.3, 0.9, 0.1));
        let without = kin.to_wheel_speeds(&ChassisCommand::new(0.3, 0.0, 0.1));
        assert_eq!(with_strafe, without);
    }

    #[test]
    fn test_differential_sides_match() {
        let wheels = DifferentialKinematics::new(0.5).to_wheel_speeds(&ChassisCommand::new(0.2, 0.0, 0.4));
        assert!(close(wheels.front_left, 0.1));
        assert!(close(wheels.front_right, 0.3));
        assert_eq!(wheels.front_left, wheels.back_left);
        assert_eq!(wheels.front_right, wheels.back_right);
    }

    #[test]
    fn test_desaturate_keeps_ratios() {
        let wheels = WheelSpeeds::new(2.0, -1.0, 0.5, 1.0).desaturate(1.0);
        assert!(close(wheels.front_left, 1.0));
        assert!(close(wheels.front_right, -0.5));
        assert!(close(wheels.back_left, 0.25));
        assert!(close(wheels.back_right, 0.5));
    }

    #[test]
    fn test_desaturate_leaves_small_speeds() {
        let wheels = WheelSpeeds::new(0.5, -0.2, 0.1, 0.0);
        assert_eq!(wheels.desaturate(1.0), wheels);
    }

    #[test]
    fn test_full_command_stays_in_range_after_desaturate() {
        // Forward + strafe + rotate can sum past 1.0 on a wheel
        let wheels = MecanumKinematics::default()
            .to_wheel_speeds(&ChassisCommand::new(0.9, 0.9, 0.9))
            .desaturate(1.0);
        for speed in wheels.as_array() {
            assert!(speed.abs() <= 1.0 + EPS, "wheel speed {} not desaturated", speed);
        }
    }
}
