// Hardware capability interfaces for the drivetrain
//
// Motor controllers and the pneumatic hub live outside this crate. The
// drivetrain only talks to them through these two traits:
// - MotorOutput: open-loop duty cycle output
// - BinaryActuator: one double-acting solenoid

mod sim;

pub use sim::{SimMotor, SimSolenoid};

use serde::{Deserialize, Serialize};

/// Position of a double-acting solenoid valve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolenoidPosition {
    Forward,
    Reverse,
    /// Both valves closed. Also the power-on state, so gearing is unknown.
    #[default]
    Off,
}

/// Error types reported by hardware backends
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    #[error("Motor controller {id} disconnected")]
    Disconnected { id: u8 },

    #[error("Duty cycle {value} out of range for motor {id}")]
    DutyCycleOutOfRange { id: u8, value: f32 },

    #[error("Solenoid channels {forward}/{reverse} rejected command: {reason}")]
    Solenoid {
        forward: u8,
        reverse: u8,
        reason: String,
    },
}

/// Open-loop motor output
pub trait MotorOutput {
    /// Command a duty cycle in [-1.0, 1.0]. Fire-and-forget: callers do not retry.
    fn set_duty_cycle(&mut self, duty_cycle: f32) -> Result<(), HardwareError>;

    /// Re-arm the controller's output safety timeout when the robot is enabled.
    fn enable(&mut self) -> Result<(), HardwareError> {
        Ok(())
    }

    /// Stop immediately (neutral output)
    fn stop(&mut self) -> Result<(), HardwareError> {
        self.set_duty_cycle(0.0)
    }
}

/// Binary pneumatic actuator (double solenoid)
pub trait BinaryActuator {
    /// Drive the valve to a position.
    fn command(&mut self, position: SolenoidPosition) -> Result<(), HardwareError>;

    /// Last position sent to the valve. There is no position sensor.
    fn observed_command(&self) -> SolenoidPosition;
}
