// Simulated hardware backend
//
// Records what would have been written to the motor controllers and the
// pneumatic hub. Used when running without a robot and in tests.

use tracing::debug;

use super::{BinaryActuator, HardwareError, MotorOutput, SolenoidPosition};

/// Simulated motor controller
#[derive(Debug, Clone)]
pub struct SimMotor {
    id: u8,
    output: f32,
    enabled: bool,
    connected: bool,
    writes: u32,
}

impl SimMotor {
    pub fn new(id: u8) -> Self {
        Self {
            id,
            output: 0.0,
            enabled: false,
            connected: true,
            writes: 0,
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    /// Last duty cycle accepted by the controller
    pub fn output(&self) -> f32 {
        self.output
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of accepted duty cycle writes
    pub fn writes(&self) -> u32 {
        self.writes
    }

    /// Simulate a pulled CAN cable. Writes fail until reconnected.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

impl MotorOutput for SimMotor {
    fn set_duty_cycle(&mut self, duty_cycle: f32) -> Result<(), HardwareError> {
        if !self.connected {
            return Err(HardwareError::Disconnected { id: self.id });
        }
        if !(-1.0..=1.0).contains(&duty_cycle) {
            return Err(HardwareError::DutyCycleOutOfRange {
                id: self.id,
                value: duty_cycle,
            });
        }
        debug!("sim motor {}: duty cycle {:.3}", self.id, duty_cycle);
        self.output = duty_cycle;
        self.writes += 1;
        Ok(())
    }

    fn enable(&mut self) -> Result<(), HardwareError> {
        if !self.connected {
            return Err(HardwareError::Disconnected { id: self.id });
        }
        self.enabled = true;
        Ok(())
    }
}

/// Simulated double solenoid on a pneumatic hub
#[derive(Debug, Clone)]
pub struct SimSolenoid {
    forward_channel: u8,
    reverse_channel: u8,
    position: SolenoidPosition,
    commands: u32,
}

impl SimSolenoid {
    pub fn new(forward_channel: u8, reverse_channel: u8) -> Self {
        Self {
            forward_channel,
            reverse_channel,
            position: SolenoidPosition::Off,
            commands: 0,
        }
    }

    pub fn channels(&self) -> (u8, u8) {
        (self.forward_channel, self.reverse_channel)
    }

    /// Number of valve commands received
    pub fn commands(&self) -> u32 {
        self.commands
    }
}

impl BinaryActuator for SimSolenoid {
    fn command(&mut self, position: SolenoidPosition) -> Result<(), HardwareError> {
        if self.forward_channel == self.reverse_channel {
            return Err(HardwareError::Solenoid {
                forward: self.forward_channel,
                reverse: self.reverse_channel,
                reason: "forward and reverse share a channel".to_string(),
            });
        }
        debug!(
            "sim solenoid {}/{}: {:?}",
            self.forward_channel, self.reverse_channel, position
        );
        self.position = position;
        self.commands += 1;
        Ok(())
    }

    fn observed_command(&self) -> SolenoidPosition {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motor_rejects_out_of_range() {
        let mut motor = SimMotor::new(3);
        assert!(motor.set_duty_cycle(1.5).is_err());
        assert_eq!(motor.output(), 0.0);
        assert_eq!(motor.writes(), 0);
    }

    #[test]
    fn test_disconnected_motor_fails_writes() {
        let mut motor = SimMotor::new(1);
        motor.set_connected(false);
        assert!(matches!(
            motor.set_duty_cycle(0.2),
            Err(HardwareError::Disconnected { id: 1 })
        ));
        motor.set_connected(true);
        motor.set_duty_cycle(0.2).unwrap();
        assert_eq!(motor.output(), 0.2);
    }

    #[test]
    fn test_solenoid_starts_off() {
        let mut solenoid = SimSolenoid::new(0, 1);
        assert_eq!(solenoid.observed_command(), SolenoidPosition::Off);
        solenoid.command(SolenoidPosition::Reverse).unwrap();
        assert_eq!(solenoid.observed_command(), SolenoidPosition::Reverse);
        assert_eq!(solenoid.commands(), 1);
    }

    #[test]
    fn test_solenoid_shared_channel_rejected() {
        // A hub refuses a double solenoid wired to the same channel twice
        let mut solenoid = SimSolenoid::new(0, 0);
        assert!(solenoid.command(SolenoidPosition::Forward).is_err());
        assert_eq!(solenoid.observed_command(), SolenoidPosition::Off);
    }
}
