// One drive module: a motor and the gear-shift actuator on its gearbox

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::actuator::ShiftActuator;
use crate::hardware::{BinaryActuator, MotorOutput};

/// Physical module slot, in the fixed wheel order used by the kinematics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleSlot {
    FrontLeft,
    FrontRight,
    BackLeft,
    BackRight,
}

impl ModuleSlot {
    pub const ALL: [ModuleSlot; 4] = [
        ModuleSlot::FrontLeft,
        ModuleSlot::FrontRight,
        ModuleSlot::BackLeft,
        ModuleSlot::BackRight,
    ];

    pub fn index(self) -> usize {
        match self {
            ModuleSlot::FrontLeft => 0,
            ModuleSlot::FrontRight => 1,
            ModuleSlot::BackLeft => 2,
            ModuleSlot::BackRight => 3,
        }
    }
}

pub struct DriveModule<M, V> {
    slot: ModuleSlot,
    motor: M,
    shifter: ShiftActuator<V>,
    inverted: bool,
    // Write-once per frame: set by the drivetrain, consumed by update()
    duty_cycle: f32,
    last_output: f32,
}

impl<M: MotorOutput, V: BinaryActuator> DriveModule<M, V> {
    pub fn new(slot: ModuleSlot, motor: M, valve: V, inverted: bool) -> Self {
        Self {
            slot,
            motor,
            shifter: ShiftActuator::new(valve),
            inverted,
            duty_cycle: 0.0,
            last_output: 0.0,
        }
    }

    pub fn slot(&self) -> ModuleSlot {
        self.slot
    }

    /// Buffer this frame's duty cycle, clamped to [-1.0, 1.0]
    pub fn set_duty_cycle(&mut self, duty_cycle: f32) {
        self.duty_cycle = duty_cycle.clamp(-1.0, 1.0);
    }

    /// Duty cycle buffered for the current frame
    pub fn duty_cycle(&self) -> f32 {
        self.duty_cycle
    }

    /// Duty cycle flushed on the last update, before inversion
    pub fn last_output(&self) -> f32 {
        self.last_output
    }

    /// Flush the buffered duty cycle to the motor and reset the buffer.
    /// Called once per frame; an unset frame flushes zero.
    pub fn update(&mut self) {
        let output = std::mem::take(&mut self.duty_cycle);
        let applied = if self.inverted { -output } else { output };

        if let Err(e) = self.motor.set_duty_cycle(applied) {
            warn!("{:?} module: motor write failed: {}", self.slot, e);
        }
        self.last_output = output;
    }

    pub fn enable(&mut self) {
        if let Err(e) = self.motor.enable() {
            warn!("{:?} module: failed to enable motor: {}", self.slot, e);
        }
    }

    /// Stop the motor now, outside the frame cycle
    pub fn stop(&mut self) {
        self.duty_cycle = 0.0;
        self.last_output = 0.0;
        if let Err(e) = self.motor.stop() {
            warn!("{:?} module: failed to stop motor: {}", self.slot, e);
        }
    }

    pub fn shifter(&self) -> &ShiftActuator<V> {
        &self.shifter
    }

    pub fn shifter_mut(&mut self) -> &mut ShiftActuator<V> {
        &mut self.shifter
    }

    pub fn motor(&self) -> &M {
        &self.motor
    }

    pub fn motor_mut(&mut self) -> &mut M {
        &mut self.motor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{SimMotor, SimSolenoid};

    fn module(inverted: bool) -> DriveModule<SimMotor, SimSolenoid> {
        DriveModule::new(ModuleSlot::FrontRight, SimMotor::new(2), SimSolenoid::new(2, 3), inverted)
    }

    #[test]
    fn test_duty_cycle_consumed_by_update() {
        let mut m = module(false);
        m.set_duty_cycle(0.4);
        m.update();
        assert_eq!(m.motor().output(), 0.4);
        assert_eq!(m.last_output(), 0.4);
        assert_eq!(m.duty_cycle(), 0.0);

        // Nothing set this frame, so zero goes out
        m.update();
        assert_eq!(m.motor().output(), 0.0);
        assert_eq!(m.last_output(), 0.0);
    }

    #[test]
    fn test_inverted_module_flips_sign() {
        let mut m = module(true);
        m.set_duty_cycle(0.25);
        m.update();
        assert_eq!(m.motor().output(), -0.25);
        // Diagnostics report the commanded value, not the wire value
        assert_eq!(m.last_output(), 0.25);
    }

    #[test]
    fn test_duty_cycle_clamped() {
        let mut m = module(false);
        m.set_duty_cycle(3.0);
        assert_eq!(m.duty_cycle(), 1.0);
    }

    #[test]
    fn test_motor_fault_does_not_panic() {
        let mut m = module(false);
        m.motor_mut().set_connected(false);
        m.set_duty_cycle(0.5);
        m.update();
        assert_eq!(m.motor().writes(), 0);

        m.motor_mut().set_connected(true);
        m.set_duty_cycle(0.5);
        m.update();
        assert_eq!(m.motor().output(), 0.5);
    }

    #[test]
    fn test_slot_order() {
        for (i, slot) in ModuleSlot::ALL.iter().enumerate() {
            assert_eq!(slot.index(), i);
        }
    }
}
