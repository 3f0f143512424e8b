// Gear-shift actuator
//
// Wraps one double-acting solenoid. There is no position sensor on the
// gearbox, so "settled" means enough control frames have passed since the
// last command. Actual mechanical settle time is assumed, not measured.

use serde::Serialize;
use tracing::warn;

use crate::hardware::{BinaryActuator, SolenoidPosition};

/// Commanded position and remaining settle window of one actuator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ShiftState {
    pub commanded: SolenoidPosition,
    pub settle_frames_remaining: u32,
}

pub struct ShiftActuator<V> {
    valve: V,
    state: ShiftState,
}

impl<V: BinaryActuator> ShiftActuator<V> {
    /// Starts from whatever the valve last reported, with no settle window
    pub fn new(valve: V) -> Self {
        let commanded = valve.observed_command();
        Self {
            valve,
            state: ShiftState {
                commanded,
                settle_frames_remaining: 0,
            },
        }
    }

    /// Last successfully commanded position (not sensed)
    pub fn get(&self) -> SolenoidPosition {
        self.state.commanded
    }

    pub fn state(&self) -> ShiftState {
        self.state
    }

    pub fn is_settled(&self) -> bool {
        self.state.settle_frames_remaining == 0
    }

    pub fn settle_frames_remaining(&self) -> u32 {
        self.state.settle_frames_remaining
    }

    /// Command the valve and arm the settle window.
    ///
    /// A failed valve write leaves the state untouched so the next frame sees
    /// the mismatch again and re-issues the command.
    pub fn shift(&mut self, position: SolenoidPosition, settle_frames: u32) {
        if let Err(e) = self.valve.command(position) {
            warn!("Shift to {:?} failed: {}", position, e);
            return;
        }
        self.state = ShiftState {
            commanded: position,
            settle_frames_remaining: settle_frames,
        };
    }

    /// Advance one control frame
    pub fn tick(&mut self) {
        self.state.settle_frames_remaining = self.state.settle_frames_remaining.saturating_sub(1);
    }

    pub fn valve(&self) -> &V {
        &self.valve
    }

    pub fn valve_mut(&mut self) -> &mut V {
        &mut self.valve
    }
}
