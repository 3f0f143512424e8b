// Drivetrain orchestrator for the shifting four-module base
//
// Provides:
// - Drive mode selection (disabled / differential / mecanum)
// - The gear-shift state machine gating wheel output during a shift
// - Kinematics fan-out to the four modules
//
// Commands only buffer intent. Hardware is touched once per control frame in
// execute(), which never blocks.

pub mod actuator;
pub mod kinematics;
pub mod module;

pub use actuator::{ShiftActuator, ShiftState};
pub use kinematics::{ChassisCommand, DifferentialKinematics, Kinematics, MecanumKinematics, WheelSpeeds};
pub use module::{DriveModule, ModuleSlot};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::DrivetrainConfig;
use crate::hardware::{BinaryActuator, MotorOutput, SolenoidPosition};
use crate::messages::DrivetrainTelemetry;

/// Largest duty cycle sent to any module
pub const MAX_DUTY_CYCLE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveMode {
    #[default]
    Disabled,
    Differential,
    Mecanum,
}

impl DriveMode {
    /// Solenoid position that engages the gearing for this mode.
    /// Disabled has no requirement and leaves the actuators alone.
    pub fn required_position(self) -> Option<SolenoidPosition> {
        match self {
            DriveMode::Disabled => None,
            DriveMode::Differential => Some(SolenoidPosition::Forward),
            DriveMode::Mecanum => Some(SolenoidPosition::Reverse),
        }
    }
}

/// Shift state machine, shared by all four actuators (they move in lock-step)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum ShiftPhase {
    Idle,
    Settling { target: DriveMode, frames_remaining: u32 },
}

/// Rejected drive commands. Recoverable: the command is dropped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DriveError {
    #[error("Invalid {axis} command {value}: must be inside (-1.0, 1.0)")]
    InvalidCommand { axis: &'static str, value: f32 },

    #[error("Lateral motion not available in {mode:?} mode")]
    InvalidModeForCommand { mode: DriveMode },
}

fn check_axis(axis: &'static str, value: f32) -> Result<f32, DriveError> {
    // NaN fails both comparisons
    if value > -1.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(DriveError::InvalidCommand { axis, value })
    }
}

pub struct Drivetrain<M: MotorOutput, V: BinaryActuator> {
    modules: [DriveModule<M, V>; 4],
    differential: DifferentialKinematics,
    mecanum: MecanumKinematics,
    settle_frames: u32,
    mode: DriveMode,
    pending: ChassisCommand,
    shift_target: DriveMode,
}

impl<M: MotorOutput, V: BinaryActuator> Drivetrain<M, V> {
    /// Modules must be given in slot order FL, FR, BL, BR
    pub fn new(
        modules: [DriveModule<M, V>; 4],
        differential: DifferentialKinematics,
        mecanum: MecanumKinematics,
        settle_frames: u32,
    ) -> Self {
        Self {
            modules,
            differential,
            mecanum,
            settle_frames,
            mode: DriveMode::Disabled,
            pending: ChassisCommand::zero(),
            shift_target: DriveMode::Disabled,
        }
    }

    /// Build from configuration with one motor and one valve per slot
    pub fn from_config(config: &DrivetrainConfig, motors: [M; 4], valves: [V; 4]) -> Self {
        let [m0, m1, m2, m3] = motors;
        let [v0, v1, v2, v3] = valves;
        let inv = |slot: ModuleSlot| config.modules[slot.index()].inverted;

        let modules = [
            DriveModule::new(ModuleSlot::FrontLeft, m0, v0, inv(ModuleSlot::FrontLeft)),
            DriveModule::new(ModuleSlot::FrontRight, m1, v1, inv(ModuleSlot::FrontRight)),
            DriveModule::new(ModuleSlot::BackLeft, m2, v2, inv(ModuleSlot::BackLeft)),
            DriveModule::new(ModuleSlot::BackRight, m3, v3, inv(ModuleSlot::BackRight)),
        ];

        let mut drivetrain = Self::new(
            modules,
            DifferentialKinematics::new(config.track_width),
            config.mecanum,
            config.settle_frames(),
        );
        drivetrain.set_mode(config.initial_mode);
        drivetrain
    }

    pub fn mode(&self) -> DriveMode {
        self.mode
    }

    /// Record the requested mode. Gearing follows on the next frames.
    pub fn set_mode(&mut self, mode: DriveMode) {
        if mode != self.mode {
            info!("Drive mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }

    /// Tank-style motion: forward and rotate, no strafe
    pub fn arcade_drive(&mut self, x_speed: f32, z_rotation: f32) -> Result<(), DriveError> {
        let x_speed = check_axis("x_speed", x_speed)?;
        let z_rotation = check_axis("z_rotation", z_rotation)?;
        self.pending = ChassisCommand::new(x_speed, 0.0, z_rotation);
        Ok(())
    }

    /// Full 3-DOF motion, only while in mecanum mode
    pub fn cartesian_drive(
        &mut self,
        x_speed: f32,
        y_speed: f32,
        z_rotation: f32,
    ) -> Result<(), DriveError> {
        let x_speed = check_axis("x_speed", x_speed)?;
        let y_speed = check_axis("y_speed", y_speed)?;
        let z_rotation = check_axis("z_rotation", z_rotation)?;
        if self.mode != DriveMode::Mecanum {
            return Err(DriveError::InvalidModeForCommand { mode: self.mode });
        }
        self.pending = ChassisCommand::new(x_speed, y_speed, z_rotation);
        Ok(())
    }

    /// Command buffered for the next frame
    pub fn pending_command(&self) -> ChassisCommand {
        self.pending
    }

    /// Run one control frame.
    ///
    /// While any actuator is settling, or on the frame a shift is issued, no
    /// kinematics are computed and every module flushes zero.
    pub fn execute(&mut self) {
        let command = std::mem::take(&mut self.pending);

        for module in &mut self.modules {
            module.shifter_mut().tick();
        }

        if self.is_shifting() {
            debug!("Shift settling, wheel output held at zero");
            self.flush();
            return;
        }

        if let Some(required) = self.mode.required_position() {
            if self.modules.iter().any(|m| m.shifter().get() != required) {
                info!(
                    "Shifting to {:?} gearing ({:?}), {} settle frames",
                    self.mode, required, self.settle_frames
                );
                for module in &mut self.modules {
                    module.shifter_mut().shift(required, self.settle_frames);
                }
                self.shift_target = self.mode;
                self.flush();
                return;
            }
        }

        let wheels = match self.mode {
            DriveMode::Disabled => WheelSpeeds::default(),
            DriveMode::Differential => self.differential.to_wheel_speeds(&command),
            DriveMode::Mecanum => self.mecanum.to_wheel_speeds(&command),
        }
        .desaturate(MAX_DUTY_CYCLE);

        debug!(
            "Wheel speeds: fl={:.3}, fr={:.3}, bl={:.3}, br={:.3}",
            wheels.front_left, wheels.front_right, wheels.back_left, wheels.back_right
        );

        for (module, speed) in self.modules.iter_mut().zip(wheels.as_array()) {
            module.set_duty_cycle(speed);
        }
        self.flush();
    }

    fn flush(&mut self) {
        for module in &mut self.modules {
            module.update();
        }
    }

    fn is_shifting(&self) -> bool {
        self.modules.iter().any(|m| !m.shifter().is_settled())
    }

    pub fn shift_phase(&self) -> ShiftPhase {
        let frames_remaining = self
            .modules
            .iter()
            .map(|m| m.shifter().settle_frames_remaining())
            .max()
            .unwrap_or(0);

        if frames_remaining == 0 {
            ShiftPhase::Idle
        } else {
            ShiftPhase::Settling {
                target: self.shift_target,
                frames_remaining,
            }
        }
    }

    /// Robot enabled: re-arm motor output safety and start from a zero command
    pub fn on_enable(&mut self) {
        info!("Drivetrain enabled in {:?} mode", self.mode);
        self.pending = ChassisCommand::zero();
        for module in &mut self.modules {
            module.enable();
        }
    }

    /// Robot disabled: stop every motor now and drop the pending command
    pub fn on_disable(&mut self) {
        info!("Drivetrain disabled, stopping motors");
        self.pending = ChassisCommand::zero();
        for module in &mut self.modules {
            module.stop();
        }
    }

    pub fn settle_frames(&self) -> u32 {
        self.settle_frames
    }

    /// Duty cycles flushed on the last frame, in slot order
    pub fn duty_cycles(&self) -> [f32; 4] {
        self.modules.each_ref().map(|m| m.last_output())
    }

    pub fn solenoid_positions(&self) -> [SolenoidPosition; 4] {
        self.modules.each_ref().map(|m| m.shifter().get())
    }

    pub fn module(&self, slot: ModuleSlot) -> &DriveModule<M, V> {
        &self.modules[slot.index()]
    }

    pub fn module_mut(&mut self, slot: ModuleSlot) -> &mut DriveModule<M, V> {
        &mut self.modules[slot.index()]
    }

    pub fn telemetry(&self) -> DrivetrainTelemetry {
        DrivetrainTelemetry {
            mode: self.mode,
            shift: self.shift_phase(),
            duty_cycles: self.duty_cycles(),
            solenoids: self.solenoid_positions(),
        }
    }
}

impl<M: MotorOutput, V: BinaryActuator> Drop for Drivetrain<M, V> {
    fn drop(&mut self) {
        // Leave the robot stopped
        for module in &mut self.modules {
            if let Err(e) = module.motor_mut().stop() {
                warn!("Failed to stop {:?} motor on drop: {}", module.slot(), e);
            }
        }
    }
}
