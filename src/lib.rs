// Control runtime for a four-module drivetrain that shifts between
// differential (tank) and mecanum (omni) gearing with pneumatic actuators.

pub mod config;
pub mod drivetrain;
pub mod hardware;
pub mod input;
pub mod messages;
pub mod runtime;
