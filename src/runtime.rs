// Fixed-rate drivetrain loop with command watchdog
// Note: the drivetrain zeroes its command every frame, so the runtime re-applies
// the latest motion command each tick while it is fresh. When teleop goes quiet
// the watchdog stops re-applying it and the robot stops on its own.

use std::time::{Duration, Instant};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::{DrivetrainConfig, CMD_TIMEOUT, TOPIC_CMD_DRIVE, TOPIC_HEALTH, TOPIC_STATE_DRIVETRAIN};
use crate::drivetrain::{DriveError, Drivetrain};
use crate::hardware::{BinaryActuator, MotorOutput, SimMotor, SimSolenoid};
use crate::input::{drive_with_sticks, DriveCurve};
use crate::messages::{DriveRequest, DrivetrainTelemetry, MotionCommand, RuntimeHealth};

pub struct Runtime<M: MotorOutput, V: BinaryActuator> {
    drivetrain: Drivetrain<M, V>,
    curve: DriveCurve,
    latest_motion: Option<MotionCommand>,
    cmd_received_at: Instant,
    cmd_timeout: Duration,
    enabled: bool,
    health: RuntimeHealth,
}

impl<M: MotorOutput, V: BinaryActuator> Runtime<M, V> {
    /// Starts disabled until an enable request arrives
    pub fn new(drivetrain: Drivetrain<M, V>, curve: DriveCurve) -> Self {
        Self {
            drivetrain,
            curve,
            latest_motion: None,
            cmd_received_at: Instant::now(),
            cmd_timeout: CMD_TIMEOUT,
            enabled: false,
            health: RuntimeHealth::Disabled,
        }
    }

    /// Override the watchdog timeout (defaults to CMD_TIMEOUT)
    pub fn with_cmd_timeout(mut self, cmd_timeout: Duration) -> Self {
        self.cmd_timeout = cmd_timeout;
        self
    }

    pub fn drivetrain(&self) -> &Drivetrain<M, V> {
        &self.drivetrain
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Process incoming request
    pub fn on_request(&mut self, request: DriveRequest) {
        debug!("Received request: {:?}", &request);
        match request {
            DriveRequest::SetMode { mode } => self.drivetrain.set_mode(mode),
            DriveRequest::Enable => self.enable(),
            DriveRequest::Disable => self.disable(),
            DriveRequest::Arcade { x_speed, z_rotation } => {
                self.on_motion(MotionCommand::Arcade { x_speed, z_rotation })
            }
            DriveRequest::Cartesian {
                x_speed,
                y_speed,
                z_rotation,
            } => self.on_motion(MotionCommand::Cartesian {
                x_speed,
                y_speed,
                z_rotation,
            }),
            DriveRequest::Sticks(sticks) => self.on_motion(MotionCommand::Sticks(sticks)),
        }
    }

    fn enable(&mut self) {
        if !self.enabled {
            self.enabled = true;
            self.drivetrain.on_enable();
        }
    }

    fn disable(&mut self) {
        if self.enabled {
            self.enabled = false;
            self.latest_motion = None;
            self.drivetrain.on_disable();
        }
    }

    /// Invalid commands are dropped and the previous one stands.
    /// Motion sent while disabled is ignored so it cannot fire on the next enable.
    fn on_motion(&mut self, motion: MotionCommand) {
        if !self.enabled {
            debug!("Ignoring drive command while disabled");
            return;
        }
        match self.apply_motion(motion) {
            Ok(()) => {
                self.latest_motion = Some(motion);
                self.cmd_received_at = Instant::now();
            }
            Err(e) => warn!("Dropping drive command: {}", e),
        }
    }

    fn apply_motion(&mut self, motion: MotionCommand) -> Result<(), DriveError> {
        match motion {
            MotionCommand::Arcade { x_speed, z_rotation } => {
                self.drivetrain.arcade_drive(x_speed, z_rotation)
            }
            MotionCommand::Cartesian {
                x_speed,
                y_speed,
                z_rotation,
            } => self.drivetrain.cartesian_drive(x_speed, y_speed, z_rotation),
            MotionCommand::Sticks(sticks) => drive_with_sticks(&mut self.drivetrain, &self.curve, &sticks),
        }
    }

    /// Run one control frame: watchdog, re-apply motion, execute
    pub fn tick(&mut self) {
        if !self.enabled {
            self.health = RuntimeHealth::Disabled;
            return;
        }

        let cmd_age = self.cmd_received_at.elapsed();
        match self.latest_motion {
            Some(_) if cmd_age > self.cmd_timeout => {
                // Watchdog triggered - stop re-applying, the frame reset stops the robot
                if self.health != RuntimeHealth::CmdStale {
                    warn!("Command stale ({:?} old), stopping robot", cmd_age);
                }
                self.health = RuntimeHealth::CmdStale;
                self.latest_motion = None;
            }
            Some(motion) => {
                self.health = RuntimeHealth::Ok;
                // A mode change can invalidate a held command (cartesian in tank mode)
                if let Err(e) = self.apply_motion(motion) {
                    warn!("Held command no longer valid: {}", e);
                    self.latest_motion = None;
                }
            }
            None => {
                // No command since the last timeout or ever
                self.health = RuntimeHealth::CmdStale;
            }
        }

        self.drivetrain.execute();
    }

    pub fn telemetry(&self) -> DrivetrainTelemetry {
        self.drivetrain.telemetry()
    }
}

/// Drivetrain wired to the simulation backend using the configured channels
pub fn simulated_drivetrain(config: &DrivetrainConfig) -> Drivetrain<SimMotor, SimSolenoid> {
    let motors = config.modules.map(|m| SimMotor::new(m.motor_id));
    let valves = config
        .modules
        .map(|m| SimSolenoid::new(m.solenoid_forward, m.solenoid_reverse));
    Drivetrain::from_config(config, motors, valves)
}

pub async fn run(config: DrivetrainConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    config.validate()?;

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let subscriber = session.declare_subscriber(TOPIC_CMD_DRIVE).await?;
    let pub_state = session.declare_publisher(TOPIC_STATE_DRIVETRAIN).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    let drivetrain = simulated_drivetrain(&config);
    let mut runtime = Runtime::new(drivetrain, config.drive_curve);
    let mut tick = interval(config.period());
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        "Runtime started: {}Hz loop, {} shift settle frames, {}ms watchdog timeout",
        config.loop_hz,
        config.settle_frames(),
        CMD_TIMEOUT.as_millis()
    );
    info!("Subscribed to: {}", TOPIC_CMD_DRIVE);
    info!("Publishing to: {}, {}", TOPIC_STATE_DRIVETRAIN, TOPIC_HEALTH);

    loop {
        tick.tick().await;

        // 1. Drain all pending requests (non-blocking), applied in arrival order
        while let Ok(Some(sample)) = subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<DriveRequest>(&payload) {
                Ok(request) => runtime.on_request(request),
                Err(e) => warn!("Failed to parse request: {}", e),
            }
        }

        // 2. Run the control frame (includes watchdog logic)
        runtime.tick();

        // 3. Publish drivetrain state
        let state_json = serde_json::to_string(&runtime.telemetry())?;
        pub_state.put(state_json).await?;

        // 4. Publish health
        let health_json = serde_json::to_string(&runtime.health())?;
        pub_health.put(health_json).await?;
    }
}
