// Keyboard teleop: WASD stick, Z/X rotate, M mecanum, T tank, E enable, Space disable, Q quit
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::{Duration, Instant};
use tracing::info;

use octo_drive_runtime::config::TOPIC_CMD_DRIVE;
use octo_drive_runtime::drivetrain::DriveMode;
use octo_drive_runtime::input::Sticks;
use octo_drive_runtime::messages::DriveRequest;

const DEFLECTION: f32 = 0.8; // simulated stick deflection per key
const INPUT_TIMEOUT_MS: u64 = 100; // Center the sticks after this much time with no input

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD_DRIVE).await?;

    info!("Controls: WASD=move, Z/X=rotate, M=mecanum, T=tank, E=enable, Space=disable, Q=quit");

    enable_raw_mode()?;
    let result = run_teleop(&publisher).await;
    disable_raw_mode()?;

    result
}

async fn send(
    publisher: &zenoh::pubsub::Publisher<'_>,
    request: &DriveRequest,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    publisher.put(serde_json::to_string(request)?).await?;
    Ok(())
}

async fn run_teleop(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut sticks = Sticks::default();
    let mut last_movement_input = Instant::now();

    loop {
        // Poll for key with 20ms timeout (50Hz effective rate)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;

                match code {
                    // Movement - deflect the stick and refresh timestamp
                    KeyCode::Char('w') if pressed => {
                        sticks.left_y = DEFLECTION;
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('s') if pressed => {
                        sticks.left_y = -DEFLECTION;
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('a') if pressed => {
                        sticks.left_x = -DEFLECTION;
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('d') if pressed => {
                        sticks.left_x = DEFLECTION;
                        last_movement_input = Instant::now();
                    }

                    // Rotation (right stick right = clockwise)
                    KeyCode::Char('z') if pressed => {
                        sticks.right_x = -DEFLECTION;
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('x') if pressed => {
                        sticks.right_x = DEFLECTION;
                        last_movement_input = Instant::now();
                    }

                    // Mode and lifecycle
                    KeyCode::Char('m') if pressed => {
                        info!("Mode: MECANUM");
                        send(publisher, &DriveRequest::SetMode { mode: DriveMode::Mecanum }).await?;
                    }
                    KeyCode::Char('t') if pressed => {
                        info!("Mode: TANK");
                        send(publisher, &DriveRequest::SetMode { mode: DriveMode::Differential }).await?;
                    }
                    KeyCode::Char('e') if pressed => {
                        info!("Enabled");
                        send(publisher, &DriveRequest::Enable).await?;
                    }
                    KeyCode::Char(' ') if pressed => {
                        info!("Disabled");
                        send(publisher, &DriveRequest::Disable).await?;
                    }

                    // Quit
                    KeyCode::Char('q') | KeyCode::Esc if pressed => {
                        send(publisher, &DriveRequest::Disable).await?;
                        break;
                    }

                    _ => {}
                }
            }
        }

        // Center the sticks if no movement input for INPUT_TIMEOUT_MS
        if last_movement_input.elapsed() > Duration::from_millis(INPUT_TIMEOUT_MS) {
            sticks = Sticks::default();
        }

        // Always publish at ~50Hz
        send(publisher, &DriveRequest::Sticks(sticks)).await?;
    }

    Ok(())
}
