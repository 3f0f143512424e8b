use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use octo_drive_runtime::config::DrivetrainConfig;

/// Shifting tank/mecanum drivetrain runtime
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Drivetrain config JSON (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init(); // installs the subscriber globally

    let args = Args::parse();
    let config = match args.config {
        Some(path) => match DrivetrainConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Config error: {}", e);
                std::process::exit(1);
            }
        },
        None => DrivetrainConfig::default(),
    };

    if let Err(e) = octo_drive_runtime::runtime::run(config).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
