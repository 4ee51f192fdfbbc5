//! CLI entry point for boilerwatch.
//!
//! Three roles, all sharing one configuration file:
//! - `monitor` — subscribe to the telemetry topic and render verified,
//!   classified readings on a fixed interval;
//! - `publish` — run the simulated boiler publisher;
//! - `attack` — run the false-data-injection publisher.

use anyhow::Result;
use boilerwatch::config::Settings;
use boilerwatch::logging;
use boilerwatch::monitor::{self, MonitorFrame};
use boilerwatch::simulator;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "boilerwatch")]
#[command(about = "Integrity-verified boiler telemetry monitor", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config/default.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Subscribe to the telemetry topic and render the live picture
    Monitor,
    /// Publish simulated boiler telemetry with valid hashes
    Publish,
    /// Publish tampered telemetry (stale hash, injected temperature)
    Attack,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)?;
    logging::init(&settings.application)?;

    match cli.command {
        Commands::Monitor => monitor::run(&settings, render_frame).await?,
        Commands::Publish => run_until_ctrl_c(simulator::run_publisher(&settings, false)).await?,
        Commands::Attack => run_until_ctrl_c(simulator::run_publisher(&settings, true)).await?,
    }

    Ok(())
}

async fn run_until_ctrl_c(
    publisher: impl std::future::Future<Output = boilerwatch::error::AppResult<()>>,
) -> Result<()> {
    tokio::select! {
        result = publisher => result?,
        _ = tokio::signal::ctrl_c() => {
            println!("\nStopping publisher...");
        }
    }
    Ok(())
}

/// Render one processing cycle as plain text. Presentation only; all
/// derived values come ready-made on the frame.
fn render_frame(frame: &MonitorFrame) {
    let link = if frame.connected { "online" } else { "offline" };

    let Some(latest) = &frame.latest else {
        println!("◉ waiting for telemetry... (broker {})", link);
        return;
    };

    let verdict = if latest.integrity_ok {
        "✓ Verified"
    } else {
        "✗ Tampered"
    };

    println!(
        "[{}] {} | {:.1}°C {:.1} PSI | status {} | {} | threat {}",
        latest.reading.timestamp.format("%H:%M:%S"),
        latest.reading.device_id,
        latest.reading.temperature,
        latest.reading.pressure,
        latest.reading.status,
        verdict,
        latest.classification.threat,
    );

    println!(
        "    packets {} | violations {} | integrity score {:.1}% | broker {}",
        frame.aggregates.total_packets,
        frame.aggregates.integrity_violations,
        frame.aggregates.integrity_score,
        link,
    );

    if let Some(window) = &frame.window {
        println!(
            "    window: {} readings | temp mean {:.1} max {:.1} | pressure mean {:.1} max {:.1}",
            window.count,
            window.temperature_mean,
            window.temperature_max,
            window.pressure_mean,
            window.pressure_max,
        );
    }

    if let Some(alert) = frame.aggregates.alert_history.last() {
        println!("    last alert: [{}] {}", alert.kind, alert.message);
    }

    if let Some(error) = &frame.last_decode_error {
        println!("    last decode error: {}", error);
    }
}
