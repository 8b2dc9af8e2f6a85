//! Grid ping-pong trading bot - entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Grid ping-pong trading bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via GRIDBOT_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config first: the log level lives in it. RUST_LOG still overrides.
    let config = grid_bot::AppConfig::load(args.config)?;

    grid_telemetry::init_logging(&config.telemetry.log_level)?;

    info!("Starting grid bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        venue = %config.venue,
        pair = %config.currency_pair(),
        bands = config.grid.band_count,
        "Configuration loaded"
    );

    let mut app = grid_bot::Application::new(config)?;

    app.run_preflight().await;

    app.run().await;

    Ok(())
}
