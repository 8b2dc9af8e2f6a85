//! Full-session integration tests against the mock venue.
//!
//! Exercises the application end to end:
//! - Wiring from defaults (client, grid, engine)
//! - Preflight probes
//! - A session that runs until the stop-loss ends it

use std::time::Duration;

use rust_decimal_macros::dec;
use tokio::time::timeout;

use grid_bot::{AppConfig, Application};
use grid_core::Price;
use grid_engine::EndReason;
use grid_exchange::Venue;

/// Default configuration wires a runnable application with no
/// credentials and no network.
#[tokio::test]
async fn test_application_wires_from_defaults() {
    let app = Application::new(AppConfig::default()).unwrap();

    app.run_preflight().await;

    assert!(!app.session_ended());
    assert_eq!(app.bot().ledger().ping_len(), 2);
    assert_eq!(app.bot().ledger().pong_len(), 0);
}

/// A stop-loss above the mock's last price fires on the first tick and
/// ends the whole session, so `run` returns without a shutdown signal.
#[tokio::test]
async fn test_session_runs_to_stop_loss() {
    let mut config = AppConfig::default();
    config.stop_loss.enabled = true;
    config.stop_loss.price = Price::new(dec!(100));
    config.engine.tick_interval_secs = 1;

    let mut app = Application::new(config).unwrap();

    timeout(Duration::from_secs(5), app.run())
        .await
        .expect("session should end on the first tick");

    assert!(app.session_ended());
    assert_eq!(
        app.bot().latch().reason(),
        // The mock venue's last price.
        Some(EndReason::StopLoss {
            price: Price::new(dec!(7.8))
        })
    );
}

/// The shipped config file matches the coded defaults, so running with
/// or without it behaves identically.
#[test]
fn test_shipped_defaults_match_coded_defaults() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/default.toml");

    let config = AppConfig::from_file(path).unwrap();
    let defaults = AppConfig::default();

    assert_eq!(config.venue, Venue::Mock);
    assert_eq!(config.currency_pair(), defaults.currency_pair());
    assert_eq!(config.grid.lower_price, defaults.grid.lower_price);
    assert_eq!(config.grid.upper_price, defaults.grid.upper_price);
    assert_eq!(config.grid.band_count, defaults.grid.band_count);
    assert_eq!(config.grid.total_amount, defaults.grid.total_amount);
    assert_eq!(config.stop_loss.enabled, defaults.stop_loss.enabled);
    assert_eq!(config.stop_loss.price, defaults.stop_loss.price);
    assert_eq!(
        config.engine.tick_interval_secs,
        defaults.engine.tick_interval_secs
    );
    assert_eq!(config.telemetry.log_level, defaults.telemetry.log_level);
}
