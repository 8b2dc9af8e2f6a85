//! Prometheus metrics for the grid bot.
//!
//! Covers the tick loop end to end:
//! - Tick counts, failures, and duration
//! - Orders placed and refused, by side
//! - Ledger occupancy (ping/pong row counts)
//! - Last ticker price and stop-loss state
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration
//! fails, it indicates a fatal configuration error (e.g., duplicate
//! metric names) that should crash at startup rather than fail silently.
//! These panics only occur during static initialization, never at
//! runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_gauge, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, Encoder, Gauge, Histogram, IntCounter, IntCounterVec, IntGauge,
    TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Total completed ticks.
pub static TICKS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("gridbot_ticks_total", "Total completed ticks").unwrap()
});

/// Total ticker fetch failures (tick aborted, session survives).
pub static TICKER_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "gridbot_ticker_failures_total",
        "Total ticker fetch failures"
    )
    .unwrap()
});

/// Orders acknowledged by the venue, by side.
pub static ORDERS_PLACED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "gridbot_orders_placed_total",
        "Total orders acknowledged by the venue",
        &["side"]
    )
    .unwrap()
});

/// Orders refused by the venue, by side.
pub static ORDERS_FAILED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "gridbot_orders_failed_total",
        "Total orders refused by the venue",
        &["side"]
    )
    .unwrap()
});

/// Rows currently waiting to buy.
pub static ROWS_PING: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("gridbot_rows_ping", "Rows currently waiting to buy").unwrap()
});

/// Rows currently waiting to sell.
pub static ROWS_PONG: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("gridbot_rows_pong", "Rows currently waiting to sell").unwrap()
});

/// Stop-loss state (1 = fired, terminal).
pub static STOP_LOSS_TRIGGERED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "gridbot_stop_loss_triggered",
        "Stop loss state (1=fired, session terminal)"
    )
    .unwrap()
});

/// Last ticker price seen.
pub static LAST_PRICE: Lazy<Gauge> =
    Lazy::new(|| register_gauge!("gridbot_last_price", "Last ticker price seen").unwrap());

/// Wall time of one tick in milliseconds (fetch through reconcile).
pub static TICK_DURATION_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "gridbot_tick_duration_ms",
        "Tick duration in milliseconds",
        vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a completed tick.
    pub fn tick() {
        TICKS_TOTAL.inc();
    }

    /// Record a ticker fetch failure.
    pub fn ticker_failure() {
        TICKER_FAILURES_TOTAL.inc();
    }

    /// Record an acknowledged order.
    pub fn order_placed(side: &str) {
        ORDERS_PLACED_TOTAL.with_label_values(&[side]).inc();
    }

    /// Record a refused order.
    pub fn order_failed(side: &str) {
        ORDERS_FAILED_TOTAL.with_label_values(&[side]).inc();
    }

    /// Update ledger occupancy.
    pub fn rows(ping: usize, pong: usize) {
        ROWS_PING.set(ping as i64);
        ROWS_PONG.set(pong as i64);
    }

    /// Mark the stop-loss as fired.
    pub fn stop_loss_triggered() {
        STOP_LOSS_TRIGGERED.set(1);
    }

    /// Update the last ticker price.
    pub fn last_price(price: f64) {
        LAST_PRICE.set(price);
    }

    /// Record tick duration.
    pub fn tick_duration(duration_ms: f64) {
        TICK_DURATION_MS.observe(duration_ms);
    }
}

/// Render every registered metric in Prometheus text exposition format.
///
/// There is no exposition endpoint; this feeds logs and tests.
pub fn render() -> TelemetryResult<String> {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
}
