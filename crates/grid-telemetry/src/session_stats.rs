//! Session statistics output.
//!
//! Reads the live metric registry back into a summary block logged at
//! shutdown and on demand. Tick-duration percentiles are interpolated
//! from the histogram buckets.

use crate::metrics::{
    LAST_PRICE, ORDERS_FAILED_TOTAL, ORDERS_PLACED_TOTAL, ROWS_PING, ROWS_PONG,
    STOP_LOSS_TRIGGERED, TICKER_FAILURES_TOTAL, TICKS_TOTAL, TICK_DURATION_MS,
};
use chrono::{DateTime, Utc};
use prometheus::core::Collector;
use tracing::info;

/// Aggregate statistics for one session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub ticks: u64,
    pub ticker_failures: u64,
    pub buys_placed: u64,
    pub buy_failures: u64,
    pub sells_placed: u64,
    pub sell_failures: u64,
    pub rows_ping: i64,
    pub rows_pong: i64,
    pub stop_loss_triggered: bool,
    pub last_price: f64,
    pub tick_p50_ms: f64,
    pub tick_p95_ms: f64,
    pub tick_p99_ms: f64,
}

/// Session statistics reporter.
pub struct SessionStatsReporter {
    start_time: DateTime<Utc>,
}

impl Default for SessionStatsReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStatsReporter {
    /// Create a reporter anchored at the current time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            start_time: Utc::now(),
        }
    }

    /// Read the current statistics out of the registry.
    #[must_use]
    pub fn get_stats(&self) -> SessionStats {
        let (tick_p50_ms, tick_p95_ms, tick_p99_ms) = tick_duration_percentiles();

        SessionStats {
            ticks: TICKS_TOTAL.get(),
            ticker_failures: TICKER_FAILURES_TOTAL.get(),
            buys_placed: ORDERS_PLACED_TOTAL.with_label_values(&["buy"]).get(),
            buy_failures: ORDERS_FAILED_TOTAL.with_label_values(&["buy"]).get(),
            sells_placed: ORDERS_PLACED_TOTAL.with_label_values(&["sell"]).get(),
            sell_failures: ORDERS_FAILED_TOTAL.with_label_values(&["sell"]).get(),
            rows_ping: ROWS_PING.get(),
            rows_pong: ROWS_PONG.get(),
            stop_loss_triggered: STOP_LOSS_TRIGGERED.get() == 1,
            last_price: LAST_PRICE.get(),
            tick_p50_ms,
            tick_p95_ms,
            tick_p99_ms,
        }
    }

    /// Output the session summary to logs.
    pub fn output_summary(&self) {
        let stats = self.get_stats();
        let duration = Utc::now() - self.start_time;
        let hours = duration.num_hours();
        let minutes = duration.num_minutes() % 60;

        info!("========== Session Summary ==========");
        info!(
            "Started: {} ({} hours {} minutes ago)",
            self.start_time.format("%Y-%m-%d %H:%M:%S UTC"),
            hours,
            minutes
        );
        info!(
            "  Ticks: {} completed, {} ticker failures",
            stats.ticks, stats.ticker_failures
        );
        info!(
            "  Buys: {} placed, {} refused",
            stats.buys_placed, stats.buy_failures
        );
        info!(
            "  Sells: {} placed, {} refused",
            stats.sells_placed, stats.sell_failures
        );
        info!(
            "  Rows: {} ping / {} pong",
            stats.rows_ping, stats.rows_pong
        );
        info!("  Last price: {}", stats.last_price);
        info!("  Stop loss triggered: {}", stats.stop_loss_triggered);
        info!(
            "  Tick duration (ms): P50={:.1}, P95={:.1}, P99={:.1}",
            stats.tick_p50_ms, stats.tick_p95_ms, stats.tick_p99_ms
        );
        info!("=====================================");
    }
}

/// P50/P95/P99 of the tick duration histogram.
fn tick_duration_percentiles() -> (f64, f64, f64) {
    for mf in TICK_DURATION_MS.collect() {
        for m in mf.get_metric() {
            let h = m.get_histogram();
            let count = h.get_sample_count();
            if count == 0 {
                return (0.0, 0.0, 0.0);
            }
            let buckets = h.get_bucket();
            return (
                percentile_from_buckets(buckets, count, 0.50),
                percentile_from_buckets(buckets, count, 0.95),
                percentile_from_buckets(buckets, count, 0.99),
            );
        }
    }
    (0.0, 0.0, 0.0)
}

/// Calculate a percentile from cumulative histogram buckets with linear
/// interpolation inside the matched bucket.
fn percentile_from_buckets(
    buckets: &[prometheus::proto::Bucket],
    total_count: u64,
    percentile: f64,
) -> f64 {
    let target = (total_count as f64 * percentile) as u64;
    let mut prev_bound = 0.0;
    let mut prev_count = 0u64;

    for bucket in buckets {
        let upper_bound = bucket.get_upper_bound();
        let cumulative_count = bucket.get_cumulative_count();

        if cumulative_count >= target {
            let bucket_count = cumulative_count - prev_count;
            if bucket_count == 0 {
                return upper_bound;
            }
            let position = (target - prev_count) as f64 / bucket_count as f64;
            return prev_bound + position * (upper_bound - prev_bound);
        }

        prev_bound = upper_bound;
        prev_count = cumulative_count;
    }

    // Target beyond all buckets: report the last bound.
    buckets.last().map(|b| b.get_upper_bound()).unwrap_or(0.0)
}
