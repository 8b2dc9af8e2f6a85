//! Telemetry for the grid bot.
//!
//! Structured logging via `tracing` and Prometheus metrics behind a
//! static facade, plus a session summary reporter that reads the
//! registry back at shutdown.

pub mod error;
pub mod logging;
pub mod metrics;
pub mod session_stats;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::{render, Metrics};
pub use session_stats::{SessionStats, SessionStatsReporter};
