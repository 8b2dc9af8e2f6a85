//! Grid ping-pong trading bot.
//!
//! Main application that wires the pieces together:
//! - Venue client selection and credentials
//! - Grid construction over the configured band
//! - Tick engine and session lifecycle
//! - Telemetry and the shutdown summary

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
