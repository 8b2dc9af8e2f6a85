//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Grid error: {0}")]
    Grid(#[from] grid_core::CoreError),

    #[error("Exchange error: {0}")]
    Exchange(#[from] grid_exchange::ExchangeError),

    #[error("Engine error: {0}")]
    Engine(#[from] grid_engine::EngineError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] grid_telemetry::TelemetryError),
}

pub type AppResult<T> = Result<T, AppError>;
