//! Error types for grid-exchange.

use thiserror::Error;

/// Exchange error types.
///
/// Every venue failure mode is typed; adapters never collapse a missing
/// or malformed payload into a default value.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Order rejected: {reason}")]
    Rejected { reason: String },

    #[error("Malformed venue response: {0}")]
    Parse(String),

    #[error("Environment variable not found: {0}")]
    MissingCredentials(String),

    #[error("Unknown venue: {0}")]
    UnknownVenue(String),
}

/// Result type alias for exchange operations.
pub type ExchangeResult<T> = std::result::Result<T, ExchangeError>;
