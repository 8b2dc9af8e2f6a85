//! Error types for grid-core.

use crate::decimal::{Amount, Price};
use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Grid must have at least one band")]
    EmptyGrid,

    #[error("Upper price {upper} must exceed lower price {lower}")]
    InvertedBand { lower: Price, upper: Price },

    #[error("Total amount must be positive, got {0}")]
    NonPositiveAmount(Amount),

    #[error("Decimal parse error: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

/// Result type alias for core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;
