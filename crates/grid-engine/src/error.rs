//! Engine error types.

use grid_exchange::ExchangeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The price fetch failed. The tick was aborted before any order
    /// traffic or ledger change; the session itself survives.
    #[error("Ticker fetch failed: {0}")]
    Ticker(#[from] ExchangeError),

    /// The session latch has ended; no further ticks may run.
    #[error("Session has ended")]
    SessionEnded,
}

pub type EngineResult<T> = Result<T, EngineError>;
