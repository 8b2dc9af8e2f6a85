//! Tick execution engine for the grid bot.
//!
//! Owns the tick cycle (fetch price, select eligible rows, dispatch both
//! order batches concurrently, settle fills, evaluate the stop-loss), the
//! one-shot session latch, and the interval loop that drives ticks until
//! the session ends.

pub mod bot;
pub mod error;
pub mod latch;
pub mod runner;

pub use bot::{PingPongBot, StopLossConfig, StopLossOutcome, TickControl, TickReport};
pub use error::{EngineError, EngineResult};
pub use latch::{EndReason, SessionLatch};
pub use runner::run_session;
