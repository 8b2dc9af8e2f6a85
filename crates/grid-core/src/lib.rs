//! Core domain types for the grid ping-pong bot.
//!
//! This crate provides the fundamental types used throughout the system:
//! - `Price`, `Amount`: precision-safe numeric types
//! - `CurrencyPair`: base/quote asset identification
//! - `LocalOrder`: one grid row (buy edge, sell edge, amount)
//! - `build_grid`: slice a price band into rows
//! - `OrderLedger`: the ping/pong tables and the movement rules

pub mod decimal;
pub mod error;
pub mod grid;
pub mod ledger;
pub mod order;
pub mod pair;

pub use decimal::{Amount, Price};
pub use error::{CoreError, CoreResult};
pub use grid::build_grid;
pub use ledger::OrderLedger;
pub use order::{LocalOrder, OrderSide, OrderType};
pub use pair::CurrencyPair;
