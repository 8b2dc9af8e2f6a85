//! Order-related types.
//!
//! Provides order side and type enums plus the `LocalOrder` grid row
//! that the ledgers track.

use crate::decimal::{Amount, Price};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Returns 1 for buy, -1 for sell (Bitfinex encodes side in the
    /// amount's sign).
    pub fn sign(&self) -> i8 {
        match self {
            Self::Buy => 1,
            Self::Sell => -1,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Limit order.
    Limit,
    /// Market order.
    Market,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limit => write!(f, "limit"),
            Self::Market => write!(f, "market"),
        }
    }
}

/// One grid row: a unit of inventory that perpetually alternates between
/// buying at `buy_price` and selling at `sell_price`.
///
/// Rows are value objects; the ledgers match them by field equality when
/// settling fills, so the amount must stay unchanged while a row migrates
/// between tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalOrder {
    pub buy_price: Price,
    pub sell_price: Price,
    pub amount: Amount,
}

impl LocalOrder {
    pub fn new(buy_price: Price, sell_price: Price, amount: Amount) -> Self {
        Self {
            buy_price,
            sell_price,
            amount,
        }
    }
}

impl fmt::Display for LocalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[buy {} / sell {} x {}]",
            self.buy_price, self.sell_price, self.amount
        )
    }
}
