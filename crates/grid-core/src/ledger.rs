//! Ping/pong order ledgers.
//!
//! Tracks which grid rows are waiting to buy (bid ping table) and which
//! are waiting to sell (ask pong table). A row lives in exactly one table
//! at any time; settling a fill moves it to the other table without
//! touching its amount, so total inventory is conserved across any
//! settlement sequence.

use crate::decimal::{Amount, Price};
use crate::order::LocalOrder;

/// The two row tables and the movement rules between them.
#[derive(Debug, Clone, Default)]
pub struct OrderLedger {
    /// Rows waiting to buy.
    bid_ping: Vec<LocalOrder>,
    /// Rows waiting to sell.
    ask_pong: Vec<LocalOrder>,
}

impl OrderLedger {
    /// Create a ledger with explicit table contents.
    pub fn new(bid_ping: Vec<LocalOrder>, ask_pong: Vec<LocalOrder>) -> Self {
        Self { bid_ping, ask_pong }
    }

    /// Create a ledger from a freshly built grid: every row starts out
    /// waiting to buy.
    pub fn from_grid(rows: Vec<LocalOrder>) -> Self {
        Self {
            bid_ping: rows,
            ask_pong: Vec::new(),
        }
    }

    // === Selection ===

    /// Rows eligible to buy at the current price: `buy_price >= current`.
    ///
    /// The comparison direction is deliberate and load-bearing; see the
    /// mirror-image `eligible_sells`.
    #[must_use]
    pub fn eligible_buys(&self, current: Price) -> Vec<LocalOrder> {
        self.bid_ping
            .iter()
            .filter(|row| row.buy_price >= current)
            .copied()
            .collect()
    }

    /// Rows eligible to sell at the current price: `sell_price <= current`.
    #[must_use]
    pub fn eligible_sells(&self, current: Price) -> Vec<LocalOrder> {
        self.ask_pong
            .iter()
            .filter(|row| row.sell_price <= current)
            .copied()
            .collect()
    }

    // === Settlement ===

    /// Settle a filled buy: move the row from the ping table to the pong
    /// table. Returns false (and changes nothing) if the row is not
    /// present, which makes settlement of a batch order-independent.
    pub fn settle_buy(&mut self, row: &LocalOrder) -> bool {
        match self.bid_ping.iter().position(|r| r == row) {
            Some(idx) => {
                let moved = self.bid_ping.remove(idx);
                self.ask_pong.push(moved);
                true
            }
            None => false,
        }
    }

    /// Settle a filled sell: move the row from the pong table back to the
    /// ping table.
    pub fn settle_sell(&mut self, row: &LocalOrder) -> bool {
        match self.ask_pong.iter().position(|r| r == row) {
            Some(idx) => {
                let moved = self.ask_pong.remove(idx);
                self.bid_ping.push(moved);
                true
            }
            None => false,
        }
    }

    // === Inspection ===

    pub fn ping_len(&self) -> usize {
        self.bid_ping.len()
    }

    pub fn pong_len(&self) -> usize {
        self.ask_pong.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bid_ping.is_empty() && self.ask_pong.is_empty()
    }

    /// Rows currently waiting to buy.
    pub fn ping_rows(&self) -> &[LocalOrder] {
        &self.bid_ping
    }

    /// Rows currently waiting to sell.
    pub fn pong_rows(&self) -> &[LocalOrder] {
        &self.ask_pong
    }

    /// Total amount across both tables. Constant under settlement.
    pub fn total_amount(&self) -> Amount {
        self.bid_ping
            .iter()
            .chain(self.ask_pong.iter())
            .map(|row| row.amount)
            .fold(Amount::ZERO, |acc, a| acc + a)
    }
}
