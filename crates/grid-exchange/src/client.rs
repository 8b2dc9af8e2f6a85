//! Exchange client abstraction.
//!
//! Provides a trait-based abstraction over venue REST APIs. This allows:
//! - Dependency injection for testing
//! - Swapping venues behind one factory
//! - Keeping the engine free of wire-format concerns

use std::pin::Pin;
use std::sync::Arc;

use grid_core::{Amount, CurrencyPair, Price};

use crate::error::ExchangeResult;
use crate::factory::Venue;
use crate::types::{OpenOrder, OrderAck, Ticker, Wallet};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Venue operations the engine depends on.
///
/// Every failure is a typed `ExchangeError`; implementations never
/// report absence as a silent default.
pub trait ExchangeClient: Send + Sync {
    /// Which venue this client talks to.
    fn venue(&self) -> Venue;

    /// Current ticker for the pair.
    fn get_ticker(&self, pair: CurrencyPair) -> BoxFuture<'_, ExchangeResult<Ticker>>;

    /// Balance for a single asset.
    fn get_wallet(&self, asset: String) -> BoxFuture<'_, ExchangeResult<Wallet>>;

    /// Orders currently resting on the venue for the pair.
    fn get_open_orders(&self, pair: CurrencyPair)
        -> BoxFuture<'_, ExchangeResult<Vec<OpenOrder>>>;

    /// Place a limit buy.
    fn buy_limit(
        &self,
        pair: CurrencyPair,
        price: Price,
        amount: Amount,
    ) -> BoxFuture<'_, ExchangeResult<OrderAck>>;

    /// Place a limit sell.
    fn sell_limit(
        &self,
        pair: CurrencyPair,
        price: Price,
        amount: Amount,
    ) -> BoxFuture<'_, ExchangeResult<OrderAck>>;

    /// Place a market buy.
    fn buy_market(
        &self,
        pair: CurrencyPair,
        amount: Amount,
    ) -> BoxFuture<'_, ExchangeResult<OrderAck>>;

    /// Place a market sell.
    fn sell_market(
        &self,
        pair: CurrencyPair,
        amount: Amount,
    ) -> BoxFuture<'_, ExchangeResult<OrderAck>>;
}

/// Arc wrapper for ExchangeClient trait objects.
pub type DynExchangeClient = Arc<dyn ExchangeClient>;
