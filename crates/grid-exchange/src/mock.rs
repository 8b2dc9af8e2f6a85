//! Deterministic in-process venue for tests and dry runs.
//!
//! No credentials, no network. Quotes and failure rules are fixed so
//! engine behavior is reproducible:
//! - ticker: bid 5 / ask 6 / last 7.8
//! - wallet: 10 available, nothing frozen
//! - limit orders at price 7.5 are refused
//! - market buys of amount 5 and market sells of amount 10 are refused
//!
//! Every call is recorded for verification, and the quote can be
//! steered to drive the engine through specific branches.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use rust_decimal::Decimal;

use grid_core::{Amount, CurrencyPair, OrderSide, Price};

use crate::client::{BoxFuture, ExchangeClient};
use crate::error::{ExchangeError, ExchangeResult};
use crate::factory::Venue;
use crate::types::{OpenOrder, OrderAck, Ticker, Wallet};

fn default_ticker() -> Ticker {
    Ticker {
        bid: Some(Price::new(Decimal::from(5))),
        ask: Some(Price::new(Decimal::from(6))),
        last: Price::new(Decimal::new(78, 1)),
    }
}

fn rejected_limit_price() -> Price {
    Price::new(Decimal::new(75, 1))
}

fn rejected_market_buy_amount() -> Amount {
    Amount::new(Decimal::from(5))
}

fn rejected_market_sell_amount() -> Amount {
    Amount::new(Decimal::from(10))
}

/// A call observed by the mock, for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Ticker,
    Wallet {
        asset: String,
    },
    OpenOrders,
    LimitOrder {
        side: OrderSide,
        price: Price,
        amount: Amount,
    },
    MarketOrder {
        side: OrderSide,
        amount: Amount,
    },
}

/// Mock venue.
#[derive(Debug)]
pub struct MockExchange {
    /// Current quote returned by `get_ticker`.
    ticker: Mutex<Ticker>,
    /// Available balance returned by `get_wallet`.
    available: Mutex<Amount>,
    /// When set, `get_ticker` fails with a venue outage.
    ticker_outage: AtomicBool,
    /// Recorded calls for verification.
    calls: Mutex<Vec<RecordedCall>>,
    next_order_id: AtomicU64,
}

impl Default for MockExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExchange {
    pub fn new() -> Self {
        Self {
            ticker: Mutex::new(default_ticker()),
            available: Mutex::new(Amount::new(Decimal::from(10))),
            ticker_outage: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
            next_order_id: AtomicU64::new(1),
        }
    }

    /// Replace the whole quote.
    pub fn set_ticker(&self, ticker: Ticker) {
        *self.ticker.lock() = ticker;
    }

    /// Steer just the last-trade price.
    pub fn set_last_price(&self, last: Price) {
        self.ticker.lock().last = last;
    }

    /// Set the available balance.
    pub fn set_available(&self, available: Amount) {
        *self.available.lock() = available;
    }

    /// Make `get_ticker` fail until cleared.
    pub fn set_ticker_outage(&self, outage: bool) {
        self.ticker_outage.store(outage, Ordering::SeqCst);
    }

    /// Get recorded calls.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Clear recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().push(call);
    }

    fn ack(&self, side: OrderSide, price: Option<Price>, amount: Amount) -> OrderAck {
        let id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
        OrderAck {
            order_id: format!("mock-{id}"),
            side,
            price,
            amount,
        }
    }

    fn limit_order(
        &self,
        side: OrderSide,
        price: Price,
        amount: Amount,
    ) -> ExchangeResult<OrderAck> {
        self.record(RecordedCall::LimitOrder {
            side,
            price,
            amount,
        });
        if price == rejected_limit_price() {
            return Err(ExchangeError::Rejected {
                reason: format!("limit {side} at {price} refused"),
            });
        }
        Ok(self.ack(side, Some(price), amount))
    }

    fn market_order(&self, side: OrderSide, amount: Amount) -> ExchangeResult<OrderAck> {
        self.record(RecordedCall::MarketOrder { side, amount });
        let rejected = match side {
            OrderSide::Buy => rejected_market_buy_amount(),
            OrderSide::Sell => rejected_market_sell_amount(),
        };
        if amount == rejected {
            return Err(ExchangeError::Rejected {
                reason: format!("market {side} of {amount} refused"),
            });
        }
        Ok(self.ack(side, None, amount))
    }
}

impl ExchangeClient for MockExchange {
    fn venue(&self) -> Venue {
        Venue::Mock
    }

    fn get_ticker(&self, _pair: CurrencyPair) -> BoxFuture<'_, ExchangeResult<Ticker>> {
        Box::pin(async move {
            self.record(RecordedCall::Ticker);
            if self.ticker_outage.load(Ordering::SeqCst) {
                return Err(ExchangeError::Status {
                    code: 503,
                    body: "mock ticker outage".to_string(),
                });
            }
            Ok(*self.ticker.lock())
        })
    }

    fn get_wallet(&self, asset: String) -> BoxFuture<'_, ExchangeResult<Wallet>> {
        Box::pin(async move {
            self.record(RecordedCall::Wallet {
                asset: asset.clone(),
            });
            Ok(Wallet {
                asset,
                available: *self.available.lock(),
                frozen: Amount::ZERO,
            })
        })
    }

    fn get_open_orders(
        &self,
        _pair: CurrencyPair,
    ) -> BoxFuture<'_, ExchangeResult<Vec<OpenOrder>>> {
        Box::pin(async move {
            self.record(RecordedCall::OpenOrders);
            Ok(Vec::new())
        })
    }

    fn buy_limit(
        &self,
        _pair: CurrencyPair,
        price: Price,
        amount: Amount,
    ) -> BoxFuture<'_, ExchangeResult<OrderAck>> {
        Box::pin(async move { self.limit_order(OrderSide::Buy, price, amount) })
    }

    fn sell_limit(
        &self,
        _pair: CurrencyPair,
        price: Price,
        amount: Amount,
    ) -> BoxFuture<'_, ExchangeResult<OrderAck>> {
        Box::pin(async move { self.limit_order(OrderSide::Sell, price, amount) })
    }

    fn buy_market(
        &self,
        _pair: CurrencyPair,
        amount: Amount,
    ) -> BoxFuture<'_, ExchangeResult<OrderAck>> {
        Box::pin(async move { self.market_order(OrderSide::Buy, amount) })
    }

    fn sell_market(
        &self,
        _pair: CurrencyPair,
        amount: Amount,
    ) -> BoxFuture<'_, ExchangeResult<OrderAck>> {
        Box::pin(async move { self.market_order(OrderSide::Sell, amount) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pair() -> CurrencyPair {
        CurrencyPair::new("NEO", "USDT")
    }

    #[tokio::test]
    async fn test_default_quote() {
        let mock = MockExchange::new();
        let ticker = mock.get_ticker(pair()).await.unwrap();

        assert_eq!(ticker.bid, Some(Price::new(dec!(5))));
        assert_eq!(ticker.ask, Some(Price::new(dec!(6))));
        assert_eq!(ticker.last, Price::new(dec!(7.8)));
    }

    #[tokio::test]
    async fn test_wallet_and_open_orders() {
        let mock = MockExchange::new();

        let wallet = mock.get_wallet("NEO".to_string()).await.unwrap();
        assert_eq!(wallet.available, Amount::new(dec!(10)));
        assert_eq!(wallet.frozen, Amount::ZERO);

        let orders = mock.get_open_orders(pair()).await.unwrap();
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_limit_order_refused_at_marked_price() {
        let mock = MockExchange::new();

        let err = mock
            .buy_limit(pair(), Price::new(dec!(7.5)), Amount::new(dec!(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::Rejected { .. }));

        let ack = mock
            .buy_limit(pair(), Price::new(dec!(36)), Amount::new(dec!(1)))
            .await
            .unwrap();
        assert_eq!(ack.order_id, "mock-1");
        assert_eq!(ack.side, OrderSide::Buy);
    }

    #[tokio::test]
    async fn test_market_order_refusal_rules() {
        let mock = MockExchange::new();

        assert!(mock
            .buy_market(pair(), Amount::new(dec!(5)))
            .await
            .is_err());
        assert!(mock
            .buy_market(pair(), Amount::new(dec!(10)))
            .await
            .is_ok());

        assert!(mock
            .sell_market(pair(), Amount::new(dec!(10)))
            .await
            .is_err());
        assert!(mock.sell_market(pair(), Amount::new(dec!(5))).await.is_ok());
    }

    #[tokio::test]
    async fn test_ticker_outage_and_recovery() {
        let mock = MockExchange::new();
        mock.set_ticker_outage(true);

        let err = mock.get_ticker(pair()).await.unwrap_err();
        assert!(matches!(err, ExchangeError::Status { code: 503, .. }));

        mock.set_ticker_outage(false);
        assert!(mock.get_ticker(pair()).await.is_ok());
    }

    #[tokio::test]
    async fn test_calls_recorded() {
        let mock = MockExchange::new();
        let _ = mock.get_ticker(pair()).await;
        let _ = mock
            .sell_limit(pair(), Price::new(dec!(39)), Amount::new(dec!(0.5)))
            .await;

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], RecordedCall::Ticker);
        assert_eq!(
            calls[1],
            RecordedCall::LimitOrder {
                side: OrderSide::Sell,
                price: Price::new(dec!(39)),
                amount: Amount::new(dec!(0.5)),
            }
        );

        mock.clear_calls();
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_steered_last_price() {
        let mock = MockExchange::new();
        mock.set_last_price(Price::new(dec!(40)));

        let ticker = mock.get_ticker(pair()).await.unwrap();
        assert_eq!(ticker.last, Price::new(dec!(40)));
    }
}
