//! Ping-pong tick execution.
//!
//! One tick: fetch the current price, select eligible rows from both
//! ledger tables, dispatch the buy batch and the sell batch concurrently,
//! settle acknowledged fills, then evaluate the stop-loss. The report
//! carries an explicit control decision; nothing outside the [`SessionLatch`]
//! remembers whether the session is alive.

use std::sync::Arc;
use std::time::Instant;

use futures_util::future;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use grid_core::{CurrencyPair, OrderLedger, OrderType, Price};
use grid_exchange::DynExchangeClient;
use grid_telemetry::Metrics;

use crate::error::{EngineError, EngineResult};
use crate::latch::{EndReason, SessionLatch};

// ============================================================================
// StopLossConfig
// ============================================================================

/// Stop-loss settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopLossConfig {
    /// Master switch; when false the check never runs.
    #[serde(default)]
    pub enabled: bool,
    /// Ticker price at or below which the position is liquidated.
    #[serde(default = "default_stop_loss_price")]
    pub price: Price,
    /// Liquidation order style.
    #[serde(default = "default_stop_loss_order_type")]
    pub order_type: OrderType,
}

fn default_stop_loss_price() -> Price {
    Price::new(Decimal::from(5))
}

fn default_stop_loss_order_type() -> OrderType {
    OrderType::Limit
}

impl Default for StopLossConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            price: default_stop_loss_price(),
            order_type: default_stop_loss_order_type(),
        }
    }
}

// ============================================================================
// TickReport
// ============================================================================

/// Control decision at the end of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    /// Keep ticking.
    Continue,
    /// End the session after this tick.
    Stop,
}

/// Result of the stop-loss liquidation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopLossOutcome {
    /// The liquidation order was acknowledged.
    Filled {
        /// Venue order id of the liquidation order.
        order_id: String,
    },
    /// The venue refused the liquidation order. The session still ends;
    /// whatever position remains needs an operator.
    Rejected {
        /// Venue rejection reason.
        reason: String,
    },
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Ticker price the tick acted on.
    pub price: Price,
    /// Rows relocated ping -> pong.
    pub bought: usize,
    /// Rows relocated pong -> ping.
    pub sold: usize,
    /// Buy orders the venue refused; their rows stayed in ping.
    pub buy_failures: usize,
    /// Sell orders the venue refused; their rows stayed in pong.
    pub sell_failures: usize,
    /// Present only when the stop-loss fired this tick.
    pub stop_loss: Option<StopLossOutcome>,
    /// Whether the session continues.
    pub control: TickControl,
}

// ============================================================================
// PingPongBot
// ============================================================================

/// The tick engine: owns the ledger and drives it against one venue.
pub struct PingPongBot {
    client: DynExchangeClient,
    pair: CurrencyPair,
    ledger: OrderLedger,
    stop_loss: StopLossConfig,
    latch: Arc<SessionLatch>,
}

impl PingPongBot {
    /// Create a bot over a freshly partitioned ledger.
    #[must_use]
    pub fn new(
        client: DynExchangeClient,
        pair: CurrencyPair,
        ledger: OrderLedger,
        stop_loss: StopLossConfig,
    ) -> Self {
        Self {
            client,
            pair,
            ledger,
            stop_loss,
            latch: Arc::new(SessionLatch::new()),
        }
    }

    /// The session latch.
    #[must_use]
    pub fn latch(&self) -> &Arc<SessionLatch> {
        &self.latch
    }

    /// Whether the session has ended.
    #[must_use]
    pub fn session_ended(&self) -> bool {
        self.latch.is_ended()
    }

    /// Current ledger state.
    #[must_use]
    pub fn ledger(&self) -> &OrderLedger {
        &self.ledger
    }

    /// The pair this bot trades.
    #[must_use]
    pub fn pair(&self) -> &CurrencyPair {
        &self.pair
    }

    /// Run one tick.
    ///
    /// A ticker failure aborts the tick before any order traffic or
    /// ledger change and surfaces as [`EngineError::Ticker`]; the caller
    /// decides whether to keep the session alive (the runner does).
    /// Individual order failures never abort the tick: the affected rows
    /// simply stay where they are and are retried on a later tick.
    pub async fn execute_tick(&mut self) -> EngineResult<TickReport> {
        if self.latch.is_ended() {
            return Err(EngineError::SessionEnded);
        }

        let started = Instant::now();

        let ticker = match self.client.get_ticker(self.pair.clone()).await {
            Ok(ticker) => ticker,
            Err(err) => {
                Metrics::ticker_failure();
                return Err(EngineError::Ticker(err));
            }
        };
        let current = ticker.last;

        Metrics::tick();
        Metrics::last_price(current.inner().to_f64().unwrap_or(0.0));

        let buys = self.ledger.eligible_buys(current);
        let sells = self.ledger.eligible_sells(current);

        debug!(
            price = %current,
            eligible_buys = buys.len(),
            eligible_sells = sells.len(),
            "Tick selection"
        );

        // Each future carries its row so reconciliation can settle the
        // exact ledger entry regardless of completion order.
        let buy_futures: Vec<_> = buys
            .into_iter()
            .map(|row| {
                let client = Arc::clone(&self.client);
                let pair = self.pair.clone();
                async move {
                    let result = client.buy_limit(pair, row.buy_price, row.amount).await;
                    (row, result)
                }
            })
            .collect();
        let sell_futures: Vec<_> = sells
            .into_iter()
            .map(|row| {
                let client = Arc::clone(&self.client);
                let pair = self.pair.clone();
                async move {
                    let result = client.sell_limit(pair, row.sell_price, row.amount).await;
                    (row, result)
                }
            })
            .collect();

        // Both batches in flight at once.
        let (buy_results, sell_results) = tokio::join!(
            future::join_all(buy_futures),
            future::join_all(sell_futures),
        );

        let mut bought = 0;
        let mut buy_failures = 0;
        for (row, result) in buy_results {
            match result {
                Ok(ack) => {
                    if self.ledger.settle_buy(&row) {
                        bought += 1;
                    }
                    Metrics::order_placed("buy");
                    debug!(order_id = %ack.order_id, row = %row, "Buy acknowledged");
                }
                Err(err) => {
                    buy_failures += 1;
                    Metrics::order_failed("buy");
                    debug!(row = %row, error = %err, "Buy refused, row stays in ping");
                }
            }
        }

        let mut sold = 0;
        let mut sell_failures = 0;
        for (row, result) in sell_results {
            match result {
                Ok(ack) => {
                    if self.ledger.settle_sell(&row) {
                        sold += 1;
                    }
                    Metrics::order_placed("sell");
                    debug!(order_id = %ack.order_id, row = %row, "Sell acknowledged");
                }
                Err(err) => {
                    sell_failures += 1;
                    Metrics::order_failed("sell");
                    debug!(row = %row, error = %err, "Sell refused, row stays in pong");
                }
            }
        }

        Metrics::rows(self.ledger.ping_len(), self.ledger.pong_len());

        let stop_loss = self.check_stop_loss(current).await;
        let control = if stop_loss.is_some() {
            TickControl::Stop
        } else {
            TickControl::Continue
        };

        Metrics::tick_duration(started.elapsed().as_secs_f64() * 1000.0);

        Ok(TickReport {
            price: current,
            bought,
            sold,
            buy_failures,
            sell_failures,
            stop_loss,
            control,
        })
    }

    /// Evaluate the stop-loss at the given ticker price.
    ///
    /// Fires when enabled and the price has fallen to or at the
    /// configured stop. Firing is terminal whether or not the venue
    /// accepts the liquidation order: a rejection leaves a position only
    /// an operator can clean up, which is why it is logged at error.
    async fn check_stop_loss(&self, current: Price) -> Option<StopLossOutcome> {
        if !self.stop_loss.enabled || self.stop_loss.price < current {
            return None;
        }

        let total = self.ledger.total_amount();
        warn!(
            price = %current,
            stop = %self.stop_loss.price,
            amount = %total,
            order_type = %self.stop_loss.order_type,
            "Stop loss fired, liquidating position"
        );
        Metrics::stop_loss_triggered();

        let result = match self.stop_loss.order_type {
            OrderType::Limit => {
                self.client
                    .sell_limit(self.pair.clone(), self.stop_loss.price, total)
                    .await
            }
            OrderType::Market => self.client.sell_market(self.pair.clone(), total).await,
        };

        self.latch.end(EndReason::StopLoss { price: current });

        match result {
            Ok(ack) => {
                info!(order_id = %ack.order_id, "Stop loss liquidation acknowledged");
                Some(StopLossOutcome::Filled {
                    order_id: ack.order_id,
                })
            }
            Err(err) => {
                error!(error = %err, "Stop loss liquidation rejected, manual intervention required");
                Some(StopLossOutcome::Rejected {
                    reason: err.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_core::{build_grid, Amount, LocalOrder, OrderSide};
    use grid_exchange::{MockExchange, RecordedCall};
    use rust_decimal_macros::dec;

    fn sample_grid() -> Vec<LocalOrder> {
        build_grid(
            Price::new(dec!(36)),
            Price::new(dec!(42)),
            2,
            Amount::new(dec!(1)),
        )
        .unwrap()
    }

    fn sample_bot(mock: Arc<MockExchange>, stop_loss: StopLossConfig) -> PingPongBot {
        PingPongBot::new(
            mock,
            CurrencyPair::new("NEO", "USDT"),
            OrderLedger::from_grid(sample_grid()),
            stop_loss,
        )
    }

    fn stop_loss_at(price: Decimal, order_type: OrderType) -> StopLossConfig {
        StopLossConfig {
            enabled: true,
            price: Price::new(price),
            order_type,
        }
    }

    #[tokio::test]
    async fn test_tick_migrates_eligible_rows() {
        // Mock last price 7.8 sits below both buy prices, so both rows
        // are eligible and both limit buys are acknowledged.
        let mock = Arc::new(MockExchange::new());
        let mut bot = sample_bot(mock.clone(), StopLossConfig::default());

        let report = bot.execute_tick().await.unwrap();

        assert_eq!(report.price, Price::new(dec!(7.8)));
        assert_eq!(report.bought, 2);
        assert_eq!(report.sold, 0);
        assert_eq!(report.buy_failures, 0);
        assert_eq!(report.sell_failures, 0);
        assert_eq!(report.stop_loss, None);
        assert_eq!(report.control, TickControl::Continue);

        assert_eq!(bot.ledger().ping_len(), 0);
        assert_eq!(bot.ledger().pong_len(), 2);
        assert_eq!(bot.ledger().total_amount(), Amount::new(dec!(1)));
    }

    #[tokio::test]
    async fn test_tick_no_orders_inside_band() {
        // Price 40 sits inside the grid: neither 36 >= 40 nor 39 >= 40,
        // and the pong table is empty, so the tick only fetches the ticker.
        let mock = Arc::new(MockExchange::new());
        mock.set_last_price(Price::new(dec!(40)));
        let mut bot = sample_bot(mock.clone(), StopLossConfig::default());

        let report = bot.execute_tick().await.unwrap();

        assert_eq!(report.bought, 0);
        assert_eq!(report.sold, 0);
        assert_eq!(report.buy_failures, 0);
        assert_eq!(report.sell_failures, 0);
        assert_eq!(mock.calls(), vec![RecordedCall::Ticker]);
        assert_eq!(bot.ledger().ping_len(), 2);
    }

    #[tokio::test]
    async fn test_failed_buy_leaves_row_in_ping() {
        // The mock refuses limit orders at 7.5; a single band buying at
        // exactly that price gets refused and stays put.
        let mock = Arc::new(MockExchange::new());
        mock.set_last_price(Price::new(dec!(7.5)));
        let rows = build_grid(
            Price::new(dec!(7.5)),
            Price::new(dec!(9.5)),
            1,
            Amount::new(dec!(1)),
        )
        .unwrap();
        let mut bot = PingPongBot::new(
            mock.clone(),
            CurrencyPair::new("NEO", "USDT"),
            OrderLedger::from_grid(rows),
            StopLossConfig::default(),
        );

        let report = bot.execute_tick().await.unwrap();

        assert_eq!(report.bought, 0);
        assert_eq!(report.buy_failures, 1);
        assert_eq!(report.control, TickControl::Continue);
        assert_eq!(bot.ledger().ping_len(), 1);
        assert_eq!(bot.ledger().pong_len(), 0);
    }

    #[tokio::test]
    async fn test_failed_sell_leaves_row_in_pong() {
        let mock = Arc::new(MockExchange::new());
        let row = LocalOrder::new(
            Price::new(dec!(6.5)),
            Price::new(dec!(7.5)),
            Amount::new(dec!(1)),
        );
        let mut bot = PingPongBot::new(
            mock.clone(),
            CurrencyPair::new("NEO", "USDT"),
            OrderLedger::new(Vec::new(), vec![row]),
            StopLossConfig::default(),
        );

        // last 7.8 makes the 7.5 sell eligible; the mock refuses it.
        let report = bot.execute_tick().await.unwrap();

        assert_eq!(report.sold, 0);
        assert_eq!(report.sell_failures, 1);
        assert_eq!(bot.ledger().pong_len(), 1);
        assert_eq!(bot.ledger().ping_len(), 0);
    }

    #[tokio::test]
    async fn test_ticker_failure_aborts_tick_without_mutation() {
        let mock = Arc::new(MockExchange::new());
        mock.set_ticker_outage(true);
        let mut bot = sample_bot(mock.clone(), StopLossConfig::default());

        let err = bot.execute_tick().await.unwrap_err();
        assert!(matches!(err, EngineError::Ticker(_)));

        // No orders went out, nothing moved, and the session survives.
        assert_eq!(mock.calls(), vec![RecordedCall::Ticker]);
        assert_eq!(bot.ledger().ping_len(), 2);
        assert!(!bot.session_ended());

        // Next tick succeeds once the venue recovers.
        mock.set_ticker_outage(false);
        let report = bot.execute_tick().await.unwrap();
        assert_eq!(report.bought, 2);
    }

    #[tokio::test]
    async fn test_stop_loss_fires_and_ends_session() {
        // Stop 100 vs last 7.8: fires on the first tick.
        let mock = Arc::new(MockExchange::new());
        let mut bot = sample_bot(mock.clone(), stop_loss_at(dec!(100), OrderType::Limit));

        let report = bot.execute_tick().await.unwrap();

        assert!(matches!(
            report.stop_loss,
            Some(StopLossOutcome::Filled { .. })
        ));
        assert_eq!(report.control, TickControl::Stop);
        assert!(bot.session_ended());

        let err = bot.execute_tick().await.unwrap_err();
        assert!(matches!(err, EngineError::SessionEnded));
    }

    #[tokio::test]
    async fn test_stop_loss_fires_when_price_reaches_stop() {
        // Stop 5, current 4: 5 < 4 is false, so the stop fires.
        let mock = Arc::new(MockExchange::new());
        mock.set_last_price(Price::new(dec!(4)));
        let mut bot = sample_bot(mock.clone(), stop_loss_at(dec!(5), OrderType::Limit));

        let report = bot.execute_tick().await.unwrap();

        assert!(report.stop_loss.is_some());
        assert_eq!(report.control, TickControl::Stop);
        assert_eq!(
            bot.latch().reason(),
            Some(EndReason::StopLoss {
                price: Price::new(dec!(4)),
            })
        );
    }

    #[tokio::test]
    async fn test_stop_loss_spares_session_above_stop() {
        // Stop 5, current 7.8: 5 < 7.8, so the stop does not fire.
        let mock = Arc::new(MockExchange::new());
        let mut bot = sample_bot(mock.clone(), stop_loss_at(dec!(5), OrderType::Limit));

        let report = bot.execute_tick().await.unwrap();

        assert_eq!(report.stop_loss, None);
        assert_eq!(report.control, TickControl::Continue);
        assert!(!bot.session_ended());
    }

    #[tokio::test]
    async fn test_stop_loss_rejection_still_terminal() {
        // Liquidation at the mock's refused limit price 7.5: the order
        // is rejected but the session ends anyway.
        let mock = Arc::new(MockExchange::new());
        mock.set_last_price(Price::new(dec!(7.4)));
        let mut bot = sample_bot(mock.clone(), stop_loss_at(dec!(7.5), OrderType::Limit));

        let report = bot.execute_tick().await.unwrap();

        assert!(matches!(
            report.stop_loss,
            Some(StopLossOutcome::Rejected { .. })
        ));
        assert_eq!(report.control, TickControl::Stop);
        assert!(bot.session_ended());
    }

    #[tokio::test]
    async fn test_stop_loss_market_order_liquidates_total() {
        let mock = Arc::new(MockExchange::new());
        let mut bot = sample_bot(mock.clone(), stop_loss_at(dec!(100), OrderType::Market));

        let report = bot.execute_tick().await.unwrap();

        assert!(matches!(
            report.stop_loss,
            Some(StopLossOutcome::Filled { .. })
        ));
        assert!(mock.calls().iter().any(|call| matches!(
            call,
            RecordedCall::MarketOrder {
                side: OrderSide::Sell,
                amount,
            } if *amount == Amount::new(dec!(1))
        )));
    }

    #[tokio::test]
    async fn test_stop_loss_disabled_never_fires() {
        let mock = Arc::new(MockExchange::new());
        mock.set_last_price(Price::new(dec!(1)));
        let mut bot = sample_bot(
            mock.clone(),
            StopLossConfig {
                enabled: false,
                price: Price::new(dec!(100)),
                order_type: OrderType::Limit,
            },
        );

        let report = bot.execute_tick().await.unwrap();

        assert_eq!(report.stop_loss, None);
        assert_eq!(report.control, TickControl::Continue);
        assert!(!bot.session_ended());
    }

    #[tokio::test]
    async fn test_pong_rows_sell_on_rebound() {
        // Buy both rows at 7.8, then raise the price past both sell
        // edges and watch them migrate back.
        let mock = Arc::new(MockExchange::new());
        let mut bot = sample_bot(mock.clone(), StopLossConfig::default());

        bot.execute_tick().await.unwrap();
        assert_eq!(bot.ledger().pong_len(), 2);

        mock.set_last_price(Price::new(dec!(42)));
        let report = bot.execute_tick().await.unwrap();

        assert_eq!(report.sold, 2);
        assert_eq!(report.bought, 0);
        assert_eq!(bot.ledger().ping_len(), 2);
        assert_eq!(bot.ledger().pong_len(), 0);
        assert_eq!(bot.ledger().total_amount(), Amount::new(dec!(1)));
    }

    #[test]
    fn test_stop_loss_config_defaults() {
        let config = StopLossConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.price, Price::new(dec!(5)));
        assert_eq!(config.order_type, OrderType::Limit);
    }
}
