//! Application wiring and lifecycle.
//!
//! Builds the venue client and the grid ledger from configuration,
//! hands them to the tick engine, and drives one session from preflight
//! to the shutdown summary.

use std::sync::Arc;

use tracing::{info, warn};

use grid_core::{build_grid, OrderLedger};
use grid_engine::{run_session, PingPongBot};
use grid_exchange::{build_client, DynExchangeClient};
use grid_telemetry::SessionStatsReporter;

use crate::config::AppConfig;
use crate::error::AppResult;

/// The application: one venue client, one grid, one session.
pub struct Application {
    config: AppConfig,
    client: DynExchangeClient,
    bot: PingPongBot,
}

impl Application {
    /// Wire the client, grid and engine from configuration.
    ///
    /// Fails on an unknown or credential-less venue and on a degenerate
    /// grid; both are startup errors, nothing has traded yet.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let client = build_client(config.venue)?;

        let rows = build_grid(
            config.grid.lower_price,
            config.grid.upper_price,
            config.grid.band_count,
            config.grid.total_amount,
        )?;
        info!(
            bands = rows.len(),
            lower = %config.grid.lower_price,
            upper = %config.grid.upper_price,
            total = %config.grid.total_amount,
            "Grid built"
        );

        let bot = PingPongBot::new(
            Arc::clone(&client),
            config.currency_pair(),
            OrderLedger::from_grid(rows),
            config.stop_loss.clone(),
        );

        Ok(Self {
            config,
            client,
            bot,
        })
    }

    /// Probe the venue and report account state.
    ///
    /// Failures are logged and non-fatal; venues gate read endpoints
    /// independently of trading, and the tick loop tolerates outages.
    pub async fn run_preflight(&self) {
        let pair = self.bot.pair().clone();

        match self.client.get_ticker(pair.clone()).await {
            Ok(ticker) => info!(last = %ticker.last, "Preflight: ticker reachable"),
            Err(err) => warn!(error = %err, "Preflight: ticker fetch failed"),
        }

        for asset in [pair.base.clone(), pair.quote.clone()] {
            match self.client.get_wallet(asset.clone()).await {
                Ok(wallet) => info!(
                    asset = %wallet.asset,
                    available = %wallet.available,
                    frozen = %wallet.frozen,
                    "Preflight: wallet"
                ),
                Err(err) => {
                    warn!(asset = %asset, error = %err, "Preflight: wallet fetch failed");
                }
            }
        }

        match self.client.get_open_orders(pair).await {
            Ok(orders) => info!(count = orders.len(), "Preflight: open orders"),
            Err(err) => warn!(error = %err, "Preflight: open orders fetch failed"),
        }
    }

    /// Run the session until stop-loss or operator shutdown, then log
    /// the summary.
    pub async fn run(&mut self) {
        let reporter = SessionStatsReporter::new();

        info!(
            venue = %self.config.venue,
            pair = %self.bot.pair(),
            interval_secs = self.config.engine.tick_interval_secs,
            "Starting session"
        );

        run_session(&mut self.bot, self.config.tick_interval()).await;

        reporter.output_summary();
        if let Some(reason) = self.bot.latch().reason() {
            info!(reason = %reason, "Session over");
        }
    }

    /// Whether the session latch has tripped.
    #[must_use]
    pub fn session_ended(&self) -> bool {
        self.bot.session_ended()
    }

    /// The engine, for inspection.
    #[must_use]
    pub fn bot(&self) -> &PingPongBot {
        &self.bot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_core::{LocalOrder, Price};
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_builds_configured_grid() {
        let app = Application::new(AppConfig::default()).unwrap();
        let ledger = app.bot().ledger();

        assert_eq!(
            ledger.ping_rows(),
            &[
                LocalOrder::new(
                    Price::new(dec!(36)),
                    Price::new(dec!(39)),
                    grid_core::Amount::new(dec!(0.5)),
                ),
                LocalOrder::new(
                    Price::new(dec!(39)),
                    Price::new(dec!(42)),
                    grid_core::Amount::new(dec!(0.5)),
                ),
            ]
        );
        assert!(ledger.pong_rows().is_empty());
        assert!(!app.session_ended());
    }

    #[test]
    fn test_new_rejects_inverted_band() {
        let mut config = AppConfig::default();
        config.grid.lower_price = Price::new(dec!(42));
        config.grid.upper_price = Price::new(dec!(36));

        let result = Application::new(config);

        assert!(matches!(
            result,
            Err(crate::error::AppError::Grid(
                grid_core::CoreError::InvertedBand { .. }
            ))
        ));
    }
}
