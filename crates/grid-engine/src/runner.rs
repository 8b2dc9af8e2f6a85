//! Session loop: periodic ticks until the session ends.

use std::time::Duration;

use tracing::{info, warn};

use crate::bot::{PingPongBot, TickControl};
use crate::error::EngineError;
use crate::latch::EndReason;

/// Drive the bot on a fixed interval until it stops or the operator
/// interrupts.
///
/// Ticker failures are survivable: the failed tick is logged and the
/// loop waits for the next interval. The loop exits when a tick decides
/// [`TickControl::Stop`], when the latch has ended, or on ctrl-c.
pub async fn run_session(bot: &mut PingPongBot, tick_interval: Duration) {
    let mut interval = tokio::time::interval(tick_interval);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match bot.execute_tick().await {
                    Ok(report) => {
                        info!(
                            price = %report.price,
                            bought = report.bought,
                            sold = report.sold,
                            buy_failures = report.buy_failures,
                            sell_failures = report.sell_failures,
                            ping = bot.ledger().ping_len(),
                            pong = bot.ledger().pong_len(),
                            "Tick complete"
                        );
                        if report.control == TickControl::Stop {
                            break;
                        }
                    }
                    Err(EngineError::Ticker(err)) => {
                        warn!(error = %err, "Ticker unavailable, skipping tick");
                    }
                    Err(EngineError::SessionEnded) => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                bot.latch().end(EndReason::Interrupted);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::StopLossConfig;
    use grid_core::{build_grid, Amount, CurrencyPair, OrderLedger, OrderType, Price};
    use grid_exchange::MockExchange;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn sample_bot(mock: Arc<MockExchange>, stop_loss: StopLossConfig) -> PingPongBot {
        let rows = build_grid(
            Price::new(dec!(36)),
            Price::new(dec!(42)),
            2,
            Amount::new(dec!(1)),
        )
        .unwrap();
        PingPongBot::new(
            mock,
            CurrencyPair::new("NEO", "USDT"),
            OrderLedger::from_grid(rows),
            stop_loss,
        )
    }

    #[tokio::test]
    async fn test_session_stops_when_stop_loss_fires() {
        // Stop 100 fires on the very first tick, so the loop exits on
        // its own well inside the timeout.
        let mock = Arc::new(MockExchange::new());
        let mut bot = sample_bot(
            mock.clone(),
            StopLossConfig {
                enabled: true,
                price: Price::new(dec!(100)),
                order_type: OrderType::Limit,
            },
        );

        tokio::time::timeout(
            Duration::from_secs(5),
            run_session(&mut bot, Duration::from_millis(10)),
        )
        .await
        .expect("session should stop on its own");

        assert!(bot.session_ended());
    }

    #[tokio::test]
    async fn test_session_exits_when_latch_already_ended() {
        let mock = Arc::new(MockExchange::new());
        let mut bot = sample_bot(mock.clone(), StopLossConfig::default());
        bot.latch().end(EndReason::Interrupted);

        tokio::time::timeout(
            Duration::from_secs(5),
            run_session(&mut bot, Duration::from_millis(10)),
        )
        .await
        .expect("ended session should not tick");

        assert!(mock.calls().is_empty());
    }
}
