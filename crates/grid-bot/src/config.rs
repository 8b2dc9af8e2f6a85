//! Application configuration.

use crate::error::{AppError, AppResult};
use grid_core::{Amount, CurrencyPair, Price};
use grid_engine::StopLossConfig;
use grid_exchange::Venue;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Traded pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairConfig {
    /// Base asset code. Default: "NEO".
    #[serde(default = "default_base")]
    pub base: String,
    /// Quote asset code. Default: "USDT".
    #[serde(default = "default_quote")]
    pub quote: String,
}

fn default_base() -> String {
    "NEO".to_string()
}

fn default_quote() -> String {
    "USDT".to_string()
}

impl Default for PairConfig {
    fn default() -> Self {
        Self {
            base: default_base(),
            quote: default_quote(),
        }
    }
}

/// Price band the grid is built over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Lower edge of the band. Default: 36.
    #[serde(default = "default_lower_price")]
    pub lower_price: Price,
    /// Upper edge of the band. Default: 42.
    #[serde(default = "default_upper_price")]
    pub upper_price: Price,
    /// Number of equal bands. Default: 2.
    #[serde(default = "default_band_count")]
    pub band_count: u32,
    /// Total base amount spread across the bands. Default: 1.
    #[serde(default = "default_total_amount")]
    pub total_amount: Amount,
}

fn default_lower_price() -> Price {
    Price::new(Decimal::from(36))
}

fn default_upper_price() -> Price {
    Price::new(Decimal::from(42))
}

fn default_band_count() -> u32 {
    2
}

fn default_total_amount() -> Amount {
    Amount::new(Decimal::ONE)
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            lower_price: default_lower_price(),
            upper_price: default_upper_price(),
            band_count: default_band_count(),
            total_amount: default_total_amount(),
        }
    }
}

/// Tick loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between ticks. Default: 5.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
}

fn default_tick_interval_secs() -> u64 {
    5
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level. Default: "info". `RUST_LOG` overrides.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Application configuration.
///
/// Every field is defaulted, so an empty file (or no file at all) yields
/// a runnable setup against the mock venue. Real venues additionally
/// need `GRIDBOT_{VENUE}_API_KEY` / `GRIDBOT_{VENUE}_API_SECRET` in the
/// environment; credentials never appear in this file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Venue to trade on. Default: mock, which never trades.
    #[serde(default = "default_venue")]
    pub venue: Venue,
    /// Traded pair.
    #[serde(default)]
    pub pair: PairConfig,
    /// Grid band.
    #[serde(default)]
    pub grid: GridConfig,
    /// Stop-loss settings.
    #[serde(default)]
    pub stop_loss: StopLossConfig,
    /// Tick loop settings.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Telemetry settings.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_venue() -> Venue {
    Venue::Mock
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            venue: default_venue(),
            pair: PairConfig::default(),
            grid: GridConfig::default(),
            stop_loss: StopLossConfig::default(),
            engine: EngineConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Path resolution: explicit argument > `GRIDBOT_CONFIG` env var >
    /// `config/default.toml`. A missing file falls back to defaults; a
    /// present but unparseable file is an error.
    pub fn load(cli_path: Option<String>) -> AppResult<Self> {
        let config_path = cli_path
            .or_else(|| std::env::var("GRIDBOT_CONFIG").ok())
            .unwrap_or_else(|| "config/default.toml".to_string());

        if Path::new(&config_path).exists() {
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// The configured pair.
    #[must_use]
    pub fn currency_pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.pair.base.clone(), self.pair.quote.clone())
    }

    /// The configured tick interval.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.engine.tick_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_core::OrderType;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.venue, Venue::Mock);
        assert_eq!(config.currency_pair(), CurrencyPair::new("NEO", "USDT"));
        assert_eq!(config.grid.lower_price, Price::new(dec!(36)));
        assert_eq!(config.grid.upper_price, Price::new(dec!(42)));
        assert_eq!(config.grid.band_count, 2);
        assert_eq!(config.grid.total_amount, Amount::new(dec!(1)));
        assert!(!config.stop_loss.enabled);
        assert_eq!(config.tick_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
            venue = "whitebit"

            [pair]
            base = "btc"
            quote = "usdt"

            [grid]
            lower_price = "30000"
            upper_price = "36000"
            band_count = 6
            total_amount = "0.1"

            [stop_loss]
            enabled = true
            price = "25000"
            order_type = "market"

            [engine]
            tick_interval_secs = 2

            [telemetry]
            log_level = "debug"
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.venue, Venue::WhiteBit);
        assert_eq!(config.currency_pair(), CurrencyPair::new("BTC", "USDT"));
        assert_eq!(config.grid.band_count, 6);
        assert_eq!(config.grid.total_amount, Amount::new(dec!(0.1)));
        assert!(config.stop_loss.enabled);
        assert_eq!(config.stop_loss.price, Price::new(dec!(25000)));
        assert_eq!(config.stop_loss.order_type, OrderType::Market);
        assert_eq!(config.engine.tick_interval_secs, 2);
        assert_eq!(config.telemetry.log_level, "debug");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("venue = \"binance\"").unwrap();

        assert_eq!(config.venue, Venue::Binance);
        assert_eq!(config.currency_pair(), CurrencyPair::new("NEO", "USDT"));
        assert_eq!(config.grid.band_count, 2);
        assert!(!config.stop_loss.enabled);
    }

    #[test]
    fn test_unknown_venue_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("venue = \"kraken\"");

        assert!(result.is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        assert!(toml_str.contains("venue"));
        assert!(toml_str.contains("lower_price"));
        assert!(toml_str.contains("tick_interval_secs"));
    }
}
