//! Venue selection.
//!
//! The supported venues form a closed set; adding one is a compile-time
//! change here, not a string registry.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::binance::BinanceClient;
use crate::bitfinex::BitfinexClient;
use crate::client::DynExchangeClient;
use crate::credentials::ApiCredentials;
use crate::error::{ExchangeError, ExchangeResult};
use crate::mock::MockExchange;
use crate::whitebit::WhiteBitClient;

/// Supported venues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Binance,
    WhiteBit,
    Bitfinex,
    /// Deterministic in-process venue; never trades.
    Mock,
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binance => write!(f, "binance"),
            Self::WhiteBit => write!(f, "whitebit"),
            Self::Bitfinex => write!(f, "bitfinex"),
            Self::Mock => write!(f, "mock"),
        }
    }
}

impl FromStr for Venue {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binance" => Ok(Self::Binance),
            "whitebit" => Ok(Self::WhiteBit),
            "bitfinex" => Ok(Self::Bitfinex),
            "mock" => Ok(Self::Mock),
            other => Err(ExchangeError::UnknownVenue(other.to_string())),
        }
    }
}

/// Build a client for the venue.
///
/// Real venues load credentials from the environment
/// (`GRIDBOT_{VENUE}_API_KEY` / `GRIDBOT_{VENUE}_API_SECRET`); the mock
/// needs none.
pub fn build_client(venue: Venue) -> ExchangeResult<DynExchangeClient> {
    match venue {
        Venue::Binance => {
            let credentials = ApiCredentials::from_env("GRIDBOT_BINANCE")?;
            Ok(Arc::new(BinanceClient::new(credentials)?))
        }
        Venue::WhiteBit => {
            let credentials = ApiCredentials::from_env("GRIDBOT_WHITEBIT")?;
            Ok(Arc::new(WhiteBitClient::new(credentials)?))
        }
        Venue::Bitfinex => {
            let credentials = ApiCredentials::from_env("GRIDBOT_BITFINEX")?;
            Ok(Arc::new(BitfinexClient::new(credentials)?))
        }
        Venue::Mock => Ok(Arc::new(MockExchange::new())),
    }
}
