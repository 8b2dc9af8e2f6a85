//! Venue REST clients for the grid ping-pong bot.
//!
//! One adapter per supported venue plus a deterministic mock, all behind
//! the dyn-compatible `ExchangeClient` trait:
//! - `BinanceClient`: v3 REST, HMAC-SHA256 query signing
//! - `WhiteBitClient`: v1/v4 REST, base64 payload + HMAC-SHA512
//! - `BitfinexClient`: v2 REST, positional arrays + HMAC-SHA384
//! - `MockExchange`: fixed quotes and failure rules, no network
//!
//! Venue selection is the closed `Venue` enum resolved by `build_client`.

pub mod binance;
pub mod bitfinex;
pub mod client;
pub mod credentials;
pub mod error;
pub mod factory;
pub mod mock;
pub mod types;
pub mod whitebit;

pub use binance::BinanceClient;
pub use bitfinex::BitfinexClient;
pub use client::{BoxFuture, DynExchangeClient, ExchangeClient};
pub use credentials::ApiCredentials;
pub use error::{ExchangeError, ExchangeResult};
pub use factory::{build_client, Venue};
pub use mock::{MockExchange, RecordedCall};
pub use types::{OpenOrder, OrderAck, Ticker, Wallet};
pub use whitebit::WhiteBitClient;
