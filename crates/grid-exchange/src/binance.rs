//! Binance spot REST adapter.
//!
//! Public endpoints are unsigned. Account and order endpoints sign the
//! full query string with HMAC-SHA256 (hex) and carry the API key in the
//! `X-MBX-APIKEY` header. Timestamps are unix milliseconds and every
//! signed request declares a receive window.

use std::time::Duration;

use hmac::{Hmac, Mac};
use reqwest::Client;
use rust_decimal::RoundingStrategy;
use serde::Deserialize;
use sha2::Sha256;
use tracing::debug;

use grid_core::{Amount, CurrencyPair, OrderSide, Price};

use crate::client::{BoxFuture, ExchangeClient};
use crate::credentials::ApiCredentials;
use crate::error::{ExchangeError, ExchangeResult};
use crate::factory::Venue;
use crate::types::{parse_decimal, OpenOrder, OrderAck, Ticker, Wallet};

type HmacSha256 = Hmac<Sha256>;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Validity window for signed requests (ms).
const RECV_WINDOW_MS: u64 = 5000;

/// Maximum decimal places Binance accepts for this market's price.
const PRICE_DECIMALS: u32 = 3;

const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Binance spot client.
pub struct BinanceClient {
    client: Client,
    base_url: String,
    credentials: ApiCredentials,
}

impl BinanceClient {
    pub fn new(credentials: ApiCredentials) -> ExchangeResult<Self> {
        Self::with_base_url(credentials, DEFAULT_BASE_URL)
    }

    /// Point the client at a different host (tests).
    pub fn with_base_url(
        credentials: ApiCredentials,
        base_url: impl Into<String>,
    ) -> ExchangeResult<Self> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            credentials,
        })
    }

    /// Wire symbol: concatenated uppercase codes (`NEOUSDT`).
    fn symbol(pair: &CurrencyPair) -> String {
        format!("{}{}", pair.base, pair.quote)
    }

    /// Append timestamp, receive window, and signature to a query string.
    fn signed_query(&self, params: &str) -> String {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let query = if params.is_empty() {
            format!("timestamp={timestamp}&recvWindow={RECV_WINDOW_MS}")
        } else {
            format!("{params}&timestamp={timestamp}&recvWindow={RECV_WINDOW_MS}")
        };
        let signature = sign_query(self.credentials.secret(), &query);
        format!("{query}&signature={signature}")
    }

    async fn ensure_ok(response: reqwest::Response) -> ExchangeResult<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExchangeError::Status {
                code: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn fetch_ticker(&self, pair: CurrencyPair) -> ExchangeResult<Ticker> {
        let url = format!(
            "{}/api/v3/ticker/price?symbol={}",
            self.base_url,
            Self::symbol(&pair)
        );
        let response = self.client.get(&url).send().await?;
        let response = Self::ensure_ok(response).await?;
        let body: PriceTickerResponse = response.json().await?;

        // The price ticker endpoint reports only the last trade.
        Ok(Ticker {
            bid: None,
            ask: None,
            last: Price::new(parse_decimal(&body.price, "price")?),
        })
    }

    async fn fetch_wallet(&self, asset: String) -> ExchangeResult<Wallet> {
        let url = format!("{}/api/v3/account?{}", self.base_url, self.signed_query(""));
        let response = self
            .client
            .get(&url)
            .header("X-MBX-APIKEY", self.credentials.key())
            .send()
            .await?;
        let response = Self::ensure_ok(response).await?;
        let body: AccountResponse = response.json().await?;

        let entry = body
            .balances
            .iter()
            .find(|b| b.asset == asset)
            .ok_or_else(|| ExchangeError::Parse(format!("no balance entry for {asset}")))?;

        Ok(Wallet {
            available: Amount::new(parse_decimal(&entry.free, "free")?),
            frozen: Amount::new(parse_decimal(&entry.locked, "locked")?),
            asset,
        })
    }

    async fn fetch_open_orders(&self, pair: CurrencyPair) -> ExchangeResult<Vec<OpenOrder>> {
        let params = format!("symbol={}", Self::symbol(&pair));
        let url = format!(
            "{}/api/v3/openOrders?{}",
            self.base_url,
            self.signed_query(&params)
        );
        let response = self
            .client
            .get(&url)
            .header("X-MBX-APIKEY", self.credentials.key())
            .send()
            .await?;
        let response = Self::ensure_ok(response).await?;
        let body: Vec<OpenOrderEntry> = response.json().await?;

        body.into_iter()
            .map(|entry| {
                Ok(OpenOrder {
                    order_id: entry.order_id.to_string(),
                    side: parse_side(&entry.side)?,
                    price: Price::new(parse_decimal(&entry.price, "price")?),
                    amount: Amount::new(parse_decimal(&entry.orig_qty, "origQty")?),
                })
            })
            .collect()
    }

    async fn place_limit(
        &self,
        pair: CurrencyPair,
        side: OrderSide,
        price: Price,
        amount: Amount,
    ) -> ExchangeResult<OrderAck> {
        let params = format!(
            "symbol={}&side={}&type=LIMIT&timeInForce=GTC&quantity={}&price={}",
            Self::symbol(&pair),
            side_param(side),
            format_amount(amount),
            format_price(price),
        );
        debug!(venue = "binance", %side, %price, %amount, "Placing limit order");
        let order_id = self.submit_order(&params).await?;

        Ok(OrderAck {
            order_id,
            side,
            price: Some(price),
            amount,
        })
    }

    async fn place_market(
        &self,
        pair: CurrencyPair,
        side: OrderSide,
        amount: Amount,
    ) -> ExchangeResult<OrderAck> {
        let params = format!(
            "symbol={}&side={}&type=MARKET&quantity={}",
            Self::symbol(&pair),
            side_param(side),
            format_amount(amount),
        );
        debug!(venue = "binance", %side, %amount, "Placing market order");
        let order_id = self.submit_order(&params).await?;

        Ok(OrderAck {
            order_id,
            side,
            price: None,
            amount,
        })
    }

    async fn submit_order(&self, params: &str) -> ExchangeResult<String> {
        let url = format!("{}/api/v3/order?{}", self.base_url, self.signed_query(params));
        let response = self
            .client
            .post(&url)
            .header("X-MBX-APIKEY", self.credentials.key())
            .send()
            .await?;
        let response = Self::ensure_ok(response).await?;
        let body: OrderResponse = response.json().await?;
        Ok(body.order_id.to_string())
    }
}

impl ExchangeClient for BinanceClient {
    fn venue(&self) -> Venue {
        Venue::Binance
    }

    fn get_ticker(&self, pair: CurrencyPair) -> BoxFuture<'_, ExchangeResult<Ticker>> {
        Box::pin(self.fetch_ticker(pair))
    }

    fn get_wallet(&self, asset: String) -> BoxFuture<'_, ExchangeResult<Wallet>> {
        Box::pin(self.fetch_wallet(asset))
    }

    fn get_open_orders(
        &self,
        pair: CurrencyPair,
    ) -> BoxFuture<'_, ExchangeResult<Vec<OpenOrder>>> {
        Box::pin(self.fetch_open_orders(pair))
    }

    fn buy_limit(
        &self,
        pair: CurrencyPair,
        price: Price,
        amount: Amount,
    ) -> BoxFuture<'_, ExchangeResult<OrderAck>> {
        Box::pin(self.place_limit(pair, OrderSide::Buy, price, amount))
    }

    fn sell_limit(
        &self,
        pair: CurrencyPair,
        price: Price,
        amount: Amount,
    ) -> BoxFuture<'_, ExchangeResult<OrderAck>> {
        Box::pin(self.place_limit(pair, OrderSide::Sell, price, amount))
    }

    fn buy_market(
        &self,
        pair: CurrencyPair,
        amount: Amount,
    ) -> BoxFuture<'_, ExchangeResult<OrderAck>> {
        Box::pin(self.place_market(pair, OrderSide::Buy, amount))
    }

    fn sell_market(
        &self,
        pair: CurrencyPair,
        amount: Amount,
    ) -> BoxFuture<'_, ExchangeResult<OrderAck>> {
        Box::pin(self.place_market(pair, OrderSide::Sell, amount))
    }
}

/// Sign a query string with HMAC-SHA256, returning the hex signature.
fn sign_query(secret: &str, query: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(query.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Format a price for the wire: capped decimal places, rounded toward
/// zero, trailing zeros stripped.
fn format_price(price: Price) -> String {
    price
        .inner()
        .round_dp_with_strategy(PRICE_DECIMALS, RoundingStrategy::ToZero)
        .normalize()
        .to_string()
}

fn format_amount(amount: Amount) -> String {
    amount.inner().normalize().to_string()
}

fn side_param(side: OrderSide) -> &'static str {
    match side {
        OrderSide::Buy => "BUY",
        OrderSide::Sell => "SELL",
    }
}

fn parse_side(value: &str) -> ExchangeResult<OrderSide> {
    match value {
        "BUY" => Ok(OrderSide::Buy),
        "SELL" => Ok(OrderSide::Sell),
        other => Err(ExchangeError::Parse(format!("unknown side: {other:?}"))),
    }
}

#[derive(Debug, Deserialize)]
struct PriceTickerResponse {
    price: String,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    balances: Vec<BalanceEntry>,
}

#[derive(Debug, Deserialize)]
struct BalanceEntry {
    asset: String,
    free: String,
    locked: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenOrderEntry {
    order_id: u64,
    side: String,
    price: String,
    orig_qty: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    order_id: u64,
}
