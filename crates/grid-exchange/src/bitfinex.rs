//! Bitfinex v2 REST adapter.
//!
//! Public endpoints live on a separate host from authenticated ones.
//! v2 responses are positional JSON arrays, not objects. Authenticated
//! requests sign `/api` + path + nonce + raw body with HMAC-SHA384 (hex)
//! under `bfx-nonce` / `bfx-apikey` / `bfx-signature` headers. Order
//! amounts are signed: negative means sell.

use std::time::Duration;

use hmac::{Hmac, Mac};
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use sha2::Sha384;
use tracing::debug;

use grid_core::{Amount, CurrencyPair, OrderSide, Price};

use crate::client::{BoxFuture, ExchangeClient};
use crate::credentials::ApiCredentials;
use crate::error::{ExchangeError, ExchangeResult};
use crate::factory::Venue;
use crate::types::{parse_decimal, OpenOrder, OrderAck, Ticker, Wallet};

type HmacSha384 = Hmac<Sha384>;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_PUBLIC_URL: &str = "https://api-pub.bitfinex.com";
const DEFAULT_AUTH_URL: &str = "https://api.bitfinex.com";

// Indices into the public ticker array.
const TICKER_BID: usize = 0;
const TICKER_ASK: usize = 2;
const TICKER_LAST: usize = 6;

// Indices into an order array.
const ORDER_ID: usize = 0;
const ORDER_AMOUNT: usize = 6;
const ORDER_PRICE: usize = 16;

/// Bitfinex client.
pub struct BitfinexClient {
    client: Client,
    public_url: String,
    auth_url: String,
    credentials: ApiCredentials,
}

impl BitfinexClient {
    pub fn new(credentials: ApiCredentials) -> ExchangeResult<Self> {
        Self::with_base_urls(credentials, DEFAULT_PUBLIC_URL, DEFAULT_AUTH_URL)
    }

    /// Point the client at different hosts (tests).
    pub fn with_base_urls(
        credentials: ApiCredentials,
        public_url: impl Into<String>,
        auth_url: impl Into<String>,
    ) -> ExchangeResult<Self> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            client,
            public_url: public_url.into(),
            auth_url: auth_url.into(),
            credentials,
        })
    }

    /// Wire symbol: t-prefixed concatenated codes (`tNEOUSDT`).
    fn symbol(pair: &CurrencyPair) -> String {
        format!("t{}{}", pair.base, pair.quote)
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

    async fn post_signed(&self, path: &str, body: Value) -> ExchangeResult<reqwest::Response> {
        let raw = body.to_string();
        let nonce = chrono::Utc::now().timestamp_millis().to_string();
        let signature = sign_request(self.credentials.secret(), path, &nonce, &raw);

        let url = format!("{}{}", self.auth_url, path);
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("bfx-nonce", nonce)
            .header("bfx-apikey", self.credentials.key())
            .header("bfx-signature", signature)
            .body(raw)
            .send()
            .await?;
        Self::ensure_ok(response).await
    }

    async fn fetch_ticker(&self, pair: CurrencyPair) -> ExchangeResult<Ticker> {
        let url = format!("{}/v2/ticker/{}", self.public_url, Self::symbol(&pair));
        let response = self.client.get(&url).send().await?;
        let response = Self::ensure_ok(response).await?;
        let values: Vec<Value> = response.json().await?;

        Ok(Ticker {
            bid: Some(Price::new(decimal_at(&values, TICKER_BID, "bid")?)),
            ask: Some(Price::new(decimal_at(&values, TICKER_ASK, "ask")?)),
            last: Price::new(decimal_at(&values, TICKER_LAST, "last")?),
        })
    }

    async fn fetch_wallet(&self, asset: String) -> ExchangeResult<Wallet> {
        let response = self.post_signed("/v2/auth/r/wallets", json!({})).await?;
        let rows: Vec<Vec<Value>> = response.json().await?;

        for row in &rows {
            let wallet_type = row.first().and_then(|v| v.as_str());
            let currency = row.get(1).and_then(|v| v.as_str());
            if wallet_type != Some("exchange") || currency != Some(asset.as_str()) {
                continue;
            }

            let balance = decimal_at(row, 2, "balance")?;
            // AVAILABLE_BALANCE is null until the venue has computed it;
            // fall back to the settled balance.
            let available = match row.get(4) {
                None | Some(Value::Null) => balance,
                Some(_) => decimal_at(row, 4, "available")?,
            };

            return Ok(Wallet {
                asset,
                available: Amount::new(available),
                frozen: Amount::new((balance - available).max(Decimal::ZERO)),
            });
        }

        Err(ExchangeError::Parse(format!(
            "no exchange wallet for {asset}"
        )))
    }

    async fn fetch_open_orders(&self, pair: CurrencyPair) -> ExchangeResult<Vec<OpenOrder>> {
        let path = format!("/v2/auth/r/orders/{}", Self::symbol(&pair));
        let response = self.post_signed(&path, json!({})).await?;
        let rows: Vec<Vec<Value>> = response.json().await?;

        rows.iter()
            .map(|row| {
                let order_id = row
                    .get(ORDER_ID)
                    .and_then(Value::as_i64)
                    .ok_or_else(|| ExchangeError::Parse("order row missing id".to_string()))?;
                let amount = decimal_at(row, ORDER_AMOUNT, "amount")?;
                let side = if amount.is_sign_negative() {
                    OrderSide::Sell
                } else {
                    OrderSide::Buy
                };

                Ok(OpenOrder {
                    order_id: order_id.to_string(),
                    side,
                    price: Price::new(decimal_at(row, ORDER_PRICE, "price")?),
                    amount: Amount::new(amount.abs()),
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
        let body = json!({
            "type": "EXCHANGE LIMIT",
            "symbol": Self::symbol(&pair),
            "price": price.inner().normalize().to_string(),
            "amount": signed_amount(side, amount),
        });

        debug!(venue = "bitfinex", %side, %price, %amount, "Placing limit order");
        let order_id = self.submit_order(body).await?;

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
        let body = json!({
            "type": "EXCHANGE MARKET",
            "symbol": Self::symbol(&pair),
            "amount": signed_amount(side, amount),
        });

        debug!(venue = "bitfinex", %side, %amount, "Placing market order");
        let order_id = self.submit_order(body).await?;

        Ok(OrderAck {
            order_id,
            side,
            price: None,
            amount,
        })
    }

    async fn submit_order(&self, body: Value) -> ExchangeResult<String> {
        let response = self.post_signed("/v2/auth/w/order/submit", body).await?;
        let notification: Vec<Value> = response.json().await?;

        // Notification shape: [mts, type, message_id, _, [[order]], code, status, text]
        let status = notification.get(6).and_then(Value::as_str).unwrap_or("");
        if status != "SUCCESS" {
            let text = notification
                .get(7)
                .and_then(Value::as_str)
                .unwrap_or("order submit failed");
            return Err(ExchangeError::Rejected {
                reason: text.to_string(),
            });
        }

        let order_id = notification
            .get(4)
            .and_then(Value::as_array)
            .and_then(|orders| orders.first())
            .and_then(Value::as_array)
            .and_then(|order| order.first())
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                ExchangeError::Parse("order submit response missing order id".to_string())
            })?;

        Ok(order_id.to_string())
    }
}

impl ExchangeClient for BitfinexClient {
    fn venue(&self) -> Venue {
        Venue::Bitfinex
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

/// Sign an authenticated request: `/api` + path + nonce + raw body,
/// HMAC-SHA384, hex.
fn sign_request(secret: &str, path: &str, nonce: &str, body: &str) -> String {
    let payload = format!("/api{path}{nonce}{body}");
    let mut mac =
        HmacSha384::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Wire amount with side encoded in the sign: negative sells.
fn signed_amount(side: OrderSide, amount: Amount) -> String {
    let signed = amount.inner().normalize() * Decimal::from(side.sign());
    signed.to_string()
}

/// Read one positional field out of a v2 array, accepting numbers or
/// numeric strings.
fn decimal_at(values: &[Value], idx: usize, field: &str) -> ExchangeResult<Decimal> {
    let value = values
        .get(idx)
        .ok_or_else(|| ExchangeError::Parse(format!("{field}: index {idx} missing")))?;
    match value {
        Value::Number(n) => parse_decimal(&n.to_string(), field),
        Value::String(s) => parse_decimal(s, field),
        other => Err(ExchangeError::Parse(format!(
            "{field}: unexpected value {other}"
        ))),
    }
}
