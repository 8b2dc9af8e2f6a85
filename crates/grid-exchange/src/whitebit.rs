//! WhiteBit REST adapter.
//!
//! The public ticker lives under the v1 API; trading and account
//! endpoints are v4. Signed requests carry the request path and a
//! unix-seconds nonce inside the JSON body; the body is base64-encoded
//! into `X-TXC-PAYLOAD` and signed with HMAC-SHA512 (hex) into
//! `X-TXC-SIGNATURE`. The body bytes sent must be exactly the bytes
//! that were signed.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use sha2::Sha512;
use tracing::debug;

use grid_core::{Amount, CurrencyPair, OrderSide, Price};

use crate::client::{BoxFuture, ExchangeClient};
use crate::credentials::ApiCredentials;
use crate::error::{ExchangeError, ExchangeResult};
use crate::factory::Venue;
use crate::types::{parse_decimal, OpenOrder, OrderAck, Ticker, Wallet};

type HmacSha512 = Hmac<Sha512>;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_BASE_URL: &str = "https://whitebit.com";

/// WhiteBit client.
pub struct WhiteBitClient {
    client: Client,
    base_url: String,
    credentials: ApiCredentials,
}

impl WhiteBitClient {
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

    /// Wire symbol: underscore-separated uppercase codes (`NEO_USDT`).
    fn symbol(pair: &CurrencyPair) -> String {
        format!("{}_{}", pair.base, pair.quote)
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

    async fn post_signed(
        &self,
        path: &str,
        body: Map<String, Value>,
    ) -> ExchangeResult<reqwest::Response> {
        let nonce = chrono::Utc::now().timestamp().to_string();
        let (raw, payload, signature) =
            build_signed_request(self.credentials.secret(), path, body, &nonce);

        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("X-TXC-APIKEY", self.credentials.key())
            .header("X-TXC-PAYLOAD", payload)
            .header("X-TXC-SIGNATURE", signature)
            .body(raw)
            .send()
            .await?;
        Self::ensure_ok(response).await
    }

    async fn fetch_ticker(&self, pair: CurrencyPair) -> ExchangeResult<Ticker> {
        let url = format!(
            "{}/api/v1/public/ticker?market={}",
            self.base_url,
            Self::symbol(&pair)
        );
        let response = self.client.get(&url).send().await?;
        let response = Self::ensure_ok(response).await?;
        let body: TickerEnvelope = response.json().await?;

        let result = match (body.success, body.result) {
            (true, Some(result)) => result,
            _ => {
                return Err(ExchangeError::Parse(
                    "ticker envelope missing result".to_string(),
                ))
            }
        };

        Ok(Ticker {
            bid: Some(Price::new(parse_decimal(&result.bid, "bid")?)),
            ask: Some(Price::new(parse_decimal(&result.ask, "ask")?)),
            last: Price::new(parse_decimal(&result.last, "last")?),
        })
    }

    async fn fetch_wallet(&self, asset: String) -> ExchangeResult<Wallet> {
        let mut body = Map::new();
        body.insert("ticker".to_string(), Value::String(asset.clone()));
        let response = self
            .post_signed("/api/v4/trade-account/balance", body)
            .await?;
        let balance: BalanceResponse = response.json().await?;

        Ok(Wallet {
            asset,
            available: Amount::new(parse_decimal(&balance.available, "available")?),
            frozen: Amount::new(parse_decimal(&balance.freeze, "freeze")?),
        })
    }

    async fn fetch_open_orders(&self, pair: CurrencyPair) -> ExchangeResult<Vec<OpenOrder>> {
        let mut body = Map::new();
        body.insert(
            "market".to_string(),
            Value::String(Self::symbol(&pair)),
        );
        let response = self.post_signed("/api/v4/orders", body).await?;
        let orders: Vec<ActiveOrder> = response.json().await?;

        orders
            .into_iter()
            .map(|order| {
                Ok(OpenOrder {
                    order_id: order.order_id.to_string(),
                    side: parse_side(&order.side)?,
                    price: Price::new(parse_decimal(&order.price, "price")?),
                    amount: Amount::new(parse_decimal(&order.amount, "amount")?),
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
        let mut body = Map::new();
        body.insert(
            "market".to_string(),
            Value::String(Self::symbol(&pair)),
        );
        body.insert("side".to_string(), Value::String(side.to_string()));
        body.insert(
            "amount".to_string(),
            Value::String(amount.inner().normalize().to_string()),
        );
        body.insert(
            "price".to_string(),
            Value::String(price.inner().normalize().to_string()),
        );

        debug!(venue = "whitebit", %side, %price, %amount, "Placing limit order");
        let response = self.post_signed("/api/v4/order/new", body).await?;
        let placed: PlacedOrder = response.json().await?;

        Ok(OrderAck {
            order_id: placed.order_id.to_string(),
            side,
            price: Some(price),
            amount,
        })
    }

    /// Place a market order.
    ///
    /// On this venue a market buy's `amount` is denominated in the quote
    /// currency and a market sell's in the base currency; callers pass
    /// the amount straight through.
    async fn place_market(
        &self,
        pair: CurrencyPair,
        side: OrderSide,
        amount: Amount,
    ) -> ExchangeResult<OrderAck> {
        let mut body = Map::new();
        body.insert(
            "market".to_string(),
            Value::String(Self::symbol(&pair)),
        );
        body.insert("side".to_string(), Value::String(side.to_string()));
        body.insert(
            "amount".to_string(),
            Value::String(amount.inner().normalize().to_string()),
        );

        debug!(venue = "whitebit", %side, %amount, "Placing market order");
        let response = self.post_signed("/api/v4/order/market", body).await?;
        let placed: PlacedOrder = response.json().await?;

        Ok(OrderAck {
            order_id: placed.order_id.to_string(),
            side,
            price: None,
            amount,
        })
    }
}

impl ExchangeClient for WhiteBitClient {
    fn venue(&self) -> Venue {
        Venue::WhiteBit
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

/// Assemble the signed parts of a v4 request: the raw JSON body (the
/// exact bytes to send), its base64 payload, and the hex signature.
fn build_signed_request(
    secret: &str,
    path: &str,
    mut body: Map<String, Value>,
    nonce: &str,
) -> (String, String, String) {
    body.insert("request".to_string(), Value::String(path.to_string()));
    body.insert("nonce".to_string(), Value::String(nonce.to_string()));

    let raw = Value::Object(body).to_string();
    let payload = STANDARD.encode(raw.as_bytes());
    let signature = sign_payload(secret, &payload);
    (raw, payload, signature)
}

/// Sign a base64 payload with HMAC-SHA512, returning the hex signature.
fn sign_payload(secret: &str, payload: &str) -> String {
    let mut mac =
        HmacSha512::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn parse_side(value: &str) -> ExchangeResult<OrderSide> {
    match value {
        "buy" => Ok(OrderSide::Buy),
        "sell" => Ok(OrderSide::Sell),
        other => Err(ExchangeError::Parse(format!("unknown side: {other:?}"))),
    }
}

#[derive(Debug, Deserialize)]
struct TickerEnvelope {
    success: bool,
    result: Option<TickerResult>,
}

#[derive(Debug, Deserialize)]
struct TickerResult {
    bid: String,
    ask: String,
    last: String,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    available: String,
    freeze: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActiveOrder {
    order_id: u64,
    side: String,
    amount: String,
    price: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlacedOrder {
    order_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_underscores() {
        let pair = CurrencyPair::new("NEO", "USDT");
        assert_eq!(WhiteBitClient::symbol(&pair), "NEO_USDT");
    }

    #[test]
    fn test_signed_request_parts() {
        let mut body = Map::new();
        body.insert("market".to_string(), Value::String("NEO_USDT".into()));
        body.insert("side".to_string(), Value::String("buy".into()));
        body.insert("amount".to_string(), Value::String("0.5".into()));
        body.insert("price".to_string(), Value::String("36".into()));

        let (raw, payload, signature) =
            build_signed_request("test-secret", "/api/v4/order/new", body, "1660000000");

        // Field order is insertion order; request and nonce ride last.
        assert_eq!(
            raw,
            r#"{"market":"NEO_USDT","side":"buy","amount":"0.5","price":"36","request":"/api/v4/order/new","nonce":"1660000000"}"#
        );
        assert_eq!(
            payload,
            "eyJtYXJrZXQiOiJORU9fVVNEVCIsInNpZGUiOiJidXkiLCJhbW91bnQiOiIwLjUiLCJwcmljZSI6IjM2Iiwi\
             cmVxdWVzdCI6Ii9hcGkvdjQvb3JkZXIvbmV3Iiwibm9uY2UiOiIxNjYwMDAwMDAwIn0="
        );
        assert_eq!(
            signature,
            "3ef55b59257bf76eb3ea8b39d73c65cf96cbfce38d0713d8dc295e2b82656cbd\
             0a06fe12019cc82e598970a8100311a2caff0d2271975cdd8cff955016851cfa"
        );
    }

    #[test]
    fn test_parse_side_lowercase() {
        assert_eq!(parse_side("buy").unwrap(), OrderSide::Buy);
        assert_eq!(parse_side("sell").unwrap(), OrderSide::Sell);
        assert!(parse_side("BUY").is_err());
    }
}
