//! Venue wire types.
//!
//! Normalized shapes for the data the engine consumes. Each adapter maps
//! its venue's payloads into these.

use crate::error::{ExchangeError, ExchangeResult};
use grid_core::{Amount, OrderSide, Price};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Snapshot of a venue's ticker for one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticker {
    /// Best bid, when the venue reports one.
    pub bid: Option<Price>,
    /// Best ask, when the venue reports one.
    pub ask: Option<Price>,
    /// Last traded price. This is what drives the tick.
    pub last: Price,
}

/// Account balance for a single asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub asset: String,
    pub available: Amount,
    pub frozen: Amount,
}

/// Acknowledgement for an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    /// Venue-assigned order id.
    pub order_id: String,
    pub side: OrderSide,
    /// Limit price; None for market orders.
    pub price: Option<Price>,
    pub amount: Amount,
}

/// A resting order reported by the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub order_id: String,
    pub side: OrderSide,
    pub price: Price,
    pub amount: Amount,
}

/// Parse a decimal field from a venue payload.
///
/// Accepts plain and scientific notation; anything else is a typed
/// parse error naming the field.
pub(crate) fn parse_decimal(value: &str, field: &str) -> ExchangeResult<Decimal> {
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|_| ExchangeError::Parse(format!("{field}: {value:?} is not a decimal")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_decimal_plain_and_scientific() {
        assert_eq!(parse_decimal("7.8", "last").unwrap(), dec!(7.8));
        assert_eq!(parse_decimal("1e-3", "last").unwrap(), dec!(0.001));
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        let err = parse_decimal("n/a", "bid").unwrap_err();
        assert!(matches!(err, ExchangeError::Parse(_)));
        assert!(err.to_string().contains("bid"));
    }
}
