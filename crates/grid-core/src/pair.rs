//! Currency pair identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A base/quote currency pair (e.g., NEO/USDT).
///
/// Carries only the uppercase asset codes. Each venue adapter owns the
/// mapping from a pair to its wire symbol (`NEOUSDT`, `NEO_USDT`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub base: String,
    pub quote: String,
}

impl CurrencyPair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into().to_uppercase(),
            quote: quote.into().to_uppercase(),
        }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}
