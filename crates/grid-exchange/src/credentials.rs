//! API credential loading.
//!
//! Credentials are injected from the environment at startup and never
//! appear as literals in source or committed configuration.
//!
//! Security notes:
//! - Secrets are wrapped in `Zeroizing` so they are wiped on drop.
//! - Keys are loaded once at startup; no runtime rotation.
//! - Never log key material; `Debug` is redacted.

use crate::error::{ExchangeError, ExchangeResult};
use std::fmt;
use zeroize::Zeroizing;

/// API key pair for a venue.
pub struct ApiCredentials {
    key: String,
    secret: Zeroizing<String>,
}

impl ApiCredentials {
    /// Load credentials from `{prefix}_API_KEY` / `{prefix}_API_SECRET`.
    ///
    /// # Errors
    /// Returns `ExchangeError::MissingCredentials` naming the variable
    /// that is absent.
    pub fn from_env(prefix: &str) -> ExchangeResult<Self> {
        let key_var = format!("{prefix}_API_KEY");
        let secret_var = format!("{prefix}_API_SECRET");

        let key =
            std::env::var(&key_var).map_err(|_| ExchangeError::MissingCredentials(key_var))?;
        let secret = std::env::var(&secret_var)
            .map_err(|_| ExchangeError::MissingCredentials(secret_var))?;

        Ok(Self {
            key,
            secret: Zeroizing::new(secret),
        })
    }

    /// Construct directly from parts (tests and tooling).
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: Zeroizing::new(secret.into()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("key", &"<redacted>")
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_var_is_a_typed_error() {
        let err = ApiCredentials::from_env("GRIDBOT_TEST_NOT_SET").unwrap_err();
        match err {
            ExchangeError::MissingCredentials(var) => {
                assert_eq!(var, "GRIDBOT_TEST_NOT_SET_API_KEY");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_debug_redacts_material() {
        let creds = ApiCredentials::new("key-material", "secret-material");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("key-material"));
        assert!(!rendered.contains("secret-material"));
    }
}
