//! Caller identity resolution.
//!
//! The calculator performs no authorisation.  Request handlers resolve
//! the calling account through an [`Authenticator`] before doing any
//! work on its behalf.

use crate::error::{PricingError, Result};
use std::collections::HashMap;

/// Resolves a bearer credential to an account id.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Result<String>;
}

/// Fixed token-to-account table, typically loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, String>,
}

impl StaticTokenAuthenticator {
    /// Parses `token=account` pairs separated by commas.  Blank entries
    /// are skipped.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut tokens = HashMap::new();
        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (token, account) = entry.split_once('=').ok_or_else(|| {
                PricingError::InvalidConfig {
                    field: "PRICING_API_TOKENS",
                    reason: format!("entry '{}' is not token=account", entry),
                }
            })?;
            let (token, account) = (token.trim(), account.trim());
            if token.is_empty() || account.is_empty() {
                return Err(PricingError::InvalidConfig {
                    field: "PRICING_API_TOKENS",
                    reason: "token and account must not be empty".to_string(),
                });
            }
            tokens.insert(token.to_string(), account.to_string());
        }
        Ok(Self { tokens })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn authenticate(&self, token: &str) -> Result<String> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or(PricingError::Unauthorized)
    }
}

/// Extracts the credential from an `Authorization: Bearer <token>` value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
