//! Server configuration.
//!
//! Settings come from environment variables (an optional `.env` file is
//! loaded first by the binary):
//!
//! - `PRICING_BIND_ADDR`: listen address, default `127.0.0.1:3000`.
//! - `PRICING_DATA_DIR`: directory for the JSON file store.  When unset
//!   the server keeps data in memory.
//! - `PRICING_API_TOKENS`: `token=account` pairs separated by commas.
//! - `PRICING_HISTORY_LIMIT`: records kept per account, default 500.
//! - `PRICING_DEFAULT_CURRENCY`: currency used when a format request
//!   names none, default `BRL`.

use crate::auth::StaticTokenAuthenticator;
use crate::display::Currency;
use crate::error::{PricingError, Result};
use crate::store::DEFAULT_HISTORY_LIMIT;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub data_dir: Option<PathBuf>,
    pub api_tokens: StaticTokenAuthenticator,
    pub history_limit: usize,
    pub default_currency: Currency,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("PRICING_BIND_ADDR")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let data_dir = lookup("PRICING_DATA_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let api_tokens = match lookup("PRICING_API_TOKENS") {
            Some(spec) => StaticTokenAuthenticator::parse(&spec)?,
            None => StaticTokenAuthenticator::default(),
        };
        let history_limit = match lookup("PRICING_HISTORY_LIMIT") {
            Some(value) => value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|limit| *limit > 0)
                .ok_or_else(|| PricingError::InvalidConfig {
                    field: "PRICING_HISTORY_LIMIT",
                    reason: format!("'{}' is not a positive integer", value),
                })?,
            None => DEFAULT_HISTORY_LIMIT,
        };
        let default_currency = match lookup("PRICING_DEFAULT_CURRENCY") {
            Some(value) => value
                .trim()
                .parse::<Currency>()
                .map_err(|reason| PricingError::InvalidConfig {
                    field: "PRICING_DEFAULT_CURRENCY",
                    reason,
                })?,
            None => Currency::default(),
        };
        Ok(Self {
            bind_addr,
            data_dir,
            api_tokens,
            history_limit,
            default_currency,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            data_dir: None,
            api_tokens: StaticTokenAuthenticator::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            default_currency: Currency::default(),
        }
    }
}
