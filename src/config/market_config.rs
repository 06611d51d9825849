//! Market data provider configuration.

use std::env;

#[derive(Debug, Clone)]
pub struct MarketEnvConfig {
    pub yahoo_base_url: String,
    /// Volatility index whose level drives the allocation policy.
    pub index_symbol: String,
}

impl Default for MarketEnvConfig {
    fn default() -> Self {
        Self {
            yahoo_base_url: "https://query1.finance.yahoo.com".to_string(),
            index_symbol: "^VIX".to_string(),
        }
    }
}

impl MarketEnvConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            yahoo_base_url: lookup("YAHOO_BASE_URL").unwrap_or(defaults.yahoo_base_url),
            index_symbol: lookup("INDEX_SYMBOL").unwrap_or(defaults.index_symbol),
        }
    }
}
