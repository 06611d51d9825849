//! Configuration module for vixbuddy.
//!
//! Settings are loaded from environment variables (after `.env`), organized by
//! concern: Market, Broker and Dashboard. Command-line flags are applied on top
//! by the binary.

mod broker_config;
mod dashboard_config;
mod market_config;

pub use broker_config::{BrokerEnvConfig, TastytradeConfig};
pub use dashboard_config::DashboardEnvConfig;
pub use market_config::MarketEnvConfig;

use anyhow::{Context, Result};
use std::env;
use std::fmt;
use std::str::FromStr;

/// Which adapters back the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Yahoo for the index, tastytrade for accounts.
    #[default]
    Live,
    /// Deterministic in-memory data, no network and no credentials.
    Mock,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "live" => Ok(Mode::Live),
            "mock" => Ok(Mode::Mock),
            _ => anyhow::bail!("Invalid MODE: {}. Must be 'live' or 'mock'", s),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Live => f.write_str("live"),
            Mode::Mock => f.write_str("mock"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub market: MarketEnvConfig,
    pub broker: BrokerEnvConfig,
    pub dashboard: DashboardEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mode = match lookup("MODE") {
            Some(raw) => Mode::from_str(&raw)?,
            None => Mode::default(),
        };

        Ok(Self {
            mode,
            market: MarketEnvConfig::from_lookup(&lookup),
            broker: BrokerEnvConfig::from_lookup(&lookup),
            dashboard: DashboardEnvConfig::from_lookup(&lookup)
                .context("Failed to load dashboard config")?,
        })
    }
}
