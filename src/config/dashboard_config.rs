//! Refresh loop and terminal presentation settings.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound for the log pane; more lines than this never fit a terminal.
pub const MAX_LOG_PANE_LINES: usize = 200;

#[derive(Debug, Clone)]
pub struct DashboardEnvConfig {
    /// Zero disables the timer; refreshes then only happen on demand.
    pub refresh_interval_secs: u64,
    pub balance_concurrency: usize,
    pub tick_rate_ms: u64,
    pub log_file: PathBuf,
    pub log_pane_lines: usize,
}

impl Default for DashboardEnvConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 300,
            balance_concurrency: 4,
            tick_rate_ms: 250,
            log_file: PathBuf::from("logs/vixbuddy.log"),
            log_pane_lines: 5,
        }
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid {}: {}", key, raw)),
        None => Ok(default),
    }
}

impl DashboardEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            refresh_interval_secs: parse_or(
                &lookup,
                "REFRESH_INTERVAL_SECS",
                defaults.refresh_interval_secs,
            )?,
            balance_concurrency: parse_or(
                &lookup,
                "BALANCE_CONCURRENCY",
                defaults.balance_concurrency,
            )?
            .max(1),
            tick_rate_ms: parse_or(&lookup, "TICK_RATE_MS", defaults.tick_rate_ms)?.max(10),
            log_file: lookup("LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
            log_pane_lines: parse_or(&lookup, "LOG_PANE_LINES", defaults.log_pane_lines)?
                .clamp(1, MAX_LOG_PANE_LINES),
        })
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }

    /// Log pane height in terminal rows.
    pub fn log_pane_height(&self) -> u16 {
        u16::try_from(self.log_pane_lines).unwrap_or(u16::MAX)
    }
}
