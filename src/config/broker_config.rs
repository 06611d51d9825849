//! Brokerage configuration parsing from environment variables.
//!
//! Credentials are optional here; whether their absence is fatal depends on
//! the run mode and is decided at startup.

use std::env;
use std::path::PathBuf;

/// Tastytrade API configuration
#[derive(Debug, Clone, Default)]
pub struct TastytradeConfig {
    pub base_url: String,
    pub login: Option<String>,
    pub password: Option<String>,
}

impl TastytradeConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            base_url: lookup("TASTY_BASE_URL")
                .unwrap_or_else(|| "https://api.tastyworks.com".to_string()),
            login: non_empty("TASTY_LOGIN"),
            password: non_empty("TASTY_PASSWORD"),
        }
    }

    /// Login and password, if both are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.login, &self.password) {
            (Some(login), Some(password)) => Some((login.as_str(), password.as_str())),
            _ => None,
        }
    }
}

/// Aggregated brokerage configuration
#[derive(Debug, Clone, Default)]
pub struct BrokerEnvConfig {
    pub tastytrade: TastytradeConfig,
    pub session_cache_path: PathBuf,
}

impl BrokerEnvConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let session_cache_path = lookup("SESSION_CACHE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_session_path(lookup("HOME")));

        Self {
            tastytrade: TastytradeConfig::from_lookup(&lookup),
            session_cache_path,
        }
    }
}

fn default_session_path(home: Option<String>) -> PathBuf {
    let base = home.map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    base.join(".vixbuddy").join("session.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_tastytrade_config_defaults() {
        let config = BrokerEnvConfig::from_lookup(lookup(&[("HOME", "/home/trader")]));
        assert!(config.tastytrade.base_url.contains("tastyworks.com"));
        assert!(config.tastytrade.credentials().is_none());
        assert_eq!(
            config.session_cache_path,
            PathBuf::from("/home/trader/.vixbuddy/session.json")
        );
    }

    #[test]
    fn test_credentials_need_both_fields() {
        let config = TastytradeConfig::from_lookup(lookup(&[
            ("TASTY_LOGIN", "trader"),
            ("TASTY_PASSWORD", "  "),
        ]));
        assert!(config.credentials().is_none());

        let config = TastytradeConfig::from_lookup(lookup(&[
            ("TASTY_LOGIN", "trader"),
            ("TASTY_PASSWORD", "hunter2"),
        ]));
        assert_eq!(config.credentials(), Some(("trader", "hunter2")));
    }

    #[test]
    fn test_session_path_override() {
        let config =
            BrokerEnvConfig::from_lookup(lookup(&[("SESSION_CACHE_PATH", "/tmp/s.json")]));
        assert_eq!(config.session_cache_path, PathBuf::from("/tmp/s.json"));
    }
}
