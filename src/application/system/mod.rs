use crate::application::data_store::{DashboardSnapshot, DataStore};
use crate::application::orchestrator::{CycleState, Orchestrator, OrchestratorConfig};
use crate::application::refresh_service::{RefreshHandle, RefreshService};
use crate::config::{Config, Mode, TastytradeConfig};
use crate::domain::errors::{DashboardError, DashboardResult};
use crate::domain::ports::{AccountService, LogSink, MarketSeriesService};
use crate::infrastructure::core::http_client_factory::HttpClientFactory;
use crate::infrastructure::mock::{MockAccountService, MockMarketSeriesService};
use crate::infrastructure::session_persistence::SessionCache;
use crate::infrastructure::tastytrade::TastytradeAccountService;
use crate::infrastructure::yahoo::YahooMarketDataService;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// What the presenter holds on to once the system is running.
pub struct SystemHandle {
    pub snapshots: watch::Receiver<Arc<DashboardSnapshot>>,
    pub cycle_state: watch::Receiver<CycleState>,
    pub refresh: RefreshHandle,
    pub mode: Mode,
}

pub struct Application {
    pub config: Config,
    pub orchestrator: Arc<Orchestrator>,
    pub log: Arc<dyn LogSink>,
}

/// Live mode cannot run without brokerage credentials.
pub fn require_credentials(config: &TastytradeConfig) -> DashboardResult<(String, String)> {
    config
        .credentials()
        .map(|(login, password)| (login.to_string(), password.to_string()))
        .ok_or_else(|| DashboardError::auth_required("TASTY_LOGIN and TASTY_PASSWORD must be set"))
}

impl Application {
    /// Wires adapters for the configured mode. Fails when live mode has no
    /// credentials.
    pub fn build(config: Config, log: Arc<dyn LogSink>) -> Result<Self> {
        info!("Building vixbuddy (mode: {})...", config.mode);

        let (market, accounts): (Arc<dyn MarketSeriesService>, Arc<dyn AccountService>) =
            match config.mode {
                Mode::Mock => (
                    Arc::new(MockMarketSeriesService::demo()),
                    Arc::new(MockAccountService::demo()),
                ),
                Mode::Live => {
                    let (login, password) =
                        require_credentials(&config.broker.tastytrade).inspect_err(|e| {
                            log.log("startup", e.to_string());
                        })?;
                    let http = HttpClientFactory::create_client();
                    let cache = SessionCache::new(&config.broker.session_cache_path, log.clone());

                    (
                        Arc::new(YahooMarketDataService::new(
                            http.clone(),
                            &config.market.yahoo_base_url,
                            log.clone(),
                        )),
                        Arc::new(TastytradeAccountService::new(
                            http,
                            &config.broker.tastytrade.base_url,
                            login,
                            password,
                            cache,
                            log.clone(),
                        )),
                    )
                }
            };

        let orchestrator = Arc::new(Orchestrator::new(
            market,
            accounts,
            Arc::new(DataStore::new()),
            log.clone(),
            OrchestratorConfig {
                symbol: config.market.index_symbol.clone(),
                balance_concurrency: config.dashboard.balance_concurrency,
            },
        ));

        Ok(Self {
            config,
            orchestrator,
            log,
        })
    }

    /// Spawns the refresh loop on the current runtime.
    pub fn start(self) -> SystemHandle {
        info!("Starting refresh service...");
        let (service, refresh) =
            RefreshService::new(self.orchestrator.clone(), self.config.dashboard.refresh_interval());
        tokio::spawn(service.run());

        SystemHandle {
            snapshots: self.orchestrator.store().subscribe(),
            cycle_state: self.orchestrator.subscribe_state(),
            refresh,
            mode: self.config.mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock::MemoryLogSink;

    fn config(pairs: &'static [(&'static str, &'static str)]) -> Config {
        Config::from_lookup(|key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .unwrap()
    }

    #[test]
    fn test_live_mode_without_credentials_is_fatal() {
        let log = Arc::new(MemoryLogSink::new());
        let result = Application::build(config(&[("MODE", "live")]), log.clone());

        let err = result.err().unwrap();
        assert!(matches!(
            err.downcast_ref::<DashboardError>(),
            Some(DashboardError::AuthRequired { .. })
        ));
        assert!(log.contains("[startup]: Authentication required"));
    }

    #[tokio::test]
    async fn test_mock_mode_publishes_first_cycle() {
        let log = Arc::new(MemoryLogSink::new());
        let app = Application::build(config(&[("MODE", "mock")]), log).unwrap();
        let mut handle = app.start();

        while handle.snapshots.borrow_and_update().cycle == 0 {
            handle.snapshots.changed().await.unwrap();
        }

        let snapshot = handle.snapshots.borrow().clone();
        assert!(snapshot.index.is_some());
        assert!(!snapshot.accounts.contains_key("1DA13984"));
        handle.refresh.shutdown().await;
    }
}
