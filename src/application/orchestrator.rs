use crate::application::data_store::{DashboardSnapshot, DataStore};
use crate::application::index_loader::fetch_index_snapshot;
use crate::domain::account::{Balance, BrokerageResponse};
use crate::domain::errors::{DashboardError, DashboardResult};
use crate::domain::market::RawIndexSnapshot;
use crate::domain::ports::{AccountService, LogSink, MarketSeriesService};
use crate::domain::stats::{AccountStats, IndexStats, derive_account_stats, derive_index_stats};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::debug;

const COMPONENT: &str = "orchestrator";

/// Where the current refresh cycle is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CycleState {
    #[default]
    Idle,
    FetchingIndexAndAccounts,
    FetchingBalances,
    Derived,
    Published,
    /// The cycle aborted; the previous snapshot stays visible.
    Error(String),
}

impl CycleState {
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            CycleState::FetchingIndexAndAccounts | CycleState::FetchingBalances | CycleState::Derived
        )
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleState::Idle => f.write_str("idle"),
            CycleState::FetchingIndexAndAccounts => f.write_str("fetching index & accounts"),
            CycleState::FetchingBalances => f.write_str("fetching balances"),
            CycleState::Derived => f.write_str("derived"),
            CycleState::Published => f.write_str("published"),
            CycleState::Error(reason) => write!(f, "error: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub symbol: String,
    /// Max balance fetches in flight at once.
    pub balance_concurrency: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            symbol: "^VIX".to_string(),
            balance_concurrency: 4,
        }
    }
}

/// Outcome of one refresh cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cycle: u64,
    pub state: CycleState,
    pub index_error: Option<DashboardError>,
    pub accounts_error: Option<DashboardError>,
    /// Accounts present in the published snapshot (fresh or carried over).
    pub published_accounts: Vec<String>,
    /// Accounts dropped from this cycle by a balance or derivation failure.
    pub failed_accounts: Vec<String>,
}

impl CycleReport {
    fn new(cycle: u64) -> Self {
        Self {
            cycle,
            state: CycleState::Idle,
            index_error: None,
            accounts_error: None,
            published_accounts: Vec::new(),
            failed_accounts: Vec::new(),
        }
    }

    pub fn published(&self) -> bool {
        self.state == CycleState::Published
    }
}

/// Runs fetch, derive and publish for the index and the brokerage accounts.
///
/// Only one cycle runs at a time; a concurrent caller waits for the running
/// cycle to finish and then runs its own.
pub struct Orchestrator {
    market: Arc<dyn MarketSeriesService>,
    accounts: Arc<dyn AccountService>,
    store: Arc<DataStore>,
    log: Arc<dyn LogSink>,
    config: OrchestratorConfig,
    cycle: Mutex<u64>,
    state: watch::Sender<CycleState>,
}

impl Orchestrator {
    pub fn new(
        market: Arc<dyn MarketSeriesService>,
        accounts: Arc<dyn AccountService>,
        store: Arc<DataStore>,
        log: Arc<dyn LogSink>,
        config: OrchestratorConfig,
    ) -> Self {
        let (state, _) = watch::channel(CycleState::Idle);
        Self {
            market,
            accounts,
            store,
            log,
            config,
            cycle: Mutex::new(0),
            state,
        }
    }

    pub fn store(&self) -> Arc<DataStore> {
        self.store.clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<CycleState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> CycleState {
        self.state.borrow().clone()
    }

    fn transition(&self, state: CycleState) {
        debug!("Orchestrator: {} -> {}", self.state.borrow().clone(), state);
        self.state.send_replace(state);
    }

    fn fail(&self, report: &mut CycleReport, error: &DashboardError) {
        self.log.log(
            COMPONENT,
            format!("cycle {} aborted, keeping previous snapshot: {}", report.cycle, error),
        );
        report.state = CycleState::Error(error.to_string());
        self.transition(report.state.clone());
    }

    /// Runs one complete cycle. Failures are reported, never raised.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut counter = self.cycle.lock().await;
        *counter += 1;
        let mut report = CycleReport::new(*counter);

        self.transition(CycleState::Idle);
        self.transition(CycleState::FetchingIndexAndAccounts);

        // Neither fetch cancels the other.
        let (index_result, accounts_result) = tokio::join!(
            fetch_index_snapshot(self.market.as_ref(), &self.config.symbol),
            self.accounts.list_accounts()
        );

        let index = match self.derive_index(index_result).await {
            Ok(stats) => stats,
            Err(e) => {
                report.index_error = Some(e.clone());
                if let Err(account_error) = &accounts_result {
                    self.log.log(
                        COMPONENT,
                        format!("account list fetch failed: {}", account_error),
                    );
                    report.accounts_error = Some(account_error.clone());
                }
                self.fail(&mut report, &e);
                return report;
            }
        };

        let accounts = match accounts_result {
            Ok(records) => {
                let summary = self
                    .store
                    .store_response(BrokerageResponse::Accounts(records))
                    .await;
                for excluded in &summary.excluded {
                    debug!("Orchestrator: skipping placeholder account {}", excluded);
                }

                self.transition(CycleState::FetchingBalances);
                let failed = self.fetch_balances().await;

                self.transition(CycleState::Derived);
                let (derived, derive_failed) = self.derive_accounts(index.last, &failed).await;
                report.failed_accounts = failed.into_iter().chain(derive_failed).collect();
                report.failed_accounts.sort();
                derived
            }
            Err(e) => {
                self.log.log(
                    COMPONENT,
                    format!("account list fetch failed, keeping previous accounts: {}", e),
                );
                report.accounts_error = Some(e);
                self.transition(CycleState::Derived);
                self.store.current().accounts.clone()
            }
        };

        report.published_accounts = accounts.keys().cloned().collect();
        self.store.publish(DashboardSnapshot {
            cycle: report.cycle,
            published_at: Some(Utc::now()),
            index: Some(index),
            accounts,
        });

        report.state = CycleState::Published;
        self.transition(CycleState::Published);
        self.log.log(
            COMPONENT,
            format!(
                "cycle {} published {} account(s), {} failed",
                report.cycle,
                report.published_accounts.len(),
                report.failed_accounts.len()
            ),
        );
        report
    }

    /// Derives index stats and keeps the raw snapshot only if derivation succeeds.
    async fn derive_index(
        &self,
        fetched: DashboardResult<RawIndexSnapshot>,
    ) -> DashboardResult<IndexStats> {
        let raw = fetched.map_err(|e| {
            self.log.log(COMPONENT, format!("index fetch failed: {}", e));
            e
        })?;
        let stats = derive_index_stats(&raw).map_err(|e| {
            self.log
                .log(COMPONENT, format!("index derivation failed: {}", e));
            e
        })?;
        self.store.store_index_snapshot(raw).await;
        Ok(stats)
    }

    /// Fetches every known account's balance with bounded concurrency and
    /// attaches the successes. Returns the accounts whose fetch failed.
    async fn fetch_balances(&self) -> BTreeSet<String> {
        let numbers = self.store.account_numbers().await;
        let accounts = self.accounts.as_ref();
        let cap = self.config.balance_concurrency.max(1);

        let results: Vec<(String, DashboardResult<Balance>)> = stream::iter(numbers)
            .map(|number| async move {
                let result = accounts.fetch_balance(&number).await;
                (number, result)
            })
            .buffer_unordered(cap)
            .collect()
            .await;

        let mut balances = Vec::with_capacity(results.len());
        let mut failed = BTreeSet::new();
        for (number, result) in results {
            match result {
                Ok(mut balance) => {
                    if balance.account_number.is_empty() {
                        balance.account_number = number;
                    }
                    balances.push(balance);
                }
                Err(e) => {
                    self.log.log(
                        COMPONENT,
                        format!(
                            "balance fetch failed for {}: {}{}",
                            number,
                            e,
                            if e.is_transient() { " (retrying next cycle)" } else { "" }
                        ),
                    );
                    failed.insert(number);
                }
            }
        }

        let summary = self
            .store
            .store_response(BrokerageResponse::Balances(balances))
            .await;
        for unknown in summary.unknown {
            self.log.log(
                COMPONENT,
                format!("balance for unlisted account {} ignored", unknown),
            );
        }
        failed
    }

    async fn derive_accounts(
        &self,
        index_last: f64,
        skip: &BTreeSet<String>,
    ) -> (BTreeMap<String, AccountStats>, Vec<String>) {
        let mut derived = BTreeMap::new();
        let mut failed = Vec::new();

        for record in self.store.accounts().await {
            if skip.contains(&record.account_number) {
                continue;
            }
            match derive_account_stats(&record, index_last) {
                Ok(stats) => {
                    derived.insert(record.account_number.clone(), stats);
                }
                Err(e) => {
                    self.log.log(
                        COMPONENT,
                        format!("stats for {} skipped: {}", record.account_number, e),
                    );
                    failed.push(record.account_number);
                }
            }
        }

        (derived, failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock::{MemoryLogSink, MockAccountService, MockMarketSeriesService};

    fn orchestrator(
        market: MockMarketSeriesService,
        accounts: MockAccountService,
    ) -> (Orchestrator, Arc<MemoryLogSink>) {
        let log = Arc::new(MemoryLogSink::new());
        let orchestrator = Orchestrator::new(
            Arc::new(market),
            Arc::new(accounts),
            Arc::new(DataStore::new()),
            log.clone(),
            OrchestratorConfig::default(),
        );
        (orchestrator, log)
    }

    #[tokio::test]
    async fn test_cycle_publishes_index_and_accounts() {
        let accounts = MockAccountService::new()
            .with_account("5WT00001", "Roth", "100000")
            .with_account("5WT00002", "Margin", "25000.50");
        let (orchestrator, _) = orchestrator(MockMarketSeriesService::demo(), accounts);

        let report = orchestrator.run_cycle().await;

        assert!(report.published());
        assert_eq!(report.cycle, 1);
        assert_eq!(orchestrator.state(), CycleState::Published);
        let snapshot = orchestrator.store().current();
        assert_eq!(snapshot.cycle, 1);
        assert_eq!(snapshot.index.as_ref().unwrap().last, 20.0);
        assert_eq!(snapshot.accounts.len(), 2);
    }

    #[tokio::test]
    async fn test_index_failure_skips_accounts_and_keeps_snapshot() {
        let accounts = MockAccountService::new().with_account("5WT00001", "Roth", "100000");
        let (orchestrator, log) = orchestrator(MockMarketSeriesService::demo(), accounts);
        orchestrator.run_cycle().await;
        let before = orchestrator.store().current();

        // Same store, broken index provider.
        let broken = Orchestrator::new(
            Arc::new(MockMarketSeriesService::demo().failing(DashboardError::network("timeout"))),
            Arc::new(MockAccountService::new().with_account("5WT00001", "Roth", "1")),
            orchestrator.store(),
            log.clone(),
            OrchestratorConfig::default(),
        );
        let report = broken.run_cycle().await;

        assert!(matches!(report.state, CycleState::Error(_)));
        assert!(matches!(report.index_error, Some(DashboardError::Network { .. })));
        assert_eq!(broken.store().current(), before);
        assert!(log.contains("index fetch failed"));
    }

    #[tokio::test]
    async fn test_account_list_failure_carries_previous_accounts() {
        let store = Arc::new(DataStore::new());
        let log: Arc<MemoryLogSink> = Arc::new(MemoryLogSink::new());
        let first = Orchestrator::new(
            Arc::new(MockMarketSeriesService::demo()),
            Arc::new(MockAccountService::new().with_account("5WT00001", "Roth", "100000")),
            store.clone(),
            log.clone(),
            OrchestratorConfig::default(),
        );
        first.run_cycle().await;

        let second = Orchestrator::new(
            Arc::new(MockMarketSeriesService::demo()),
            Arc::new(MockAccountService::new().failing_list(DashboardError::Remote {
                status: 502,
                body: "bad gateway".to_string(),
            })),
            store.clone(),
            log.clone(),
            OrchestratorConfig::default(),
        );
        let report = second.run_cycle().await;

        assert!(report.published());
        assert!(report.accounts_error.is_some());
        assert_eq!(report.published_accounts, vec!["5WT00001".to_string()]);
        assert!(store.current().accounts.contains_key("5WT00001"));
    }

    #[tokio::test]
    async fn test_unparseable_balance_omits_account() {
        let accounts = MockAccountService::new()
            .with_account("5WT00001", "Roth", "100000")
            .with_account("5WT00002", "Margin", "not-a-number");
        let (orchestrator, log) = orchestrator(MockMarketSeriesService::demo(), accounts);

        let report = orchestrator.run_cycle().await;

        assert!(report.published());
        assert_eq!(report.failed_accounts, vec!["5WT00002".to_string()]);
        assert!(!orchestrator.store().current().accounts.contains_key("5WT00002"));
        assert!(log.contains("stats for 5WT00002 skipped"));
    }

    #[tokio::test]
    async fn test_cycle_counter_increments() {
        let (orchestrator, _) =
            orchestrator(MockMarketSeriesService::demo(), MockAccountService::new());
        orchestrator.run_cycle().await;
        let report = orchestrator.run_cycle().await;
        assert_eq!(report.cycle, 2);
        assert_eq!(orchestrator.store().current().cycle, 2);
    }

    #[test]
    fn test_busy_states() {
        assert!(CycleState::FetchingBalances.is_busy());
        assert!(!CycleState::Published.is_busy());
        assert!(!CycleState::Error("x".into()).is_busy());
    }
}
