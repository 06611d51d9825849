use crate::domain::account::{AccountRecord, Balance, BrokerageResponse, is_excluded_account};
use crate::domain::market::RawIndexSnapshot;
use crate::domain::stats::{AccountStats, IndexStats};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{RwLock, watch};

/// What the presenter renders. Published as a whole; never mutated after.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSnapshot {
    /// Refresh cycle that produced this snapshot; 0 before the first publish.
    pub cycle: u64,
    pub published_at: Option<DateTime<Utc>>,
    pub index: Option<IndexStats>,
    pub accounts: BTreeMap<String, AccountStats>,
}

impl DashboardSnapshot {
    pub fn is_empty(&self) -> bool {
        self.index.is_none() && self.accounts.is_empty()
    }
}

/// Result of ingesting a brokerage response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub stored: usize,
    /// Placeholder accounts filtered out of an account list.
    pub excluded: Vec<String>,
    /// Balances whose account is not in the current account list.
    pub unknown: Vec<String>,
}

#[derive(Default)]
struct RawState {
    index: Option<RawIndexSnapshot>,
    accounts: BTreeMap<String, AccountRecord>,
}

/// Owns the raw fetched data and the published snapshot.
///
/// Raw state is written only by the refresh orchestrator. Readers get
/// `Arc<DashboardSnapshot>` values through a watch channel, so a reader sees
/// either the previous snapshot or the next one, never a mix.
pub struct DataStore {
    raw: RwLock<RawState>,
    published: watch::Sender<Arc<DashboardSnapshot>>,
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DataStore {
    pub fn new() -> Self {
        let (published, _) = watch::channel(Arc::new(DashboardSnapshot::default()));
        Self {
            raw: RwLock::new(RawState::default()),
            published,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DashboardSnapshot>> {
        self.published.subscribe()
    }

    /// Last published snapshot.
    pub fn current(&self) -> Arc<DashboardSnapshot> {
        self.published.borrow().clone()
    }

    pub fn publish(&self, snapshot: DashboardSnapshot) {
        self.published.send_replace(Arc::new(snapshot));
    }

    pub async fn store_index_snapshot(&self, snapshot: RawIndexSnapshot) {
        self.raw.write().await.index = Some(snapshot);
    }

    pub async fn index_snapshot(&self) -> Option<RawIndexSnapshot> {
        self.raw.read().await.index.clone()
    }

    /// Ingests a brokerage payload.
    ///
    /// An account list replaces all known records (balances included). A
    /// balance list attaches each balance to its account record.
    pub async fn store_response(&self, response: BrokerageResponse) -> IngestSummary {
        let mut raw = self.raw.write().await;
        let mut summary = IngestSummary::default();

        match response {
            BrokerageResponse::Accounts(records) => {
                raw.accounts.clear();
                for record in records {
                    if is_excluded_account(&record.account_number) {
                        summary.excluded.push(record.account_number);
                        continue;
                    }
                    raw.accounts.insert(record.account_number.clone(), record);
                    summary.stored += 1;
                }
            }
            BrokerageResponse::Balances(balances) => {
                for balance in balances {
                    Self::attach_balance(&mut raw.accounts, balance, &mut summary);
                }
            }
        }

        summary
    }

    fn attach_balance(
        accounts: &mut BTreeMap<String, AccountRecord>,
        balance: Balance,
        summary: &mut IngestSummary,
    ) {
        match accounts.get_mut(&balance.account_number) {
            Some(record) => {
                record.balance = Some(balance);
                summary.stored += 1;
            }
            None => summary.unknown.push(balance.account_number),
        }
    }

    /// Account records in account-number order.
    pub async fn accounts(&self) -> Vec<AccountRecord> {
        self.raw.read().await.accounts.values().cloned().collect()
    }

    pub async fn account_numbers(&self) -> Vec<String> {
        self.raw.read().await.accounts.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balance(number: &str, net_liq: &str) -> Balance {
        Balance {
            account_number: number.to_string(),
            net_liquidating_value: net_liq.to_string(),
            extra: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_account_list_filters_placeholder() {
        let store = DataStore::new();
        let summary = store
            .store_response(BrokerageResponse::Accounts(vec![
                AccountRecord::new("5WT00001", "Roth"),
                AccountRecord::new("1DA13984", "TW Challenge"),
                AccountRecord::new("5WT00002", "Margin"),
            ]))
            .await;

        assert_eq!(summary.stored, 2);
        assert_eq!(summary.excluded, vec!["1DA13984".to_string()]);
        assert_eq!(store.account_numbers().await, vec!["5WT00001", "5WT00002"]);
    }

    #[tokio::test]
    async fn test_balances_attach_to_known_accounts_only() {
        let store = DataStore::new();
        store
            .store_response(BrokerageResponse::Accounts(vec![AccountRecord::new(
                "5WT00001", "Roth",
            )]))
            .await;

        let summary = store
            .store_response(BrokerageResponse::Balances(vec![
                balance("5WT00001", "1000.00"),
                balance("ZZZ99999", "5.00"),
            ]))
            .await;

        assert_eq!(summary.stored, 1);
        assert_eq!(summary.unknown, vec!["ZZZ99999".to_string()]);
        let accounts = store.accounts().await;
        assert_eq!(
            accounts[0].balance.as_ref().unwrap().net_liquidating_value,
            "1000.00"
        );
    }

    #[tokio::test]
    async fn test_new_account_list_drops_old_balances() {
        let store = DataStore::new();
        store
            .store_response(BrokerageResponse::Accounts(vec![AccountRecord::new(
                "5WT00001", "Roth",
            )]))
            .await;
        store
            .store_response(BrokerageResponse::Balances(vec![balance("5WT00001", "1.00")]))
            .await;
        store
            .store_response(BrokerageResponse::Accounts(vec![AccountRecord::new(
                "5WT00001", "Roth",
            )]))
            .await;

        assert!(store.accounts().await[0].balance.is_none());
    }

    #[tokio::test]
    async fn test_publish_swaps_whole_snapshot() {
        let store = DataStore::new();
        let rx = store.subscribe();
        assert!(store.current().is_empty());

        store.publish(DashboardSnapshot {
            cycle: 3,
            published_at: Some(Utc::now()),
            index: None,
            accounts: BTreeMap::new(),
        });

        assert_eq!(rx.borrow().cycle, 3);
        assert_eq!(store.current().cycle, 3);
    }
}
