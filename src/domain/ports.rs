use crate::domain::account::{AccountRecord, Balance};
use crate::domain::errors::DashboardResult;
use crate::domain::market::{Bar, HistoryRequest, Quote};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait MarketSeriesService: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> DashboardResult<Quote>;
    /// Bars ascending by time; possibly empty.
    async fn fetch_history(&self, request: &HistoryRequest) -> DashboardResult<Vec<Bar>>;
}

#[async_trait]
pub trait AccountService: Send + Sync {
    async fn list_accounts(&self) -> DashboardResult<Vec<AccountRecord>>;
    async fn fetch_balance(&self, account_number: &str) -> DashboardResult<Balance>;
}

/// Timestamped, append-only diagnostic sink.
pub trait LogSink: Send + Sync {
    fn record(&self, timestamp: DateTime<Utc>, component: &str, message: &str);
}

impl dyn LogSink {
    /// Records `message` stamped with the current time.
    pub fn log(&self, component: &str, message: impl AsRef<str>) {
        self.record(Utc::now(), component, message.as_ref());
    }
}
