use super::client::TastytradeClient;
use super::types::{AccountItems, accounts_from_items, balance_from_data};
use crate::domain::account::{AccountRecord, Balance};
use crate::domain::errors::DashboardResult;
use crate::domain::ports::{AccountService, LogSink};
use crate::infrastructure::core::http_client_factory::percent_encode;
use crate::infrastructure::session_persistence::SessionCache;
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::{Map, Value};
use std::sync::Arc;

const COMPONENT: &str = "tastytrade";

/// Account list and balances from tastytrade.
pub struct TastytradeAccountService {
    client: TastytradeClient,
    log: Arc<dyn LogSink>,
}

impl TastytradeAccountService {
    pub fn new(
        http: ClientWithMiddleware,
        base_url: &str,
        login: String,
        password: String,
        cache: SessionCache,
        log: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            client: TastytradeClient::new(http, base_url, login, password, cache, log.clone()),
            log,
        }
    }
}

#[async_trait]
impl AccountService for TastytradeAccountService {
    async fn list_accounts(&self) -> DashboardResult<Vec<AccountRecord>> {
        self.log.log(COMPONENT, "fetching accounts");
        let data: AccountItems = self.client.get_data("/customers/me/accounts").await?;
        accounts_from_items(data.items)
    }

    async fn fetch_balance(&self, account_number: &str) -> DashboardResult<Balance> {
        self.log
            .log(COMPONENT, format!("fetching balance for {}", account_number));
        let path = format!("/accounts/{}/balances", percent_encode(account_number));
        let data: Map<String, Value> = self.client.get_data(&path).await?;
        balance_from_data(data, account_number)
    }
}
