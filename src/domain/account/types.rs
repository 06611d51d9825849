use serde::{Deserialize, Serialize};

/// Leftover brokerage placeholder accounts that are never shown.
pub const EXCLUDED_ACCOUNT_NUMBERS: &[&str] = &["1DA13984"];

pub fn is_excluded_account(account_number: &str) -> bool {
    EXCLUDED_ACCOUNT_NUMBERS.contains(&account_number)
}

/// Balance snapshot for one account. Only the net liquidating value is
/// consumed downstream; everything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub account_number: String,
    /// Numeric string as returned by the brokerage.
    pub net_liquidating_value: String,
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One brokerage account. Created from the account list; the balance is
/// attached later and may be missing if its fetch has not completed or failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub account_number: String,
    pub nickname: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub balance: Option<Balance>,
}

impl AccountRecord {
    pub fn new(account_number: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            account_number: account_number.into(),
            nickname: nickname.into(),
            metadata: serde_json::Value::Null,
            balance: None,
        }
    }
}

/// Brokerage payloads the data store knows how to ingest.
#[derive(Debug, Clone, PartialEq)]
pub enum BrokerageResponse {
    Accounts(Vec<AccountRecord>),
    Balances(Vec<Balance>),
}
