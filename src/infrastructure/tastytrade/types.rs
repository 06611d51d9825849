use crate::domain::account::{AccountRecord, Balance};
use crate::domain::errors::{DashboardError, DashboardResult};
use crate::infrastructure::session_persistence::PersistedSession;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Every tastytrade payload is wrapped in `{"data": ...}`.
#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub(super) struct LoginRequest<'a> {
    pub login: &'a str,
    pub password: &'a str,
    #[serde(rename = "remember-me")]
    pub remember_me: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct SessionData {
    pub session_token: String,
    #[serde(default)]
    pub remember_token: Option<String>,
    #[serde(default)]
    pub session_expiration: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user: Option<SessionUser>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct SessionUser {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
}

impl SessionData {
    pub fn into_persisted(self) -> PersistedSession {
        let user = self.user.unwrap_or_default();
        PersistedSession {
            session_token: self.session_token,
            remember_token: self.remember_token,
            username: user.username,
            email: user.email,
            external_id: user.external_id,
            session_expiration: self.session_expiration,
            saved_at: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct AccountItems {
    #[serde(default)]
    pub items: Vec<Value>,
}

/// `data.items[].account`, keeping each whole item as metadata.
pub(super) fn accounts_from_items(items: Vec<Value>) -> DashboardResult<Vec<AccountRecord>> {
    items
        .into_iter()
        .map(|item| {
            let account = item.get("account").unwrap_or(&item);
            let account_number = account
                .get("account-number")
                .and_then(Value::as_str)
                .ok_or_else(|| DashboardError::parse("account item without account-number"))?
                .to_string();
            let nickname = account
                .get("nickname")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            Ok(AccountRecord {
                account_number,
                nickname,
                metadata: item,
                balance: None,
            })
        })
        .collect()
}

/// `data` of a balances response. Numbers are accepted as well as numeric
/// strings; everything besides the two consumed fields lands in `extra`.
pub(super) fn balance_from_data(
    mut data: Map<String, Value>,
    requested: &str,
) -> DashboardResult<Balance> {
    let account_number = match data.remove("account-number") {
        Some(Value::String(number)) => number,
        _ => requested.to_string(),
    };
    let net_liquidating_value = match data.remove("net-liquidating-value") {
        Some(Value::String(value)) => value,
        Some(Value::Number(value)) => value.to_string(),
        _ => {
            return Err(DashboardError::unavailable(format!(
                "balance for {} has no net-liquidating-value",
                requested
            )));
        }
    };

    Ok(Balance {
        account_number,
        net_liquidating_value,
        extra: data,
    })
}
