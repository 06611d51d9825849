use super::types::{Envelope, LoginRequest, SessionData};
use crate::domain::errors::{DashboardError, DashboardResult};
use crate::domain::ports::LogSink;
use crate::infrastructure::session_persistence::SessionCache;
use reqwest::StatusCode;
use reqwest_middleware::{ClientWithMiddleware, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const COMPONENT: &str = "tastytrade";
const USER_AGENT: &str = "vixbuddy/1.0";

/// Authenticated HTTP access to the tastytrade REST API.
///
/// The session token is obtained lazily, reused from the session cache when
/// possible, and refreshed once when the server answers 401.
pub struct TastytradeClient {
    http: ClientWithMiddleware,
    base_url: String,
    login: String,
    password: String,
    cache: SessionCache,
    token: Mutex<Option<String>>,
    log: Arc<dyn LogSink>,
}

impl TastytradeClient {
    pub fn new(
        http: ClientWithMiddleware,
        base_url: &str,
        login: String,
        password: String,
        cache: SessionCache,
        log: Arc<dyn LogSink>,
    ) -> Self {
        let token = match cache.load() {
            Some(session) => {
                log.log(COMPONENT, "using cached session token");
                Some(session.session_token)
            }
            None => None,
        };

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            login,
            password,
            cache,
            token: Mutex::new(token),
            log,
        }
    }

    fn with_headers(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
    }

    /// Current session token, authenticating first if there is none.
    async fn token(&self) -> DashboardResult<String> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }
        let token = self.authenticate().await?;
        *guard = Some(token.clone());
        Ok(token)
    }

    /// Drops `rejected` unless another request already replaced it.
    async fn invalidate(&self, rejected: &str) {
        let mut guard = self.token.lock().await;
        if guard.as_deref() == Some(rejected) {
            *guard = None;
            if let Err(e) = self.cache.clear() {
                warn!("TastytradeClient: failed to clear session cache: {:#}", e);
            }
        }
    }

    async fn authenticate(&self) -> DashboardResult<String> {
        info!("TastytradeClient: authenticating as {}", self.login);
        self.log.log(COMPONENT, "authenticating");

        let body = serde_json::to_string(&LoginRequest {
            login: &self.login,
            password: &self.password,
            remember_me: true,
        })?;
        let url = format!("{}/sessions", self.base_url);
        let response = self
            .with_headers(self.http.post(&url))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            self.log
                .log(COMPONENT, format!("authentication failed with {}", status));
            return Err(DashboardError::Remote {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: Envelope<SessionData> = serde_json::from_str(&text)?;
        let session = envelope.data.into_persisted();
        let token = session.session_token.clone();

        if let Err(e) = self.cache.save(&session) {
            self.log
                .log(COMPONENT, format!("could not persist session: {:#}", e));
        }
        self.log.log(COMPONENT, "authenticated");
        Ok(token)
    }

    async fn send_get(&self, path: &str, token: &str) -> DashboardResult<String> {
        let url = format!("{}{}", self.base_url, path);
        debug!("TastytradeClient: GET {}", url);

        let response = self
            .with_headers(self.http.get(&url))
            .header("Authorization", token)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(DashboardError::Remote {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }

    /// GETs `path` and decodes the `data` envelope.
    pub async fn get_data<T: DeserializeOwned>(&self, path: &str) -> DashboardResult<T> {
        let token = self.token().await?;
        let text = match self.send_get(path, &token).await {
            Err(DashboardError::Remote { status, .. })
                if status == StatusCode::UNAUTHORIZED.as_u16() =>
            {
                self.log
                    .log(COMPONENT, format!("session rejected on {}, re-authenticating", path));
                self.invalidate(&token).await;
                let token = self.token().await?;
                self.send_get(path, &token).await?
            }
            other => other?,
        };

        let envelope: Envelope<T> = serde_json::from_str(&text)?;
        Ok(envelope.data)
    }
}
