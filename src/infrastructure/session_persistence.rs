use crate::domain::ports::LogSink;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

const COMPONENT: &str = "session";

/// Brokerage session kept between runs so startup can skip re-authentication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub session_token: String,
    #[serde(default)]
    pub remember_token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub session_expiration: Option<DateTime<Utc>>,
    pub saved_at: DateTime<Utc>,
}

impl PersistedSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.session_expiration.is_some_and(|expires| expires <= now)
    }
}

pub struct SessionCache {
    file_path: PathBuf,
    log: Arc<dyn LogSink>,
}

impl SessionCache {
    pub fn new(file_path: impl AsRef<Path>, log: Arc<dyn LogSink>) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
            log,
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Cached session, if there is a usable one. Missing, unreadable,
    /// corrupt and expired files all mean "no session".
    pub fn load(&self) -> Option<PersistedSession> {
        let content = match fs::read_to_string(&self.file_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                self.log.log(
                    COMPONENT,
                    format!("cannot read {}: {}", self.path().display(), e),
                );
                return None;
            }
        };

        let session: PersistedSession = match serde_json::from_str(&content) {
            Ok(session) => session,
            Err(e) => {
                self.log.log(
                    COMPONENT,
                    format!("ignoring corrupt session file {}: {}", self.path().display(), e),
                );
                return None;
            }
        };

        if session.is_expired(Utc::now()) {
            self.log.log(COMPONENT, "cached session expired");
            return None;
        }

        info!("Loaded cached session from {}", self.path().display());
        Some(session)
    }

    pub fn save(&self, session: &PersistedSession) -> Result<()> {
        if let Some(dir) = self.file_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).context("Failed to create session directory")?;
        }
        let content =
            serde_json::to_string_pretty(session).context("Failed to serialize session")?;

        // Atomic write: write to temp file then rename
        let temp_path = self.file_path.with_extension("tmp");
        fs::write(&temp_path, content).context("Failed to write temp session file")?;
        fs::rename(&temp_path, &self.file_path).context("Failed to rename session file")?;

        info!("Saved session to {}", self.path().display());
        Ok(())
    }

    /// Forgets the cached session, e.g. after the server rejected it.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.file_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove session file"),
        }
    }
}
