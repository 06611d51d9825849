use thiserror::Error;

/// Failure taxonomy shared by the fetch adapters, the stats engine and the
/// refresh orchestrator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashboardError {
    #[error("Network error: {reason}")]
    Network { reason: String },

    #[error("Remote error (status {status}): {body}")]
    Remote { status: u16, body: String },

    #[error("Parse error: {reason}")]
    Parse { reason: String },

    #[error("Data unavailable: {reason}")]
    DataUnavailable { reason: String },

    #[error("Authentication required: {reason}")]
    AuthRequired { reason: String },
}

impl DashboardError {
    pub fn network(reason: impl Into<String>) -> Self {
        Self::Network {
            reason: reason.into(),
        }
    }

    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            reason: reason.into(),
        }
    }

    pub fn auth_required(reason: impl Into<String>) -> Self {
        Self::AuthRequired {
            reason: reason.into(),
        }
    }

    /// True for failures a later refresh cycle may not hit again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Remote { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(err.to_string())
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_formatting() {
        let error = DashboardError::Remote {
            status: 503,
            body: "maintenance".to_string(),
        };

        let msg = error.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("maintenance"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(DashboardError::network("reset").is_transient());
        assert!(
            DashboardError::Remote {
                status: 502,
                body: String::new()
            }
            .is_transient()
        );
        assert!(
            !DashboardError::Remote {
                status: 404,
                body: String::new()
            }
            .is_transient()
        );
        assert!(!DashboardError::parse("bad json").is_transient());
        assert!(!DashboardError::auth_required("no login").is_transient());
    }

    #[test]
    fn test_json_error_becomes_parse_error() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(
            DashboardError::from(err),
            DashboardError::Parse { .. }
        ));
    }
}
