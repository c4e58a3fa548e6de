use thiserror::Error;

/// Errors surfaced by the session client and the monitor
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The backend answered 401: the session is gone
    #[error("session is not authenticated")]
    Unauthorized,

    /// Any other non-success HTTP status
    #[error("session backend returned HTTP {0}")]
    Status(u16),

    /// Transport failure (connect, timeout, decode)
    #[error("session request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid session timeout configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid session backend url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl MonitorError {
    /// True for the one failure that always ends the session
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, MonitorError::Unauthorized)
    }

    /// Failures that are skipped and retried on the next check
    pub fn is_transient(&self) -> bool {
        matches!(self, MonitorError::Http(_) | MonitorError::Status(_))
    }
}

pub type MonitorResult<T> = Result<T, MonitorError>;
