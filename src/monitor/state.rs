use std::fmt;

use serde::{Deserialize, Serialize};

/// Externally visible monitor state, published on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MonitorState {
    /// No timers run (login page, unauthenticated, or unloaded)
    Disabled,
    Active,
    Warning { remaining_seconds: u32 },
    /// Terminal for the page lifetime
    Expired { reason: LogoutReason },
}

impl MonitorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MonitorState::Expired { .. })
    }
}

/// Why the session ended, carried to the login page as `?reason=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    /// Countdown reached zero or the user chose to log out
    SessionTimeout,
    /// The backend reported the session as unauthenticated
    SessionExpired,
}

impl LogoutReason {
    pub fn query_value(&self) -> &'static str {
        match self {
            LogoutReason::SessionTimeout => "session_timeout",
            LogoutReason::SessionExpired => "session_expired",
        }
    }

    pub fn redirect_location(&self, login_path: &str) -> String {
        format!("{}?reason={}", login_path, self.query_value())
    }
}

impl fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_value())
    }
}

/// Tracked user-activity events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Pointer,
    Key,
    Scroll,
    Touch,
    Click,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 5] = [
        ActivityKind::Pointer,
        ActivityKind::Key,
        ActivityKind::Scroll,
        ActivityKind::Touch,
        ActivityKind::Click,
    ];
}

/// Severity of a user-facing notice (toast)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// How a monitor task finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// Monitoring never started or was disabled by the backend
    Disabled,
    /// Shut down by the embedder (page unload)
    Stopped,
    /// Terminal transition; the navigator was sent here
    Redirected(String),
}
