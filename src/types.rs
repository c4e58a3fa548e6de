//! Wire types shared by the session backend and the HTTP session client

use serde::{Deserialize, Serialize};

use crate::monitor::ConfigUpdate;

pub const CSRF_HEADER: &str = "X-CSRF-Token";
pub const SESSION_COOKIE: &str = "whodis_session";
pub const CSRF_COOKIE: &str = "csrf_token";

/// POST /api/session/check body
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CheckRequest {
    /// Unix seconds of the client's last recorded activity
    pub last_activity: i64,
}

/// POST /api/session/check response; the config fields are present when the
/// backend wants the client to pick up new settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResponse {
    #[serde(default = "default_valid")]
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<i64>,
    #[serde(flatten)]
    pub config: ConfigUpdate,
}

fn default_valid() -> bool {
    true
}

impl Default for CheckResponse {
    fn default() -> Self {
        Self {
            valid: true,
            remaining_seconds: None,
            config: ConfigUpdate::default(),
        }
    }
}

/// POST /api/session/extend response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<i64>,
}

/// POST /auth/login body (development login)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub username: String,
    pub csrf_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_response_without_config() {
        let response: CheckResponse = serde_json::from_str(r#"{"valid": true}"#).unwrap();
        assert!(response.valid);
        assert!(response.config.is_empty());
    }

    #[test]
    fn test_check_response_with_config() {
        let response: CheckResponse = serde_json::from_str(
            r#"{"valid": true, "remaining_seconds": 600, "timeout_minutes": 20, "warning_minutes": 3}"#,
        )
        .unwrap();
        assert_eq!(response.remaining_seconds, Some(600));
        assert_eq!(response.config.timeout_minutes, Some(20));
        assert_eq!(response.config.warning_minutes, Some(3));
        assert_eq!(response.config.check_interval_seconds, None);
    }
}
