use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::error::{MonitorError, MonitorResult};

pub const DEFAULT_TIMEOUT_MINUTES: u32 = 15;
pub const DEFAULT_WARNING_MINUTES: u32 = 2;
pub const DEFAULT_CHECK_INTERVAL_SECONDS: u32 = 30;

/// One day; keeps deadline arithmetic well inside chrono's range
pub const MAX_TIMEOUT_MINUTES: u32 = 24 * 60;
pub const MAX_CHECK_INTERVAL_SECONDS: u32 = 60 * 60;

/// Inactivity timeout settings shared by the backend and the monitor.
///
/// Serialized with the same field names the backend uses on the wire:
/// `{ "timeout_minutes": 15, "warning_minutes": 2, "check_interval_seconds": 30 }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTimeoutConfig {
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: u32,
    #[serde(default = "default_warning_minutes")]
    pub warning_minutes: u32,
    #[serde(default = "default_check_interval_seconds")]
    pub check_interval_seconds: u32,
}

fn default_timeout_minutes() -> u32 {
    DEFAULT_TIMEOUT_MINUTES
}

fn default_warning_minutes() -> u32 {
    DEFAULT_WARNING_MINUTES
}

fn default_check_interval_seconds() -> u32 {
    DEFAULT_CHECK_INTERVAL_SECONDS
}

impl Default for SessionTimeoutConfig {
    fn default() -> Self {
        Self {
            timeout_minutes: DEFAULT_TIMEOUT_MINUTES,
            warning_minutes: DEFAULT_WARNING_MINUTES,
            check_interval_seconds: DEFAULT_CHECK_INTERVAL_SECONDS,
        }
    }
}

/// Optional overrides carried by a check or config-edit payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_interval_seconds: Option<u32>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self.timeout_minutes.is_none()
            && self.warning_minutes.is_none()
            && self.check_interval_seconds.is_none()
    }
}

impl From<SessionTimeoutConfig> for ConfigUpdate {
    fn from(config: SessionTimeoutConfig) -> Self {
        Self {
            timeout_minutes: Some(config.timeout_minutes),
            warning_minutes: Some(config.warning_minutes),
            check_interval_seconds: Some(config.check_interval_seconds),
        }
    }
}

impl SessionTimeoutConfig {
    pub fn new(timeout_minutes: u32, warning_minutes: u32, check_interval_seconds: u32) -> Self {
        Self {
            timeout_minutes,
            warning_minutes,
            check_interval_seconds,
        }
    }

    pub fn validate(&self) -> MonitorResult<()> {
        if self.timeout_minutes == 0 {
            return Err(MonitorError::InvalidConfig(
                "timeout_minutes must be at least 1".to_string(),
            ));
        }
        if self.warning_minutes == 0 {
            return Err(MonitorError::InvalidConfig(
                "warning_minutes must be at least 1".to_string(),
            ));
        }
        if self.warning_minutes >= self.timeout_minutes {
            return Err(MonitorError::InvalidConfig(format!(
                "warning_minutes ({}) must be less than timeout_minutes ({})",
                self.warning_minutes, self.timeout_minutes
            )));
        }
        if self.timeout_minutes > MAX_TIMEOUT_MINUTES {
            return Err(MonitorError::InvalidConfig(format!(
                "timeout_minutes must be at most {}",
                MAX_TIMEOUT_MINUTES
            )));
        }
        if self.check_interval_seconds == 0 {
            return Err(MonitorError::InvalidConfig(
                "check_interval_seconds must be at least 1".to_string(),
            ));
        }
        if self.check_interval_seconds > MAX_CHECK_INTERVAL_SECONDS {
            return Err(MonitorError::InvalidConfig(format!(
                "check_interval_seconds must be at most {}",
                MAX_CHECK_INTERVAL_SECONDS
            )));
        }
        Ok(())
    }

    /// Returns the merged config, or an error leaving `self` untouched
    pub fn merge(&self, update: &ConfigUpdate) -> MonitorResult<Self> {
        let merged = Self {
            timeout_minutes: update.timeout_minutes.unwrap_or(self.timeout_minutes),
            warning_minutes: update.warning_minutes.unwrap_or(self.warning_minutes),
            check_interval_seconds: update
                .check_interval_seconds
                .unwrap_or(self.check_interval_seconds),
        };
        merged.validate()?;
        Ok(merged)
    }

    pub fn timeout(&self) -> Duration {
        Duration::minutes(i64::from(self.timeout_minutes))
    }

    /// Inactivity after which the warning is shown
    pub fn warning_threshold(&self) -> Duration {
        Duration::minutes(i64::from(self.timeout_minutes.saturating_sub(self.warning_minutes)))
    }

    /// Countdown length once the warning is shown
    pub fn warning_seconds(&self) -> u32 {
        self.warning_minutes.saturating_mul(60)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::seconds(i64::from(self.check_interval_seconds))
    }
}
