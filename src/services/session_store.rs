use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::monitor::{ConfigUpdate, MonitorResult, SessionTimeoutConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,
    #[error("session expired after inactivity")]
    Expired,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub user: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// In-memory sessions plus the live timeout configuration
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionRecord>>,
    config: RwLock<SessionTimeoutConfig>,
}

impl SessionStore {
    pub fn new(config: SessionTimeoutConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config: RwLock::new(config),
        }
    }

    pub async fn config(&self) -> SessionTimeoutConfig {
        *self.config.read().await
    }

    /// Validates and installs a config edit, returning the new config
    pub async fn update_config(&self, update: &ConfigUpdate) -> MonitorResult<SessionTimeoutConfig> {
        let mut config = self.config.write().await;
        let merged = config.merge(update)?;
        *config = merged;
        Ok(merged)
    }

    pub async fn create(&self, user: &str, now: DateTime<Utc>) -> Uuid {
        let sid = Uuid::new_v4();
        let record = SessionRecord {
            user: user.to_string(),
            created_at: now,
            last_activity: now,
        };
        self.sessions.write().await.insert(sid, record);
        tracing::info!("Session created for '{}' ({})", user, sid);
        sid
    }

    pub async fn get(&self, sid: &Uuid) -> Option<SessionRecord> {
        self.sessions.read().await.get(sid).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Applies the client's reported activity and returns the seconds left.
    ///
    /// Reported times are clamped to `now` and never move the record
    /// backwards. A session idle for the full timeout is removed.
    pub async fn touch(
        &self,
        sid: &Uuid,
        reported_last_activity: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, SessionError> {
        let timeout = self.config.read().await.timeout();
        let mut sessions = self.sessions.write().await;
        let record = sessions.get_mut(sid).ok_or(SessionError::NotFound)?;

        if let Some(reported) = DateTime::from_timestamp(reported_last_activity, 0) {
            let reported = reported.min(now);
            if reported > record.last_activity {
                record.last_activity = reported;
            }
        }

        let idle = now - record.last_activity;
        if idle >= timeout {
            tracing::info!("Session {} for '{}' expired after {}s idle", sid, record.user, idle.num_seconds());
            sessions.remove(sid);
            return Err(SessionError::Expired);
        }
        Ok((timeout - idle).num_seconds())
    }

    /// Resets the inactivity window; fails if the session already timed out
    pub async fn extend(&self, sid: &Uuid, now: DateTime<Utc>) -> Result<i64, SessionError> {
        let timeout = self.config.read().await.timeout();
        let mut sessions = self.sessions.write().await;
        let record = sessions.get_mut(sid).ok_or(SessionError::NotFound)?;

        if now - record.last_activity >= timeout {
            sessions.remove(sid);
            return Err(SessionError::Expired);
        }
        record.last_activity = now;
        Ok(timeout.num_seconds())
    }

    pub async fn remove(&self, sid: &Uuid) -> Option<SessionRecord> {
        let removed = self.sessions.write().await.remove(sid);
        if let Some(record) = &removed {
            tracing::info!("Session {} for '{}' logged out", sid, record.user);
        }
        removed
    }

    /// Drops every session idle for at least the timeout; returns how many
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let timeout = self.config.read().await.timeout();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| now - record.last_activity < timeout);
        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_touch_uses_reported_activity() {
        let store = SessionStore::new(SessionTimeoutConfig::default());
        let sid = store.create("alice", t0()).await;

        let reported = (t0() + Duration::minutes(5)).timestamp();
        let remaining = store.touch(&sid, reported, t0() + Duration::minutes(10)).await.unwrap();
        assert_eq!(remaining, 10 * 60);
    }

    #[tokio::test]
    async fn test_touch_never_moves_activity_backwards_or_into_future() {
        let store = SessionStore::new(SessionTimeoutConfig::default());
        let sid = store.create("alice", t0()).await;
        let now = t0() + Duration::minutes(1);

        store.touch(&sid, (t0() - Duration::hours(1)).timestamp(), now).await.unwrap();
        assert_eq!(store.get(&sid).await.unwrap().last_activity, t0());

        store.touch(&sid, (t0() + Duration::hours(1)).timestamp(), now).await.unwrap();
        assert_eq!(store.get(&sid).await.unwrap().last_activity, now);
    }

    #[tokio::test]
    async fn test_touch_expires_idle_session() {
        let store = SessionStore::new(SessionTimeoutConfig::default());
        let sid = store.create("alice", t0()).await;

        let result = store.touch(&sid, t0().timestamp(), t0() + Duration::minutes(15)).await;
        assert_eq!(result, Err(SessionError::Expired));
        assert!(store.get(&sid).await.is_none());
        assert_eq!(
            store.touch(&sid, t0().timestamp(), t0()).await,
            Err(SessionError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_extend_resets_window() {
        let store = SessionStore::new(SessionTimeoutConfig::default());
        let sid = store.create("alice", t0()).await;
        let now = t0() + Duration::minutes(14);

        assert_eq!(store.extend(&sid, now).await, Ok(15 * 60));
        assert_eq!(store.get(&sid).await.map(|r| r.last_activity), Some(now));
    }

    #[tokio::test]
    async fn test_extend_after_timeout_fails() {
        let store = SessionStore::new(SessionTimeoutConfig::default());
        let sid = store.create("alice", t0()).await;
        assert_eq!(
            store.extend(&sid, t0() + Duration::minutes(16)).await,
            Err(SessionError::Expired)
        );
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = SessionStore::new(SessionTimeoutConfig::default());
        store.create("idle", t0()).await;
        let busy = store.create("busy", t0()).await;
        store.extend(&busy, t0() + Duration::minutes(10)).await.unwrap();

        let purged = store.purge_expired(t0() + Duration::minutes(20)).await;
        assert_eq!(purged, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.get(&busy).await.is_some());
    }

    #[tokio::test]
    async fn test_update_config_validates() {
        let store = SessionStore::new(SessionTimeoutConfig::default());
        let bad = ConfigUpdate {
            warning_minutes: Some(15),
            ..Default::default()
        };
        assert!(store.update_config(&bad).await.is_err());
        assert_eq!(store.config().await, SessionTimeoutConfig::default());

        let good = ConfigUpdate {
            timeout_minutes: Some(30),
            warning_minutes: Some(5),
            ..Default::default()
        };
        let updated = store.update_config(&good).await.unwrap();
        assert_eq!(updated, SessionTimeoutConfig::new(30, 5, 30));
    }
}
