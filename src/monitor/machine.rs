use chrono::{DateTime, Duration, Utc};

use super::config::SessionTimeoutConfig;
use super::error::{MonitorError, MonitorResult};
use super::state::{ActivityKind, LogoutReason, MonitorState, NoticeLevel};
use crate::types::CheckResponse;

/// Side effects requested by the state machine, executed in order by the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SendCheck { last_activity: i64 },
    SendExtend,
    ShowWarning { remaining_seconds: u32 },
    UpdateCountdown { remaining_seconds: u32 },
    HideWarning,
    Notify { level: NoticeLevel, message: String },
    /// Best-effort; always followed by a `Redirect`
    SendLogout,
    Redirect { location: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Disabled,
    Active,
    /// The countdown timer exists exactly as long as this phase does
    Warning {
        remaining_seconds: u32,
        countdown_due: DateTime<Utc>,
    },
    Expired {
        reason: LogoutReason,
    },
}

/// Inactivity tracker for one page lifetime.
///
/// Holds no clock and performs no I/O: callers pass `now` into every
/// operation and carry out the returned [`Action`]s. Both timers are plain
/// deadlines stored on the struct, so cancelling one is a field write.
#[derive(Debug, Clone)]
pub struct SessionMonitor {
    config: SessionTimeoutConfig,
    login_path: String,
    current_path: String,
    phase: Phase,
    last_activity: DateTime<Utc>,
    check_due: Option<DateTime<Utc>>,
    check_in_flight: bool,
    extend_in_flight: bool,
}

impl SessionMonitor {
    pub fn new(
        config: SessionTimeoutConfig,
        login_path: impl Into<String>,
        current_path: impl Into<String>,
    ) -> Self {
        Self {
            config,
            login_path: login_path.into(),
            current_path: current_path.into(),
            phase: Phase::Disabled,
            last_activity: DateTime::<Utc>::MIN_UTC,
            check_due: None,
            check_in_flight: false,
            extend_in_flight: false,
        }
    }

    pub fn state(&self) -> MonitorState {
        match self.phase {
            Phase::Disabled => MonitorState::Disabled,
            Phase::Active => MonitorState::Active,
            Phase::Warning { remaining_seconds, .. } => MonitorState::Warning { remaining_seconds },
            Phase::Expired { reason } => MonitorState::Expired { reason },
        }
    }

    pub fn config(&self) -> &SessionTimeoutConfig {
        &self.config
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, Phase::Expired { .. })
    }

    pub fn on_login_page(&self) -> bool {
        let path = self.current_path.split(['?', '#']).next().unwrap_or_default();
        normalize_path(path) == normalize_path(&self.login_path)
    }

    pub fn inactivity(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_activity
    }

    pub fn check_deadline(&self) -> Option<DateTime<Utc>> {
        self.check_due
    }

    pub fn countdown_deadline(&self) -> Option<DateTime<Utc>> {
        match self.phase {
            Phase::Warning { countdown_due, .. } => Some(countdown_due),
            _ => None,
        }
    }

    /// Earliest armed timer; `None` means nothing is scheduled
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        match (self.check_due, self.countdown_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Installs a freshly fetched config; only meaningful before `start`
    pub fn apply_config(&mut self, config: SessionTimeoutConfig) -> MonitorResult<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.phase != Phase::Disabled {
            return;
        }
        self.last_activity = now;
        self.phase = Phase::Active;
        self.check_due = Some(now + self.config.check_interval());
        tracing::info!(
            "Session monitor active (timeout {}m, warning {}m, check every {}s)",
            self.config.timeout_minutes,
            self.config.warning_minutes,
            self.config.check_interval_seconds
        );
    }

    pub fn record_activity(&mut self, now: DateTime<Utc>, kind: ActivityKind) -> Vec<Action> {
        match self.phase {
            Phase::Disabled | Phase::Expired { .. } => Vec::new(),
            Phase::Active => {
                self.last_activity = now;
                Vec::new()
            }
            Phase::Warning { .. } => {
                self.last_activity = now;
                self.phase = Phase::Active;
                tracing::info!("Activity ({:?}) during warning, session back to active", kind);
                vec![Action::HideWarning]
            }
        }
    }

    /// Fires every timer whose deadline is at or before `now`. The countdown
    /// is handled first so a simultaneous check cannot race the expiry.
    pub fn on_timer(&mut self, now: DateTime<Utc>) -> Vec<Action> {
        let mut actions = Vec::new();

        if let Phase::Warning { remaining_seconds, countdown_due } = self.phase {
            if countdown_due <= now {
                let remaining_seconds = remaining_seconds.saturating_sub(1);
                if remaining_seconds == 0 {
                    return self.expire(LogoutReason::SessionTimeout);
                }
                self.phase = Phase::Warning {
                    remaining_seconds,
                    countdown_due: countdown_due + Duration::seconds(1),
                };
                actions.push(Action::UpdateCountdown { remaining_seconds });
            }
        }

        if let Some(due) = self.check_due {
            if due <= now {
                self.check_due = Some(now + self.config.check_interval());
                if self.check_in_flight {
                    tracing::debug!("Previous session check still in flight, skipping this tick");
                } else {
                    self.check_in_flight = true;
                    actions.push(Action::SendCheck {
                        last_activity: self.last_activity.timestamp(),
                    });
                }
            }
        }

        actions
    }

    pub fn on_check_response(
        &mut self,
        now: DateTime<Utc>,
        result: MonitorResult<CheckResponse>,
    ) -> Vec<Action> {
        self.check_in_flight = false;
        if matches!(self.phase, Phase::Disabled | Phase::Expired { .. }) {
            return Vec::new();
        }

        let response = match result {
            Ok(response) if response.valid => response,
            Ok(_) | Err(MonitorError::Unauthorized) => return self.on_unauthorized(),
            Err(e) if e.is_transient() => {
                tracing::warn!("Session check failed, retrying next interval: {}", e);
                return Vec::new();
            }
            Err(e) => {
                tracing::error!("Session check could not be sent: {}", e);
                return Vec::new();
            }
        };

        if !response.config.is_empty() {
            self.apply_update(now, &response);
        }

        let mut actions = Vec::new();
        if self.phase == Phase::Active && self.inactivity(now) >= self.config.warning_threshold() {
            let remaining_seconds = self.config.warning_seconds();
            self.phase = Phase::Warning {
                remaining_seconds,
                countdown_due: now + Duration::seconds(1),
            };
            tracing::info!(
                "Inactive for {}s, showing timeout warning ({}s left)",
                self.inactivity(now).num_seconds(),
                remaining_seconds
            );
            actions.push(Action::ShowWarning { remaining_seconds });
        }
        actions
    }

    fn apply_update(&mut self, now: DateTime<Utc>, response: &CheckResponse) {
        match self.config.merge(&response.config) {
            Ok(merged) if merged != self.config => {
                let interval_changed =
                    merged.check_interval_seconds != self.config.check_interval_seconds;
                tracing::info!("Session timeout config updated by server: {:?}", merged);
                self.config = merged;
                if interval_changed {
                    self.check_due = Some(now + self.config.check_interval());
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Ignoring config update from server: {}", e),
        }
    }

    fn on_unauthorized(&mut self) -> Vec<Action> {
        if self.on_login_page() {
            tracing::info!("Session unauthenticated on the login page, monitoring disabled");
            let was_warning = matches!(self.phase, Phase::Warning { .. });
            self.check_due = None;
            self.phase = Phase::Disabled;
            return if was_warning { vec![Action::HideWarning] } else { Vec::new() };
        }
        self.expire(LogoutReason::SessionExpired)
    }

    pub fn continue_session(&mut self) -> Vec<Action> {
        match self.phase {
            Phase::Warning { .. } if !self.extend_in_flight => {
                self.extend_in_flight = true;
                vec![Action::SendExtend]
            }
            _ => Vec::new(),
        }
    }

    pub fn on_extend_response(
        &mut self,
        now: DateTime<Utc>,
        result: MonitorResult<()>,
    ) -> Vec<Action> {
        self.extend_in_flight = false;
        match (self.phase, result) {
            (Phase::Warning { .. }, Ok(())) => {
                self.last_activity = now;
                self.phase = Phase::Active;
                tracing::info!("Session extended");
                vec![
                    Action::HideWarning,
                    Action::Notify {
                        level: NoticeLevel::Success,
                        message: "Session extended successfully".to_string(),
                    },
                ]
            }
            (Phase::Warning { .. }, Err(e)) => {
                tracing::warn!("Failed to extend session: {}", e);
                vec![Action::Notify {
                    level: NoticeLevel::Error,
                    message: "Failed to extend session".to_string(),
                }]
            }
            // Activity already cleared the warning while the request was out
            (Phase::Active, Ok(())) => {
                self.last_activity = now;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Explicit "Logout Now"
    pub fn logout(&mut self) -> Vec<Action> {
        match self.phase {
            Phase::Active | Phase::Warning { .. } => self.expire(LogoutReason::SessionTimeout),
            Phase::Disabled | Phase::Expired { .. } => Vec::new(),
        }
    }

    /// Page unload: cancels every timer
    pub fn shutdown(&mut self) {
        self.check_due = None;
        if !self.is_terminal() {
            self.phase = Phase::Disabled;
        }
    }

    fn expire(&mut self, reason: LogoutReason) -> Vec<Action> {
        let mut actions = Vec::new();
        if matches!(self.phase, Phase::Warning { .. }) {
            actions.push(Action::HideWarning);
        }
        self.check_due = None;
        self.phase = Phase::Expired { reason };
        tracing::info!("Session ended: {}", reason);

        if reason == LogoutReason::SessionTimeout {
            actions.push(Action::SendLogout);
        }
        actions.push(Action::Redirect {
            location: reason.redirect_location(&self.login_path),
        });
        actions
    }
}

fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}
