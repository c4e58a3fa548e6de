//! Client-side session timeout monitor.
//!
//! [`SessionMonitor`] is the pure state machine (Disabled → Active ⇄ Warning →
//! Expired); [`driver`] runs it on a tokio task against a [`SessionApi`],
//! a [`WarningView`] and a [`Navigator`].

pub mod client;
pub mod clock;
pub mod config;
pub mod driver;
pub mod error;
pub mod machine;
pub mod state;
pub mod view;

pub use client::{HttpSessionApi, SessionApi};
pub use clock::{Clock, MonotonicClock};
pub use config::{ConfigUpdate, SessionTimeoutConfig};
pub use driver::{spawn, MonitorControl, MonitorDeps, MonitorHandle};
pub use error::{MonitorError, MonitorResult};
pub use machine::{Action, SessionMonitor};
pub use state::{ActivityKind, LogoutReason, MonitorOutcome, MonitorState, NoticeLevel};
pub use view::{format_countdown, Navigator, WarningView};
