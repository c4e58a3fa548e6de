use chrono::{DateTime, Duration, Utc};
use tokio::time::Instant;

/// Source of "now" for the monitor
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time that only moves forward.
///
/// The wall time is sampled once and then advanced by the tokio monotonic
/// clock, so system clock jumps do not shift deadlines and paused tokio
/// time in tests drives it as well.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    anchor_wall: DateTime<Utc>,
    anchor: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            anchor_wall: Utc::now(),
            anchor: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = Duration::from_std(self.anchor.elapsed()).unwrap_or_else(|_| Duration::zero());
        self.anchor_wall + elapsed
    }
}

/// Converts a deadline into a sleep length, clamped at zero
pub fn until(clock: &dyn Clock, deadline: DateTime<Utc>) -> std::time::Duration {
    (deadline - clock.now())
        .to_std()
        .unwrap_or(std::time::Duration::ZERO)
}
