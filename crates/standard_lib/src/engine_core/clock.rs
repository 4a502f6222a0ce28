use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

/// Simulation/backtest clock.
///
/// Holds a mutable "current time" value that can be set or advanced
/// manually by a backtest driver. Readers always see the most recent
/// simulated timestamp.
pub struct SimClock {
    cur: RwLock<DateTime<Utc>>,
}

impl SimClock {
    /// Construct a new `SimClock` starting at `start`.
    pub fn new(start: DateTime<Utc>) -> Self { Self { cur: RwLock::new(start) } }

    /// Hard-set the simulated time to `t`.
    pub fn set(&self, t: DateTime<Utc>) { *self.cur.write() = t; }

    /// Move the clock forward by `step`, saturating at the end of the
    /// representable range; returns the new time.
    pub fn advance(&self, step: Duration) -> DateTime<Utc> {
        let mut w = self.cur.write();
        *w = w.checked_add_signed(step).unwrap_or(DateTime::<Utc>::MAX_UTC);
        *w
    }

    pub fn now(&self) -> DateTime<Utc> { *self.cur.read() }
}
