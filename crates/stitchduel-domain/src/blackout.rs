//! Pre-batch blackout policy
//!
//! Ad-hoc duel requests are disallowed during the window leading up to the
//! weekly random duel draw, so nobody can slip into a private duel right
//! before being paired. The window is a policy the engine receives, not a
//! constant baked into the request flow.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};

/// Decides whether a moment falls inside the pre-batch blackout window
pub trait BlackoutPolicy: Send + Sync {
    fn is_blackout(&self, now: DateTime<Utc>) -> bool;
}

/// The production window: from `start` (weekday, hour, inclusive) through
/// the end of `end`'s hour on the following weekday, in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreBatchBlackout {
    pub start_day: Weekday,
    pub start_hour: u32,
    pub end_day: Weekday,
    pub end_hour: u32,
}

impl Default for PreBatchBlackout {
    fn default() -> Self {
        // The weekly draw happens Saturday morning; requests freeze from
        // Friday 07:00 UTC through Saturday 07:59 UTC.
        Self {
            start_day: Weekday::Fri,
            start_hour: 7,
            end_day: Weekday::Sat,
            end_hour: 7,
        }
    }
}

impl BlackoutPolicy for PreBatchBlackout {
    fn is_blackout(&self, now: DateTime<Utc>) -> bool {
        let (day, hour) = (now.weekday(), now.hour());
        (day == self.start_day && hour >= self.start_hour)
            || (day == self.end_day && hour <= self.end_hour)
    }
}

/// Policy that never blocks; used in tests and local development
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBlackout;

impl BlackoutPolicy for NoBlackout {
    fn is_blackout(&self, _now: DateTime<Utc>) -> bool {
        false
    }
}
