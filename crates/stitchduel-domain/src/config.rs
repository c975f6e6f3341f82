//! Engine configuration

use std::time::Duration;

use chrono::{DateTime, Utc};

const SECOND: Duration = Duration::from_secs(1);
const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(60 * 60);
const DAY: Duration = Duration::from_secs(60 * 60 * 24);

/// What happens to a sender's other pending requests once one is accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiblingCleanup {
    /// Remove every sibling; the ones with an outward message marker get
    /// their notification edited first, the rest vanish silently
    All,
    /// Only remove siblings whose outward notification can be edited;
    /// unmarked siblings are left to expire on their own
    MarkedOnly,
}

/// Timing and policy knobs for the duel lifecycle engine
#[derive(Debug, Clone)]
pub struct DuelConfig {
    /// How long a duel request stays pending before it expires
    pub request_validity: Duration,
    /// How long a duel runs from start to deadline
    pub duel_period: Duration,
    /// Offsets from duel start at which report reminders fire
    pub report_reminder_offsets: Vec<Duration>,
    /// Extra completion delay per duel index in a weekly batch, so the
    /// result postings do not land in one burst
    pub completion_stagger: Duration,
    pub sibling_cleanup: SiblingCleanup,
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            request_validity: HOUR,
            duel_period: DAY,
            report_reminder_offsets: vec![
                20 * HOUR,            // 4 hours before the deadline
                23 * HOUR,            // 1 hour before the deadline
                23 * HOUR + 45 * MINUTE, // 15 minutes before the deadline
            ],
            completion_stagger: 30 * SECOND,
            sibling_cleanup: SiblingCleanup::All,
        }
    }
}

impl DuelConfig {
    /// Load overrides from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            request_validity: env_secs("DUEL_REQUEST_VALIDITY_SECS")
                .unwrap_or(defaults.request_validity),
            duel_period: env_secs("DUEL_PERIOD_SECS").unwrap_or(defaults.duel_period),
            report_reminder_offsets: defaults.report_reminder_offsets,
            completion_stagger: env_secs("DUEL_COMPLETION_STAGGER_SECS")
                .unwrap_or(defaults.completion_stagger),
            sibling_cleanup: match std::env::var("DUEL_SIBLING_CLEANUP").as_deref() {
                Ok("marked-only") => SiblingCleanup::MarkedOnly,
                _ => defaults.sibling_cleanup,
            },
        }
    }

    /// Deadline of a duel started at `started_at`
    pub fn deadline_for(&self, started_at: DateTime<Utc>) -> DateTime<Utc> {
        started_at + chrono_duration(self.duel_period)
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Convert a configured std duration to chrono, saturating on overflow
fn chrono_duration(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}
