//! Calendar helpers

use chrono::{DateTime, Datelike, Duration, Utc};

/// `true` when `now` falls on the last day of its calendar month.
///
/// Schedulers that cannot express "last day of month" run the monthly
/// rating task on every candidate day (28th-31st); the handler uses this
/// to decide whether to actually publish.
pub fn is_last_day_of_month(now: DateTime<Utc>) -> bool {
    (now + Duration::days(1)).month() != now.month()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_last_day_detection() {
        let eom = Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 0).unwrap();
        assert!(is_last_day_of_month(eom));

        let mid = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        assert!(!is_last_day_of_month(mid));

        // February, leap year.
        let leap = Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap();
        assert!(is_last_day_of_month(leap));
        let not_leap_end = Utc.with_ymd_and_hms(2024, 2, 28, 0, 0, 0).unwrap();
        assert!(!is_last_day_of_month(not_leap_end));
    }
}
