//! Calendar helpers for promise dates.

use chrono::NaiveDate;

/// Whole days from `start` to `end` (negative when `end` is earlier).
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Human label for `date` relative to `today`.
pub fn relative_label(date: NaiveDate, today: NaiveDate) -> String {
    match days_between(today, date) {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        n if n > 1 => format!("In {} days", n),
        n => format!("{} days ago", -n),
    }
}
