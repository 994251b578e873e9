//! Fire-time arithmetic for daily reminders.

use chrono::{DateTime, LocalResult, NaiveDateTime, NaiveTime, TimeZone};
use std::time::Duration;

/// The next instant strictly after `now` whose local wall-clock time is `at`.
///
/// Today's occurrence is used if it is still in the future; an occurrence
/// equal to `now` counts as passed and rolls over to tomorrow.
pub fn next_fire_time<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> DateTime<Tz> {
    let tz = now.timezone();
    let today = now.date_naive();

    let candidate = resolve_local(&tz, today.and_time(at));
    if candidate > *now {
        return candidate;
    }

    let tomorrow = today.succ_opt().unwrap_or(today);
    resolve_local(&tz, tomorrow.and_time(at))
}

/// Milliseconds from `now` until the next occurrence of `at`.
///
/// Always positive: the target is strictly in the future. Sub-millisecond
/// remainders are truncated.
pub fn compute_initial_delay<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> Duration {
    let target = next_fire_time(now, at);
    let millis = (target - now.clone()).num_milliseconds().max(0);
    Duration::from_millis(millis as u64)
}

/// Map a local wall-clock time onto the timeline.
///
/// Ambiguous times (clocks going back) take the earlier instant. Times inside
/// a spring-forward gap are pushed one hour later.
fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let shifted = local + chrono::Duration::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .unwrap_or_else(|| tz.from_utc_datetime(&local))
        }
    }
}
