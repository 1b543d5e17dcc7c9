//! Conversion of absolute trigger times into non-negative wait durations.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Wait from now until `trigger`; zero when the trigger is now or in the past
pub fn calculate_delay(trigger: DateTime<Utc>) -> Duration {
    calculate_delay_from(trigger, Utc::now())
}

pub fn calculate_delay_from(trigger: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (trigger - now).to_std().unwrap_or(Duration::ZERO)
}

/// Like [`calculate_delay_from`] for an RFC 3339 string. Unparseable input is
/// treated as already due.
pub fn calculate_delay_str(trigger: &str, now: DateTime<Utc>) -> Duration {
    match DateTime::parse_from_rfc3339(trigger.trim()) {
        Ok(parsed) => calculate_delay_from(parsed.with_timezone(&Utc), now),
        Err(_) => Duration::ZERO,
    }
}

/// Whole seconds for queues with second granularity, rounded up so a reminder
/// never fires early
pub fn delay_in_whole_seconds(delay: Duration) -> u64 {
    let secs = delay.as_secs();
    if delay.subsec_nanos() > 0 {
        secs.saturating_add(1)
    } else {
        secs
    }
}
