//! Countdown arithmetic.
//!
//! Every value here is recomputed from the session's anchor timestamp and the
//! current time. Nothing is accumulated tick by tick.

use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};

/// Length of a quiz attempt.
pub const DURATION_LIMIT_SECS: u32 = 30 * 60;

/// Below this many seconds the timer is shown as running low.
pub const LOW_TIME_WARNING_SECS: u32 = 5 * 60;

/// Period of the countdown tick.
pub const TICK_INTERVAL: StdDuration = StdDuration::from_secs(1);

/// Whole seconds elapsed since `started_at`, floored. A `now` earlier than the
/// anchor counts as zero elapsed.
#[must_use]
pub fn elapsed_secs(started_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let elapsed_ms = (now - started_at).num_milliseconds();
    u64::try_from(elapsed_ms.div_euclid(1000)).unwrap_or(0)
}

/// `max(0, limit − floor(elapsed))`, in seconds.
#[must_use]
pub fn remaining_secs(started_at: DateTime<Utc>, now: DateTime<Utc>, limit_secs: u32) -> u32 {
    let elapsed = elapsed_secs(started_at, now);
    let remaining = u64::from(limit_secs).saturating_sub(elapsed);
    u32::try_from(remaining).unwrap_or(0)
}

#[must_use]
pub fn is_expired(remaining_secs: u32) -> bool {
    remaining_secs == 0
}

#[must_use]
pub fn is_low_time(remaining_secs: u32) -> bool {
    remaining_secs < LOW_TIME_WARNING_SECS
}
