use chrono::{DateTime, Utc};
use quiz_core::countdown::{DURATION_LIMIT_SECS, is_expired, is_low_time, remaining_secs};

use crate::Clock;

/// One observation of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    pub remaining_secs: u32,
    pub is_low_time: bool,
    pub is_expired: bool,
}

impl CountdownTick {
    #[must_use]
    pub fn from_remaining(remaining_secs: u32) -> Self {
        Self {
            remaining_secs,
            is_low_time: is_low_time(remaining_secs),
            is_expired: is_expired(remaining_secs),
        }
    }
}

/// Wall-clock countdown anchored at the session start.
///
/// Every observation recomputes from the anchor, so a delayed or skipped tick
/// never drifts the displayed time away from the real deadline.
#[derive(Debug, Clone)]
pub struct Countdown {
    started_at: DateTime<Utc>,
    limit_secs: u32,
    clock: Clock,
}

impl Countdown {
    #[must_use]
    pub fn new(started_at: DateTime<Utc>, clock: Clock) -> Self {
        Self {
            started_at,
            limit_secs: DURATION_LIMIT_SECS,
            clock,
        }
    }

    #[must_use]
    pub fn observe(&self) -> CountdownTick {
        self.observe_at(self.clock.now())
    }

    #[must_use]
    pub fn observe_at(&self, now: DateTime<Utc>) -> CountdownTick {
        CountdownTick::from_remaining(remaining_secs(self.started_at, now, self.limit_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::time::fixed_now;

    #[test]
    fn observation_follows_the_clock_not_a_counter() {
        let mut clock = Clock::manual(fixed_now());
        let countdown = Countdown::new(fixed_now(), clock.clone());

        assert_eq!(countdown.observe().remaining_secs, 1800);

        // A stalled ticker that wakes up late still sees the true remaining time.
        clock.advance(Duration::seconds(1500));
        let tick = countdown.observe();
        assert_eq!(tick.remaining_secs, 300);
        assert!(!tick.is_low_time);

        clock.advance(Duration::seconds(1));
        assert!(countdown.observe().is_low_time);
    }

    #[test]
    fn expired_on_reload_after_deadline() {
        let clock = Clock::fixed(fixed_now() + Duration::seconds(1805));
        let tick = Countdown::new(fixed_now(), clock).observe();

        assert_eq!(tick.remaining_secs, 0);
        assert!(tick.is_expired);
    }
}
