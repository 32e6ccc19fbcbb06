// SPDX-License-Identifier: MIT
//! Injected time source.
//!
//! Streak continuity and challenge scheduling are calendar-day computations,
//! so "now" is a dependency, not an ambient global. Production wires in
//! [`SystemClock`]; tests pin and advance a [`FixedClock`].

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::RwLock;

pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test clock pinned to an instant. Advance it to cross day boundaries.
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write().expect("clock lock poisoned") = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().expect("clock lock poisoned");
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.read().expect("clock lock poisoned")
    }
}

/// Calendar day of `now` under the configured UTC offset.
///
/// The offset is applied before truncating, so a user configured at
/// UTC+2 who plays at 23:30 UTC is credited on the next calendar day.
/// The host-process local timezone is never consulted.
pub fn local_date(now: DateTime<Utc>, utc_offset_minutes: i32) -> NaiveDate {
    (now + Duration::minutes(utc_offset_minutes as i64)).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::at(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
        clock.advance(Duration::hours(13));
        assert_eq!(
            clock.now_utc(),
            Utc.with_ymd_and_hms(2026, 3, 2, 1, 0, 0).unwrap()
        );
    }

    #[test]
    fn local_date_applies_offset_across_midnight() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 23, 30, 0).unwrap();
        assert_eq!(local_date(now, 0).to_string(), "2026-03-01");
        // UTC+2: 23:30 UTC is already 01:30 the next day.
        assert_eq!(local_date(now, 120).to_string(), "2026-03-02");
        // UTC-5: still the same day.
        assert_eq!(local_date(now, -300).to_string(), "2026-03-01");
    }
}
