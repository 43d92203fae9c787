use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::domain::ports::Clock;

/// Clock that only moves when told to. Used by tests and demo seeding.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    pub fn advance_days(&self, days: i64) {
        self.advance(Duration::days(days));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn advances_by_whole_days() {
        let start = Utc.with_ymd_and_hms(2025, 1, 31, 23, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        clock.advance_days(1);
        assert_eq!(clock.today().to_string(), "2025-02-01");
        clock.set(start);
        assert_eq!(clock.now(), start);
    }
}
