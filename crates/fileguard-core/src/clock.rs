//! Time source for record timestamps.
//!
//! Every timestamp written to the baseline comes from a [`Clock`], truncated
//! to whole seconds in UTC.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use parking_lot::Mutex;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock UTC time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(0)
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(start.trunc_subsecs(0)),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.current.lock() = at.trunc_subsecs(0);
    }

    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock();
        *current = (*current + by).trunc_subsecs(0);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
