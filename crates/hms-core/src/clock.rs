//! Time source used for registration defaults, ages and date-of-birth checks.

use std::fmt::Debug;
use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveDateTime};

/// Supplies the current local date and time.
pub trait Clock: Debug + Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Clock shared between the connection provider and the patient service.
pub type SharedClock = Arc<dyn Clock>;

/// Wall clock in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock pinned to one instant, for deterministic ages in tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    /// Pin the clock to midnight of `date`.
    pub fn at_date(date: NaiveDate) -> Self {
        Self(date.and_time(chrono::NaiveTime::MIN))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Default shared clock.
pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}
