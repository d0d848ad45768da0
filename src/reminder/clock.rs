use chrono::{DateTime, Local, TimeZone, Utc};

/// Wall-clock source for the scheduler, with the zone that "09:00" means.
pub trait Clock: Send + Sync + 'static {
    type Tz: TimeZone + Send + Sync + 'static;

    fn now(&self) -> DateTime<Utc>;

    fn zone(&self) -> Self::Tz;
}

/// The system clock in the machine's local zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Tz = Local;

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn zone(&self) -> Local {
        Local
    }
}
