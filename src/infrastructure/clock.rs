use crate::domain::ports::clock::Clock;
use chrono::{DateTime, Utc};

/// Wall-clock time source for production wiring.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
