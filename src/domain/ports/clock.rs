use chrono::{DateTime, Utc};

/// Injected time source. Quota rollover and cache validity compare calendar
/// dates, so tests need to simulate day boundaries deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Today's calendar date as `YYYY-MM-DD`.
    fn today(&self) -> String {
        self.now().format("%Y-%m-%d").to_string()
    }
}
