//! Per-provider daily request budgets.
//!
//! Records reset lazily the first time they are touched on a new calendar
//! day (date-string comparison against the injected clock), so no background
//! timer is needed. All mutation happens under one mutex; concurrent fetches
//! within a scan cycle cannot over-consume past a limit.

use crate::domain::ports::clock::Clock;
use crate::domain::ports::model_provider::ProviderKind;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct QuotaRecord {
    date: String,
    used: u32,
    limit: u32,
}

/// Read-only view of one provider's budget.
#[derive(Debug, Clone, Serialize)]
pub struct QuotaUsage {
    pub provider: ProviderKind,
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
    pub percent_used: f64,
    /// Start of the next calendar day, when the record resets.
    pub resets_at: DateTime<Utc>,
}

pub struct QuotaTracker {
    clock: Arc<dyn Clock>,
    records: Mutex<HashMap<ProviderKind, QuotaRecord>>,
}

impl QuotaTracker {
    pub fn new(clock: Arc<dyn Clock>, daily_limits: &HashMap<ProviderKind, u32>) -> Self {
        let today = clock.today();
        let records = daily_limits
            .iter()
            .map(|(provider, limit)| {
                (
                    *provider,
                    QuotaRecord {
                        date: today.clone(),
                        used: 0,
                        limit: *limit,
                    },
                )
            })
            .collect();
        Self {
            clock,
            records: Mutex::new(records),
        }
    }

    /// Whether one more request would fit under the provider's daily limit.
    pub fn can_consume(&self, provider: ProviderKind) -> bool {
        let mut records = self.records.lock().unwrap();
        let today = self.clock.today();
        match records.get_mut(&provider) {
            Some(record) => {
                roll_over(record, &today);
                record.used < record.limit
            }
            None => false,
        }
    }

    /// Atomically increment usage iff under the limit. Returns false (and
    /// changes nothing) once the limit is reached.
    pub fn consume(&self, provider: ProviderKind) -> bool {
        let mut records = self.records.lock().unwrap();
        let today = self.clock.today();
        match records.get_mut(&provider) {
            Some(record) => {
                roll_over(record, &today);
                if record.used < record.limit {
                    record.used += 1;
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }

    pub fn usage(&self, provider: ProviderKind) -> Option<QuotaUsage> {
        let mut records = self.records.lock().unwrap();
        let today = self.clock.today();
        let record = records.get_mut(&provider)?;
        roll_over(record, &today);
        let next_midnight = (self.clock.now() + Duration::days(1))
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or_else(|| self.clock.now());
        Some(QuotaUsage {
            provider,
            used: record.used,
            limit: record.limit,
            remaining: record.limit.saturating_sub(record.used),
            percent_used: if record.limit > 0 {
                record.used as f64 / record.limit as f64 * 100.0
            } else {
                100.0
            },
            resets_at: next_midnight,
        })
    }

    pub fn all_usage(&self) -> Vec<QuotaUsage> {
        ProviderKind::PRIORITY
            .iter()
            .filter_map(|p| self.usage(*p))
            .collect()
    }

    /// Pick the preferred provider if the caller has an adapter for it and
    /// it has budget, otherwise the first provider in priority order that
    /// satisfies both. Quota limits may name providers the caller never
    /// registered (e.g. no API key), so selection intersects `among` with
    /// the budgets. `None` means no usable provider remains and the caller
    /// must degrade gracefully.
    pub fn best_available(
        &self,
        preferred: ProviderKind,
        among: &[ProviderKind],
    ) -> Option<ProviderKind> {
        if among.contains(&preferred) && self.can_consume(preferred) {
            return Some(preferred);
        }
        ProviderKind::PRIORITY
            .iter()
            .copied()
            .filter(|p| *p != preferred && among.contains(p))
            .find(|p| self.can_consume(*p))
    }
}

fn roll_over(record: &mut QuotaRecord, today: &str) {
    if record.date != today {
        record.date = today.to_string();
        record.used = 0;
    }
}
