//! One day's worth of scored recommendations.
//!
//! Recommendations are expensive (rate-limited model calls) and represent
//! "today's market read", so validity is whole-day: a set dated any other
//! day, or written by an older schema, is purged on read rather than
//! partially reused.

use crate::domain::entities::recommendation::{Recommendation, RecommendationStats};
use crate::domain::ports::clock::Clock;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Bumped whenever the shape of the cached set changes, so a deploy never
/// serves structurally incompatible data from a previous run.
pub const CACHE_SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Clone, Serialize)]
pub struct CachedRecommendations {
    pub date: String,
    pub generated_at: DateTime<Utc>,
    pub recommendations: Vec<Recommendation>,
    pub market_analysis: String,
    pub top_opportunities: Vec<Recommendation>,
    pub stats: RecommendationStats,
    pub version: u32,
}

pub struct RecommendationCache {
    clock: Arc<dyn Clock>,
    entry: Mutex<Option<CachedRecommendations>>,
}

impl RecommendationCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entry: Mutex::new(None),
        }
    }

    /// Today's set, if present and structurally current. A stale or
    /// version-mismatched entry is purged as a side effect.
    pub fn get(&self) -> Option<CachedRecommendations> {
        let mut entry = self.entry.lock().unwrap();
        match entry.as_ref() {
            Some(cached)
                if cached.date == self.clock.today() && cached.version == CACHE_SCHEMA_VERSION =>
            {
                Some(cached.clone())
            }
            Some(_) => {
                *entry = None;
                None
            }
            None => None,
        }
    }

    /// Replace the cached set wholesale; never merged incrementally.
    pub fn put(
        &self,
        recommendations: Vec<Recommendation>,
        market_analysis: String,
        top_opportunities: Vec<Recommendation>,
    ) {
        let stats = RecommendationStats::from_recommendations(&recommendations);
        let cached = CachedRecommendations {
            date: self.clock.today(),
            generated_at: self.clock.now(),
            recommendations,
            market_analysis,
            top_opportunities,
            stats,
            version: CACHE_SCHEMA_VERSION,
        };
        *self.entry.lock().unwrap() = Some(cached);
    }

    pub fn clear(&self) {
        *self.entry.lock().unwrap() = None;
    }

    pub fn is_stale(&self) -> bool {
        let entry = self.entry.lock().unwrap();
        match entry.as_ref() {
            Some(cached) => {
                cached.date != self.clock.today() || cached.version != CACHE_SCHEMA_VERSION
            }
            None => true,
        }
    }

    #[cfg(test)]
    fn corrupt_version(&self) {
        if let Some(cached) = self.entry.lock().unwrap().as_mut() {
            cached.version = CACHE_SCHEMA_VERSION - 1;
        }
    }

    /// Human-readable age description. Informational only; never used for
    /// control flow.
    pub fn status_message(&self) -> String {
        let entry = self.entry.lock().unwrap();
        match entry.as_ref() {
            None => "no cached recommendations".to_string(),
            Some(cached) if cached.version != CACHE_SCHEMA_VERSION => {
                "cached recommendations use an outdated schema".to_string()
            }
            Some(cached) if cached.date != self.clock.today() => {
                format!("cached recommendations are from {}", cached.date)
            }
            Some(cached) => {
                let age = self.clock.now() - cached.generated_at;
                let mins = age.num_minutes();
                if mins < 1 {
                    "recommendations generated moments ago".to_string()
                } else if mins < 60 {
                    format!("recommendations generated {mins} minutes ago")
                } else {
                    format!("recommendations generated {} hours ago", mins / 60)
                }
            }
        }
    }
}
