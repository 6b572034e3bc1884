use crate::domain::entities::recommendation::Recommendation;
use crate::domain::values::action::TradeAction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeStatus::Pending => write!(f, "PENDING"),
            TradeStatus::Completed => write!(f, "COMPLETED"),
            TradeStatus::Failed => write!(f, "FAILED"),
            TradeStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// A trade the engine has decided to make, waiting for the drainer.
/// Immutable once COMPLETED or FAILED.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedTrade {
    pub id: String,
    pub symbol: String,
    pub action: TradeAction,
    pub quantity: u64,
    pub target_price: f64,
    /// The recommendation that motivated this trade, frozen at decision time.
    pub recommendation: Recommendation,
    pub scheduled_for: DateTime<Utc>,
    pub status: TradeStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
}

impl QueuedTrade {
    pub fn new(
        recommendation: Recommendation,
        quantity: u64,
        scheduled_for: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: recommendation.symbol.clone(),
            action: recommendation.action,
            quantity,
            target_price: recommendation.current_price,
            recommendation,
            scheduled_for,
            status: TradeStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
            failure_reason: None,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == TradeStatus::Pending && now >= self.scheduled_for
    }

    pub fn complete(&mut self, at: DateTime<Utc>) {
        if self.status == TradeStatus::Pending {
            self.status = TradeStatus::Completed;
            self.completed_at = Some(at);
        }
    }

    pub fn fail(&mut self, at: DateTime<Utc>, reason: String) {
        if self.status == TradeStatus::Pending {
            self.status = TradeStatus::Failed;
            self.completed_at = Some(at);
            self.failure_reason = Some(reason);
        }
    }

    pub fn cancel(&mut self) {
        if self.status == TradeStatus::Pending {
            self.status = TradeStatus::Cancelled;
        }
    }
}
