use crate::domain::entities::recommendation::Recommendation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionOutcome {
    ExecuteTrade,
    Skip,
    Defer,
}

impl fmt::Display for DecisionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionOutcome::ExecuteTrade => write!(f, "EXECUTE_TRADE"),
            DecisionOutcome::Skip => write!(f, "SKIP"),
            DecisionOutcome::Defer => write!(f, "DEFER"),
        }
    }
}

/// One entry in the append-only decision audit trail. Never mutated after
/// creation; the reason string makes the trail self-explanatory without
/// external logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotDecision {
    pub id: String,
    pub symbol: String,
    pub recommendation: Option<Recommendation>,
    pub decision: DecisionOutcome,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl BotDecision {
    pub fn new(
        symbol: &str,
        recommendation: Option<Recommendation>,
        decision: DecisionOutcome,
        reason: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: symbol.to_uppercase(),
            recommendation,
            decision,
            reason: reason.into(),
            timestamp,
        }
    }
}
