use crate::domain::values::action::TradeAction;
use crate::domain::values::risk::RiskLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scored trade opinion for one symbol, as ingested from a provider.
///
/// All fields are normalized on ingestion: confidence is clamped to
/// [0, 100] and unrecognized actions coerce to HOLD. The decision layer
/// always receives either a usable recommendation or an explicit failure,
/// never a half-valid one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub symbol: String,
    pub action: TradeAction,
    /// 0–100.
    pub confidence: f64,
    pub reasoning: String,
    pub risk_level: RiskLevel,
    pub target_price: Option<f64>,
    pub current_price: f64,
    /// Which provider produced this opinion.
    pub provider: String,
    pub generated_at: DateTime<Utc>,
}

/// The raw structured fields a provider is asked to emit. Deserialized
/// leniently; everything is re-validated by [`Recommendation::from_raw`].
#[derive(Debug, Deserialize)]
pub struct RawRecommendation {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub risk_level: String,
    #[serde(default)]
    pub target_price: Option<f64>,
}

impl Recommendation {
    /// Build a validated recommendation from raw provider output.
    pub fn from_raw(
        symbol: &str,
        raw: RawRecommendation,
        current_price: f64,
        provider: &str,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            action: TradeAction::from_raw(&raw.action),
            confidence: raw.confidence.clamp(0.0, 100.0),
            reasoning: raw.reasoning,
            risk_level: RiskLevel::from_raw(&raw.risk_level),
            target_price: raw.target_price.filter(|p| *p > 0.0),
            current_price,
            provider: provider.to_string(),
            generated_at,
        }
    }
}

/// Aggregate stats over one day's recommendation set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationStats {
    pub total: usize,
    pub buys: usize,
    pub sells: usize,
    pub holds: usize,
    pub avg_confidence: f64,
}

impl RecommendationStats {
    pub fn from_recommendations(recs: &[Recommendation]) -> Self {
        let total = recs.len();
        let buys = recs.iter().filter(|r| r.action == TradeAction::Buy).count();
        let sells = recs.iter().filter(|r| r.action == TradeAction::Sell).count();
        let avg_confidence = if total > 0 {
            recs.iter().map(|r| r.confidence).sum::<f64>() / total as f64
        } else {
            0.0
        };
        Self {
            total,
            buys,
            sells,
            holds: total - buys - sells,
            avg_confidence,
        }
    }
}
