//! Portfolio risk scoring.
//!
//! Concentration risk is the largest single holding's share of total value.
//! Diversification is scored from the normalized Herfindahl index across
//! holdings: more positions with flatter weights score higher.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-recommendation risk label supplied by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Normalize a raw risk string from model output; unknown values are
    /// treated as Medium rather than rejected.
    pub fn from_raw(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "LOW" => RiskLevel::Low,
            "HIGH" => RiskLevel::High,
            _ => RiskLevel::Medium,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}

impl FromStr for RiskLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOW" => Ok(RiskLevel::Low),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "HIGH" => Ok(RiskLevel::High),
            _ => Err(format!("Unknown risk level: {s}")),
        }
    }
}

/// Portfolio-wide risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OverallRisk {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for OverallRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallRisk::Low => write!(f, "LOW"),
            OverallRisk::Medium => write!(f, "MEDIUM"),
            OverallRisk::High => write!(f, "HIGH"),
            OverallRisk::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Tunable boundaries for mapping concentration/diversification into an
/// overall risk level. Exposed as configuration, never hard-coded at call
/// sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskThresholds {
    /// Concentration (0.0–1.0) at or above which the portfolio is CRITICAL.
    pub critical_concentration: f64,
    /// Concentration at or above which the portfolio is HIGH.
    pub high_concentration: f64,
    /// Concentration at or above which the portfolio is MEDIUM.
    pub medium_concentration: f64,
    /// Diversification score (0–100) below which risk is bumped one level.
    pub low_diversification_floor: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            critical_concentration: 0.60,
            high_concentration: 0.40,
            medium_concentration: 0.25,
            low_diversification_floor: 30.0,
        }
    }
}

/// On-demand snapshot of portfolio-level risk. Never persisted by the core.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioRiskSnapshot {
    pub overall_risk: OverallRisk,
    /// 0–100; higher is better diversified.
    pub diversification_score: f64,
    /// Largest single holding's share of total value, as a percentage.
    pub concentration_risk_pct: f64,
    pub holding_count: usize,
}

impl PortfolioRiskSnapshot {
    /// Snapshot for an empty portfolio: nothing at risk, nothing diversified.
    pub fn empty() -> Self {
        Self {
            overall_risk: OverallRisk::Low,
            diversification_score: 0.0,
            concentration_risk_pct: 0.0,
            holding_count: 0,
        }
    }
}

/// Map concentration (0.0–1.0) and diversification (0–100) to an overall
/// level using the configured thresholds.
pub fn classify_risk(
    concentration: f64,
    diversification: f64,
    thresholds: &RiskThresholds,
) -> OverallRisk {
    let base = if concentration >= thresholds.critical_concentration {
        OverallRisk::Critical
    } else if concentration >= thresholds.high_concentration {
        OverallRisk::High
    } else if concentration >= thresholds.medium_concentration {
        OverallRisk::Medium
    } else {
        OverallRisk::Low
    };

    // Poor diversification bumps everything below CRITICAL up one level.
    if diversification < thresholds.low_diversification_floor {
        match base {
            OverallRisk::Low => OverallRisk::Medium,
            OverallRisk::Medium => OverallRisk::High,
            OverallRisk::High | OverallRisk::Critical => OverallRisk::Critical,
        }
    } else {
        base
    }
}
