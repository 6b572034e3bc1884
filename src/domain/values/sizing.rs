//! Position sizing under two independent caps.
//!
//! A candidate buy is bounded by:
//! - max position size as a fraction of total portfolio value, and
//! - max risk per trade: a fraction of portfolio value divided by the
//!   distance to the stop-loss price.
//!
//! The binding (smaller) constraint determines share count; fractional
//! shares round down. Available cash is a hard ceiling on top of both.

use serde::{Deserialize, Serialize};

/// Configuration for position-sizing calculations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingConfig {
    /// Maximum fraction of portfolio value in any single position (0.0–1.0).
    pub max_position_pct: f64,
    /// Maximum fraction of portfolio value risked per trade (0.0–1.0).
    pub max_risk_per_trade_pct: f64,
    /// Stop-loss distance from entry, as a fraction of entry price (0.0–1.0).
    pub stop_loss_pct: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            max_position_pct: 0.20,
            max_risk_per_trade_pct: 0.02,
            stop_loss_pct: 0.10,
        }
    }
}

/// Result of a sizing calculation.
#[derive(Debug, Clone, Serialize)]
pub struct PositionSizing {
    pub shares: u64,
    pub position_value: f64,
    /// Dollar amount lost if the stop-loss fires at exactly its price.
    pub risk_amount: f64,
    /// Position value as a fraction of total portfolio value.
    pub position_size_ratio: f64,
    /// Which cap determined the share count.
    pub binding_constraint: Option<String>,
}

/// Compute a position size for a buy at `price`.
///
/// Returns `None` for unusable inputs (non-positive price, zero portfolio,
/// degenerate stop distance).
pub fn compute_position_size(
    price: f64,
    portfolio_value: f64,
    available_cash: f64,
    config: &SizingConfig,
) -> Option<PositionSizing> {
    if price <= 0.0 || portfolio_value <= 0.0 || config.stop_loss_pct <= 0.0 {
        return None;
    }

    let max_position_value = portfolio_value * config.max_position_pct;
    let risk_budget = portfolio_value * config.max_risk_per_trade_pct;
    // Loss per share if the stop fires.
    let risk_per_share = price * config.stop_loss_pct;

    let shares_by_position = (max_position_value / price).floor() as u64;
    let shares_by_risk = (risk_budget / risk_per_share).floor() as u64;
    let shares_by_cash = (available_cash.max(0.0) / price).floor() as u64;

    let mut shares = shares_by_position;
    let mut binding = Some("max_position_pct".to_string());
    if shares_by_risk < shares {
        shares = shares_by_risk;
        binding = Some("max_risk_per_trade_pct".to_string());
    }
    if shares_by_cash < shares {
        shares = shares_by_cash;
        binding = Some("available_cash".to_string());
    }
    if shares == 0 {
        binding = None;
    }

    let position_value = shares as f64 * price;
    Some(PositionSizing {
        shares,
        position_value,
        risk_amount: shares as f64 * risk_per_share,
        position_size_ratio: position_value / portfolio_value,
        binding_constraint: binding,
    })
}
