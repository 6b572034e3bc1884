//! Portfolio-level risk assessment and per-holding exit targets.

use crate::config::BotConfig;
use crate::domain::entities::recommendation::Recommendation;
use crate::domain::ports::portfolio::Holding;
use crate::domain::values::risk::{classify_risk, PortfolioRiskSnapshot};
use crate::domain::values::sizing::{compute_position_size, PositionSizing};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitTargetKind {
    StopLoss,
    TakeProfit,
    TrailingStop,
}

/// A holding whose market price has crossed one of its exit thresholds.
#[derive(Debug, Clone, Serialize)]
pub struct ExitTarget {
    pub symbol: String,
    pub kind: ExitTargetKind,
    pub current_price: f64,
    pub threshold_price: f64,
    pub quantity: u64,
}

pub struct RiskManager {
    config: BotConfig,
    /// Highest price observed per symbol since the position was opened.
    /// Ratchets upward only; used by the trailing-stop check.
    high_water_marks: Mutex<HashMap<String, f64>>,
}

impl RiskManager {
    pub fn new(config: BotConfig) -> Self {
        Self {
            config,
            high_water_marks: Mutex::new(HashMap::new()),
        }
    }

    /// Recompute portfolio risk from current holdings. Concentration is the
    /// largest holding's share of total value; diversification comes from
    /// the normalized Herfindahl index across all holdings.
    pub fn assess_portfolio_risk(&self, holdings: &HashMap<String, Holding>) -> PortfolioRiskSnapshot {
        let values: Vec<f64> = holdings
            .values()
            .filter(|h| h.quantity > 0)
            .map(|h| h.market_value())
            .collect();
        let total: f64 = values.iter().sum();
        if values.is_empty() || total <= 0.0 {
            return PortfolioRiskSnapshot::empty();
        }

        let largest = values.iter().cloned().fold(0.0_f64, f64::max);
        let concentration = largest / total;

        let n = values.len() as f64;
        let herfindahl: f64 = values.iter().map(|v| (v / total).powi(2)).sum();
        // Normalize so a single holding scores 0 and perfectly flat weights
        // score 100.
        let diversification = if values.len() == 1 {
            0.0
        } else {
            100.0 * (1.0 - (herfindahl - 1.0 / n) / (1.0 - 1.0 / n))
        };

        PortfolioRiskSnapshot {
            overall_risk: classify_risk(concentration, diversification, &self.config.risk_thresholds),
            diversification_score: diversification,
            concentration_risk_pct: concentration * 100.0,
            holding_count: values.len(),
        }
    }

    /// Find every holding whose current price has crossed its stop-loss,
    /// take-profit, or trailing-stop threshold. Stop-loss wins over the
    /// trailing check when both would fire.
    pub fn check_exit_targets(&self, holdings: &HashMap<String, Holding>) -> Vec<ExitTarget> {
        let mut targets = Vec::new();
        let mut marks = self.high_water_marks.lock().unwrap();

        for holding in holdings.values() {
            if holding.quantity == 0 {
                continue;
            }

            let mark = marks
                .entry(holding.symbol.clone())
                .or_insert(holding.avg_price);
            if holding.current_price > *mark {
                *mark = holding.current_price;
            }
            let trailing_stop_price = *mark * (1.0 - self.config.stop_loss_pct);

            let stop_price = holding.avg_price * (1.0 - self.config.stop_loss_pct);
            let take_profit_price = holding.avg_price * (1.0 + self.config.take_profit_pct);

            if holding.current_price <= stop_price {
                targets.push(ExitTarget {
                    symbol: holding.symbol.clone(),
                    kind: ExitTargetKind::StopLoss,
                    current_price: holding.current_price,
                    threshold_price: stop_price,
                    quantity: holding.quantity,
                });
            } else if holding.current_price >= take_profit_price {
                targets.push(ExitTarget {
                    symbol: holding.symbol.clone(),
                    kind: ExitTargetKind::TakeProfit,
                    current_price: holding.current_price,
                    threshold_price: take_profit_price,
                    quantity: holding.quantity,
                });
            } else if holding.current_price <= trailing_stop_price {
                targets.push(ExitTarget {
                    symbol: holding.symbol.clone(),
                    kind: ExitTargetKind::TrailingStop,
                    current_price: holding.current_price,
                    threshold_price: trailing_stop_price,
                    quantity: holding.quantity,
                });
            }
        }

        targets
    }

    /// Size a buy recommended at its current price. `None` for unusable
    /// inputs (see [`compute_position_size`]).
    pub fn size_position(
        &self,
        recommendation: &Recommendation,
        portfolio_value: f64,
        available_cash: f64,
    ) -> Option<PositionSizing> {
        compute_position_size(
            recommendation.current_price,
            portfolio_value,
            available_cash,
            &self.config.sizing(),
        )
    }

    /// Drop the high-water mark for a closed position so a re-entry starts
    /// fresh.
    pub fn forget_symbol(&self, symbol: &str) {
        self.high_water_marks.lock().unwrap().remove(symbol);
    }

    #[cfg(test)]
    pub fn high_water_mark(&self, symbol: &str) -> Option<f64> {
        self.high_water_marks.lock().unwrap().get(symbol).copied()
    }
}
