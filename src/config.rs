//! Bot configuration surface. Read-only to the core; every tunable the
//! decision and risk layers consult lives here.

use crate::domain::ports::model_provider::ProviderKind;
use crate::domain::values::risk::RiskThresholds;
use crate::domain::values::sizing::SizingConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Maximum EXECUTE_TRADE decisions per calendar day.
    pub max_daily_trades: u32,
    /// Maximum dollars deployed per calendar day.
    pub max_daily_trade_amount: f64,
    /// Minimum recommendation confidence (0–100) to consider trading.
    pub min_confidence: f64,
    /// Stop-loss distance as a fraction of entry price.
    pub stop_loss_pct: f64,
    /// Take-profit distance as a fraction of entry price.
    pub take_profit_pct: f64,
    /// Maximum fraction of portfolio value in one position.
    pub max_position_pct: f64,
    /// Maximum fraction of portfolio value risked per trade.
    pub max_risk_per_trade_pct: f64,
    /// Seconds between scan cycles.
    pub scan_interval_secs: u64,
    /// Seconds between drainer passes over the trade queue.
    pub drain_interval_secs: u64,
    /// Delay between an EXECUTE_TRADE decision and its scheduled execution.
    pub execution_delay_secs: u64,
    /// Per-provider daily request quotas.
    pub provider_daily_limits: HashMap<ProviderKind, u32>,
    /// Provider to try first when its quota allows.
    pub preferred_provider: ProviderKind,
    /// Hard timeout for a single provider call, in seconds.
    pub provider_timeout_secs: u64,
    /// Worker limit for bulk recommendation fetches within one scan.
    pub max_concurrent_fetches: usize,
    /// Consecutive portfolio-collaborator failures before the engine errors.
    pub max_consecutive_failures: u32,
    /// Symbols the scan loop evaluates.
    pub watchlist: Vec<String>,
    pub risk_thresholds: RiskThresholds,
}

impl Default for BotConfig {
    fn default() -> Self {
        let mut provider_daily_limits = HashMap::new();
        provider_daily_limits.insert(ProviderKind::OpenAi, 200);
        provider_daily_limits.insert(ProviderKind::Anthropic, 200);
        provider_daily_limits.insert(ProviderKind::Local, 10_000);
        Self {
            max_daily_trades: 5,
            max_daily_trade_amount: 5_000.0,
            min_confidence: 70.0,
            stop_loss_pct: 0.10,
            take_profit_pct: 0.20,
            max_position_pct: 0.20,
            max_risk_per_trade_pct: 0.02,
            scan_interval_secs: 300,
            drain_interval_secs: 5,
            execution_delay_secs: 0,
            provider_daily_limits,
            preferred_provider: ProviderKind::OpenAi,
            provider_timeout_secs: 30,
            max_concurrent_fetches: 3,
            max_consecutive_failures: 3,
            watchlist: vec![
                "AAPL".into(),
                "MSFT".into(),
                "NVDA".into(),
                "GOOGL".into(),
                "AMZN".into(),
            ],
            risk_thresholds: RiskThresholds::default(),
        }
    }
}

impl BotConfig {
    pub fn from_file(path: &str) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path).map_err(|e| format!("read {path}: {e}"))?;
        serde_json::from_str(&raw).map_err(|e| format!("parse {path}: {e}"))
    }

    pub fn sizing(&self) -> SizingConfig {
        SizingConfig {
            max_position_pct: self.max_position_pct,
            max_risk_per_trade_pct: self.max_risk_per_trade_pct,
            stop_loss_pct: self.stop_loss_pct,
        }
    }
}
