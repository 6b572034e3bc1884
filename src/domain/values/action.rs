use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a recommendation tells us to do with a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl TradeAction {
    /// Normalize a raw action string from model output. Anything that is not
    /// recognizably BUY or SELL degrades to Hold; raw model output is never
    /// trusted to drive a trade on its own spelling.
    pub fn from_raw(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "BUY" | "STRONG BUY" | "STRONG_BUY" => TradeAction::Buy,
            "SELL" | "STRONG SELL" | "STRONG_SELL" => TradeAction::Sell,
            _ => TradeAction::Hold,
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
            TradeAction::Hold => write!(f, "HOLD"),
        }
    }
}

impl FromStr for TradeAction {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BUY" => Ok(TradeAction::Buy),
            "SELL" => Ok(TradeAction::Sell),
            "HOLD" => Ok(TradeAction::Hold),
            _ => Err(format!("Unknown trade action: {s}")),
        }
    }
}

/// Which side of the book an order sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}
