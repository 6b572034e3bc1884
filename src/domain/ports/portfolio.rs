use crate::domain::error::DomainError;
use crate::domain::values::action::OrderSide;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One open position as reported by the portfolio collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub quantity: u64,
    /// Average entry price per share.
    pub avg_price: f64,
    /// Latest known market price per share.
    pub current_price: f64,
}

impl Holding {
    pub fn market_value(&self) -> f64 {
        self.quantity as f64 * self.current_price
    }

    pub fn cost_basis(&self) -> f64 {
        self.quantity as f64 * self.avg_price
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.market_value() - self.cost_basis()
    }
}

/// Result of a simulated fill.
#[derive(Debug, Clone, Serialize)]
pub struct TradeFill {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: u64,
    pub price: f64,
    pub total: f64,
}

/// The persistence boundary. All durable state lives behind this port; the
/// core never writes anywhere else.
#[async_trait::async_trait]
pub trait PortfolioPort: Send + Sync {
    async fn get_holdings(&self) -> Result<HashMap<String, Holding>, DomainError>;

    async fn get_cash_balance(&self) -> Result<f64, DomainError>;

    async fn execute_trade(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: u64,
        price: f64,
    ) -> Result<TradeFill, DomainError>;
}
