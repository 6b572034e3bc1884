use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};

/// A clean quote record for one symbol. Normalization of raw market data is
/// the collaborator's job, not the core's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub change_percent: f64,
    pub high_52w: Option<f64>,
    pub low_52w: Option<f64>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub industry: Option<String>,
}

#[async_trait::async_trait]
pub trait MarketData: Send + Sync {
    async fn get_quote(&self, symbol: &str) -> Result<Quote, DomainError>;
}
