use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Quote unavailable for {0}")]
    QuoteUnavailable(String),

    #[error("No model provider available (all quotas exhausted)")]
    NoProviderAvailable,

    #[error("Provider {0} timed out")]
    ProviderTimeout(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider returned malformed response: {0}")]
    ProviderMalformedResponse(String),

    #[error("Insufficient funds: need {needed:.2}, have {available:.2}")]
    InsufficientFunds { needed: f64, available: f64 },

    #[error("Insufficient shares of {symbol}: need {needed}, have {available}")]
    InsufficientShares {
        symbol: String,
        needed: u64,
        available: u64,
    },

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("Portfolio collaborator unreachable: {0}")]
    PortfolioUnreachable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DomainError {
    /// Whether this error must halt the engine rather than be recorded
    /// as a per-symbol or per-trade outcome.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DomainError::PortfolioUnreachable(_))
    }
}

impl From<String> for DomainError {
    fn from(s: String) -> Self {
        DomainError::InvalidInput(s)
    }
}

impl From<&str> for DomainError {
    fn from(s: &str) -> Self {
        DomainError::InvalidInput(s.to_string())
    }
}
