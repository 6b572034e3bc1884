use crate::domain::error::DomainError;
use crate::domain::ports::model_provider::{ModelProvider, ProviderKind};

/// Offline provider for running the bot without any API keys. Always
/// answers with a low-confidence HOLD, so nothing ever trades on it.
pub struct CannedProvider;

#[async_trait::async_trait]
impl ModelProvider for CannedProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    async fn complete(&self, _prompt: &str) -> Result<String, DomainError> {
        Ok(r#"{"action": "HOLD", "confidence": 0, "reasoning": "offline provider", "risk_level": "MEDIUM"}"#
            .to_string())
    }
}
