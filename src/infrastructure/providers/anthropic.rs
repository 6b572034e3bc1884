use crate::domain::error::DomainError;
use crate::domain::ports::model_provider::{ModelProvider, ProviderKind};
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String, model: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.unwrap_or_else(|| "claude-3-5-haiku-latest".to_string()),
        }
    }
}

#[async_trait::async_trait]
impl ModelProvider for AnthropicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        let resp = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&MessagesRequest {
                model: self.model.clone(),
                max_tokens: 1024,
                messages: vec![Message {
                    role: "user",
                    content: prompt.to_string(),
                }],
            })
            .send()
            .await
            .map_err(|e| DomainError::Provider(format!("Anthropic API error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(DomainError::Provider(format!(
                "Anthropic API {status}: {body}"
            )));
        }

        let result: MessagesResponse = resp
            .json()
            .await
            .map_err(|e| DomainError::ProviderMalformedResponse(e.to_string()))?;
        let text: String = result.content.into_iter().map(|b| b.text).collect();
        if text.is_empty() {
            return Err(DomainError::ProviderMalformedResponse(
                "Anthropic returned no text content".to_string(),
            ));
        }
        Ok(text)
    }
}
