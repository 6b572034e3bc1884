//! Provider selection, structured-recommendation requests, and fallback.
//!
//! One call = one provider attempt. Timeouts are classified, not retried
//! synchronously; quota-based selection routes later calls around exhausted
//! or misbehaving providers. Bulk fetches fan out with a bounded worker
//! limit so a scan cycle cannot burst a provider's rate limit.

use crate::application::quota::QuotaTracker;
use crate::domain::entities::recommendation::{RawRecommendation, Recommendation};
use crate::domain::error::DomainError;
use crate::domain::ports::clock::Clock;
use crate::domain::ports::market_data::Quote;
use crate::domain::ports::model_provider::{ModelProvider, ProviderKind};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Portfolio context embedded in the prompt so the model sees current
/// exposure alongside the quote.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PortfolioContext {
    pub cash_balance: f64,
    pub total_value: f64,
    pub holding_count: usize,
    /// Shares already held of the symbol being evaluated, if any.
    pub held_quantity: u64,
}

#[derive(Clone)]
pub struct ProviderOrchestrator {
    providers: Arc<HashMap<ProviderKind, Arc<dyn ModelProvider>>>,
    /// Kinds with a registered adapter, in priority order. Quota limits may
    /// cover more providers than the wiring supplied keys for.
    registered: Vec<ProviderKind>,
    quota: Arc<QuotaTracker>,
    clock: Arc<dyn Clock>,
    preferred: ProviderKind,
    timeout: Duration,
    max_concurrent: usize,
}

impl ProviderOrchestrator {
    pub fn new(
        providers: Vec<Arc<dyn ModelProvider>>,
        quota: Arc<QuotaTracker>,
        clock: Arc<dyn Clock>,
        preferred: ProviderKind,
        timeout: Duration,
        max_concurrent: usize,
    ) -> Self {
        let providers: HashMap<ProviderKind, Arc<dyn ModelProvider>> =
            providers.into_iter().map(|p| (p.kind(), p)).collect();
        let registered = ProviderKind::PRIORITY
            .iter()
            .copied()
            .filter(|p| providers.contains_key(p))
            .collect();
        Self {
            providers: Arc::new(providers),
            registered,
            quota,
            clock,
            preferred,
            timeout,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Obtain a validated recommendation for one symbol, or an explicit
    /// failure. Quota is consumed at attempt time so the local counter stays
    /// conservative about the daily budget.
    pub async fn get_recommendation(
        &self,
        symbol: &str,
        quote: &Quote,
        context: &PortfolioContext,
    ) -> Result<Recommendation, DomainError> {
        let kind = self
            .quota
            .best_available(self.preferred, &self.registered)
            .ok_or(DomainError::NoProviderAvailable)?;
        let provider = self
            .providers
            .get(&kind)
            .ok_or(DomainError::NoProviderAvailable)?;

        if !self.quota.consume(kind) {
            // Lost a race with a concurrent fetch for the last slot.
            return Err(DomainError::NoProviderAvailable);
        }

        let prompt = build_prompt(symbol, quote, context);
        debug!(symbol, provider = %kind, "requesting recommendation");

        let text = match tokio::time::timeout(self.timeout, provider.complete(&prompt)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(DomainError::ProviderTimeout(kind.to_string())),
        };

        let json = extract_first_json_object(&text).ok_or_else(|| {
            DomainError::ProviderMalformedResponse(format!(
                "no JSON object in response from {kind}"
            ))
        })?;
        let raw: RawRecommendation = serde_json::from_str(json)
            .map_err(|e| DomainError::ProviderMalformedResponse(e.to_string()))?;

        Ok(Recommendation::from_raw(
            symbol,
            raw,
            quote.price,
            &kind.to_string(),
            self.clock.now(),
        ))
    }

    /// Fetch recommendations for many symbols with bounded concurrency.
    /// Each request carries its own portfolio context, so a prompt states
    /// the held quantity of the symbol it is actually about. Per-symbol
    /// failures are logged and omitted; the batch never fails as a whole.
    /// Results come back sorted by confidence, highest first.
    pub async fn get_recommendations(
        &self,
        requests: Vec<(Quote, PortfolioContext)>,
    ) -> Vec<Recommendation> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for (quote, context) in requests {
            let orchestrator = self.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                match orchestrator
                    .get_recommendation(&quote.symbol, &quote, &context)
                    .await
                {
                    Ok(rec) => Some(rec),
                    Err(e) => {
                        warn!(symbol = %quote.symbol, error = %e, "recommendation fetch failed");
                        None
                    }
                }
            });
        }

        let mut recommendations = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            if let Ok(Some(rec)) = joined {
                recommendations.push(rec);
            }
        }
        recommendations.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        recommendations
    }
}

fn build_prompt(symbol: &str, quote: &Quote, context: &PortfolioContext) -> String {
    let mut prompt = format!(
        "You are a cautious equity analyst for a paper-trading account.\n\
         Evaluate {symbol} and respond with ONLY a JSON object, no other text:\n\
         {{\"action\": \"BUY\"|\"SELL\"|\"HOLD\", \"confidence\": 0-100, \
         \"reasoning\": \"...\", \"risk_level\": \"LOW\"|\"MEDIUM\"|\"HIGH\", \
         \"target_price\": number}}\n\n\
         Quote: price ${:.2}, day change {:.2}%",
        quote.price, quote.change_percent
    );
    if let (Some(high), Some(low)) = (quote.high_52w, quote.low_52w) {
        prompt.push_str(&format!(", 52w range ${low:.2}-${high:.2}"));
    }
    if let Some(pe) = quote.pe_ratio {
        prompt.push_str(&format!(", P/E {pe:.1}"));
    }
    if let Some(industry) = &quote.industry {
        prompt.push_str(&format!(", industry {industry}"));
    }
    prompt.push_str(&format!(
        "\nPortfolio: cash ${:.2}, total value ${:.2}, {} open positions, \
         {} shares of {symbol} held",
        context.cash_balance, context.total_value, context.holding_count, context.held_quantity
    ));
    prompt
}

/// Extract the first balanced `{...}` object from free-form model output.
/// Brace counting ignores braces inside string literals.
fn extract_first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
