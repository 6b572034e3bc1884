use crate::domain::error::DomainError;
use crate::domain::ports::market_data::{MarketData, Quote};
use async_trait::async_trait;

/// Yahoo Finance quote source using the v8 chart API (no auth required).
pub struct YahooMarketData {
    client: reqwest::Client,
}

impl YahooMarketData {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(
                    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                     AppleWebKit/537.36 (KHTML, like Gecko) \
                     Chrome/120.0.0.0 Safari/537.36",
                )
                .build()
                .unwrap_or_default(),
        }
    }
}

impl Default for YahooMarketData {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, serde::Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, serde::Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, serde::Deserialize)]
struct ChartData {
    meta: ChartMeta,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: String,
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    chart_previous_close: Option<f64>,
    #[serde(default)]
    fifty_two_week_high: Option<f64>,
    #[serde(default)]
    fifty_two_week_low: Option<f64>,
}

#[async_trait]
impl MarketData for YahooMarketData {
    async fn get_quote(&self, symbol: &str) -> Result<Quote, DomainError> {
        let url = format!(
            "https://query1.finance.yahoo.com/v8/finance/chart/{symbol}?range=1d&interval=1d"
        );
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DomainError::QuoteUnavailable(format!("{symbol}: {e}")))?;

        if !resp.status().is_success() {
            return Err(DomainError::QuoteUnavailable(format!(
                "{symbol}: HTTP {}",
                resp.status()
            )));
        }

        let parsed: ChartResponse = resp
            .json()
            .await
            .map_err(|e| DomainError::QuoteUnavailable(format!("{symbol}: {e}")))?;

        if let Some(err) = parsed.chart.error {
            return Err(DomainError::QuoteUnavailable(format!("{symbol}: {err}")));
        }
        let data = parsed
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .ok_or_else(|| DomainError::QuoteUnavailable(format!("{symbol}: empty result")))?;

        let price = data
            .meta
            .regular_market_price
            .ok_or_else(|| DomainError::QuoteUnavailable(format!("{symbol}: no market price")))?;
        let change_percent = data
            .meta
            .chart_previous_close
            .filter(|prev| *prev > 0.0)
            .map(|prev| (price - prev) / prev * 100.0)
            .unwrap_or(0.0);

        Ok(Quote {
            symbol: data.meta.symbol,
            price,
            change_percent,
            high_52w: data.meta.fifty_two_week_high,
            low_52w: data.meta.fifty_two_week_low,
            market_cap: None,
            pe_ratio: None,
            industry: None,
        })
    }
}
