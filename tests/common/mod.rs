//! Shared test helpers: deterministic clock, scripted model providers, and
//! fake market/portfolio collaborators.
#![allow(dead_code)]

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use papertrader::config::BotConfig;
use papertrader::domain::error::DomainError;
use papertrader::domain::ports::clock::Clock;
use papertrader::domain::ports::market_data::{MarketData, Quote};
use papertrader::domain::ports::model_provider::{ModelProvider, ProviderKind};
use papertrader::domain::ports::portfolio::{Holding, PortfolioPort, TradeFill};
use papertrader::domain::values::action::OrderSide;
use papertrader::PaperTrader;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A clock tests can move by hand, for day-boundary behavior.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Utc::now()),
        })
    }

    pub fn advance_days(&self, days: i64) {
        *self.now.lock().unwrap() += ChronoDuration::days(days);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub fn buy_json(confidence: f64) -> String {
    format!(
        r#"{{"action": "BUY", "confidence": {confidence}, "reasoning": "test", "risk_level": "LOW"}}"#
    )
}

pub fn sell_json(confidence: f64) -> String {
    format!(
        r#"{{"action": "SELL", "confidence": {confidence}, "reasoning": "test", "risk_level": "MEDIUM"}}"#
    )
}

pub fn hold_json() -> String {
    r#"{"action": "HOLD", "confidence": 50, "reasoning": "test", "risk_level": "MEDIUM"}"#
        .to_string()
}

/// Returns queued responses in order; errors once the script runs out.
pub struct ScriptedProvider {
    kind: ProviderKind,
    responses: Mutex<VecDeque<String>>,
    pub calls: AtomicU32,
}

impl ScriptedProvider {
    pub fn new(kind: ProviderKind, responses: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            kind,
            responses: Mutex::new(responses.into()),
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait::async_trait]
impl ModelProvider for ScriptedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn complete(&self, _prompt: &str) -> Result<String, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| DomainError::Provider("script exhausted".to_string()))
    }
}

/// Answers every prompt with the same response.
pub struct RepeatingProvider {
    kind: ProviderKind,
    response: String,
    pub calls: AtomicU32,
}

impl RepeatingProvider {
    pub fn new(kind: ProviderKind, response: String) -> Arc<Self> {
        Arc::new(Self {
            kind,
            response,
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait::async_trait]
impl ModelProvider for RepeatingProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn complete(&self, _prompt: &str) -> Result<String, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

/// Captures every prompt it receives, answering with a harmless HOLD.
pub struct PromptRecordingProvider {
    kind: ProviderKind,
    prompts: Mutex<Vec<String>>,
}

impl PromptRecordingProvider {
    pub fn new(kind: ProviderKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ModelProvider for PromptRecordingProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(hold_json())
    }
}

/// Sleeps longer than any sane orchestrator timeout before answering.
pub struct SlowProvider {
    kind: ProviderKind,
    delay: Duration,
}

impl SlowProvider {
    pub fn new(kind: ProviderKind, delay: Duration) -> Arc<Self> {
        Arc::new(Self { kind, delay })
    }
}

#[async_trait::async_trait]
impl ModelProvider for SlowProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn complete(&self, _prompt: &str) -> Result<String, DomainError> {
        tokio::time::sleep(self.delay).await;
        Ok(buy_json(90.0))
    }
}

/// Tracks how many calls run at once, for concurrency-bound assertions.
pub struct CountingProvider {
    kind: ProviderKind,
    pub active: AtomicUsize,
    pub peak: AtomicUsize,
}

impl CountingProvider {
    pub fn new(kind: ProviderKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl ModelProvider for CountingProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn complete(&self, _prompt: &str) -> Result<String, DomainError> {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_active, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(25)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(buy_json(80.0))
    }
}

/// Serves fixed prices; unknown symbols are unavailable.
pub struct FakeMarketData {
    prices: Mutex<HashMap<String, f64>>,
}

impl FakeMarketData {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            prices: Mutex::new(HashMap::new()),
        })
    }

    pub fn set_price(&self, symbol: &str, price: f64) {
        self.prices
            .lock()
            .unwrap()
            .insert(symbol.to_uppercase(), price);
    }
}

#[async_trait::async_trait]
impl MarketData for FakeMarketData {
    async fn get_quote(&self, symbol: &str) -> Result<Quote, DomainError> {
        let prices = self.prices.lock().unwrap();
        match prices.get(&symbol.to_uppercase()) {
            Some(price) => Ok(Quote {
                symbol: symbol.to_uppercase(),
                price: *price,
                change_percent: 0.0,
                high_52w: None,
                low_52w: None,
                market_cap: None,
                pe_ratio: None,
                industry: None,
            }),
            None => Err(DomainError::QuoteUnavailable(symbol.to_string())),
        }
    }
}

/// Every call fails as if the portfolio collaborator is offline.
pub struct UnreachablePortfolio;

#[async_trait::async_trait]
impl PortfolioPort for UnreachablePortfolio {
    async fn get_holdings(&self) -> Result<HashMap<String, Holding>, DomainError> {
        Err(DomainError::PortfolioUnreachable("offline".to_string()))
    }

    async fn get_cash_balance(&self) -> Result<f64, DomainError> {
        Err(DomainError::PortfolioUnreachable("offline".to_string()))
    }

    async fn execute_trade(
        &self,
        _symbol: &str,
        _side: OrderSide,
        _quantity: u64,
        _price: f64,
    ) -> Result<TradeFill, DomainError> {
        Err(DomainError::PortfolioUnreachable("offline".to_string()))
    }
}

/// Reads fine but rejects every fill, for failure-path drainer tests.
pub struct BrokenExecutionPortfolio {
    pub cash: f64,
}

#[async_trait::async_trait]
impl PortfolioPort for BrokenExecutionPortfolio {
    async fn get_holdings(&self) -> Result<HashMap<String, Holding>, DomainError> {
        Ok(HashMap::new())
    }

    async fn get_cash_balance(&self) -> Result<f64, DomainError> {
        Ok(self.cash)
    }

    async fn execute_trade(
        &self,
        _symbol: &str,
        _side: OrderSide,
        quantity: u64,
        price: f64,
    ) -> Result<TradeFill, DomainError> {
        Err(DomainError::InsufficientFunds {
            needed: quantity as f64 * price,
            available: 0.0,
        })
    }
}

/// Config with background loops effectively disabled and the daily amount
/// cap out of the way, so tests drive cycles by hand.
pub fn test_config(watchlist: Vec<&str>) -> BotConfig {
    BotConfig {
        scan_interval_secs: 3_600,
        drain_interval_secs: 3_600,
        execution_delay_secs: 0,
        max_daily_trade_amount: 1_000_000.0,
        watchlist: watchlist.into_iter().map(|s| s.to_string()).collect(),
        ..BotConfig::default()
    }
}

pub fn setup(
    config: BotConfig,
    providers: Vec<Arc<dyn ModelProvider>>,
    market: Arc<dyn MarketData>,
    portfolio: Arc<dyn PortfolioPort>,
) -> PaperTrader {
    PaperTrader::with_collaborators(
        config,
        providers,
        market,
        portfolio,
        Arc::new(papertrader::infrastructure::clock::SystemClock),
    )
}
