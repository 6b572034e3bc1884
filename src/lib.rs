pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

use crate::application::cache::RecommendationCache;
use crate::application::engine::{BotPerformance, ScanSummary, SuccessPolicy, TradingEngine};
use crate::application::orchestrator::{PortfolioContext, ProviderOrchestrator};
use crate::application::quota::{QuotaTracker, QuotaUsage};
use crate::application::risk::{ExitTarget, RiskManager};
use crate::config::BotConfig;
use crate::domain::entities::decision::BotDecision;
use crate::domain::entities::queued_trade::QueuedTrade;
use crate::domain::entities::recommendation::Recommendation;
use crate::domain::error::DomainError;
use crate::domain::ports::clock::Clock;
use crate::domain::ports::market_data::MarketData;
use crate::domain::ports::model_provider::ModelProvider;
use crate::domain::ports::portfolio::PortfolioPort;
use crate::domain::values::bot_state::BotStatus;
use crate::domain::values::risk::PortfolioRiskSnapshot;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::market::yahoo::YahooMarketData;
use crate::infrastructure::paper::portfolio::PaperPortfolio;
use crate::infrastructure::providers::anthropic::AnthropicProvider;
use crate::infrastructure::providers::canned::CannedProvider;
use crate::infrastructure::providers::openai::OpenAiProvider;
use std::sync::Arc;
use std::time::Duration;

/// Top-level assembly: wires the quota tracker, cache, orchestrator, risk
/// manager and engine around injected collaborators, and exposes the
/// read-only observability surface.
pub struct PaperTrader {
    engine: TradingEngine,
    orchestrator: ProviderOrchestrator,
    cache: Arc<RecommendationCache>,
    risk: Arc<RiskManager>,
    quota: Arc<QuotaTracker>,
    market: Arc<dyn MarketData>,
    portfolio: Arc<dyn PortfolioPort>,
}

impl PaperTrader {
    /// Production wiring: providers from environment keys, Yahoo quotes,
    /// and an in-memory paper portfolio.
    ///
    /// Recognized variables: `PAPERTRADER_OPENAI_KEY`,
    /// `PAPERTRADER_ANTHROPIC_KEY`, `PAPERTRADER_MODEL` (optional override
    /// for both), `PAPERTRADER_STARTING_CASH`.
    pub fn new(config: BotConfig) -> Self {
        let model = std::env::var("PAPERTRADER_MODEL").ok();
        let mut providers: Vec<Arc<dyn ModelProvider>> = Vec::new();
        if let Ok(key) = std::env::var("PAPERTRADER_OPENAI_KEY") {
            providers.push(Arc::new(OpenAiProvider::new(key, model.clone())));
        }
        if let Ok(key) = std::env::var("PAPERTRADER_ANTHROPIC_KEY") {
            providers.push(Arc::new(AnthropicProvider::new(key, model)));
        }
        providers.push(Arc::new(CannedProvider));

        let starting_cash = std::env::var("PAPERTRADER_STARTING_CASH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(100_000.0);

        Self::with_collaborators(
            config,
            providers,
            Arc::new(YahooMarketData::new()),
            Arc::new(PaperPortfolio::new(starting_cash)),
            Arc::new(SystemClock),
        )
    }

    /// Dependency-injection constructor; tests pass fakes for every port.
    pub fn with_collaborators(
        config: BotConfig,
        providers: Vec<Arc<dyn ModelProvider>>,
        market: Arc<dyn MarketData>,
        portfolio: Arc<dyn PortfolioPort>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let quota = Arc::new(QuotaTracker::new(
            clock.clone(),
            &config.provider_daily_limits,
        ));
        let cache = Arc::new(RecommendationCache::new(clock.clone()));
        let risk = Arc::new(RiskManager::new(config.clone()));
        let orchestrator = ProviderOrchestrator::new(
            providers,
            quota.clone(),
            clock.clone(),
            config.preferred_provider,
            Duration::from_secs(config.provider_timeout_secs),
            config.max_concurrent_fetches,
        );
        let engine = TradingEngine::new(
            orchestrator.clone(),
            cache.clone(),
            risk.clone(),
            market.clone(),
            portfolio.clone(),
            clock,
            config,
        );
        Self {
            engine,
            orchestrator,
            cache,
            risk,
            quota,
            market,
            portfolio,
        }
    }

    /// Swap the trade-success attribution policy before starting.
    pub fn with_success_policy(
        config: BotConfig,
        providers: Vec<Arc<dyn ModelProvider>>,
        market: Arc<dyn MarketData>,
        portfolio: Arc<dyn PortfolioPort>,
        clock: Arc<dyn Clock>,
        policy: Box<dyn SuccessPolicy>,
    ) -> Self {
        let mut this = Self::with_collaborators(config.clone(), providers, market.clone(), portfolio.clone(), clock.clone());
        this.engine = TradingEngine::with_success_policy(
            this.orchestrator.clone(),
            this.cache.clone(),
            this.risk.clone(),
            market,
            portfolio,
            clock,
            config,
            policy,
        );
        this
    }

    // ---- lifecycle -------------------------------------------------------

    pub fn start(&self) -> Result<(), DomainError> {
        self.engine.start()
    }

    pub fn pause(&self) -> Result<(), DomainError> {
        self.engine.pause()
    }

    pub fn stop(&self) -> Result<(), DomainError> {
        self.engine.stop()
    }

    pub fn emergency_stop(&self) {
        self.engine.emergency_stop()
    }

    /// One manual scan cycle, independent of the background loop.
    pub async fn scan_once(&self) -> Result<ScanSummary, DomainError> {
        self.engine.run_scan_cycle().await
    }

    /// One manual drainer pass (no-op unless the engine is RUNNING).
    pub async fn drain_once(&self) -> usize {
        self.engine.drain_due_trades().await
    }

    // ---- observability ---------------------------------------------------

    pub fn status(&self) -> BotStatus {
        self.engine.status()
    }

    pub fn recent_decisions(&self, limit: usize) -> Vec<BotDecision> {
        self.engine.recent_decisions(limit)
    }

    pub fn queued_trades(&self) -> Vec<QueuedTrade> {
        self.engine.queued_trades()
    }

    pub fn performance(&self) -> BotPerformance {
        self.engine.performance()
    }

    pub fn quota_usage(&self) -> Vec<QuotaUsage> {
        self.quota.all_usage()
    }

    pub fn cache_status(&self) -> String {
        self.cache.status_message()
    }

    pub async fn risk_snapshot(&self) -> Result<PortfolioRiskSnapshot, DomainError> {
        let holdings = self.portfolio.get_holdings().await?;
        Ok(self.risk.assess_portfolio_risk(&holdings))
    }

    pub async fn exit_targets(&self) -> Result<Vec<ExitTarget>, DomainError> {
        let holdings = self.portfolio.get_holdings().await?;
        Ok(self.risk.check_exit_targets(&holdings))
    }

    /// Ad hoc single-symbol recommendation, outside any scan cycle.
    pub async fn recommend(&self, symbol: &str) -> Result<Recommendation, DomainError> {
        let quote = self.market.get_quote(symbol).await?;
        let holdings = self.portfolio.get_holdings().await?;
        let cash = self.portfolio.get_cash_balance().await?;
        let context = PortfolioContext {
            cash_balance: cash,
            total_value: cash + holdings.values().map(|h| h.market_value()).sum::<f64>(),
            holding_count: holdings.values().filter(|h| h.quantity > 0).count(),
            held_quantity: holdings
                .get(&symbol.to_uppercase())
                .map(|h| h.quantity)
                .unwrap_or(0),
        };
        self.orchestrator
            .get_recommendation(symbol, &quote, &context)
            .await
    }

    /// The engine handle, for callers that drive cycles directly.
    pub fn engine(&self) -> &TradingEngine {
        &self.engine
    }
}
