//! The trading bot engine: lifecycle state machine, periodic scan loop,
//! decision policy, and the execution drainer.
//!
//! The scan loop and drainer are cooperative scheduled tasks terminated
//! through a watch channel, so shutdown is deterministic. `run_scan_cycle`
//! and `drain_due_trades` are public and clock-driven, letting tests push
//! the engine through full cycles without timers.

use crate::application::cache::RecommendationCache;
use crate::application::orchestrator::{PortfolioContext, ProviderOrchestrator};
use crate::application::risk::{ExitTargetKind, RiskManager};
use crate::config::BotConfig;
use crate::domain::entities::decision::{BotDecision, DecisionOutcome};
use crate::domain::entities::order::OcoPair;
use crate::domain::entities::queued_trade::{QueuedTrade, TradeStatus};
use crate::domain::entities::recommendation::Recommendation;
use crate::domain::error::DomainError;
use crate::domain::ports::clock::Clock;
use crate::domain::ports::market_data::{MarketData, Quote};
use crate::domain::ports::portfolio::{Holding, PortfolioPort, TradeFill};
use crate::domain::values::action::{OrderSide, TradeAction};
use crate::domain::values::bot_state::{BotState, BotStatus};
use crate::domain::values::risk::OverallRisk;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Pluggable attribution of trade success for performance bookkeeping.
pub trait SuccessPolicy: Send + Sync {
    /// Judge an executed fill against the position it affected. `None`
    /// means "no verdict yet" (e.g. a fresh buy).
    fn judge(&self, fill: &TradeFill, holding_before: Option<&Holding>) -> Option<bool>;
}

/// Default policy: a sell is a win iff it realizes a non-negative P&L
/// against the position's average entry price.
pub struct UnrealizedPnlSign;

impl SuccessPolicy for UnrealizedPnlSign {
    fn judge(&self, fill: &TradeFill, holding_before: Option<&Holding>) -> Option<bool> {
        match fill.side {
            OrderSide::Sell => holding_before.map(|h| fill.price >= h.avg_price),
            OrderSide::Buy => None,
        }
    }
}

/// Running totals the drainer maintains.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BotPerformance {
    pub trades_executed: u32,
    pub trades_failed: u32,
    pub total_invested: f64,
    pub wins: u32,
    pub losses: u32,
}

/// Outcome of one scan cycle.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub scanned_at: DateTime<Utc>,
    pub candidates: usize,
    pub decisions: usize,
    pub trades_queued: usize,
    pub exits_queued: usize,
    /// True when the engine left RUNNING mid-cycle and the results were
    /// thrown away instead of committed.
    pub discarded: bool,
}

struct EngineCore {
    state: BotState,
    started_at: Option<DateTime<Utc>>,
    last_scan: Option<DateTime<Utc>>,
    next_scan: Option<DateTime<Utc>>,
    day: String,
    trades_today: u32,
    amount_today: f64,
    queued: Vec<QueuedTrade>,
    decisions: Vec<BotDecision>,
    oco_pairs: Vec<OcoPair>,
    performance: BotPerformance,
    consecutive_failures: u32,
    error_message: Option<String>,
    shutdown: Option<watch::Sender<bool>>,
}

struct EngineInner {
    orchestrator: ProviderOrchestrator,
    cache: Arc<RecommendationCache>,
    risk: Arc<RiskManager>,
    market: Arc<dyn MarketData>,
    portfolio: Arc<dyn PortfolioPort>,
    clock: Arc<dyn Clock>,
    config: BotConfig,
    success_policy: Box<dyn SuccessPolicy>,
    core: Mutex<EngineCore>,
}

#[derive(Clone)]
pub struct TradingEngine {
    inner: Arc<EngineInner>,
}

impl TradingEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        orchestrator: ProviderOrchestrator,
        cache: Arc<RecommendationCache>,
        risk: Arc<RiskManager>,
        market: Arc<dyn MarketData>,
        portfolio: Arc<dyn PortfolioPort>,
        clock: Arc<dyn Clock>,
        config: BotConfig,
    ) -> Self {
        Self::with_success_policy(
            orchestrator,
            cache,
            risk,
            market,
            portfolio,
            clock,
            config,
            Box::new(UnrealizedPnlSign),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_success_policy(
        orchestrator: ProviderOrchestrator,
        cache: Arc<RecommendationCache>,
        risk: Arc<RiskManager>,
        market: Arc<dyn MarketData>,
        portfolio: Arc<dyn PortfolioPort>,
        clock: Arc<dyn Clock>,
        config: BotConfig,
        success_policy: Box<dyn SuccessPolicy>,
    ) -> Self {
        let day = clock.today();
        Self {
            inner: Arc::new(EngineInner {
                orchestrator,
                cache,
                risk,
                market,
                portfolio,
                clock,
                config,
                success_policy,
                core: Mutex::new(EngineCore {
                    state: BotState::Stopped,
                    started_at: None,
                    last_scan: None,
                    next_scan: None,
                    day,
                    trades_today: 0,
                    amount_today: 0.0,
                    queued: Vec::new(),
                    decisions: Vec::new(),
                    oco_pairs: Vec::new(),
                    performance: BotPerformance::default(),
                    consecutive_failures: 0,
                    error_message: None,
                    shutdown: None,
                }),
            }),
        }
    }

    // ---- lifecycle -------------------------------------------------------

    /// Begin (or resume) scanning. Valid from STOPPED or PAUSED only; in
    /// particular `start()` from ERROR fails until a `stop()` acknowledges
    /// the error.
    pub fn start(&self) -> Result<(), DomainError> {
        let mut core = self.inner.core.lock().unwrap();
        if !core.state.can_transition_to(BotState::Running) {
            return Err(DomainError::InvalidTransition(format!(
                "cannot start from {}",
                core.state
            )));
        }
        let resuming = core.state == BotState::Paused;
        core.state = BotState::Running;
        core.error_message = None;
        if resuming {
            info!("engine resumed");
            return Ok(());
        }

        let now = self.inner.clock.now();
        core.started_at = Some(now);
        core.next_scan =
            Some(now + ChronoDuration::seconds(self.inner.config.scan_interval_secs as i64));
        let (tx, rx) = watch::channel(false);
        core.shutdown = Some(tx);
        drop(core);

        self.spawn_scan_loop(rx.clone());
        self.spawn_drainer(rx);
        info!("engine started");
        Ok(())
    }

    /// Freeze the scan loop without cancelling queued trades.
    pub fn pause(&self) -> Result<(), DomainError> {
        let mut core = self.inner.core.lock().unwrap();
        if core.state != BotState::Running {
            return Err(DomainError::InvalidTransition(format!(
                "cannot pause from {}",
                core.state
            )));
        }
        core.state = BotState::Paused;
        info!("engine paused");
        Ok(())
    }

    /// Halt scanning. Already-queued PENDING trades stay queued; the
    /// drainer is gated on RUNNING so nothing executes while stopped. Also
    /// the manual acknowledgement that clears ERROR.
    pub fn stop(&self) -> Result<(), DomainError> {
        let mut core = self.inner.core.lock().unwrap();
        if !core.state.can_transition_to(BotState::Stopped) {
            return Err(DomainError::InvalidTransition(format!(
                "cannot stop from {}",
                core.state
            )));
        }
        core.state = BotState::Stopped;
        core.started_at = None;
        core.next_scan = None;
        if let Some(tx) = core.shutdown.take() {
            let _ = tx.send(true);
        }
        info!("engine stopped");
        Ok(())
    }

    /// The escape hatch: valid from any state, idempotent. Cancels every
    /// PENDING queued trade and marks all open exit orders CANCELLED before
    /// returning.
    pub fn emergency_stop(&self) {
        let mut core = self.inner.core.lock().unwrap();
        core.state = BotState::Stopped;
        core.started_at = None;
        core.next_scan = None;
        core.error_message = None;
        if let Some(tx) = core.shutdown.take() {
            let _ = tx.send(true);
        }
        let mut cancelled = 0usize;
        for trade in core.queued.iter_mut() {
            if trade.status == TradeStatus::Pending {
                trade.cancel();
                cancelled += 1;
            }
        }
        for pair in core.oco_pairs.iter_mut() {
            pair.cancel_both();
        }
        warn!(cancelled_trades = cancelled, "emergency stop applied");
    }

    // ---- observability ---------------------------------------------------

    pub fn status(&self) -> BotStatus {
        let core = self.inner.core.lock().unwrap();
        let now = self.inner.clock.now();
        BotStatus {
            state: core.state,
            monitoring: core.state == BotState::Running,
            uptime_secs: core
                .started_at
                .map(|t| (now - t).num_seconds())
                .unwrap_or(0),
            last_scan: core.last_scan,
            next_scan: core.next_scan,
            trades_today: core.trades_today,
            amount_traded_today: core.amount_today,
            pending_trades: core
                .queued
                .iter()
                .filter(|t| t.status == TradeStatus::Pending)
                .count(),
            error_message: core.error_message.clone(),
        }
    }

    pub fn recent_decisions(&self, limit: usize) -> Vec<BotDecision> {
        let core = self.inner.core.lock().unwrap();
        core.decisions.iter().rev().take(limit).cloned().collect()
    }

    pub fn queued_trades(&self) -> Vec<QueuedTrade> {
        self.inner.core.lock().unwrap().queued.clone()
    }

    pub fn open_oco_pairs(&self) -> Vec<OcoPair> {
        let core = self.inner.core.lock().unwrap();
        core.oco_pairs.iter().filter(|p| p.is_open()).cloned().collect()
    }

    pub fn performance(&self) -> BotPerformance {
        self.inner.core.lock().unwrap().performance.clone()
    }

    // ---- scan cycle ------------------------------------------------------

    /// Run one scan cycle: refresh candidates, enforce exit targets, apply
    /// the decision policy in candidate order, and queue resulting trades.
    /// Per-symbol failures are recorded and never abort the cycle; only a
    /// broken portfolio boundary escalates to ERROR.
    pub async fn run_scan_cycle(&self) -> Result<ScanSummary, DomainError> {
        let was_running = {
            let mut core = self.inner.core.lock().unwrap();
            let today = self.inner.clock.today();
            roll_day(&mut core, &today);
            core.state == BotState::Running
        };

        let (holdings, cash) = match self.portfolio_view().await {
            Ok(view) => view,
            Err(e) => {
                if e.is_fatal() {
                    self.escalate(&e);
                }
                return Err(e);
            }
        };
        let total_value =
            cash + holdings.values().map(|h| h.market_value()).sum::<f64>();

        let exit_targets = self.inner.risk.check_exit_targets(&holdings);
        let candidates = self.candidate_recommendations(&holdings, cash, total_value).await;

        // Mid-flight cancellation: work that finished after the engine left
        // RUNNING is discarded, not committed.
        let now = self.inner.clock.now();
        let mut core = self.inner.core.lock().unwrap();
        if was_running && core.state != BotState::Running {
            return Ok(ScanSummary {
                scanned_at: now,
                candidates: candidates.len(),
                decisions: 0,
                trades_queued: 0,
                exits_queued: 0,
                discarded: true,
            });
        }

        let mut exits_queued = 0usize;
        for target in &exit_targets {
            let already_exiting = core.queued.iter().any(|t| {
                t.symbol == target.symbol
                    && t.action == TradeAction::Sell
                    && t.status == TradeStatus::Pending
            });
            if already_exiting {
                continue;
            }
            let Some(holding) = holdings.get(&target.symbol) else {
                continue;
            };
            let rec = exit_recommendation(target.kind, holding, target.threshold_price, now);
            core.decisions.push(BotDecision::new(
                &target.symbol,
                Some(rec.clone()),
                DecisionOutcome::ExecuteTrade,
                format!(
                    "{:?} threshold {:.2} crossed at {:.2}",
                    target.kind, target.threshold_price, target.current_price
                ),
                now,
            ));
            core.queued
                .push(QueuedTrade::new(rec, target.quantity, now));
            // Resolve the matching OCO pair: the crossed leg triggers, the
            // sibling is cancelled in the same operation. The is_open guard
            // above makes the trigger infallible; a rejection here would
            // mean the pair invariant broke, so it is logged, not dropped.
            for pair in core.oco_pairs.iter_mut() {
                if pair.symbol() == target.symbol && pair.is_open() {
                    let triggered = match target.kind {
                        ExitTargetKind::TakeProfit => pair.trigger_take_profit(),
                        _ => pair.trigger_stop_loss(),
                    };
                    if let Err(e) = triggered {
                        warn!(symbol = %target.symbol, error = %e, "exit pair trigger rejected");
                    }
                }
            }
            exits_queued += 1;
        }

        let risk_snapshot = self.inner.risk.assess_portfolio_risk(&holdings);
        let mut trades_queued = 0usize;
        let mut decisions_made = 0usize;
        let mut cash_left = cash;
        for rec in &candidates {
            let decision = self.decide(&mut core, rec, &holdings, risk_snapshot.overall_risk, total_value, cash_left, now);
            decisions_made += 1;
            if decision == DecisionOutcome::ExecuteTrade {
                trades_queued += 1;
                if let Some(last) = core.queued.last() {
                    if last.action == TradeAction::Buy {
                        cash_left -= last.quantity as f64 * last.target_price;
                    }
                }
            }
        }

        // Scan bookkeeping advances regardless of per-symbol outcomes.
        core.last_scan = Some(now);
        core.next_scan =
            Some(now + ChronoDuration::seconds(self.inner.config.scan_interval_secs as i64));

        Ok(ScanSummary {
            scanned_at: now,
            candidates: candidates.len(),
            decisions: decisions_made,
            trades_queued,
            exits_queued,
            discarded: false,
        })
    }

    /// Apply the decision policy to one candidate. Records a BotDecision
    /// and, on EXECUTE_TRADE, queues the trade plus its exit-order pair.
    fn decide(
        &self,
        core: &mut EngineCore,
        rec: &Recommendation,
        holdings: &std::collections::HashMap<String, Holding>,
        overall_risk: OverallRisk,
        total_value: f64,
        cash_left: f64,
        now: DateTime<Utc>,
    ) -> DecisionOutcome {
        let config = &self.inner.config;
        let skip_reason: Option<String> = if rec.action == TradeAction::Hold {
            Some("hold recommendation".to_string())
        } else if rec.confidence < config.min_confidence {
            Some(format!(
                "confidence {:.1} below threshold {:.1}",
                rec.confidence, config.min_confidence
            ))
        } else if core.trades_today >= config.max_daily_trades {
            Some(format!(
                "daily trade count cap ({}) reached",
                config.max_daily_trades
            ))
        } else if core.amount_today >= config.max_daily_trade_amount {
            Some(format!(
                "daily trade amount cap (${:.2}) reached",
                config.max_daily_trade_amount
            ))
        } else if overall_risk == OverallRisk::Critical {
            Some("portfolio risk is CRITICAL".to_string())
        } else {
            None
        };
        if let Some(reason) = skip_reason {
            core.decisions.push(BotDecision::new(
                &rec.symbol,
                Some(rec.clone()),
                DecisionOutcome::Skip,
                reason,
                now,
            ));
            return DecisionOutcome::Skip;
        }

        let sized = match rec.action {
            TradeAction::Sell => match holdings.get(&rec.symbol) {
                Some(h) if h.quantity > 0 => {
                    Ok((h.quantity, h.quantity as f64 * rec.current_price))
                }
                _ => Err("no position to sell".to_string()),
            },
            TradeAction::Buy => {
                match self.inner.risk.size_position(rec, total_value, cash_left) {
                    Some(s) if s.shares > 0 => Ok((s.shares, s.position_value)),
                    Some(_) => Err("position size rounds to zero".to_string()),
                    None => Err("position sizing rejected inputs".to_string()),
                }
            }
            TradeAction::Hold => unreachable!(),
        };
        let (quantity, trade_value) = match sized {
            Ok(pair) => pair,
            Err(reason) => {
                core.decisions.push(BotDecision::new(
                    &rec.symbol,
                    Some(rec.clone()),
                    DecisionOutcome::Skip,
                    reason,
                    now,
                ));
                return DecisionOutcome::Skip;
            }
        };

        if core.amount_today + trade_value > config.max_daily_trade_amount {
            core.decisions.push(BotDecision::new(
                &rec.symbol,
                Some(rec.clone()),
                DecisionOutcome::Skip,
                format!(
                    "trade of ${:.2} would exceed daily amount cap (${:.2})",
                    trade_value, config.max_daily_trade_amount
                ),
                now,
            ));
            return DecisionOutcome::Skip;
        }

        let scheduled_for =
            now + ChronoDuration::seconds(config.execution_delay_secs as i64);
        let trade = QueuedTrade::new(rec.clone(), quantity, scheduled_for);
        core.decisions.push(BotDecision::new(
            &rec.symbol,
            Some(rec.clone()),
            DecisionOutcome::ExecuteTrade,
            format!("{} {} shares at ~${:.2}", rec.action, quantity, rec.current_price),
            now,
        ));
        if rec.action == TradeAction::Buy {
            match OcoPair::exit_pair_for(
                &rec.symbol,
                rec.current_price,
                quantity,
                config.stop_loss_pct,
                config.take_profit_pct,
            ) {
                Ok(pair) => core.oco_pairs.push(pair),
                Err(e) => warn!(symbol = %rec.symbol, error = %e, "could not build exit pair"),
            }
        }
        core.queued.push(trade);
        core.trades_today += 1;
        core.amount_today += trade_value;
        DecisionOutcome::ExecuteTrade
    }

    /// Today's candidates: the cached set when valid, otherwise a fresh
    /// bounded-concurrency fetch that replaces the cache wholesale.
    async fn candidate_recommendations(
        &self,
        holdings: &std::collections::HashMap<String, Holding>,
        cash: f64,
        total_value: f64,
    ) -> Vec<Recommendation> {
        if let Some(cached) = self.inner.cache.get() {
            return cached.recommendations;
        }

        let mut quotes = Vec::new();
        for symbol in &self.inner.config.watchlist {
            match self.inner.market.get_quote(symbol).await {
                Ok(q) => quotes.push(q),
                Err(e) => warn!(symbol, error = %e, "quote fetch failed"),
            }
        }
        if quotes.is_empty() {
            return Vec::new();
        }

        let holding_count = holdings.values().filter(|h| h.quantity > 0).count();
        let requests: Vec<(Quote, PortfolioContext)> = quotes
            .into_iter()
            .map(|quote| {
                let held_quantity = holdings
                    .get(&quote.symbol)
                    .map(|h| h.quantity)
                    .unwrap_or(0);
                let context = PortfolioContext {
                    cash_balance: cash,
                    total_value,
                    holding_count,
                    held_quantity,
                };
                (quote, context)
            })
            .collect();
        let recommendations = self
            .inner
            .orchestrator
            .get_recommendations(requests)
            .await;
        if recommendations.is_empty() {
            // Provider outage or exhausted quotas: degrade gracefully and
            // leave any stale cache message available to callers.
            return Vec::new();
        }

        let top: Vec<Recommendation> = recommendations
            .iter()
            .filter(|r| r.action == TradeAction::Buy)
            .take(3)
            .cloned()
            .collect();
        let analysis = market_analysis(&recommendations);
        self.inner
            .cache
            .put(recommendations.clone(), analysis, top);
        recommendations
    }

    // ---- drainer ---------------------------------------------------------

    /// Execute due PENDING trades in `scheduled_for` order. Gated on
    /// RUNNING. Returns how many trades completed.
    pub async fn drain_due_trades(&self) -> usize {
        let now = self.inner.clock.now();
        let due: Vec<QueuedTrade> = {
            let core = self.inner.core.lock().unwrap();
            if core.state != BotState::Running {
                return 0;
            }
            let mut due: Vec<QueuedTrade> = core
                .queued
                .iter()
                .filter(|t| t.is_due(now))
                .cloned()
                .collect();
            due.sort_by_key(|t| t.scheduled_for);
            due
        };

        let mut completed = 0usize;
        for trade in due {
            let side = match trade.action {
                TradeAction::Buy => OrderSide::Buy,
                TradeAction::Sell => OrderSide::Sell,
                TradeAction::Hold => continue,
            };
            let holding_before = self
                .inner
                .portfolio
                .get_holdings()
                .await
                .ok()
                .and_then(|h| h.get(&trade.symbol).cloned());

            let result = self
                .inner
                .portfolio
                .execute_trade(&trade.symbol, side, trade.quantity, trade.target_price)
                .await;

            let now = self.inner.clock.now();
            let mut core = self.inner.core.lock().unwrap();
            // Fills that land after a stop are discarded from bookkeeping.
            if core.state != BotState::Running {
                return completed;
            }
            let Some(stored) = core.queued.iter_mut().find(|t| t.id == trade.id) else {
                continue;
            };
            if stored.status != TradeStatus::Pending {
                continue;
            }
            match result {
                Ok(fill) => {
                    stored.complete(now);
                    completed += 1;
                    core.consecutive_failures = 0;
                    core.performance.trades_executed += 1;
                    if side == OrderSide::Buy {
                        core.performance.total_invested += fill.total;
                    } else {
                        self.inner.risk.forget_symbol(&trade.symbol);
                    }
                    match self.inner.success_policy.judge(&fill, holding_before.as_ref()) {
                        Some(true) => core.performance.wins += 1,
                        Some(false) => core.performance.losses += 1,
                        None => {}
                    }
                    info!(symbol = %trade.symbol, side = %side, quantity = trade.quantity, "trade executed");
                }
                Err(e) => {
                    stored.fail(now, e.to_string());
                    core.performance.trades_failed += 1;
                    core.consecutive_failures += 1;
                    warn!(symbol = %trade.symbol, error = %e, "trade execution failed");
                    if e.is_fatal()
                        || core.consecutive_failures >= self.inner.config.max_consecutive_failures
                    {
                        drop(core);
                        self.escalate(&e);
                        return completed;
                    }
                }
            }
        }
        completed
    }

    // ---- internals -------------------------------------------------------

    async fn portfolio_view(
        &self,
    ) -> Result<(std::collections::HashMap<String, Holding>, f64), DomainError> {
        let holdings = self.inner.portfolio.get_holdings().await?;
        let cash = self.inner.portfolio.get_cash_balance().await?;
        Ok((holdings, cash))
    }

    fn escalate(&self, e: &DomainError) {
        let mut core = self.inner.core.lock().unwrap();
        if core.state.can_transition_to(BotState::Error) {
            core.state = BotState::Error;
        }
        core.error_message = Some(e.to_string());
        if let Some(tx) = core.shutdown.take() {
            let _ = tx.send(true);
        }
        error!(error = %e, "engine escalated to ERROR");
    }

    fn spawn_scan_loop(&self, mut shutdown: watch::Receiver<bool>) {
        let engine = self.clone();
        let period = Duration::from_secs(self.inner.config.scan_interval_secs.max(1));
        tokio::spawn(async move {
            // First tick lands one full period after start.
            let mut ticker =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => {
                        if engine.status().state != BotState::Running {
                            continue;
                        }
                        if let Err(e) = engine.run_scan_cycle().await {
                            warn!(error = %e, "scan cycle failed");
                        }
                    }
                }
            }
        });
    }

    fn spawn_drainer(&self, mut shutdown: watch::Receiver<bool>) {
        let engine = self.clone();
        let period = Duration::from_secs(self.inner.config.drain_interval_secs.max(1));
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => {
                        engine.drain_due_trades().await;
                    }
                }
            }
        });
    }
}

fn roll_day(core: &mut EngineCore, today: &str) {
    if core.day != today {
        core.day = today.to_string();
        core.trades_today = 0;
        core.amount_today = 0.0;
    }
}

fn market_analysis(recs: &[Recommendation]) -> String {
    let buys = recs.iter().filter(|r| r.action == TradeAction::Buy).count();
    let sells = recs.iter().filter(|r| r.action == TradeAction::Sell).count();
    let avg = if recs.is_empty() {
        0.0
    } else {
        recs.iter().map(|r| r.confidence).sum::<f64>() / recs.len() as f64
    };
    format!(
        "{} symbols scanned: {} buy, {} sell, {} hold; average confidence {:.1}",
        recs.len(),
        buys,
        sells,
        recs.len() - buys - sells,
        avg
    )
}

/// Synthetic recommendation recorded with an exit-target trade so the audit
/// trail carries the same snapshot shape as provider-driven trades.
fn exit_recommendation(
    kind: ExitTargetKind,
    holding: &Holding,
    threshold: f64,
    now: DateTime<Utc>,
) -> Recommendation {
    Recommendation {
        symbol: holding.symbol.clone(),
        action: TradeAction::Sell,
        confidence: 100.0,
        reasoning: format!(
            "{kind:?} exit: threshold {threshold:.2}, entry {:.2}",
            holding.avg_price
        ),
        risk_level: crate::domain::values::risk::RiskLevel::Medium,
        target_price: Some(threshold),
        current_price: holding.current_price,
        provider: "risk-manager".to_string(),
        generated_at: now,
    }
}
