mod common;

use common::{
    buy_json, hold_json, setup, test_config, BrokenExecutionPortfolio, FakeMarketData,
    PromptRecordingProvider, RepeatingProvider, UnreachablePortfolio,
};
use papertrader::domain::entities::decision::DecisionOutcome;
use papertrader::domain::entities::queued_trade::TradeStatus;
use papertrader::domain::error::DomainError;
use papertrader::domain::ports::model_provider::ProviderKind;
use papertrader::domain::values::action::TradeAction;
use papertrader::domain::values::bot_state::BotState;
use papertrader::infrastructure::paper::portfolio::PaperPortfolio;
use std::sync::Arc;

fn market_with(prices: &[(&str, f64)]) -> Arc<FakeMarketData> {
    let market = FakeMarketData::new();
    for (symbol, price) in prices {
        market.set_price(symbol, *price);
    }
    market
}

#[tokio::test]
async fn test_daily_trade_count_cap() {
    let mut config = test_config(vec!["AAPL", "MSFT", "NVDA", "GOOGL", "AMZN"]);
    config.max_daily_trades = 2;
    let market = market_with(&[
        ("AAPL", 50.0),
        ("MSFT", 50.0),
        ("NVDA", 50.0),
        ("GOOGL", 50.0),
        ("AMZN", 50.0),
    ]);
    let provider = RepeatingProvider::new(ProviderKind::OpenAi, buy_json(90.0));
    let trader = setup(
        config,
        vec![provider],
        market,
        Arc::new(PaperPortfolio::new(100_000.0)),
    );

    let summary = trader.scan_once().await.unwrap();
    assert_eq!(summary.candidates, 5);
    assert_eq!(summary.decisions, 5);
    assert_eq!(summary.trades_queued, 2);
    assert_eq!(summary.exits_queued, 0);

    let decisions = trader.recent_decisions(10);
    let executed = decisions
        .iter()
        .filter(|d| d.decision == DecisionOutcome::ExecuteTrade)
        .count();
    let capped = decisions
        .iter()
        .filter(|d| d.reason.contains("daily trade count cap"))
        .count();
    assert_eq!(executed, 2);
    assert_eq!(capped, 3);

    assert_eq!(trader.queued_trades().len(), 2);
    assert_eq!(trader.status().trades_today, 2);
    // Every queued buy carries a protective stop-loss/take-profit pair.
    assert_eq!(trader.engine().open_oco_pairs().len(), 2);
}

#[tokio::test]
async fn test_daily_amount_cap() {
    let mut config = test_config(vec!["AAPL", "MSFT", "NVDA"]);
    config.max_daily_trades = 10;
    config.max_daily_trade_amount = 2_500.0;
    let market = market_with(&[("AAPL", 50.0), ("MSFT", 50.0), ("NVDA", 50.0)]);
    let provider = RepeatingProvider::new(ProviderKind::OpenAi, buy_json(90.0));
    let trader = setup(
        config,
        vec![provider],
        market,
        Arc::new(PaperPortfolio::new(10_000.0)),
    );

    // Each sized buy is $2,000; only one fits under a $2,500 daily cap.
    let summary = trader.scan_once().await.unwrap();
    assert_eq!(summary.trades_queued, 1);
    let over_cap = trader
        .recent_decisions(10)
        .iter()
        .filter(|d| d.reason.contains("amount cap"))
        .count();
    assert_eq!(over_cap, 2);
}

#[tokio::test]
async fn test_low_confidence_is_skipped() {
    let config = test_config(vec!["AAPL"]);
    let market = market_with(&[("AAPL", 50.0)]);
    let provider = RepeatingProvider::new(ProviderKind::OpenAi, buy_json(50.0));
    let trader = setup(
        config,
        vec![provider],
        market,
        Arc::new(PaperPortfolio::new(100_000.0)),
    );

    let summary = trader.scan_once().await.unwrap();
    assert_eq!(summary.trades_queued, 0);
    let decisions = trader.recent_decisions(10);
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].decision, DecisionOutcome::Skip);
    assert!(decisions[0].reason.contains("below threshold"));
}

#[tokio::test]
async fn test_hold_recommendation_is_skipped() {
    let config = test_config(vec!["AAPL"]);
    let market = market_with(&[("AAPL", 50.0)]);
    let provider = RepeatingProvider::new(ProviderKind::OpenAi, hold_json());
    let trader = setup(
        config,
        vec![provider],
        market,
        Arc::new(PaperPortfolio::new(100_000.0)),
    );

    trader.scan_once().await.unwrap();
    let decisions = trader.recent_decisions(10);
    assert_eq!(decisions[0].decision, DecisionOutcome::Skip);
    assert!(decisions[0].reason.contains("hold"));
}

#[tokio::test]
async fn test_zero_share_sizing_is_skipped() {
    let config = test_config(vec!["BRK"]);
    let market = market_with(&[("BRK", 500.0)]);
    let provider = RepeatingProvider::new(ProviderKind::OpenAi, buy_json(95.0));
    // $100 portfolio cannot afford a single $500 share within its caps.
    let trader = setup(
        config,
        vec![provider],
        market,
        Arc::new(PaperPortfolio::new(100.0)),
    );

    let summary = trader.scan_once().await.unwrap();
    assert_eq!(summary.trades_queued, 0);
    assert!(trader.recent_decisions(10)[0]
        .reason
        .contains("rounds to zero"));
}

#[tokio::test]
async fn test_critical_portfolio_risk_blocks_new_buys() {
    let config = test_config(vec!["AAPL"]);
    let market = market_with(&[("AAPL", 50.0)]);
    let provider = RepeatingProvider::new(ProviderKind::OpenAi, buy_json(95.0));
    // One position holds the entire portfolio: concentration is CRITICAL.
    let portfolio = Arc::new(PaperPortfolio::new(1_000.0).with_holding("TSLA", 100, 100.0));
    let trader = setup(config, vec![provider], market, portfolio);

    let summary = trader.scan_once().await.unwrap();
    assert_eq!(summary.trades_queued, 0);
    assert!(trader.recent_decisions(10)[0].reason.contains("CRITICAL"));
}

#[tokio::test]
async fn test_scan_prompts_state_held_quantity_per_symbol() {
    let config = test_config(vec!["AAPL", "MSFT"]);
    let market = market_with(&[("AAPL", 50.0), ("MSFT", 50.0)]);
    let provider = PromptRecordingProvider::new(ProviderKind::OpenAi);
    let portfolio = Arc::new(PaperPortfolio::new(10_000.0).with_holding("AAPL", 10, 50.0));
    let trader = setup(config, vec![provider.clone()], market, portfolio);

    trader.scan_once().await.unwrap();

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 2);
    let aapl = prompts.iter().find(|p| p.contains("AAPL")).unwrap();
    let msft = prompts.iter().find(|p| p.contains("MSFT")).unwrap();
    assert!(aapl.contains("10 shares of AAPL held"));
    assert!(msft.contains("0 shares of MSFT held"));
}

#[tokio::test]
async fn test_stop_loss_after_filled_buy_resolves_exit_pair() {
    let mut config = test_config(vec!["AAPL"]);
    config.max_daily_trades = 1;
    let market = market_with(&[("AAPL", 50.0)]);
    let provider = RepeatingProvider::new(ProviderKind::OpenAi, buy_json(90.0));
    let portfolio = Arc::new(PaperPortfolio::new(100_000.0));
    let trader = setup(config, vec![provider], market, portfolio.clone());

    trader.scan_once().await.unwrap();
    assert_eq!(trader.engine().open_oco_pairs().len(), 1);
    trader.start().unwrap();
    assert_eq!(trader.drain_once().await, 1);

    // Entry at $50, 10% stop → $45; drop through it.
    portfolio.mark_price("AAPL", 44.0);
    let summary = trader.scan_once().await.unwrap();
    assert_eq!(summary.exits_queued, 1);

    // The stop leg triggered and cancelled its take-profit sibling.
    assert!(trader.engine().open_oco_pairs().is_empty());
    let sell = trader
        .queued_trades()
        .into_iter()
        .find(|t| t.action == TradeAction::Sell)
        .unwrap();
    assert_eq!(sell.quantity, 400);
    assert_eq!(sell.target_price, 44.0);
    trader.stop().unwrap();
}

#[tokio::test]
async fn test_stop_loss_breach_queues_exit_sell() {
    let config = test_config(vec![]);
    let market = market_with(&[]);
    let provider = RepeatingProvider::new(ProviderKind::OpenAi, hold_json());
    let portfolio = Arc::new(PaperPortfolio::new(1_000.0).with_holding("AAPL", 10, 100.0));
    portfolio.mark_price("AAPL", 89.0); // below the $90 stop
    let trader = setup(config, vec![provider], market, portfolio);

    let summary = trader.scan_once().await.unwrap();
    assert_eq!(summary.exits_queued, 1);

    let queued = trader.queued_trades();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].action, TradeAction::Sell);
    assert_eq!(queued[0].quantity, 10);
    assert_eq!(queued[0].target_price, 89.0);
    assert!(trader.recent_decisions(10)[0].reason.contains("StopLoss"));

    // A second scan does not queue a duplicate exit.
    let summary = trader.scan_once().await.unwrap();
    assert_eq!(summary.exits_queued, 0);
    assert_eq!(trader.queued_trades().len(), 1);
}

#[tokio::test]
async fn test_drainer_executes_queued_exit() {
    let config = test_config(vec![]);
    let market = market_with(&[]);
    let provider = RepeatingProvider::new(ProviderKind::OpenAi, hold_json());
    let portfolio = Arc::new(PaperPortfolio::new(1_000.0).with_holding("AAPL", 10, 100.0));
    portfolio.mark_price("AAPL", 89.0);
    let trader = setup(config, vec![provider], market, portfolio.clone());

    trader.scan_once().await.unwrap();
    trader.start().unwrap();
    let completed = trader.drain_once().await;
    assert_eq!(completed, 1);

    let queued = trader.queued_trades();
    assert_eq!(queued[0].status, TradeStatus::Completed);
    assert_eq!(trader.status().pending_trades, 0);

    // 10 shares sold at $89 on a $1,000 cash base.
    use papertrader::domain::ports::portfolio::PortfolioPort;
    assert!((portfolio.get_cash_balance().await.unwrap() - 1_890.0).abs() < 1e-9);
    assert!(portfolio.get_holdings().await.unwrap().is_empty());

    // Selling below the average entry counts as a loss.
    let perf = trader.performance();
    assert_eq!(perf.trades_executed, 1);
    assert_eq!(perf.losses, 1);
    assert_eq!(perf.wins, 0);

    trader.stop().unwrap();
}

#[tokio::test]
async fn test_drainer_is_gated_on_running() {
    let config = test_config(vec![]);
    let market = market_with(&[]);
    let provider = RepeatingProvider::new(ProviderKind::OpenAi, hold_json());
    let portfolio = Arc::new(PaperPortfolio::new(1_000.0).with_holding("AAPL", 10, 100.0));
    portfolio.mark_price("AAPL", 89.0);
    let trader = setup(config, vec![provider], market, portfolio);

    trader.scan_once().await.unwrap();
    // Engine never started: the due trade stays queued.
    assert_eq!(trader.drain_once().await, 0);
    assert_eq!(trader.queued_trades()[0].status, TradeStatus::Pending);
}

#[tokio::test]
async fn test_failed_execution_is_recorded_not_fatal() {
    let mut config = test_config(vec!["AAPL"]);
    config.max_daily_trades = 1;
    let market = market_with(&[("AAPL", 50.0)]);
    let provider = RepeatingProvider::new(ProviderKind::OpenAi, buy_json(90.0));
    let trader = setup(
        config,
        vec![provider],
        market,
        Arc::new(BrokenExecutionPortfolio { cash: 100_000.0 }),
    );

    trader.scan_once().await.unwrap();
    assert_eq!(trader.queued_trades().len(), 1);

    trader.start().unwrap();
    assert_eq!(trader.drain_once().await, 0);

    let queued = trader.queued_trades();
    assert_eq!(queued[0].status, TradeStatus::Failed);
    assert!(queued[0]
        .failure_reason
        .as_deref()
        .unwrap()
        .contains("Insufficient funds"));

    // One bad fill is a per-trade outcome, not an engine failure.
    assert_eq!(trader.status().state, BotState::Running);
    assert_eq!(trader.performance().trades_failed, 1);
    trader.stop().unwrap();
}

#[tokio::test]
async fn test_consecutive_failures_escalate_to_error() {
    let mut config = test_config(vec!["AAPL", "MSFT"]);
    config.max_daily_trades = 2;
    config.max_consecutive_failures = 2;
    let market = market_with(&[("AAPL", 50.0), ("MSFT", 50.0)]);
    let provider = RepeatingProvider::new(ProviderKind::OpenAi, buy_json(90.0));
    let trader = setup(
        config,
        vec![provider],
        market,
        Arc::new(BrokenExecutionPortfolio { cash: 100_000.0 }),
    );

    trader.scan_once().await.unwrap();
    assert_eq!(trader.queued_trades().len(), 2);

    trader.start().unwrap();
    trader.drain_once().await;

    let status = trader.status();
    assert_eq!(status.state, BotState::Error);
    assert!(status.error_message.is_some());

    // ERROR must be acknowledged by stop() before a restart is legal.
    assert!(matches!(
        trader.start(),
        Err(DomainError::InvalidTransition(_))
    ));
    trader.stop().unwrap();
    assert_eq!(trader.status().state, BotState::Stopped);
    trader.start().unwrap();
    assert_eq!(trader.status().state, BotState::Running);
    trader.emergency_stop();
}

#[tokio::test]
async fn test_custom_success_policy_drives_attribution() {
    use papertrader::application::engine::SuccessPolicy;
    use papertrader::domain::ports::portfolio::{Holding, TradeFill};
    use papertrader::PaperTrader;

    // Counts every executed fill as a win, whatever the P&L.
    struct AlwaysWin;
    impl SuccessPolicy for AlwaysWin {
        fn judge(&self, _fill: &TradeFill, _before: Option<&Holding>) -> Option<bool> {
            Some(true)
        }
    }

    let market = market_with(&[]);
    let provider = RepeatingProvider::new(ProviderKind::OpenAi, hold_json());
    let portfolio = Arc::new(PaperPortfolio::new(1_000.0).with_holding("AAPL", 10, 100.0));
    portfolio.mark_price("AAPL", 89.0);
    let trader = PaperTrader::with_success_policy(
        test_config(vec![]),
        vec![provider],
        market,
        portfolio,
        Arc::new(papertrader::infrastructure::clock::SystemClock),
        Box::new(AlwaysWin),
    );

    trader.scan_once().await.unwrap();
    trader.start().unwrap();
    assert_eq!(trader.drain_once().await, 1);

    // The losing sell still scores as a win under the injected policy.
    let perf = trader.performance();
    assert_eq!(perf.wins, 1);
    assert_eq!(perf.losses, 0);
    trader.stop().unwrap();
}

#[tokio::test]
async fn test_unreachable_portfolio_is_fatal() {
    let config = test_config(vec!["AAPL"]);
    let market = market_with(&[("AAPL", 50.0)]);
    let provider = RepeatingProvider::new(ProviderKind::OpenAi, buy_json(90.0));
    let trader = setup(config, vec![provider], market, Arc::new(UnreachablePortfolio));

    trader.start().unwrap();
    let err = trader.scan_once().await.unwrap_err();
    assert!(matches!(err, DomainError::PortfolioUnreachable(_)));

    let status = trader.status();
    assert_eq!(status.state, BotState::Error);
    assert!(status.error_message.is_some());

    trader.stop().unwrap();
    assert_eq!(trader.status().state, BotState::Stopped);
}
