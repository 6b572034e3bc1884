use clap::Parser;
use papertrader::cli::commands::{Cli, Commands};
use papertrader::config::BotConfig;
use papertrader::PaperTrader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => match BotConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {e}");
                std::process::exit(1);
            }
        },
        None => BotConfig::default(),
    };

    let trader = PaperTrader::new(config);
    if let Err(e) = run_command(trader, cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_command(
    trader: PaperTrader,
    cmd: Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::Run => {
            trader.start()?;
            println!("Engine running; press Ctrl+C to stop.");
            tokio::signal::ctrl_c().await?;
            trader.stop()?;
            println!(
                "{}",
                serde_json::to_string_pretty(&trader.performance())?
            );
        }
        Commands::Scan => {
            let summary = trader.scan_once().await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            let decisions = trader.recent_decisions(summary.decisions + summary.exits_queued);
            println!("{}", serde_json::to_string_pretty(&decisions)?);
        }
        Commands::Status => {
            println!(
                "{}",
                serde_json::to_string_pretty(&trader.status())?
            );
            println!("{}", trader.cache_status());
        }
        Commands::Decisions { limit } => {
            let decisions = trader.recent_decisions(limit);
            println!("{}", serde_json::to_string_pretty(&decisions)?);
        }
        Commands::Trades => {
            println!(
                "{}",
                serde_json::to_string_pretty(&trader.queued_trades())?
            );
        }
        Commands::Risk => {
            let snapshot = trader.risk_snapshot().await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            let targets = trader.exit_targets().await?;
            println!("{}", serde_json::to_string_pretty(&targets)?);
        }
        Commands::Quota => {
            println!(
                "{}",
                serde_json::to_string_pretty(&trader.quota_usage())?
            );
        }
        Commands::Recommend { symbol } => {
            let rec = trader.recommend(&symbol).await?;
            println!("{}", serde_json::to_string_pretty(&rec)?);
        }
    }
    Ok(())
}
