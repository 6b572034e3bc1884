use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "papertrader", about = "Automated paper-trading assistant")]
pub struct Cli {
    /// Path to a JSON config file; defaults apply when omitted.
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the engine and run scan/drain loops until Ctrl+C
    Run,
    /// Run a single scan cycle and print the decisions it produced
    Scan,
    /// Show current bot status
    Status,
    /// Show the last N decisions from the audit trail
    Decisions {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Show queued trades
    Trades,
    /// Show the current portfolio risk snapshot and exit targets
    Risk,
    /// Show per-provider quota usage
    Quota,
    /// Ask for a one-off recommendation for a symbol
    Recommend { symbol: String },
}
