//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Fincast - Household finance health, exchange-rate forecasts and inflation checks
#[derive(Parser)]
#[command(name = "fincast")]
#[command(about = "Personal finance analytics: savings health, rate forecasts, inflation", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ~/.local/share/fincast/config.toml, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List account ids found in a transaction CSV
    Accounts {
        /// Transaction CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Header profile: auto, lowercase, banking
        #[arg(long)]
        profile: Option<String>,
    },

    /// Classify an account's financial health from its monthly net savings
    Health {
        /// Transaction CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Account id to analyze
        #[arg(short, long)]
        account: String,

        /// Number of most recent months to include
        #[arg(short, long)]
        window: Option<usize>,

        /// Header profile: auto, lowercase, banking
        #[arg(long)]
        profile: Option<String>,

        /// Write the monthly series to a file (.csv or .json)
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Forecast exchange rates
    Forecast {
        #[command(flatten)]
        rates: RateArgs,
    },

    /// Recommend when to buy or sell based on forecast rates
    Advise {
        #[command(flatten)]
        rates: RateArgs,

        /// Minimum favorable move in percent of the current rate
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Trade direction: buy or sell
        #[arg(long)]
        action: Option<String>,

        /// Current rate (fetched from the provider if omitted)
        #[arg(long)]
        current_rate: Option<f64>,

        /// Include advisories for dates inside the history, not just future dates
        #[arg(long)]
        all: bool,
    },

    /// Compare projected income growth against an inflation table
    Inflation {
        /// Inflation CSV file (Year, Predicted Yearly Inflation Rate (%))
        #[arg(short, long)]
        file: PathBuf,

        /// Base annual income
        #[arg(long)]
        income: Option<f64>,

        /// Annual income growth in percent
        #[arg(long)]
        growth: Option<f64>,
    },

    /// Run the health, forecast and inflation pipelines together
    Run {
        /// Transaction CSV file
        #[arg(long)]
        transactions: PathBuf,

        /// Account id to analyze
        #[arg(short, long)]
        account: String,

        /// Inflation CSV file
        #[arg(long)]
        inflation: PathBuf,

        #[command(flatten)]
        rates: RateArgs,
    },

    /// Show the resolved configuration and where it came from
    Config,
}

/// Where rate history comes from and how far to forecast
#[derive(Args, Debug, Clone, Default)]
pub struct RateArgs {
    /// Offline rate history CSV (date,rate); skips the rate provider
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// History start date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// History end date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Base currency (e.g. USD)
    #[arg(long)]
    pub base: Option<String>,

    /// Target currency (e.g. EUR)
    #[arg(long)]
    pub target: Option<String>,

    /// Days to forecast past the last observation (at most 3650)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=fincast_core::MAX_HORIZON_DAYS as i64))]
    pub horizon: Option<u32>,

    /// Write results to a file (.csv or .json)
    #[arg(long)]
    pub export: Option<PathBuf>,
}
