//! Fincast CLI - Household finance analytics
//!
//! Usage:
//!   fincast accounts --file CSV                 List accounts in a transaction file
//!   fincast health --file CSV --account ID      Classify savings health
//!   fincast forecast --history CSV              Forecast exchange rates
//!   fincast advise --action buy --threshold 2   Buy/sell advisories
//!   fincast inflation --file CSV                Income growth vs inflation
//!   fincast run --transactions CSV --account ID --inflation CSV

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use fincast_core::FincastConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let (config, source) = FincastConfig::load(cli.config.as_deref())?;
    tracing::debug!("Using configuration from {}", source);

    match cli.command {
        Commands::Accounts { file, profile } => {
            commands::cmd_accounts(&config, &file, profile.as_deref(), cli.json)
        }
        Commands::Health {
            file,
            account,
            window,
            profile,
            export,
        } => commands::cmd_health(
            &config,
            &file,
            &account,
            window,
            profile.as_deref(),
            export.as_deref(),
            cli.json,
        )
        .map(|_| ()),
        Commands::Forecast { rates } => commands::cmd_forecast(&config, &rates, cli.json)
            .await
            .map(|_| ()),
        Commands::Advise {
            rates,
            threshold,
            action,
            current_rate,
            all,
        } => commands::cmd_advise(
            &config,
            &rates,
            threshold,
            action.as_deref(),
            current_rate,
            all,
            cli.json,
        )
        .await
        .map(|_| ()),
        Commands::Inflation {
            file,
            income,
            growth,
        } => commands::cmd_inflation(&config, &file, income, growth, cli.json).map(|_| ()),
        Commands::Run {
            transactions,
            account,
            inflation,
            rates,
        } => {
            commands::cmd_run(&config, &transactions, &account, &inflation, &rates, cli.json)
                .await
        }
        Commands::Config => commands::cmd_config(&config, &source, cli.json),
    }
}
