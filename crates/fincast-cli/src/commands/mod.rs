//! CLI command implementations
//!
//! Commands are organized by pipeline:
//! - `accounts` - List account ids in a transaction file
//! - `health` - Monthly aggregation and financial health classification
//! - `rates` - Exchange-rate forecast and buy/sell advisories
//! - `inflation` - Income growth versus inflation
//! - `run` - All three pipelines in one invocation
//! - `config` - Show the resolved configuration

pub mod accounts;
pub mod config;
pub mod health;
pub mod inflation;
pub mod rates;
pub mod run;

// Re-export command functions for main.rs
pub use accounts::*;
pub use config::*;
pub use health::*;
pub use inflation::*;
pub use rates::*;
pub use run::*;

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use fincast_core::{parse_transactions, FincastConfig, HeaderProfile, TransactionImport};
use tracing::{info, warn};

/// Header profile from `--profile`, falling back to the configured one
pub fn resolve_profile(config: &FincastConfig, flag: Option<&str>) -> Result<HeaderProfile> {
    match flag {
        Some(profile) => profile.parse().map_err(anyhow::Error::msg),
        None => Ok(config.import.header_profile),
    }
}

/// Open a CSV input with a readable error
pub fn open_input(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to open {}", path.display()))
}

/// Read a transaction file, warning about skipped rows
pub fn load_transactions(path: &Path, profile: HeaderProfile) -> Result<TransactionImport> {
    let import = parse_transactions(open_input(path)?, profile)
        .with_context(|| format!("Failed to read transactions from {}", path.display()))?;
    if import.skipped_rows > 0 {
        warn!(
            "Skipped {} unreadable rows in {}",
            import.skipped_rows,
            path.display()
        );
    }
    Ok(import)
}

/// Parse a YYYY-MM-DD command-line date
pub fn parse_date_arg(value: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid --{} date format (use YYYY-MM-DD)", flag))
}

/// Write exported results to a file
pub fn write_export(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write export to {}", path.display()))?;
    info!("Exported to {}", path.display());
    Ok(())
}
