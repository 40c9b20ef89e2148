//! Account listing

use std::path::Path;

use anyhow::Result;
use fincast_core::{accounts, FincastConfig};

use super::{load_transactions, resolve_profile};

pub fn cmd_accounts(
    config: &FincastConfig,
    file: &Path,
    profile: Option<&str>,
    json: bool,
) -> Result<()> {
    let profile = resolve_profile(config, profile)?;
    let import = load_transactions(file, profile)?;
    let summaries = accounts(&import.transactions);

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("No transactions found in {}.", file.display());
        return Ok(());
    }

    println!();
    println!("🏦 Accounts ({} header profile)", import.profile);
    println!("   ─────────────────────────────────────");
    println!("   {:24} │ {:>8}", "Account", "Rows");
    println!("   ─────────────────────────┼──────────");
    for summary in &summaries {
        println!(
            "   {:24} │ {:>8}",
            summary.account_id, summary.transaction_count
        );
    }
    if import.skipped_rows > 0 {
        println!();
        println!("   {} rows skipped (unreadable date or account)", import.skipped_rows);
    }

    Ok(())
}
