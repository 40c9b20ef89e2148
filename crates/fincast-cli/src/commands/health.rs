//! Financial health command

use std::path::Path;

use anyhow::{Context, Result};
use fincast_core::{
    aggregate, export_monthly_series, ExportFormat, FinancialStatus, FincastConfig,
    HealthClassifier,
};

use super::{load_transactions, resolve_profile, write_export};

pub fn cmd_health(
    config: &FincastConfig,
    file: &Path,
    account: &str,
    window: Option<usize>,
    profile: Option<&str>,
    export: Option<&Path>,
    json: bool,
) -> Result<FinancialStatus> {
    let profile = resolve_profile(config, profile)?;
    let import = load_transactions(file, profile)?;

    let window = window.unwrap_or(config.health.window_months);
    let series = aggregate(&import.transactions, account, window)
        .with_context(|| format!("Failed to aggregate account {}", account))?;
    let status = HealthClassifier::with_well_off_above(config.health.well_off_above).classify(&series);

    if let Some(path) = export {
        let contents = export_monthly_series(&series, status, ExportFormat::from_path(path))?;
        write_export(path, &contents)?;
    }

    if json {
        println!(
            "{}",
            export_monthly_series(&series, status, ExportFormat::Json)?
        );
        return Ok(status);
    }

    println!();
    println!("💰 Financial Health: account {}", account);
    match (series.first_month(), series.last_month()) {
        (Some(first), Some(last)) => println!(
            "   Period: {} to {} ({} months, window {})",
            first,
            last,
            series.len(),
            window
        ),
        _ => println!("   No months with recorded amounts in the last {} months.", window),
    }
    println!("   ─────────────────────────────────────────────────────────────");

    if !series.is_empty() {
        println!(
            "   {:8} │ {:>14} │ {:>14} │ {:>14}",
            "Month", "Income", "Spending", "Net Savings"
        );
        println!("   ─────────┼────────────────┼────────────────┼────────────────");
        for bucket in series.buckets() {
            println!(
                "   {:8} │ {:>14.2} │ {:>14.2} │ {:>14.2}",
                bucket.year_month.to_string(),
                bucket.income,
                bucket.spending,
                bucket.net_savings
            );
        }
        println!("   ─────────┼────────────────┼────────────────┼────────────────");
        println!(
            "   {:8} │ {:>14.2} │ {:>14.2} │ {:>14.2}",
            "Total",
            series.total_income(),
            series.total_spending(),
            series.total_net_savings()
        );
    }

    println!();
    println!("   Financial Status: {}", status.label());

    Ok(status)
}
