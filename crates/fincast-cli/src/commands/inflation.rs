//! Income versus inflation command

use std::path::Path;

use anyhow::{Context, Result};
use fincast_core::{
    compare_income_to_inflation, parse_inflation, FincastConfig, IncomeProjection,
    ProjectionStatus,
};

use super::open_input;

pub fn cmd_inflation(
    config: &FincastConfig,
    file: &Path,
    income: Option<f64>,
    growth: Option<f64>,
    json: bool,
) -> Result<Vec<IncomeProjection>> {
    let records = parse_inflation(open_input(file)?)
        .with_context(|| format!("Failed to read inflation table {}", file.display()))?;

    let base_income = income.unwrap_or(config.income.base_income);
    let growth = growth.unwrap_or(config.income.annual_growth_pct);
    let projections = compare_income_to_inflation(&records, base_income, growth);

    if json {
        println!("{}", serde_json::to_string_pretty(&projections)?);
        return Ok(projections);
    }

    println!();
    println!(
        "📈 Income vs Inflation (base ${:.2}, growth {}% per year)",
        base_income, growth
    );
    println!("   ─────────────────────────────────────────────────────────────");

    if projections.is_empty() {
        println!("   No inflation records in {}.", file.display());
        return Ok(projections);
    }

    for projection in &projections {
        println!("   {}", projection);
    }

    let favorable = projections
        .iter()
        .filter(|p| p.status == ProjectionStatus::Favorable)
        .count();
    println!();
    println!(
        "   Income keeps pace with inflation in {} of {} years",
        favorable,
        projections.len()
    );

    Ok(projections)
}
