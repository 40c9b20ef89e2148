//! Monthly income/spending aggregation for a single account

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{MonthlyBucket, MonthlySeries, Transaction, YearMonth};

/// Number of most recent months kept when no window is configured
pub const DEFAULT_WINDOW_MONTHS: usize = 60;

#[derive(Default)]
struct MonthTotals {
    income: Option<f64>,
    spending: Option<f64>,
}

fn add(total: &mut Option<f64>, amount: Option<f64>) {
    if let Some(amount) = amount {
        *total = Some(total.unwrap_or(0.0) + amount);
    }
}

/// Aggregate one account's transactions into a monthly series
///
/// Only rows for `account_id` are considered. Deposits sum into income and
/// withdrawals into spending; missing amounts are left out of the sums. A
/// month appears once it has at least one deposit or withdrawal, and a side
/// with nothing recorded is reported as 0. Only the last `window_months`
/// months are kept, oldest first.
pub fn aggregate(
    transactions: &[Transaction],
    account_id: &str,
    window_months: usize,
) -> Result<MonthlySeries> {
    let mut months: BTreeMap<YearMonth, MonthTotals> = BTreeMap::new();
    let mut seen_account = false;

    for tx in transactions.iter().filter(|tx| tx.account_id == account_id) {
        seen_account = true;
        if tx.deposit_amount.is_none() && tx.withdrawal_amount.is_none() {
            continue;
        }
        let totals = months.entry(tx.year_month()).or_default();
        add(&mut totals.income, tx.deposit_amount);
        add(&mut totals.spending, tx.withdrawal_amount);
    }

    if !seen_account {
        return Err(Error::AccountNotFound(account_id.to_string()));
    }

    let skip = months.len().saturating_sub(window_months);
    let buckets: Vec<MonthlyBucket> = months
        .into_iter()
        .skip(skip)
        .map(|(year_month, totals)| {
            MonthlyBucket::new(
                year_month,
                totals.income.unwrap_or(0.0),
                totals.spending.unwrap_or(0.0),
            )
        })
        .collect();

    debug!(
        "Aggregated account {} into {} months ({} older months dropped)",
        account_id,
        buckets.len(),
        skip
    );

    Ok(MonthlySeries::new(account_id, buckets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tx(account: &str, date: &str, deposit: Option<f64>, withdrawal: Option<f64>) -> Transaction {
        Transaction {
            account_id: account.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            deposit_amount: deposit,
            withdrawal_amount: withdrawal,
        }
    }

    #[test]
    fn test_single_month_excludes_other_accounts() {
        let transactions = vec![
            tx("A", "2024-01-05", Some(1000.0), None),
            tx("A", "2024-01-20", None, Some(400.0)),
            tx("B", "2024-01-10", Some(5000.0), None),
        ];

        let series = aggregate(&transactions, "A", DEFAULT_WINDOW_MONTHS).unwrap();
        assert_eq!(series.len(), 1);
        let bucket = &series.buckets()[0];
        assert_eq!(bucket.year_month, YearMonth::new(2024, 1));
        assert_eq!(bucket.income, 1000.0);
        assert_eq!(bucket.spending, 400.0);
        assert_eq!(bucket.net_savings, 600.0);
        assert_eq!(series.account_id, "A");
    }

    #[test]
    fn test_missing_side_defaults_to_zero() {
        let transactions = vec![
            tx("A", "2024-01-05", Some(100.0), None),
            tx("A", "2024-02-05", None, Some(30.0)),
        ];

        let series = aggregate(&transactions, "A", 60).unwrap();
        assert_eq!(series.buckets()[0].spending, 0.0);
        assert_eq!(series.buckets()[1].income, 0.0);
        assert_eq!(series.buckets()[1].net_savings, -30.0);
    }

    #[test]
    fn test_rows_without_amounts_do_not_create_months() {
        let transactions = vec![
            tx("A", "2024-01-05", Some(100.0), None),
            tx("A", "2024-03-05", None, None),
        ];

        let series = aggregate(&transactions, "A", 60).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_window_keeps_most_recent_months_in_order() {
        let transactions: Vec<Transaction> = (1..=12)
            .rev()
            .map(|m| tx("A", &format!("2023-{:02}-15", m), Some(m as f64), None))
            .collect();

        let series = aggregate(&transactions, "A", 3).unwrap();
        let months: Vec<String> = series
            .buckets()
            .iter()
            .map(|b| b.year_month.to_string())
            .collect();
        assert_eq!(months, vec!["2023-10", "2023-11", "2023-12"]);
    }

    #[test]
    fn test_fewer_months_than_window_uses_all() {
        let transactions = vec![
            tx("A", "2022-12-31", Some(1.0), None),
            tx("A", "2023-01-01", Some(2.0), None),
        ];
        let series = aggregate(&transactions, "A", 60).unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_zero_window_is_empty() {
        let transactions = vec![tx("A", "2024-01-05", Some(1.0), None)];
        let series = aggregate(&transactions, "A", 0).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_unknown_account() {
        let transactions = vec![tx("A", "2024-01-05", Some(1.0), None)];
        let err = aggregate(&transactions, "Z", 60).unwrap_err();
        assert!(matches!(err, Error::AccountNotFound(ref id) if id == "Z"));
    }

    #[test]
    fn test_net_savings_matches_flattened_totals() {
        let transactions = vec![
            tx("A", "2023-11-02", Some(250.5), Some(10.0)),
            tx("A", "2023-11-20", None, Some(99.5)),
            tx("A", "2023-12-01", Some(1200.0), None),
            tx("A", "2024-01-15", None, Some(700.25)),
            tx("A", "2024-01-16", None, None),
        ];

        let total_income: f64 = transactions.iter().filter_map(|t| t.deposit_amount).sum();
        let total_spending: f64 = transactions.iter().filter_map(|t| t.withdrawal_amount).sum();

        let series = aggregate(&transactions, "A", 60).unwrap();
        assert!((series.total_net_savings() - (total_income - total_spending)).abs() < 1e-9);
        assert!((series.total_income() - total_income).abs() < 1e-9);
    }
}
