//! CSV import for transaction, inflation, and exchange-rate tables
//!
//! Transaction files come in two header layouts:
//! - lowercase: `account number,date of transaction,deposits,withdrawals`
//! - banking: `Account No,DATE,...,WITHDRAWAL AMT,DEPOSIT AMT,...`
//!
//! Header matching is case-insensitive and ignores surrounding whitespace.
//! Malformed dates skip the row; malformed amounts become missing values.

use std::collections::HashMap;
use std::io::Read;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{InflationYearRecord, RateObservation, RateSeries, Transaction};

/// Which header layout a transaction file uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HeaderProfile {
    /// Detect from the header row
    #[default]
    Auto,
    Lowercase,
    Banking,
}

impl HeaderProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Lowercase => "lowercase",
            Self::Banking => "banking",
        }
    }

    /// Required headers (normalized) in account, date, deposit, withdrawal order
    fn required_headers(&self) -> Option<[&'static str; 4]> {
        match self {
            Self::Auto => None,
            Self::Lowercase => Some([
                "account number",
                "date of transaction",
                "deposits",
                "withdrawals",
            ]),
            Self::Banking => Some(["account no", "date", "deposit amt", "withdrawal amt"]),
        }
    }
}

impl std::str::FromStr for HeaderProfile {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "lowercase" => Ok(Self::Lowercase),
            "banking" => Ok(Self::Banking),
            _ => Err(format!(
                "Unknown header profile: {} (valid: auto, lowercase, banking)",
                s
            )),
        }
    }
}

impl std::fmt::Display for HeaderProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of reading a transaction table
#[derive(Debug, Clone)]
pub struct TransactionImport {
    pub transactions: Vec<Transaction>,
    /// Rows dropped because the account or date could not be read
    pub skipped_rows: usize,
    /// The concrete profile that was used (never `Auto`)
    pub profile: HeaderProfile,
}

/// An account id seen in a transaction table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub account_id: String,
    pub transaction_count: usize,
}

struct ColumnMap {
    account: usize,
    date: usize,
    deposit: usize,
    withdrawal: usize,
}

fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

fn header_index(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (normalize_header(h), i))
        .collect()
}

/// Detect the header profile from a header row
///
/// Returns None if neither layout's required columns are all present.
pub fn detect_header_profile(headers: &StringRecord) -> Option<HeaderProfile> {
    let index = header_index(headers);
    [HeaderProfile::Lowercase, HeaderProfile::Banking]
        .into_iter()
        .find(|profile| {
            profile
                .required_headers()
                .is_some_and(|req| req.iter().all(|h| index.contains_key(*h)))
        })
}

fn resolve_columns(headers: &StringRecord, profile: HeaderProfile) -> Result<(ColumnMap, HeaderProfile)> {
    let profile = match profile {
        HeaderProfile::Auto => detect_header_profile(headers).ok_or_else(|| {
            Error::DataFormat(format!(
                "Unrecognized transaction headers: [{}]. Expected [{}] or [{}]",
                headers.iter().collect::<Vec<_>>().join(", "),
                HeaderProfile::Lowercase.required_headers().unwrap_or_default().join(", "),
                HeaderProfile::Banking.required_headers().unwrap_or_default().join(", "),
            ))
        })?,
        explicit => explicit,
    };

    let index = header_index(headers);
    let required = profile.required_headers().unwrap_or_default();
    let mut found = [0usize; 4];
    for (slot, name) in found.iter_mut().zip(required.iter()) {
        *slot = *index.get(*name).ok_or_else(|| {
            Error::DataFormat(format!(
                "Missing column '{}' for {} header profile (found: {})",
                name,
                profile,
                headers.iter().collect::<Vec<_>>().join(", ")
            ))
        })?;
    }

    Ok((
        ColumnMap {
            account: found[0],
            date: found[1],
            deposit: found[2],
            withdrawal: found[3],
        },
        profile,
    ))
}

/// Parse a transaction table
pub fn parse_transactions<R: Read>(reader: R, profile: HeaderProfile) -> Result<TransactionImport> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let (columns, profile) = resolve_columns(&headers, profile)?;
    debug!("Reading transactions with {} header profile", profile);

    let mut transactions = Vec::new();
    let mut skipped_rows = 0;

    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        // Banking exports suffix account numbers with a stray apostrophe
        let account_id = record
            .get(columns.account)
            .map(|s| s.trim().trim_matches('\''))
            .unwrap_or_default();
        if account_id.is_empty() {
            warn!("Skipping line {}: missing account identifier", line);
            skipped_rows += 1;
            continue;
        }

        let raw_date = record.get(columns.date).unwrap_or_default();
        let Some(date) = parse_date(raw_date) else {
            warn!("Skipping line {}: unable to parse date '{}'", line, raw_date);
            skipped_rows += 1;
            continue;
        };

        let deposit_amount = record.get(columns.deposit).and_then(parse_amount);
        let withdrawal_amount = record.get(columns.withdrawal).and_then(parse_amount);

        transactions.push(Transaction {
            account_id: account_id.to_string(),
            date,
            deposit_amount,
            withdrawal_amount,
        });
    }

    debug!(
        "Parsed {} transactions ({} rows skipped)",
        transactions.len(),
        skipped_rows
    );
    Ok(TransactionImport {
        transactions,
        skipped_rows,
        profile,
    })
}

/// Distinct account ids in first-seen order, with row counts
pub fn accounts(transactions: &[Transaction]) -> Vec<AccountSummary> {
    let mut summaries: Vec<AccountSummary> = Vec::new();
    for tx in transactions {
        match summaries.iter_mut().find(|s| s.account_id == tx.account_id) {
            Some(summary) => summary.transaction_count += 1,
            None => summaries.push(AccountSummary {
                account_id: tx.account_id.clone(),
                transaction_count: 1,
            }),
        }
    }
    summaries
}

const INFLATION_YEAR_HEADER: &str = "year";
const INFLATION_RATE_HEADER: &str = "predicted yearly inflation rate (%)";

/// Parse the inflation table, keeping file order
pub fn parse_inflation<R: Read>(reader: R) -> Result<Vec<InflationYearRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let index = header_index(&headers);
    let year_col = *index.get(INFLATION_YEAR_HEADER).ok_or_else(|| {
        Error::DataFormat("Inflation table is missing the 'Year' column".into())
    })?;
    let rate_col = *index.get(INFLATION_RATE_HEADER).ok_or_else(|| {
        Error::DataFormat(
            "Inflation table is missing the 'Predicted Yearly Inflation Rate (%)' column".into(),
        )
    })?;

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let raw_year = record.get(year_col).unwrap_or_default();
        let year = parse_year(raw_year).ok_or_else(|| {
            Error::DataFormat(format!("Line {}: invalid year '{}'", line, raw_year))
        })?;

        let raw_rate = record.get(rate_col).unwrap_or_default();
        let inflation_rate_pct = parse_percentage(raw_rate).ok_or_else(|| {
            Error::DataFormat(format!("Line {}: invalid inflation rate '{}'", line, raw_rate))
        })?;

        records.push(InflationYearRecord {
            year,
            inflation_rate_pct,
        });
    }

    debug!("Parsed {} inflation records", records.len());
    Ok(records)
}

/// Parse an offline exchange-rate history (`date,rate`; `ds,y` also accepted)
pub fn parse_rate_history<R: Read>(reader: R) -> Result<RateSeries> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let index = header_index(&headers);
    let date_col = index
        .get("date")
        .or_else(|| index.get("ds"))
        .copied()
        .ok_or_else(|| Error::DataFormat("Rate history is missing a 'date' column".into()))?;
    let rate_col = index
        .get("rate")
        .or_else(|| index.get("y"))
        .copied()
        .ok_or_else(|| Error::DataFormat("Rate history is missing a 'rate' column".into()))?;

    let mut observations = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let date = record.get(date_col).and_then(parse_date);
        let rate = record
            .get(rate_col)
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|r| r.is_finite() && *r > 0.0);

        match (date, rate) {
            (Some(date), Some(rate)) => observations.push(RateObservation::new(date, rate)),
            _ => warn!("Skipping rate history line {}: malformed date or rate", line),
        }
    }

    let series = RateSeries::from_observations(observations);
    debug!("Parsed {} rate observations", series.len());
    Ok(series)
}

/// Parse a date string in various common formats
///
/// Timestamps are accepted by reading only their leading date part.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%Y", // 01/15/2024
        "%d-%b-%y", // 15-Jan-24
        "%d-%b-%Y", // 15-Jan-2024
        "%d %b %Y", // 15 Jan 2024
        "%d/%m/%Y", // 15/01/2024 (European)
        "%m/%d/%y", // 01/15/24
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    // "2024-01-15 10:30:00" or "2024-01-15T10:30:00Z"
    let prefix = s.split(['T', ' ']).next().unwrap_or_default();
    if prefix.len() < s.len() {
        return parse_date(prefix);
    }

    None
}

/// Parse a monetary amount, stripping grouping separators and currency symbols
///
/// Empty, unparsable, negative, or non-finite values are treated as missing.
pub fn parse_amount(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' ', '"', '\''], "");

    if cleaned.is_empty() {
        return None;
    }

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Some(value),
        Ok(value) => {
            debug!("Ignoring out-of-range amount: {}", value);
            None
        }
        Err(_) => {
            debug!("Ignoring unparsable amount: {}", s);
            None
        }
    }
}

fn parse_year(s: &str) -> Option<i32> {
    let s = s.trim();
    s.parse::<i32>().ok().or_else(|| {
        // Spreadsheet exports sometimes write years as "2025.0"
        s.parse::<f64>()
            .ok()
            .filter(|y| y.fract() == 0.0 && y.abs() < i32::MAX as f64)
            .map(|y| y as i32)
    })
}

fn parse_percentage(s: &str) -> Option<f64> {
    s.trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
