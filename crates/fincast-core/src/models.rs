//! Domain models for fincast

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::Error;

// ========== Transactions & Monthly Aggregation ==========

/// A single row of the transaction table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub account_id: String,
    pub date: NaiveDate,
    /// Money in. `None` when the cell was empty or could not be parsed.
    pub deposit_amount: Option<f64>,
    /// Money out. `None` when the cell was empty or could not be parsed.
    pub withdrawal_amount: Option<f64>,
}

impl Transaction {
    pub fn year_month(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }
}

/// Calendar month key, ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("Invalid year-month: {} (expected YYYY-MM)", s))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("Invalid year in: {}", s))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("Invalid month in: {}", s))?;
        if !(1..=12).contains(&month) {
            return Err(format!("Month out of range in: {}", s));
        }
        Ok(Self { year, month })
    }
}

/// Aggregated totals for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    pub year_month: YearMonth,
    pub income: f64,
    pub spending: f64,
    /// Always `income - spending`
    pub net_savings: f64,
}

impl MonthlyBucket {
    pub fn new(year_month: YearMonth, income: f64, spending: f64) -> Self {
        Self {
            year_month,
            income,
            spending,
            net_savings: income - spending,
        }
    }
}

/// Chronologically ordered monthly buckets for a single account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MonthlySeriesData")]
pub struct MonthlySeries {
    pub account_id: String,
    buckets: Vec<MonthlyBucket>,
}

/// Wire shape of `MonthlySeries`, re-sorted on the way in
#[derive(Deserialize)]
struct MonthlySeriesData {
    account_id: String,
    buckets: Vec<MonthlyBucket>,
}

impl From<MonthlySeriesData> for MonthlySeries {
    fn from(data: MonthlySeriesData) -> Self {
        Self::new(data.account_id, data.buckets)
    }
}

impl MonthlySeries {
    /// Build a series, sorting buckets by month
    pub fn new(account_id: impl Into<String>, mut buckets: Vec<MonthlyBucket>) -> Self {
        buckets.sort_by_key(|b| b.year_month);
        Self {
            account_id: account_id.into(),
            buckets,
        }
    }

    pub fn buckets(&self) -> &[MonthlyBucket] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn total_income(&self) -> f64 {
        self.buckets.iter().map(|b| b.income).sum()
    }

    pub fn total_spending(&self) -> f64 {
        self.buckets.iter().map(|b| b.spending).sum()
    }

    pub fn total_net_savings(&self) -> f64 {
        self.buckets.iter().map(|b| b.net_savings).sum()
    }

    pub fn first_month(&self) -> Option<YearMonth> {
        self.buckets.first().map(|b| b.year_month)
    }

    pub fn last_month(&self) -> Option<YearMonth> {
        self.buckets.last().map(|b| b.year_month)
    }
}

/// Overall verdict on an account's savings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialStatus {
    WellOff,
    Healthy,
    Unhealthy,
}

impl FinancialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WellOff => "well_off",
            Self::Healthy => "healthy",
            Self::Unhealthy => "unhealthy",
        }
    }

    /// Label used in reports and chart annotations
    pub fn label(&self) -> &'static str {
        match self {
            Self::WellOff => "Well Off!",
            Self::Healthy => "Healthy",
            Self::Unhealthy => "Unhealthy",
        }
    }
}

impl std::str::FromStr for FinancialStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "well_off" | "welloff" => Ok(Self::WellOff),
            "healthy" => Ok(Self::Healthy),
            "unhealthy" => Ok(Self::Unhealthy),
            _ => Err(format!("Unknown financial status: {}", s)),
        }
    }
}

impl std::fmt::Display for FinancialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ========== Exchange Rates ==========

/// One observed exchange rate for the configured currency pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateObservation {
    pub date: NaiveDate,
    pub rate: f64,
}

impl RateObservation {
    pub fn new(date: NaiveDate, rate: f64) -> Self {
        Self { date, rate }
    }
}

/// Rate observations sorted ascending by date, at most one per date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RateSeriesData")]
pub struct RateSeries {
    observations: Vec<RateObservation>,
}

#[derive(Deserialize)]
struct RateSeriesData {
    observations: Vec<RateObservation>,
}

impl From<RateSeriesData> for RateSeries {
    fn from(data: RateSeriesData) -> Self {
        Self::from_observations(data.observations)
    }
}

impl RateSeries {
    /// Sort by date and keep the last observation seen for each date
    pub fn from_observations(mut observations: Vec<RateObservation>) -> Self {
        // Stable sort keeps input order within a date, so the last one wins below
        observations.sort_by_key(|o| o.date);
        let mut deduped: Vec<RateObservation> = Vec::with_capacity(observations.len());
        for obs in observations {
            match deduped.last_mut() {
                Some(last) if last.date == obs.date => *last = obs,
                _ => deduped.push(obs),
            }
        }
        Self {
            observations: deduped,
        }
    }

    pub fn observations(&self) -> &[RateObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|o| o.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }

    /// Rate observed on an exact date
    pub fn rate_on(&self, date: NaiveDate) -> Option<f64> {
        self.observations
            .binary_search_by_key(&date, |o| o.date)
            .ok()
            .map(|i| self.observations[i].rate)
    }
}

/// Model output for one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_rate: f64,
}

// ========== Advisory ==========

/// Which side of the exchange the user wants to be on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl std::str::FromStr for TradeAction {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            _ => Err(Error::InvalidAction(s.to_string())),
        }
    }
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Favorable,
    Wait,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Favorable => "favorable",
            Self::Wait => "wait",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Buy/sell guidance for one forecast date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub date: NaiveDate,
    pub predicted_rate: f64,
    pub action: TradeAction,
    pub recommendation: Recommendation,
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.recommendation {
            Recommendation::Favorable => write!(
                f,
                "Good time to {} on {} with predicted rate: {:.4}",
                self.action, self.date, self.predicted_rate
            ),
            Recommendation::Wait => write!(
                f,
                "Wait to {}, predicted rate on {} is {:.4}",
                self.action, self.date, self.predicted_rate
            ),
        }
    }
}

// ========== Income vs Inflation ==========

/// One row of the inflation table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InflationYearRecord {
    pub year: i32,
    pub inflation_rate_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionStatus {
    Favorable,
    Unfavorable,
}

impl ProjectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Favorable => "favorable",
            Self::Unfavorable => "unfavorable",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Favorable => "Good Financial Position",
            Self::Unfavorable => "Not in a Good Financial Position",
        }
    }
}

impl std::fmt::Display for ProjectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Projected income for one inflation-table year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncomeProjection {
    pub year: i32,
    pub inflation_rate_pct: f64,
    pub projected_income: f64,
    pub status: ProjectionStatus,
}

impl std::fmt::Display for IncomeProjection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Year: {}, Inflation Rate: {}%, Income: ${:.2}, Status: {}",
            self.year,
            self.inflation_rate_pct,
            self.projected_income,
            self.status.label()
        )
    }
}
