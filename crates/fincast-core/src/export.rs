//! Export of pipeline results for external plotting and reporting
//!
//! Supports:
//! - Monthly income/spending/net savings with the health status
//! - Actual vs predicted exchange rates, one row per date
//! - Buy/sell advisories

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::models::{Advisory, FinancialStatus, ForecastPoint, MonthlySeries, RateSeries};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown export format: {} (valid: csv, json)", s)),
        }
    }
}

impl ExportFormat {
    /// Guess the format from a file extension, defaulting to CSV
    pub fn from_path(path: &std::path::Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Csv,
        }
    }
}

#[derive(Debug, Serialize)]
struct MonthlyRow {
    year_month: String,
    income: f64,
    spending: f64,
    net_savings: f64,
}

#[derive(Debug, Serialize)]
struct MonthlyExport<'a> {
    account_id: &'a str,
    status: FinancialStatus,
    total_net_savings: f64,
    months: Vec<MonthlyRow>,
}

/// Export a monthly series with its health status
pub fn export_monthly_series(
    series: &MonthlySeries,
    status: FinancialStatus,
    format: ExportFormat,
) -> Result<String> {
    let rows: Vec<MonthlyRow> = series
        .buckets()
        .iter()
        .map(|b| MonthlyRow {
            year_month: b.year_month.to_string(),
            income: b.income,
            spending: b.spending,
            net_savings: b.net_savings,
        })
        .collect();

    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(&MonthlyExport {
            account_id: &series.account_id,
            status,
            total_net_savings: series.total_net_savings(),
            months: rows,
        })?),
        ExportFormat::Csv => {
            let mut csv = String::from("year_month,income,spending,net_savings,status\n");
            for row in rows {
                csv.push_str(&format!(
                    "{},{:.2},{:.2},{:.2},{}\n",
                    row.year_month, row.income, row.spending, row.net_savings, status
                ));
            }
            Ok(csv)
        }
    }
}

#[derive(Debug, Serialize)]
struct ForecastRow {
    date: NaiveDate,
    actual: Option<f64>,
    predicted: Option<f64>,
}

/// Export observed and predicted rates joined by date
///
/// Dates present on only one side leave the other column empty.
pub fn export_forecast(
    history: &RateSeries,
    forecast: &[ForecastPoint],
    format: ExportFormat,
) -> Result<String> {
    let mut rows: BTreeMap<NaiveDate, ForecastRow> = BTreeMap::new();
    for obs in history.observations() {
        rows.entry(obs.date)
            .or_insert_with(|| ForecastRow {
                date: obs.date,
                actual: None,
                predicted: None,
            })
            .actual = Some(obs.rate);
    }
    for point in forecast {
        rows.entry(point.date)
            .or_insert_with(|| ForecastRow {
                date: point.date,
                actual: None,
                predicted: None,
            })
            .predicted = Some(point.predicted_rate);
    }
    let rows: Vec<ForecastRow> = rows.into_values().collect();

    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(&rows)?),
        ExportFormat::Csv => {
            let mut csv = String::from("date,actual,predicted\n");
            for row in rows {
                csv.push_str(&format!(
                    "{},{},{}\n",
                    row.date,
                    row.actual.map(|r| format!("{:.6}", r)).unwrap_or_default(),
                    row.predicted.map(|r| format!("{:.6}", r)).unwrap_or_default()
                ));
            }
            Ok(csv)
        }
    }
}

/// Export advisories in forecast order
pub fn export_advisories(advisories: &[Advisory], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(advisories)?),
        ExportFormat::Csv => {
            let mut csv = String::from("date,predicted_rate,action,recommendation\n");
            for a in advisories {
                csv.push_str(&format!(
                    "{},{:.6},{},{}\n",
                    a.date, a.predicted_rate, a.action, a.recommendation
                ));
            }
            Ok(csv)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MonthlyBucket, RateObservation, Recommendation, TradeAction, YearMonth};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn series() -> MonthlySeries {
        MonthlySeries::new(
            "A",
            vec![
                MonthlyBucket::new(YearMonth::new(2024, 2), 50.0, 75.5),
                MonthlyBucket::new(YearMonth::new(2024, 1), 1000.0, 400.0),
            ],
        )
    }

    #[test]
    fn test_monthly_series_csv() {
        let csv = export_monthly_series(&series(), FinancialStatus::WellOff, ExportFormat::Csv)
            .unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "year_month,income,spending,net_savings,status");
        assert_eq!(lines[1], "2024-01,1000.00,400.00,600.00,well_off");
        assert_eq!(lines[2], "2024-02,50.00,75.50,-25.50,well_off");
    }

    #[test]
    fn test_monthly_series_json() {
        let json = export_monthly_series(&series(), FinancialStatus::Healthy, ExportFormat::Json)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["account_id"], "A");
        assert_eq!(value["status"], "healthy");
        assert_eq!(value["months"].as_array().unwrap().len(), 2);
        assert_eq!(value["months"][0]["year_month"], "2024-01");
    }

    #[test]
    fn test_forecast_joins_by_date() {
        let history = RateSeries::from_observations(vec![
            RateObservation::new(date("2024-01-01"), 1.0),
            RateObservation::new(date("2024-01-02"), 1.1),
        ]);
        let forecast = vec![
            ForecastPoint {
                date: date("2024-01-02"),
                predicted_rate: 1.1,
            },
            ForecastPoint {
                date: date("2024-01-03"),
                predicted_rate: 1.2,
            },
        ];

        let csv = export_forecast(&history, &forecast, ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "2024-01-01,1.000000,");
        assert_eq!(lines[2], "2024-01-02,1.100000,1.100000");
        assert_eq!(lines[3], "2024-01-03,,1.200000");

        let json = export_forecast(&history, &forecast, ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value[2]["actual"].is_null());
        assert_eq!(value[2]["date"], "2024-01-03");
    }

    #[test]
    fn test_advisories_csv() {
        let advisories = vec![Advisory {
            date: date("2024-01-05"),
            predicted_rate: 0.95,
            action: TradeAction::Buy,
            recommendation: Recommendation::Favorable,
        }];
        let csv = export_advisories(&advisories, ExportFormat::Csv).unwrap();
        assert_eq!(
            csv,
            "date,predicted_rate,action,recommendation\n2024-01-05,0.950000,buy,favorable\n"
        );
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ExportFormat::from_path(std::path::Path::new("out.JSON")),
            ExportFormat::Json
        );
        assert_eq!(
            ExportFormat::from_path(std::path::Path::new("out.csv")),
            ExportFormat::Csv
        );
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
    }
}
