//! Fincast Core Library
//!
//! Household finance analytics for the fincast tool:
//! - CSV import for transactions, inflation tables and rate histories
//! - Monthly income/spending aggregation and financial health classification
//! - Exchange-rate forecasting (trend + seasonal regression)
//! - Buy/sell advisories from forecasted rates
//! - Income growth versus inflation projections
//! - Pluggable exchange-rate providers (HTTP, static)
//! - Layered TOML configuration and CSV/JSON export

pub mod advisory;
pub mod aggregate;
pub mod config;
pub mod error;
pub mod export;
pub mod forecast;
pub mod health;
pub mod import;
pub mod inflation;
pub mod models;
pub mod rates;

/// Test utilities including mock exchange-rate server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use advisory::{advise, AdvisoryReport};
pub use aggregate::aggregate;
pub use config::{ConfigSource, FincastConfig};
pub use error::{Error, Result};
pub use export::{export_advisories, export_forecast, export_monthly_series, ExportFormat};
pub use forecast::{
    FittedRateModel, ForecastOptions, ModelComponents, RateForecaster, Seasonality,
    MAX_HORIZON_DAYS,
};
pub use health::HealthClassifier;
pub use import::{
    accounts, parse_inflation, parse_rate_history, parse_transactions, AccountSummary,
    HeaderProfile, TransactionImport,
};
pub use inflation::compare as compare_income_to_inflation;
pub use models::*;
pub use rates::{HttpRateProvider, RateProvider, StaticRateProvider};
