//! Error types for fincast

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Data format error: {0}")]
    DataFormat(String),

    #[error("Insufficient data: need at least 2 distinct rate observations, got {observations}")]
    InsufficientData { observations: usize },

    #[error("Invalid action: {0} (valid: buy, sell)")]
    InvalidAction(String),

    #[error("Exchange rate provider error ({provider}): {message}")]
    ExternalRate { provider: String, message: String },

    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build an `ExternalRate` error tagged with the provider that produced it
    pub fn external_rate(provider: &str, message: impl Into<String>) -> Self {
        Self::ExternalRate {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
