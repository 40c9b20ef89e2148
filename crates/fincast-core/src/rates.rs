//! Exchange-rate providers
//!
//! The forecasting pipeline only needs two things from the outside world: the
//! current rate for a currency pair and a daily history between two dates.
//! `RateProvider` abstracts both so the CLI can inject an HTTP provider, and
//! tests or offline runs a static one.
//!
//! The HTTP provider speaks the common `latest` / `timeseries` query API:
//!
//! ```text
//! GET {api_url}/latest?base=USD&symbols=EUR&access_key=...
//! GET {api_url}/timeseries?start_date=2024-01-01&end_date=2024-03-31&base=USD&symbols=EUR&access_key=...
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{RateObservation, RateSeries};

/// Source of current and historical exchange rates
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Short identifier used in error messages
    fn name(&self) -> &str;

    /// Current rate of `base` expressed in `target`
    async fn current_rate(&self, base: &str, target: &str) -> Result<f64>;

    /// Daily rates between `start` and `end` inclusive, ascending by date
    async fn historical_rates(
        &self,
        base: &str,
        target: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RateSeries>;
}

/// Rate provider backed by an HTTP API
#[derive(Clone)]
pub struct HttpRateProvider {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpRateProvider {
    /// Create a provider for `base_url`; the key is sent as `access_key` when present
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Create a provider reading its key from the environment variable `key_env`
    pub fn from_env(base_url: &str, key_env: &str) -> Self {
        let api_key = std::env::var(key_env).ok();
        if api_key.is_none() {
            debug!("{} not set, calling {} without an access key", key_env, base_url);
        }
        Self::new(base_url, api_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::external_rate(&self.base_url, message)
    }

    async fn get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("GET {} {:?}", url, query);

        let mut request = self.http_client.get(&url).query(query);
        if let Some(key) = &self.api_key {
            request = request.query(&[("access_key", key)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.error(format!("request failed: {}", e)))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.error(format!("failed to read response: {}", e)))?;

        let data: Option<Value> = serde_json::from_str(&body).ok();
        if let Some(error) = data.as_ref().and_then(|d| d.get("error")) {
            return Err(self.error(format!("API error: {}", error)));
        }
        if !status.is_success() {
            return Err(self.error(format!("HTTP {}", status)));
        }
        data.ok_or_else(|| self.error("response is not valid JSON"))
    }
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    rates: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesResponse {
    rates: BTreeMap<String, BTreeMap<String, f64>>,
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn current_rate(&self, base: &str, target: &str) -> Result<f64> {
        let data = self
            .get(
                "latest",
                &[("base", base.to_string()), ("symbols", target.to_string())],
            )
            .await?;
        let latest: LatestResponse = serde_json::from_value(data)
            .map_err(|e| self.error(format!("unexpected latest response: {}", e)))?;

        let rate = latest
            .rates
            .get(target)
            .copied()
            .ok_or_else(|| self.error(format!("no {} rate in response", target)))?;
        debug!("Current {}/{} rate: {}", base, target, rate);
        Ok(rate)
    }

    async fn historical_rates(
        &self,
        base: &str,
        target: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RateSeries> {
        let data = self
            .get(
                "timeseries",
                &[
                    ("start_date", start.format("%Y-%m-%d").to_string()),
                    ("end_date", end.format("%Y-%m-%d").to_string()),
                    ("base", base.to_string()),
                    ("symbols", target.to_string()),
                ],
            )
            .await?;
        let timeseries: TimeseriesResponse = serde_json::from_value(data)
            .map_err(|e| self.error(format!("unexpected timeseries response: {}", e)))?;

        let mut observations = Vec::with_capacity(timeseries.rates.len());
        for (day, rates) in &timeseries.rates {
            let date = NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .map_err(|_| self.error(format!("invalid date in timeseries: {}", day)))?;
            match rates.get(target) {
                Some(rate) => observations.push(RateObservation::new(date, *rate)),
                None => warn!("No {} rate for {}, skipping", target, day),
            }
        }

        if observations.is_empty() {
            return Err(self.error(format!(
                "no {} rates between {} and {}",
                target, start, end
            )));
        }

        let series = RateSeries::from_observations(observations);
        debug!(
            "Fetched {} {}/{} observations ({} to {})",
            series.len(),
            base,
            target,
            start,
            end
        );
        Ok(series)
    }
}

/// In-memory rate provider for offline runs
#[derive(Debug, Clone, Default)]
pub struct StaticRateProvider {
    current: Option<f64>,
    history: RateSeries,
}

impl StaticRateProvider {
    pub fn new(current: Option<f64>, history: RateSeries) -> Self {
        Self { current, history }
    }

    /// Use the last historical observation as the current rate
    pub fn from_history(history: RateSeries) -> Self {
        let current = history.observations().last().map(|o| o.rate);
        Self { current, history }
    }
}

#[async_trait]
impl RateProvider for StaticRateProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn current_rate(&self, _base: &str, target: &str) -> Result<f64> {
        self.current
            .ok_or_else(|| Error::external_rate("static", format!("no current {} rate", target)))
    }

    async fn historical_rates(
        &self,
        _base: &str,
        _target: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RateSeries> {
        let observations = self
            .history
            .observations()
            .iter()
            .filter(|o| o.date >= start && o.date <= end)
            .cloned()
            .collect();
        Ok(RateSeries::from_observations(observations))
    }
}
