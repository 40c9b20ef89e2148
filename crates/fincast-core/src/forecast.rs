//! Exchange-rate forecasting
//!
//! Fits an additive model to a daily rate history:
//!
//! ```text
//! rate(d) = intercept + slope * t(d) + weekly(d) + yearly(d)
//! ```
//!
//! where `t` is the day offset scaled to [0, 1] over the history and the
//! seasonal terms are Fourier series (order 3 weekly, order 6 yearly). The fit
//! is ordinary least squares with a small ridge penalty on the seasonal
//! coefficients only, so a flat history always yields a flat forecast.
//!
//! Output is not clamped: short or volatile histories can extrapolate to
//! implausible (even negative) rates.

use std::f64::consts::PI;
use std::time::Duration;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{ForecastPoint, RateSeries};

const WEEKLY_PERIOD_DAYS: f64 = 7.0;
const YEARLY_PERIOD_DAYS: f64 = 365.25;
const WEEKLY_ORDER: usize = 3;
const YEARLY_ORDER: usize = 6;

/// Minimum history span before `Auto` enables each seasonal block
const WEEKLY_AUTO_MIN_SPAN_DAYS: i64 = 14;
const YEARLY_AUTO_MIN_SPAN_DAYS: i64 = 730;

/// Ridge strength per observation, applied to seasonal coefficients
const SEASONAL_RIDGE: f64 = 1e-4;

pub const DEFAULT_FIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest accepted forecast horizon, in days
pub const MAX_HORIZON_DAYS: u32 = 3650;

/// Whether a seasonal component is included in the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Seasonality {
    /// Included when the history is long enough to observe it
    #[default]
    Auto,
    On,
    Off,
}

impl Seasonality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::On => "on",
            Self::Off => "off",
        }
    }

    fn enabled(&self, span_days: i64, auto_min_span: i64) -> bool {
        match self {
            Self::Auto => span_days >= auto_min_span,
            Self::On => true,
            Self::Off => false,
        }
    }
}

impl std::str::FromStr for Seasonality {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "on" | "true" => Ok(Self::On),
            "off" | "false" => Ok(Self::Off),
            _ => Err(format!("Unknown seasonality mode: {} (valid: auto, on, off)", s)),
        }
    }
}

impl std::fmt::Display for Seasonality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastOptions {
    pub weekly: Seasonality,
    pub yearly: Seasonality,
    /// Upper bound on fitting time when run through the async wrapper
    pub fit_timeout: Duration,
}

impl Default for ForecastOptions {
    fn default() -> Self {
        Self {
            weekly: Seasonality::Auto,
            yearly: Seasonality::Auto,
            fit_timeout: DEFAULT_FIT_TIMEOUT,
        }
    }
}

/// Fits rate models; each `fit` call returns an independent model
#[derive(Debug, Clone, Default)]
pub struct RateForecaster {
    options: ForecastOptions,
}

impl RateForecaster {
    pub fn new(options: ForecastOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ForecastOptions {
        &self.options
    }

    /// Fit a model to the history
    ///
    /// Fails with `InsufficientData` when fewer than two distinct dates exist.
    pub fn fit(&self, history: &RateSeries) -> Result<FittedRateModel> {
        let observations = history.observations();
        let (first, last) = match (history.first_date(), history.last_date()) {
            (Some(first), Some(last)) if observations.len() >= 2 => (first, last),
            _ => {
                return Err(Error::InsufficientData {
                    observations: observations.len(),
                })
            }
        };

        if let Some(bad) = observations.iter().find(|o| !o.rate.is_finite()) {
            return Err(Error::DataFormat(format!(
                "Non-finite rate on {}",
                bad.date
            )));
        }

        let span_days = (last - first).num_days();
        let design = Design {
            origin: first,
            span_days: span_days.max(1) as f64,
            weekly: self
                .options
                .weekly
                .enabled(span_days, WEEKLY_AUTO_MIN_SPAN_DAYS),
            yearly: self
                .options
                .yearly
                .enabled(span_days, YEARLY_AUTO_MIN_SPAN_DAYS),
        };

        // Work on scaled rates so the ridge strength is unit-free
        let scale = observations
            .iter()
            .map(|o| o.rate.abs())
            .fold(0.0_f64, f64::max);
        let scale = if scale > 0.0 { scale } else { 1.0 };

        let p = design.width();
        let mut xtx = vec![vec![0.0; p]; p];
        let mut xty = vec![0.0; p];
        for obs in observations {
            let row = design.row(obs.date);
            let y = obs.rate / scale;
            for i in 0..p {
                xty[i] += row[i] * y;
                for j in 0..p {
                    xtx[i][j] += row[i] * row[j];
                }
            }
        }

        let ridge = SEASONAL_RIDGE * observations.len() as f64;
        for (i, xtx_row) in xtx.iter_mut().enumerate().skip(2) {
            xtx_row[i] += ridge;
        }

        let beta = solve(xtx, xty).ok_or(Error::InsufficientData {
            observations: observations.len(),
        })?;
        let coefficients: Vec<f64> = beta.into_iter().map(|b| b * scale).collect();

        debug!(
            "Fitted rate model on {} observations over {} days (weekly: {}, yearly: {})",
            observations.len(),
            span_days,
            design.weekly,
            design.yearly
        );

        Ok(FittedRateModel {
            design,
            coefficients,
            first_date: first,
            last_date: last,
        })
    }

    /// Fit and evaluate the model daily from the first historical date
    /// through `horizon_days` past the last one
    pub fn fit_and_forecast(
        &self,
        history: &RateSeries,
        horizon_days: u32,
    ) -> Result<Vec<ForecastPoint>> {
        self.fit(history)?.forecast(horizon_days)
    }

    /// Run `fit_and_forecast` on a blocking task, bounded by the fit timeout
    ///
    /// On timeout the caller gets `Cancelled`; the detached computation is
    /// left to finish in the background.
    pub async fn fit_and_forecast_with_timeout(
        &self,
        history: RateSeries,
        horizon_days: u32,
    ) -> Result<Vec<ForecastPoint>> {
        let forecaster = self.clone();
        let timeout = self.options.fit_timeout;
        let task = tokio::task::spawn_blocking(move || {
            forecaster.fit_and_forecast(&history, horizon_days)
        });

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) if e.is_panic() => {
                Err(Error::Internal(format!("Forecast task panicked: {}", e)))
            }
            Ok(Err(e)) => Err(Error::Cancelled(format!("Forecast task failed: {}", e))),
            Err(_) => Err(Error::Cancelled(format!(
                "Forecast did not finish within {:?}",
                timeout
            ))),
        }
    }
}

/// Feature layout shared by fitting and prediction
#[derive(Debug, Clone, Copy)]
struct Design {
    origin: NaiveDate,
    span_days: f64,
    weekly: bool,
    yearly: bool,
}

impl Design {
    fn width(&self) -> usize {
        let mut width = 2;
        if self.weekly {
            width += 2 * WEEKLY_ORDER;
        }
        if self.yearly {
            width += 2 * YEARLY_ORDER;
        }
        width
    }

    fn row(&self, date: NaiveDate) -> Vec<f64> {
        let days = (date - self.origin).num_days() as f64;
        let mut row = Vec::with_capacity(self.width());
        row.push(1.0);
        row.push(days / self.span_days);
        if self.weekly {
            push_fourier(&mut row, days, WEEKLY_PERIOD_DAYS, WEEKLY_ORDER);
        }
        if self.yearly {
            push_fourier(&mut row, days, YEARLY_PERIOD_DAYS, YEARLY_ORDER);
        }
        row
    }
}

fn push_fourier(row: &mut Vec<f64>, days: f64, period: f64, order: usize) {
    for k in 1..=order {
        let angle = 2.0 * PI * k as f64 * days / period;
        row.push(angle.sin());
        row.push(angle.cos());
    }
}

/// Solve `a x = b` by Gaussian elimination with partial pivoting
///
/// Returns None when the system is numerically singular.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

/// Summary of what a fitted model contains
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelComponents {
    pub weekly_seasonality: bool,
    pub yearly_seasonality: bool,
    /// Trend change per calendar day
    pub trend_per_day: f64,
}

/// A model fitted to one rate history
#[derive(Debug, Clone)]
pub struct FittedRateModel {
    design: Design,
    coefficients: Vec<f64>,
    first_date: NaiveDate,
    last_date: NaiveDate,
}

impl FittedRateModel {
    pub fn predict(&self, date: NaiveDate) -> f64 {
        self.design
            .row(date)
            .iter()
            .zip(&self.coefficients)
            .map(|(x, c)| x * c)
            .sum()
    }

    /// Daily predictions from the first historical date through
    /// `horizon_days` days past the last one
    ///
    /// Horizons above `MAX_HORIZON_DAYS` are rejected with `DataFormat`.
    pub fn forecast(&self, horizon_days: u32) -> Result<Vec<ForecastPoint>> {
        if horizon_days > MAX_HORIZON_DAYS {
            return Err(Error::DataFormat(format!(
                "forecast horizon must be at most {} days, got {}",
                MAX_HORIZON_DAYS, horizon_days
            )));
        }
        let end = self
            .last_date
            .checked_add_days(Days::new(horizon_days.into()))
            .ok_or_else(|| {
                Error::DataFormat(format!(
                    "forecast horizon of {} days past {} is out of the calendar range",
                    horizon_days, self.last_date
                ))
            })?;

        Ok(self
            .first_date
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|date| ForecastPoint {
                date,
                predicted_rate: self.predict(date),
            })
            .collect())
    }

    pub fn first_date(&self) -> NaiveDate {
        self.first_date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.last_date
    }

    pub fn components(&self) -> ModelComponents {
        ModelComponents {
            weekly_seasonality: self.design.weekly,
            yearly_seasonality: self.design.yearly,
            trend_per_day: self.coefficients[1] / self.design.span_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RateObservation;
    use chrono::Duration as ChronoDuration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily_series(start: NaiveDate, days: i64, f: impl Fn(i64) -> f64) -> RateSeries {
        RateSeries::from_observations(
            (0..days)
                .map(|i| RateObservation::new(start + ChronoDuration::days(i), f(i)))
                .collect(),
        )
    }

    #[test]
    fn test_insufficient_data() {
        let forecaster = RateForecaster::default();
        let empty = RateSeries::default();
        assert!(matches!(
            forecaster.fit(&empty),
            Err(Error::InsufficientData { observations: 0 })
        ));

        let single = RateSeries::from_observations(vec![
            RateObservation::new(date(2024, 1, 1), 1.3),
            RateObservation::new(date(2024, 1, 1), 1.4),
        ]);
        assert!(matches!(
            forecaster.fit(&single),
            Err(Error::InsufficientData { observations: 1 })
        ));
    }

    #[test]
    fn test_two_identical_observations_stay_flat() {
        let history = RateSeries::from_observations(vec![
            RateObservation::new(date(2024, 1, 1), 1.25),
            RateObservation::new(date(2024, 1, 2), 1.25),
        ]);

        let forecast = RateForecaster::default()
            .fit_and_forecast(&history, 90)
            .unwrap();
        assert_eq!(forecast.len(), 92);
        for point in &forecast {
            assert!((point.predicted_rate - 1.25).abs() < 1e-9);
        }
    }

    #[test]
    fn test_flat_history_with_seasonality_enabled_stays_flat() {
        let history = daily_series(date(2022, 1, 1), 800, |_| 0.74);
        let model = RateForecaster::default().fit(&history).unwrap();
        let components = model.components();
        assert!(components.weekly_seasonality);
        assert!(components.yearly_seasonality);
        for point in model.forecast(30).unwrap() {
            assert!((point.predicted_rate - 0.74).abs() < 1e-6);
        }
    }

    #[test]
    fn test_forecast_covers_history_and_horizon() {
        let history = daily_series(date(2024, 1, 1), 10, |i| 1.0 + i as f64 * 0.01);
        let forecast = RateForecaster::default()
            .fit_and_forecast(&history, 5)
            .unwrap();

        assert_eq!(forecast.first().unwrap().date, date(2024, 1, 1));
        assert_eq!(forecast.last().unwrap().date, date(2024, 1, 15));
        assert_eq!(forecast.len(), 15);
        assert!(forecast.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_linear_trend_extrapolates() {
        let history = daily_series(date(2024, 1, 1), 10, |i| 1.0 + i as f64 * 0.01);
        let model = RateForecaster::default().fit(&history).unwrap();

        assert!(!model.components().weekly_seasonality);
        assert!((model.components().trend_per_day - 0.01).abs() < 1e-9);
        // 2024-01-20 is 19 days after the origin
        assert!((model.predict(date(2024, 1, 20)) - 1.19).abs() < 1e-9);
    }

    #[test]
    fn test_short_history_can_go_negative() {
        let history = RateSeries::from_observations(vec![
            RateObservation::new(date(2024, 1, 1), 1.0),
            RateObservation::new(date(2024, 1, 2), 0.5),
        ]);
        let forecast = RateForecaster::default()
            .fit_and_forecast(&history, 5)
            .unwrap();
        assert!(forecast.last().unwrap().predicted_rate < 0.0);
    }

    #[test]
    fn test_weekly_pattern_is_learned() {
        // Weekend bump on top of a flat level
        let start = date(2024, 1, 1); // Monday
        let history = daily_series(start, 56, |i| if i % 7 >= 5 { 1.10 } else { 1.00 });
        let model = RateForecaster::default().fit(&history).unwrap();

        let saturday = date(2024, 3, 2);
        let wednesday = date(2024, 2, 28);
        assert!(model.predict(saturday) > model.predict(wednesday) + 0.05);
    }

    #[test]
    fn test_seasonality_off() {
        let history = daily_series(date(2022, 1, 1), 800, |i| 1.0 + (i % 7) as f64 * 0.01);
        let forecaster = RateForecaster::new(ForecastOptions {
            weekly: Seasonality::Off,
            yearly: Seasonality::Off,
            ..Default::default()
        });
        let components = forecaster.fit(&history).unwrap().components();
        assert!(!components.weekly_seasonality);
        assert!(!components.yearly_seasonality);
    }

    #[test]
    fn test_independent_models() {
        let forecaster = RateForecaster::default();
        let up = daily_series(date(2024, 1, 1), 5, |i| 1.0 + i as f64);
        let down = daily_series(date(2024, 1, 1), 5, |i| 10.0 - i as f64);

        let up_model = forecaster.fit(&up).unwrap();
        let down_model = forecaster.fit(&down).unwrap();
        assert!(up_model.components().trend_per_day > 0.0);
        assert!(down_model.components().trend_per_day < 0.0);
    }

    #[tokio::test]
    async fn test_fit_with_timeout() {
        let history = daily_series(date(2024, 1, 1), 30, |i| 1.3 + (i as f64) * 0.001);
        let forecast = RateForecaster::default()
            .fit_and_forecast_with_timeout(history, 7)
            .await
            .unwrap();
        assert_eq!(forecast.len(), 37);
    }

    #[test]
    fn test_horizon_limits() {
        let history = daily_series(date(2024, 1, 1), 2, |_| 1.0);
        let forecaster = RateForecaster::default();

        let longest = forecaster
            .fit_and_forecast(&history, MAX_HORIZON_DAYS)
            .unwrap();
        assert_eq!(longest.len(), 2 + MAX_HORIZON_DAYS as usize);

        for horizon in [MAX_HORIZON_DAYS + 1, u32::MAX] {
            assert!(matches!(
                forecaster.fit_and_forecast(&history, horizon),
                Err(Error::DataFormat(_))
            ));
        }
    }

    #[test]
    fn test_horizon_past_calendar_end() {
        let history = RateSeries::from_observations(vec![
            RateObservation::new(NaiveDate::MAX - ChronoDuration::days(1), 1.0),
            RateObservation::new(NaiveDate::MAX, 1.1),
        ]);
        let model = RateForecaster::default().fit(&history).unwrap();
        assert!(matches!(model.forecast(1), Err(Error::DataFormat(_))));
        assert_eq!(model.forecast(0).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_fit_with_timeout_rejects_huge_horizon() {
        let history = daily_series(date(2024, 1, 1), 2, |_| 1.0);
        let result = RateForecaster::default()
            .fit_and_forecast_with_timeout(history, u32::MAX)
            .await;
        assert!(matches!(result, Err(Error::DataFormat(_))));
    }

    #[tokio::test]
    async fn test_fit_with_timeout_propagates_errors() {
        let result = RateForecaster::default()
            .fit_and_forecast_with_timeout(RateSeries::default(), 7)
            .await;
        assert!(matches!(result, Err(Error::InsufficientData { .. })));
    }
}
