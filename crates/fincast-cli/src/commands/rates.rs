//! Exchange-rate forecast and advisory commands

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use fincast_core::{
    export_advisories, export_forecast, parse_rate_history, AdvisoryReport, ExportFormat,
    FincastConfig, ForecastPoint, HttpRateProvider, RateForecaster, RateProvider, RateSeries,
    Recommendation, StaticRateProvider, TradeAction,
};
use tracing::{debug, info};

use super::{open_input, parse_date_arg, write_export};
use crate::cli::RateArgs;

/// History fetched when no --from is given
const DEFAULT_HISTORY_DAYS: i64 = 365;

/// Currency pair, date range and provider for one invocation
pub struct RateSource {
    pub base: String,
    pub target: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub provider: Box<dyn RateProvider>,
}

impl RateSource {
    /// Offline history file if given, otherwise the configured HTTP provider
    pub fn resolve(config: &FincastConfig, args: &RateArgs) -> Result<Self> {
        let base = args
            .base
            .clone()
            .unwrap_or_else(|| config.rates.base_currency.clone())
            .to_uppercase();
        let target = args
            .target
            .clone()
            .unwrap_or_else(|| config.rates.target_currency.clone())
            .to_uppercase();

        let from = args.from.as_deref().map(|d| parse_date_arg(d, "from")).transpose()?;
        let to = args.to.as_deref().map(|d| parse_date_arg(d, "to")).transpose()?;

        let (provider, default_from, default_to): (Box<dyn RateProvider>, NaiveDate, NaiveDate) =
            match &args.history {
                Some(path) => {
                    let history = parse_rate_history(open_input(path)?).with_context(|| {
                        format!("Failed to read rate history {}", path.display())
                    })?;
                    let (Some(first), Some(last)) = (history.first_date(), history.last_date())
                    else {
                        anyhow::bail!("No usable rates in {}", path.display());
                    };
                    (
                        Box::new(StaticRateProvider::from_history(history)) as Box<dyn RateProvider>,
                        first,
                        last,
                    )
                }
                None => {
                    let today = Utc::now().date_naive();
                    let end = to.unwrap_or(today);
                    (
                        Box::new(HttpRateProvider::from_env(
                            &config.rates.api_url,
                            &config.rates.api_key_env,
                        )) as Box<dyn RateProvider>,
                        end - Duration::days(DEFAULT_HISTORY_DAYS),
                        today,
                    )
                }
            };

        let from = from.unwrap_or(default_from);
        let to = to.unwrap_or(default_to);
        if from > to {
            anyhow::bail!("--from ({}) is after --to ({})", from, to);
        }

        Ok(Self {
            base,
            target,
            from,
            to,
            provider,
        })
    }

    pub async fn history(&self) -> Result<RateSeries> {
        let history = self
            .provider
            .historical_rates(&self.base, &self.target, self.from, self.to)
            .await
            .with_context(|| {
                format!(
                    "Failed to fetch {}/{} rates from {}",
                    self.base,
                    self.target,
                    self.provider.name()
                )
            })?;
        info!(
            "Loaded {} {}/{} rates ({} to {})",
            history.len(),
            self.base,
            self.target,
            self.from,
            self.to
        );
        Ok(history)
    }

    pub async fn current_rate(&self) -> Result<f64> {
        self.provider
            .current_rate(&self.base, &self.target)
            .await
            .with_context(|| format!("Failed to fetch current {}/{} rate", self.base, self.target))
    }
}

/// Fit and forecast with the configured options and timeout
pub async fn forecast_rates(
    config: &FincastConfig,
    history: &RateSeries,
    horizon: u32,
) -> Result<Vec<ForecastPoint>> {
    let forecaster = RateForecaster::new(config.forecast.options());
    let forecast = forecaster
        .fit_and_forecast_with_timeout(history.clone(), horizon)
        .await
        .context("Failed to forecast exchange rates")?;
    debug!("Forecast {} points (horizon {} days)", forecast.len(), horizon);
    Ok(forecast)
}

pub async fn cmd_forecast(
    config: &FincastConfig,
    args: &RateArgs,
    json: bool,
) -> Result<Vec<ForecastPoint>> {
    let source = RateSource::resolve(config, args)?;
    let history = source.history().await?;
    let horizon = args.horizon.unwrap_or(config.forecast.horizon_days);
    let forecast = forecast_rates(config, &history, horizon).await?;

    if let Some(path) = &args.export {
        let contents = export_forecast(&history, &forecast, ExportFormat::from_path(path))?;
        write_export(path, &contents)?;
    }

    if json {
        println!(
            "{}",
            export_forecast(&history, &forecast, ExportFormat::Json)?
        );
        return Ok(forecast);
    }

    let last_observed = history.last_date();
    println!();
    println!(
        "💱 {}/{} forecast ({} observations, {} to {})",
        source.base,
        source.target,
        history.len(),
        source.from,
        source.to
    );
    println!("   ─────────────────────────────────────");
    println!("   {:12} │ {:>12}", "Date", "Predicted");
    println!("   ─────────────┼──────────────");
    for point in forecast
        .iter()
        .filter(|p| last_observed.map_or(true, |last| p.date > last))
    {
        println!("   {:12} │ {:>12.4}", point.date.to_string(), point.predicted_rate);
    }

    Ok(forecast)
}

pub async fn cmd_advise(
    config: &FincastConfig,
    args: &RateArgs,
    threshold: Option<f64>,
    action: Option<&str>,
    current_rate: Option<f64>,
    include_history: bool,
    json: bool,
) -> Result<AdvisoryReport> {
    let action: TradeAction = match action {
        Some(action) => action.parse()?,
        None => config.advisory.action,
    };
    let threshold = threshold.unwrap_or(config.advisory.threshold_pct);

    let source = RateSource::resolve(config, args)?;
    let history = source.history().await?;
    let current = match current_rate {
        Some(rate) => rate,
        None => source.current_rate().await?,
    };

    let horizon = args.horizon.unwrap_or(config.forecast.horizon_days);
    let forecast = forecast_rates(config, &history, horizon).await?;

    let mut report = AdvisoryReport::build(&forecast, current, threshold, action)?;
    if !include_history {
        if let Some(last) = history.last_date() {
            report = report.future_only(last);
        }
    }

    if let Some(path) = &args.export {
        let contents = export_advisories(&report.advisories, ExportFormat::from_path(path))?;
        write_export(path, &contents)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(report);
    }

    println!();
    println!(
        "🔔 {}/{} advisories: {} when the rate moves {}% (current {:.4})",
        source.base, source.target, action, threshold, current
    );
    println!("   ─────────────────────────────────────────────────────────────");
    for advisory in &report.advisories {
        let marker = match advisory.recommendation {
            Recommendation::Favorable => "✓",
            Recommendation::Wait => " ",
        };
        println!("   {} {}", marker, advisory);
    }

    println!();
    match report.best() {
        Some(best) => println!(
            "   {} favorable dates; best on {} at {:.4}",
            report.favorable_count(),
            best.date,
            best.predicted_rate
        ),
        None => println!("   No favorable dates in the forecast window."),
    }

    Ok(report)
}
