//! fincast configuration
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path (`--config`), or the override in the data dir
//!    (~/.local/share/fincast/config.toml) when it exists
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Any key missing from the file keeps its built-in default. API keys are
//! never part of the config; `rates.api_key_env` names the environment
//! variable that holds one.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::DEFAULT_WINDOW_MONTHS;
use crate::error::{Error, Result};
use crate::forecast::{ForecastOptions, Seasonality, MAX_HORIZON_DAYS};
use crate::health::DEFAULT_WELL_OFF_ABOVE;
use crate::import::HeaderProfile;
use crate::models::TradeAction;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/fincast.toml");

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthConfig {
    pub window_months: usize,
    pub well_off_above: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastConfig {
    pub horizon_days: u32,
    pub weekly_seasonality: Seasonality,
    pub yearly_seasonality: Seasonality,
    pub timeout_secs: u64,
}

impl ForecastConfig {
    pub fn options(&self) -> ForecastOptions {
        ForecastOptions {
            weekly: self.weekly_seasonality,
            yearly: self.yearly_seasonality,
            fit_timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvisoryConfig {
    pub threshold_pct: f64,
    pub action: TradeAction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatesConfig {
    pub base_currency: String,
    pub target_currency: String,
    pub api_url: String,
    pub api_key_env: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeConfig {
    pub base_income: f64,
    pub annual_growth_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportConfig {
    pub header_profile: HeaderProfile,
}

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FincastConfig {
    pub health: HealthConfig,
    pub forecast: ForecastConfig,
    pub advisory: AdvisoryConfig,
    pub rates: RatesConfig,
    pub income: IncomeConfig,
    pub import: ImportConfig,
}

impl Default for FincastConfig {
    fn default() -> Self {
        Self {
            health: HealthConfig {
                window_months: DEFAULT_WINDOW_MONTHS,
                well_off_above: DEFAULT_WELL_OFF_ABOVE,
            },
            forecast: ForecastConfig {
                horizon_days: 30,
                weekly_seasonality: Seasonality::Auto,
                yearly_seasonality: Seasonality::Auto,
                timeout_secs: 30,
            },
            advisory: AdvisoryConfig {
                threshold_pct: 1.0,
                action: TradeAction::Buy,
            },
            rates: RatesConfig {
                base_currency: "USD".to_string(),
                target_currency: "EUR".to_string(),
                api_url: "https://api.exchangerate.host".to_string(),
                api_key_env: "FINCAST_RATES_API_KEY".to_string(),
            },
            income: IncomeConfig {
                base_income: 50000.0,
                annual_growth_pct: 3.0,
            },
            import: ImportConfig {
                header_profile: HeaderProfile::Auto,
            },
        }
    }
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Embedded,
    File(PathBuf),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedded => write!(f, "embedded defaults"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl FincastConfig {
    /// Load configuration (explicit path, then override file, then default)
    ///
    /// An explicit path that does not exist is an error; a missing override
    /// file is not.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, ConfigSource)> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Ok((Self::from_file(path)?, ConfigSource::File(path.to_path_buf())));
        }

        if let Some(path) = default_config_path() {
            if path.exists() {
                let config = Self::from_file(&path)?;
                return Ok((config, ConfigSource::File(path)));
            }
        }

        Ok((Self::parse(DEFAULT_CONFIG)?, ConfigSource::Embedded))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading config from {}", path.display());
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;
        Self::parse(&content)
    }

    /// Parse TOML, applying any present keys over the built-in defaults
    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        let mut config = Self::default();

        if let Some(health) = raw.health {
            if let Some(window) = health.window_months {
                config.health.window_months = window;
            }
            if let Some(above) = health.well_off_above {
                let above = finite("health.well_off_above", above)?;
                if above < 0.0 {
                    return Err(Error::Config(format!(
                        "health.well_off_above must not be negative, got {}",
                        above
                    )));
                }
                config.health.well_off_above = above;
            }
        }

        if let Some(forecast) = raw.forecast {
            if let Some(horizon) = forecast.horizon_days {
                if horizon > MAX_HORIZON_DAYS {
                    return Err(Error::Config(format!(
                        "forecast.horizon_days must be at most {}, got {}",
                        MAX_HORIZON_DAYS, horizon
                    )));
                }
                config.forecast.horizon_days = horizon;
            }
            if let Some(mode) = forecast.weekly_seasonality {
                config.forecast.weekly_seasonality = mode.parse().map_err(Error::Config)?;
            }
            if let Some(mode) = forecast.yearly_seasonality {
                config.forecast.yearly_seasonality = mode.parse().map_err(Error::Config)?;
            }
            if let Some(timeout) = forecast.timeout_secs {
                if timeout == 0 {
                    return Err(Error::Config(
                        "forecast.timeout_secs must be at least 1".to_string(),
                    ));
                }
                config.forecast.timeout_secs = timeout;
            }
        }

        if let Some(advisory) = raw.advisory {
            if let Some(threshold) = advisory.threshold_pct {
                config.advisory.threshold_pct = finite("advisory.threshold_pct", threshold)?;
            }
            if let Some(action) = advisory.action {
                config.advisory.action = action
                    .parse()
                    .map_err(|e: Error| Error::Config(format!("advisory.action: {}", e)))?;
            }
        }

        if let Some(rates) = raw.rates {
            if let Some(base) = rates.base_currency {
                config.rates.base_currency = base.to_uppercase();
            }
            if let Some(target) = rates.target_currency {
                config.rates.target_currency = target.to_uppercase();
            }
            if let Some(url) = rates.api_url {
                config.rates.api_url = url;
            }
            if let Some(key_env) = rates.api_key_env {
                if key_env.trim().is_empty() {
                    return Err(Error::Config("rates.api_key_env must not be empty".to_string()));
                }
                config.rates.api_key_env = key_env;
            }
        }

        if let Some(income) = raw.income {
            if let Some(base) = income.base_income {
                config.income.base_income = finite("income.base_income", base)?;
            }
            if let Some(growth) = income.annual_growth_pct {
                config.income.annual_growth_pct = finite("income.annual_growth_pct", growth)?;
            }
        }

        if let Some(import) = raw.import {
            if let Some(profile) = import.header_profile {
                config.import.header_profile = profile.parse().map_err(Error::Config)?;
            }
        }

        Ok(config)
    }

    /// Render as TOML (for `fincast config`)
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to render config: {}", e)))
    }
}

/// Get the default override config path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("fincast").join("config.toml"))
}

fn finite(key: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::Config(format!("{} must be a finite number", key)))
    }
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    health: Option<RawHealth>,
    forecast: Option<RawForecast>,
    advisory: Option<RawAdvisory>,
    rates: Option<RawRates>,
    income: Option<RawIncome>,
    import: Option<RawImport>,
}

#[derive(Debug, Deserialize)]
struct RawHealth {
    window_months: Option<usize>,
    well_off_above: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawForecast {
    horizon_days: Option<u32>,
    weekly_seasonality: Option<String>,
    yearly_seasonality: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawAdvisory {
    threshold_pct: Option<f64>,
    action: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRates {
    base_currency: Option<String>,
    target_currency: Option<String>,
    api_url: Option<String>,
    api_key_env: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawIncome {
    base_income: Option<f64>,
    annual_growth_pct: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawImport {
    header_profile: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_default_config() {
        let config = FincastConfig::parse(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, FincastConfig::default());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = FincastConfig::parse(
            r#"
            [advisory]
            action = "SELL"
            threshold_pct = 2.5

            [forecast]
            yearly_seasonality = "off"
            "#,
        )
        .unwrap();

        assert_eq!(config.advisory.action, TradeAction::Sell);
        assert_eq!(config.advisory.threshold_pct, 2.5);
        assert_eq!(config.forecast.yearly_seasonality, Seasonality::Off);
        assert_eq!(config.forecast.weekly_seasonality, Seasonality::Auto);
        assert_eq!(config.health.window_months, 60);
        assert_eq!(config.rates.api_key_env, "FINCAST_RATES_API_KEY");
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(FincastConfig::parse("").unwrap(), FincastConfig::default());
    }

    #[test]
    fn test_invalid_values() {
        let err = FincastConfig::parse("[advisory]\naction = \"hold\"").unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("hold")));

        let err = FincastConfig::parse("[forecast]\nweekly_seasonality = \"maybe\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = FincastConfig::parse("[forecast]\ntimeout_secs = 0").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = FincastConfig::parse("[health\nwindow_months = 3").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_negative_well_off_boundary_rejected() {
        let err = FincastConfig::parse("[health]\nwell_off_above = -50.0").unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("well_off_above")));

        let config = FincastConfig::parse("[health]\nwell_off_above = 0.0").unwrap();
        assert_eq!(config.health.well_off_above, 0.0);
    }

    #[test]
    fn test_horizon_limit() {
        let config = FincastConfig::parse("[forecast]\nhorizon_days = 3650").unwrap();
        assert_eq!(config.forecast.horizon_days, MAX_HORIZON_DAYS);

        let err = FincastConfig::parse("[forecast]\nhorizon_days = 3651").unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("horizon_days")));
    }

    #[test]
    fn test_forecast_options() {
        let config = FincastConfig::parse("[forecast]\ntimeout_secs = 5").unwrap();
        let options = config.forecast.options();
        assert_eq!(options.fit_timeout, Duration::from_secs(5));
        assert_eq!(options.weekly, Seasonality::Auto);
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[health]\nwindow_months = 12").unwrap();

        let (config, source) = FincastConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.health.window_months, 12);
        assert_eq!(source, ConfigSource::File(file.path().to_path_buf()));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = FincastConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_to_toml_round_trips() {
        let config = FincastConfig::default();
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[rates]"));
        assert_eq!(FincastConfig::parse(&rendered).unwrap(), config);
    }
}
