//! Buy/sell advisories from forecasted rates
//!
//! For every forecast point the percentage change against the current rate is
//! `(predicted - current) / current * 100`. Buying is favorable once the rate
//! has dropped by at least the threshold; selling once it has risen by at
//! least the threshold.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Advisory, ForecastPoint, Recommendation, TradeAction};

/// Float slack (in percentage points) so a rate exactly on the threshold
/// counts as reaching it
const THRESHOLD_EPSILON: f64 = 1e-9;

/// Percentage change of `predicted` relative to `current`
pub fn pct_change(predicted: f64, current: f64) -> Result<f64> {
    if current == 0.0 || !current.is_finite() {
        return Err(Error::DivisionByZero(format!(
            "current rate must be a non-zero number, got {}",
            current
        )));
    }
    Ok((predicted - current) / current * 100.0)
}

fn recommend(pct: f64, threshold_pct: f64, action: TradeAction) -> Recommendation {
    let favorable = match action {
        TradeAction::Buy => pct <= -threshold_pct + THRESHOLD_EPSILON,
        TradeAction::Sell => pct >= threshold_pct - THRESHOLD_EPSILON,
    };
    if favorable {
        Recommendation::Favorable
    } else {
        Recommendation::Wait
    }
}

/// One advisory per forecast point, in forecast order
pub fn advise(
    forecast: &[ForecastPoint],
    current_rate: f64,
    threshold_pct: f64,
    action: TradeAction,
) -> Result<Vec<Advisory>> {
    if !threshold_pct.is_finite() {
        return Err(Error::DataFormat(format!(
            "threshold must be a finite percentage, got {}",
            threshold_pct
        )));
    }

    forecast
        .iter()
        .map(|point| {
            let pct = pct_change(point.predicted_rate, current_rate)?;
            Ok(Advisory {
                date: point.date,
                predicted_rate: point.predicted_rate,
                action,
                recommendation: recommend(pct, threshold_pct, action),
            })
        })
        .collect()
}

/// Advisories plus the inputs that produced them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryReport {
    pub action: TradeAction,
    pub current_rate: f64,
    pub threshold_pct: f64,
    pub advisories: Vec<Advisory>,
}

impl AdvisoryReport {
    pub fn build(
        forecast: &[ForecastPoint],
        current_rate: f64,
        threshold_pct: f64,
        action: TradeAction,
    ) -> Result<Self> {
        Ok(Self {
            action,
            current_rate,
            threshold_pct,
            advisories: advise(forecast, current_rate, threshold_pct, action)?,
        })
    }

    /// Keep only advisories dated strictly after `date`
    pub fn future_only(mut self, date: NaiveDate) -> Self {
        self.advisories.retain(|a| a.date > date);
        self
    }

    pub fn favorable(&self) -> impl Iterator<Item = &Advisory> {
        self.advisories
            .iter()
            .filter(|a| a.recommendation == Recommendation::Favorable)
    }

    pub fn favorable_count(&self) -> usize {
        self.favorable().count()
    }

    /// Most attractive favorable date: lowest rate to buy, highest to sell
    pub fn best(&self) -> Option<&Advisory> {
        let by_rate = |a: &&Advisory, b: &&Advisory| a.predicted_rate.total_cmp(&b.predicted_rate);
        match self.action {
            TradeAction::Buy => self.favorable().min_by(by_rate),
            TradeAction::Sell => self.favorable().max_by(by_rate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(day: u32, rate: f64) -> ForecastPoint {
        ForecastPoint {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            predicted_rate: rate,
        }
    }

    #[test]
    fn test_buy_favorable_on_drop() {
        let advisories = advise(&[point(1, 0.95)], 1.00, 3.0, TradeAction::Buy).unwrap();
        assert_eq!(advisories.len(), 1);
        assert_eq!(advisories[0].recommendation, Recommendation::Favorable);
        assert_eq!(advisories[0].action, TradeAction::Buy);
    }

    #[test]
    fn test_buy_waits_on_small_drop() {
        let advisories = advise(&[point(1, 0.99)], 1.00, 3.0, TradeAction::Buy).unwrap();
        assert_eq!(advisories[0].recommendation, Recommendation::Wait);
    }

    #[test]
    fn test_sell_favorable_on_rise() {
        let forecast = [point(1, 1.02), point(2, 1.05), point(3, 0.90)];
        let advisories = advise(&forecast, 1.00, 3.0, TradeAction::Sell).unwrap();
        let recs: Vec<Recommendation> = advisories.iter().map(|a| a.recommendation).collect();
        assert_eq!(
            recs,
            vec![
                Recommendation::Wait,
                Recommendation::Favorable,
                Recommendation::Wait
            ]
        );
    }

    #[test]
    fn test_exact_threshold_is_favorable() {
        for (current, threshold) in [(1.0, 3.0), (1.25, 2.0), (1.3456, 1.5), (150.0, 0.7)] {
            let buy_at = current * (1.0 - threshold / 100.0);
            let sell_at = current * (1.0 + threshold / 100.0);

            let buy = advise(&[point(1, buy_at)], current, threshold, TradeAction::Buy).unwrap();
            assert_eq!(buy[0].recommendation, Recommendation::Favorable);

            let sell = advise(&[point(1, sell_at)], current, threshold, TradeAction::Sell).unwrap();
            assert_eq!(sell[0].recommendation, Recommendation::Favorable);
        }
    }

    #[test]
    fn test_just_inside_threshold_waits() {
        // -2.99% and +2.99% against a 3% threshold
        let buy = advise(&[point(1, 0.9701)], 1.00, 3.0, TradeAction::Buy).unwrap();
        assert_eq!(buy[0].recommendation, Recommendation::Wait);

        let sell = advise(&[point(1, 1.0299)], 1.00, 3.0, TradeAction::Sell).unwrap();
        assert_eq!(sell[0].recommendation, Recommendation::Wait);

        // Slack stays far below anything a four-decimal rate can express
        let near = 1.0 * (1.0 - 3.0 / 100.0) + 1e-6;
        let buy = advise(&[point(1, near)], 1.00, 3.0, TradeAction::Buy).unwrap();
        assert_eq!(buy[0].recommendation, Recommendation::Wait);
    }

    #[test]
    fn test_zero_current_rate() {
        let err = advise(&[point(1, 1.0)], 0.0, 1.0, TradeAction::Buy).unwrap_err();
        assert!(matches!(err, Error::DivisionByZero(_)));
        assert!(matches!(
            pct_change(1.0, f64::NAN),
            Err(Error::DivisionByZero(_))
        ));
    }

    #[test]
    fn test_empty_forecast() {
        let advisories = advise(&[], 1.0, 1.0, TradeAction::Sell).unwrap();
        assert!(advisories.is_empty());
    }

    #[test]
    fn test_preserves_order() {
        let forecast = [point(3, 1.0), point(1, 1.0), point(2, 1.0)];
        let advisories = advise(&forecast, 1.0, 1.0, TradeAction::Buy).unwrap();
        let days: Vec<NaiveDate> = advisories.iter().map(|a| a.date).collect();
        let expected: Vec<NaiveDate> = forecast.iter().map(|p| p.date).collect();
        assert_eq!(days, expected);
    }

    #[test]
    fn test_report_best_and_future_only() {
        let forecast = [point(1, 0.90), point(2, 0.95), point(3, 0.93), point(4, 1.0)];
        let report = AdvisoryReport::build(&forecast, 1.0, 2.0, TradeAction::Buy).unwrap();
        assert_eq!(report.favorable_count(), 3);
        assert_eq!(report.best().unwrap().date, point(1, 0.0).date);

        let future = report.future_only(point(1, 0.0).date);
        assert_eq!(future.advisories.len(), 3);
        assert_eq!(future.best().unwrap().date, point(3, 0.0).date);
    }

    #[test]
    fn test_report_best_for_sell() {
        let forecast = [point(1, 1.05), point(2, 1.08), point(3, 1.0)];
        let report = AdvisoryReport::build(&forecast, 1.0, 2.0, TradeAction::Sell).unwrap();
        assert_eq!(report.best().unwrap().predicted_rate, 1.08);
    }
}
