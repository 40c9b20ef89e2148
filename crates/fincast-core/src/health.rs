//! Financial health classification

use crate::models::{FinancialStatus, MonthlySeries};

/// Net savings strictly above this are considered well off
pub const DEFAULT_WELL_OFF_ABOVE: f64 = 100.0;

/// Classifies a monthly series by its total net savings
///
/// - total > `well_off_above` → WellOff
/// - 0 < total ≤ `well_off_above` → Healthy
/// - total ≤ 0 → Unhealthy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthClassifier {
    well_off_above: f64,
}

impl HealthClassifier {
    pub fn new() -> Self {
        Self {
            well_off_above: DEFAULT_WELL_OFF_ABOVE,
        }
    }

    pub fn with_well_off_above(well_off_above: f64) -> Self {
        Self { well_off_above }
    }

    pub fn well_off_above(&self) -> f64 {
        self.well_off_above
    }

    pub fn classify(&self, series: &MonthlySeries) -> FinancialStatus {
        self.classify_total(series.total_net_savings())
    }

    pub fn classify_total(&self, total_net: f64) -> FinancialStatus {
        // Non-positive totals are Unhealthy whatever the boundary
        if total_net <= 0.0 || total_net.is_nan() {
            FinancialStatus::Unhealthy
        } else if total_net > self.well_off_above {
            FinancialStatus::WellOff
        } else {
            FinancialStatus::Healthy
        }
    }
}

impl Default for HealthClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify with the default boundary
pub fn classify(series: &MonthlySeries) -> FinancialStatus {
    HealthClassifier::new().classify(series)
}
