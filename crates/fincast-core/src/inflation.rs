//! Income growth versus published inflation

use crate::models::{IncomeProjection, InflationYearRecord, ProjectionStatus};

/// Project income for each inflation record
///
/// The record at position `i` (file order, not year order) is paired with
/// `base_income * (1 + growth/100)^(i+1)`. A year is favorable when the
/// growth rate keeps up with that year's inflation.
pub fn compare(
    records: &[InflationYearRecord],
    base_income: f64,
    annual_growth_pct: f64,
) -> Vec<IncomeProjection> {
    let factor = 1.0 + annual_growth_pct / 100.0;
    records
        .iter()
        .enumerate()
        .map(|(i, record)| IncomeProjection {
            year: record.year,
            inflation_rate_pct: record.inflation_rate_pct,
            projected_income: base_income * factor.powi(i as i32 + 1),
            status: if annual_growth_pct >= record.inflation_rate_pct {
                ProjectionStatus::Favorable
            } else {
                ProjectionStatus::Unfavorable
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: i32, inflation_rate_pct: f64) -> InflationYearRecord {
        InflationYearRecord {
            year,
            inflation_rate_pct,
        }
    }

    #[test]
    fn test_single_year() {
        let projections = compare(&[record(2025, 4.0)], 50000.0, 3.0);
        assert_eq!(projections.len(), 1);
        assert!((projections[0].projected_income - 51500.0).abs() < 1e-6);
        assert_eq!(projections[0].status, ProjectionStatus::Unfavorable);
    }

    #[test]
    fn test_compounds_by_position() {
        let projections = compare(
            &[record(2025, 2.0), record(2026, 3.0), record(2027, 3.5)],
            50000.0,
            3.0,
        );
        assert!((projections[1].projected_income - 53045.0).abs() < 1e-6);
        assert!((projections[2].projected_income - 54636.35).abs() < 1e-6);
        // Equal growth and inflation is favorable
        assert_eq!(projections[0].status, ProjectionStatus::Favorable);
        assert_eq!(projections[1].status, ProjectionStatus::Favorable);
        assert_eq!(projections[2].status, ProjectionStatus::Unfavorable);
    }

    #[test]
    fn test_input_order_not_year_order() {
        let projections = compare(&[record(2030, 1.0), record(2025, 1.0)], 100.0, 10.0);
        assert_eq!(projections[0].year, 2030);
        assert!((projections[0].projected_income - 110.0).abs() < 1e-9);
        assert!((projections[1].projected_income - 121.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_records() {
        assert!(compare(&[], 50000.0, 3.0).is_empty());
    }
}
