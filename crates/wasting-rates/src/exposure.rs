//! Mortality adjustment of cross-sectional wasting exposure, and the birth
//! prevalence boundary condition.

use serde::Serialize;

use wasting_core::constants::EXPOSURE_SUM_TOLERANCE;
use wasting_core::{CategoryTable, DrawTable, Result, Sex, WastingCategory, WastingError};

/// Daily all-cause mortality probability used to deflate exposures
pub fn acmr_adjustment(all_cause_mortality_rate: &DrawTable) -> DrawTable {
    all_cause_mortality_rate.map(wasting_core::annual_to_daily)
}

/// `exposure / (1 + adjustment)` for every category
pub fn adjust_exposure(exposure: &CategoryTable, adjustment: &DrawTable) -> Result<CategoryTable> {
    adjustment.ensure_compatible(
        "acmr_adjustment",
        "child_wasting.exposure",
        exposure.index(),
        exposure.n_draws(),
    )?;
    let divisor = adjustment.values() + 1.0;
    Ok(exposure.map_arrays(|_, values| values / &divisor))
}

/// Categorical exposures must sum to one in every modeled stratum and draw.
///
/// Strata ending at or below `start_age` carry the birth prevalence and are
/// not checked.
pub fn validate_exposure(exposure: &CategoryTable, start_age: f64) -> Result<()> {
    let total = exposure.total();
    for ((row, draw), sum) in total.indexed_iter() {
        let stratum = exposure.index()[row];
        if stratum.age_end <= start_age {
            continue;
        }
        if (sum - 1.0).abs() > EXPOSURE_SUM_TOLERANCE {
            return Err(WastingError::ExposureNotNormalized {
                stratum,
                draw,
                sum: *sum,
            });
        }
    }
    Ok(())
}

/// Prevalence of one category at the youngest modeled age
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BirthPrevalence {
    pub sex: Sex,
    pub year_start: i32,
    pub year_end: i32,
    pub category: WastingCategory,
    /// Prevalence by draw, in draw order
    pub draws: Vec<f64>,
}

/// Exposure rows whose `age_end` equals `start_age`, keyed without age
pub fn birth_prevalence(
    exposure: &CategoryTable,
    category: WastingCategory,
    start_age: f64,
) -> Vec<BirthPrevalence> {
    let values = exposure.get(category);
    exposure
        .index()
        .iter()
        .zip(values.rows())
        .filter(|(stratum, _)| stratum.age_end == start_age)
        .map(|(stratum, row)| BirthPrevalence {
            sex: stratum.sex,
            year_start: stratum.year_start,
            year_end: stratum.year_end,
            category,
            draws: row.to_vec(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;
    use wasting_core::{Stratum, StratumIndex};

    fn index() -> StratumIndex {
        StratumIndex::new(vec![
            Stratum::new(Sex::Female, 0.0, 0.5, 2022, 2023),
            Stratum::new(Sex::Female, 0.5, 1.0, 2022, 2023),
        ])
    }

    fn exposure(values: [f64; 4]) -> CategoryTable {
        let index = index();
        let arrays = values.map(|v| Array2::from_elem((index.len(), 2), v));
        CategoryTable::new(index, arrays).unwrap()
    }

    #[test]
    fn test_adjusted_exposure_is_dominated() {
        let exposure = exposure([0.05, 0.15, 0.3, 0.5]);
        let acmr = DrawTable::filled(index(), 2, 0.01);
        let adjusted = adjust_exposure(&exposure, &acmr_adjustment(&acmr)).unwrap();
        for category in WastingCategory::ALL {
            for (adj, raw) in adjusted.get(category).iter().zip(exposure.get(category).iter()) {
                assert!(*adj < *raw);
                assert!(*adj >= 0.0);
            }
        }
        let expected = 0.3 / (1.0 + wasting_core::annual_to_daily(0.01));
        assert_relative_eq!(adjusted.get(WastingCategory::Mild)[[1, 0]], expected);
    }

    #[test]
    fn test_zero_mortality_leaves_exposure_unchanged() {
        let exposure = exposure([0.05, 0.15, 0.3, 0.5]);
        let adjustment = acmr_adjustment(&DrawTable::filled(index(), 2, 0.0));
        let adjusted = adjust_exposure(&exposure, &adjustment).unwrap();
        assert_eq!(adjusted.get(WastingCategory::Tmrel), exposure.get(WastingCategory::Tmrel));
    }

    #[test]
    fn test_validate_exposure() {
        validate_exposure(&exposure([0.05, 0.15, 0.3, 0.5]), 0.5).unwrap();
        let err = validate_exposure(&exposure([0.05, 0.15, 0.3, 0.6]), 0.5).unwrap_err();
        match err {
            WastingError::ExposureNotNormalized { stratum, sum, .. } => {
                assert_eq!(stratum.age_start, 0.5);
                assert_relative_eq!(sum, 1.1, epsilon = 1e-12);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_birth_prevalence() {
        let rows = birth_prevalence(&exposure([0.05, 0.15, 0.3, 0.5]), WastingCategory::Moderate, 0.5);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sex, Sex::Female);
        assert_eq!(rows[0].year_start, 2022);
        assert_relative_eq!(rows[0].draws[1], 0.15);
    }
}
