//! Wasting-category-specific mortality.
//!
//! For category `i` the annual rate starts from all-cause mortality, swaps
//! each comorbid cause's population-average mortality for a
//! category-specific one, then does the same for protein-energy
//! malnutrition, which only SAM and MAM children carry:
//!
//! ```text
//! mr_i = acmr
//!      + sum_c (rr_ci * inc_c * (1 - paf_c) * dur_c * emr_c - csmr_c)
//!      + (pem_i * emr_pem - csmr_pem)
//! ```
//!
//! with `dur_c` in years and `pem_i` one for SAM and MAM, zero otherwise.

use ndarray::{Array1, Array2, Axis};

use wasting_core::constants::YEAR_DURATION;
use wasting_core::rates::annual_to_daily_array;
use wasting_core::{CategoryTable, ComorbidCause, Result, StratumIndex, WastingCategory, WastingError};

use crate::config::WastingConfig;
use crate::inputs::MortalityInputs;
use crate::parameters::DrawParameters;

/// Episode durations of the comorbid causes, in days
#[derive(Debug, Clone, PartialEq)]
pub struct CauseDurations {
    /// Diarrheal duration, one value per draw
    pub diarrheal_diseases: Array1<f64>,
    pub measles: f64,
    pub lower_respiratory_infections: f64,
    /// Duration used for every cause in the age bin starting at 0
    pub early_neonatal: f64,
}

impl CauseDurations {
    /// Sampled diarrheal durations plus the configured fixed durations
    pub fn from_parameters(parameters: &DrawParameters, config: &WastingConfig) -> Self {
        Self {
            diarrheal_diseases: parameters.diarrhea_duration.clone(),
            measles: config.measles_duration,
            lower_respiratory_infections: config.lri_duration,
            early_neonatal: config.early_neonatal_cause_duration,
        }
    }

    /// Strata x draws durations of `cause`, in years
    pub fn in_years(&self, cause: ComorbidCause, index: &StratumIndex, n_draws: usize) -> Array2<f64> {
        let per_draw = match cause {
            ComorbidCause::DiarrhealDiseases => self.diarrheal_diseases.clone(),
            ComorbidCause::Measles => Array1::from_elem(n_draws, self.measles),
            ComorbidCause::LowerRespiratoryInfections => {
                Array1::from_elem(n_draws, self.lower_respiratory_infections)
            }
        };

        let mut durations = Array2::zeros((index.len(), n_draws));
        for (mut row, stratum) in durations.axis_iter_mut(Axis(0)).zip(index.iter()) {
            if stratum.age_start == 0.0 {
                row.fill(self.early_neonatal);
            } else {
                row.assign(&per_draw);
            }
        }
        durations / YEAR_DURATION
    }
}

/// Annual mortality rate of each wasting category
pub fn mortality_rates_by_category(
    inputs: &MortalityInputs,
    durations: &CauseDurations,
) -> Result<CategoryTable> {
    inputs.validate()?;
    let index = inputs.index();
    let n_draws = inputs.n_draws();
    if durations.diarrheal_diseases.len() != n_draws {
        return Err(WastingError::DrawCountMismatch {
            entity: "diarrheal_diseases.duration".to_string(),
            expected: n_draws,
            actual: durations.diarrheal_diseases.len(),
        });
    }

    let acmr = inputs.all_cause_mortality_rate.values();
    let pem = &inputs.malnutrition;

    let mut rates: [Array2<f64>; 4] = Default::default();
    for category in WastingCategory::ALL {
        let mut rate = acmr.clone();
        for cause in ComorbidCause::ALL {
            let cause_inputs = inputs.cause(cause)?;
            let duration = durations.in_years(cause, index, n_draws);
            let incidence = cause_inputs.relative_risk.get(category)
                * cause_inputs.incidence_rate.values()
                * (1.0 - cause_inputs.population_attributable_fraction.values());
            rate = rate + incidence * duration * cause_inputs.excess_mortality_rate.values()
                - cause_inputs.cause_specific_mortality_rate.values();
        }

        let pem_prevalence = if category.is_acutely_malnourished() { 1.0 } else { 0.0 };
        rate = rate + pem.excess_mortality_rate.values() * pem_prevalence
            - pem.cause_specific_mortality_rate.values();

        rates[category.position()] = rate;
    }
    CategoryTable::new(index.clone(), rates)
}

/// Daily mortality probability of each wasting category
pub fn daily_mortality_probabilities(
    inputs: &MortalityInputs,
    durations: &CauseDurations,
) -> Result<CategoryTable> {
    let rates = mortality_rates_by_category(inputs, durations)?;
    Ok(rates.map_arrays(|_, values| annual_to_daily_array(values)))
}
