//! Epidemiological inputs consumed by the rate derivation.
//!
//! All tables must share the all-cause mortality table's stratum index and
//! draw columns. [`WastingInputs::validate`] checks this, plus the presence of
//! every comorbid cause and the absence of missing values, before any
//! arithmetic runs.

use std::collections::BTreeMap;

use wasting_core::{CategoryTable, ComorbidCause, DrawTable, Result, StratumIndex, WastingError};

use crate::exposure;

const ACMR: &str = "all_causes.cause_specific_mortality_rate";

/// Inputs for one cause whose incidence is modified by wasting
#[derive(Debug, Clone)]
pub struct ComorbidCauseInputs {
    /// Annual incidence rate of the cause
    pub incidence_rate: DrawTable,
    /// Annual excess mortality rate among prevalent cases
    pub excess_mortality_rate: DrawTable,
    /// Annual cause-specific mortality rate in the population
    pub cause_specific_mortality_rate: DrawTable,
    /// Fraction of the cause's incidence attributable to wasting
    pub population_attributable_fraction: DrawTable,
    /// Relative risk of incidence in each wasting category
    pub relative_risk: CategoryTable,
}

/// Protein-energy malnutrition mortality, applied to SAM and MAM only
#[derive(Debug, Clone)]
pub struct MalnutritionMortalityInputs {
    /// Annual excess mortality rate among prevalent cases
    pub excess_mortality_rate: DrawTable,
    /// Annual cause-specific mortality rate in the population
    pub cause_specific_mortality_rate: DrawTable,
}

/// Mortality tables for all-cause, comorbid and malnutrition deaths
#[derive(Debug, Clone)]
pub struct MortalityInputs {
    /// Annual all-cause mortality rate; its index is the reference
    pub all_cause_mortality_rate: DrawTable,
    /// One entry per [`ComorbidCause`]
    pub comorbid: BTreeMap<ComorbidCause, ComorbidCauseInputs>,
    pub malnutrition: MalnutritionMortalityInputs,
}

impl MortalityInputs {
    /// Reference stratum index
    pub fn index(&self) -> &StratumIndex {
        self.all_cause_mortality_rate.index()
    }

    /// Number of draw columns
    pub fn n_draws(&self) -> usize {
        self.all_cause_mortality_rate.n_draws()
    }

    /// Inputs of one comorbid cause
    pub fn cause(&self, cause: ComorbidCause) -> Result<&ComorbidCauseInputs> {
        self.comorbid
            .get(&cause)
            .ok_or_else(|| WastingError::MissingCause(cause.name().to_string()))
    }

    /// Check that every cause is present and every table is aligned and complete
    pub fn validate(&self) -> Result<()> {
        let index = self.index();
        let n_draws = self.n_draws();
        self.all_cause_mortality_rate.ensure_complete(ACMR)?;

        let check = |name: String, table: &DrawTable| -> Result<()> {
            table.ensure_compatible(&name, ACMR, index, n_draws)?;
            table.ensure_complete(&name)
        };

        for cause in ComorbidCause::ALL {
            let inputs = self.cause(cause)?;
            check(format!("{}.incidence_rate", cause), &inputs.incidence_rate)?;
            check(format!("{}.excess_mortality_rate", cause), &inputs.excess_mortality_rate)?;
            check(
                format!("{}.cause_specific_mortality_rate", cause),
                &inputs.cause_specific_mortality_rate,
            )?;
            check(
                format!("{}.population_attributable_fraction", cause),
                &inputs.population_attributable_fraction,
            )?;

            let rr_name = format!("child_wasting.relative_risk.{}", cause);
            inputs
                .relative_risk
                .ensure_compatible(&rr_name, ACMR, index, n_draws)?;
            inputs.relative_risk.ensure_complete(&rr_name)?;
        }

        check(
            "protein_energy_malnutrition.excess_mortality_rate".to_string(),
            &self.malnutrition.excess_mortality_rate,
        )?;
        check(
            "protein_energy_malnutrition.cause_specific_mortality_rate".to_string(),
            &self.malnutrition.cause_specific_mortality_rate,
        )
    }
}

/// Everything the rate engine reads
#[derive(Debug, Clone)]
pub struct WastingInputs {
    /// Cross-sectional category prevalence
    pub exposure: CategoryTable,
    pub mortality: MortalityInputs,
}

impl WastingInputs {
    /// Reference stratum index
    pub fn index(&self) -> &StratumIndex {
        self.mortality.index()
    }

    /// Number of draw columns
    pub fn n_draws(&self) -> usize {
        self.mortality.n_draws()
    }

    /// Check alignment, completeness and exposure normalization
    pub fn validate(&self, start_age: f64) -> Result<()> {
        self.mortality.validate()?;
        self.exposure
            .ensure_compatible("child_wasting.exposure", ACMR, self.index(), self.n_draws())?;
        self.exposure.ensure_complete("child_wasting.exposure")?;
        exposure::validate_exposure(&self.exposure, start_age)
    }
}
