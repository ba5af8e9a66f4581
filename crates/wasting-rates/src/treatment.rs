//! Treatment coverage and efficacy for SAM and MAM.
//!
//! Effective coverage is `coverage * efficacy`. Treated recovery times switch
//! on `age_start` at the treatment age boundary. The treatment exposure and
//! relative-risk tables describe three treatment categories: uncovered,
//! baseline coverage and an alternative scenario, with baseline as the
//! reference level.

use std::fmt;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use wasting_core::{rate_from_duration, DrawTable, Result, StratumIndex, Transition, TreatedCategory, WastingError};

use crate::config::WastingConfig;
use crate::parameters::DrawParameters;

/// Coverage, efficacy and recovery time of one treated category
#[derive(Debug, Clone)]
pub struct TreatmentParameters {
    /// Category the treatment applies to
    pub category: TreatedCategory,
    /// Fraction of the category reached by treatment
    pub coverage: DrawTable,
    /// Probability that treatment succeeds, one value per draw
    pub efficacy: Array1<f64>,
    /// Treated recovery time in days
    pub recovery_time: DrawTable,
}

impl TreatmentParameters {
    /// Baseline coverage and efficacy sampled for the draws of `parameters`
    pub fn baseline(
        category: TreatedCategory,
        index: &StratumIndex,
        parameters: &DrawParameters,
        config: &WastingConfig,
    ) -> Self {
        let recovery_times = match category {
            TreatedCategory::Severe => config.sam_treated_recovery_time,
            TreatedCategory::Moderate => config.mam_treated_recovery_time,
        };
        let boundary = config.treatment_age_boundary;
        Self {
            category,
            coverage: DrawTable::broadcast_draws(index.clone(), parameters.coverage(category)),
            efficacy: parameters.efficacy(category).clone(),
            recovery_time: DrawTable::from_strata(index.clone(), parameters.n_draws(), |stratum| {
                recovery_times.for_age(stratum.age_start, boundary)
            }),
        }
    }

    /// Replace the coverage, e.g. for a scale-up scenario.
    ///
    /// Every cell must be a fraction in [0, 1].
    pub fn with_coverage(mut self, coverage: DrawTable) -> Result<Self> {
        coverage.ensure_compatible(
            "treatment coverage",
            self.category.treatment_name(),
            self.recovery_time.index(),
            self.recovery_time.n_draws(),
        )?;
        ensure_fractions(
            &format!("{}.coverage", self.category.treatment_name()),
            coverage.values().iter(),
        )?;
        self.coverage = coverage;
        Ok(self)
    }

    /// Number of draws
    pub fn n_draws(&self) -> usize {
        self.efficacy.len()
    }

    /// `coverage * efficacy` per stratum and draw
    pub fn effective_coverage(&self) -> Array2<f64> {
        self.coverage.values() * &self.efficacy
    }

    /// Annual rate of leaving the category under treatment
    pub fn treated_recovery_rate(&self) -> Array2<f64> {
        self.recovery_time.values().mapv(rate_from_duration)
    }

    pub(crate) fn ensure_compatible(&self, index: &StratumIndex, n_draws: usize) -> Result<()> {
        let name = self.category.treatment_name();
        self.coverage.ensure_compatible(name, "wasting inputs", index, n_draws)?;
        self.recovery_time.ensure_compatible(name, "wasting inputs", index, n_draws)?;
        if self.efficacy.len() != n_draws {
            return Err(WastingError::DrawCountMismatch {
                entity: format!("{}.efficacy", name),
                expected: n_draws,
                actual: self.efficacy.len(),
            });
        }
        ensure_fractions(&format!("{}.coverage", name), self.coverage.values().iter())?;
        ensure_fractions(&format!("{}.efficacy", name), self.efficacy.iter())
    }
}

fn ensure_fractions<'a>(entity: &str, values: impl Iterator<Item = &'a f64>) -> Result<()> {
    for value in values {
        if !(0.0..=1.0).contains(value) {
            return Err(WastingError::InvalidConfig(format!(
                "{} must lie in [0, 1], got {}",
                entity, value
            )));
        }
    }
    Ok(())
}

/// Treatment level of a simulant with SAM or MAM
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TreatmentCategory {
    #[serde(rename = "cat1")]
    Uncovered,
    #[serde(rename = "cat2")]
    Baseline,
    #[serde(rename = "cat3")]
    Alternative,
}

impl TreatmentCategory {
    pub const ALL: [TreatmentCategory; 3] = [
        TreatmentCategory::Uncovered,
        TreatmentCategory::Baseline,
        TreatmentCategory::Alternative,
    ];

    /// Category label used in exposure and relative-risk tables
    pub fn label(self) -> &'static str {
        match self {
            TreatmentCategory::Uncovered => "cat1",
            TreatmentCategory::Baseline => "cat2",
            TreatmentCategory::Alternative => "cat3",
        }
    }

    /// Treatment efficacy in this category given the baseline efficacy
    pub fn efficacy(self, baseline: &Array1<f64>) -> Array1<f64> {
        match self {
            TreatmentCategory::Uncovered => Array1::zeros(baseline.len()),
            TreatmentCategory::Baseline | TreatmentCategory::Alternative => baseline.clone(),
        }
    }
}

impl fmt::Display for TreatmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Baseline exposure to each treatment category
#[derive(Debug, Clone)]
pub struct TreatmentExposure {
    /// `1 - coverage`
    pub uncovered: DrawTable,
    /// Baseline coverage
    pub baseline: DrawTable,
    /// Zero until a scenario moves simulants here
    pub alternative: DrawTable,
}

impl TreatmentExposure {
    /// Exposure table of one treatment category
    pub fn get(&self, category: TreatmentCategory) -> &DrawTable {
        match category {
            TreatmentCategory::Uncovered => &self.uncovered,
            TreatmentCategory::Baseline => &self.baseline,
            TreatmentCategory::Alternative => &self.alternative,
        }
    }
}

/// Uncovered `1 - coverage`, baseline `coverage`, nobody on the alternative
pub fn treatment_exposure(treatment: &TreatmentParameters) -> TreatmentExposure {
    TreatmentExposure {
        uncovered: treatment.coverage.map(|coverage| 1.0 - coverage),
        baseline: treatment.coverage.clone(),
        alternative: treatment.coverage.map(|_| 0.0),
    }
}

/// Relative risk of one remission edge in one treatment category
#[derive(Debug, Clone)]
pub struct TreatmentRelativeRisk {
    /// Remission edge the risk applies to
    pub transition: Transition,
    /// Treatment category exposed to the risk
    pub category: TreatmentCategory,
    /// Relative risk by stratum and draw
    pub values: DrawTable,
}

/// Relative risks of the remission edges affected by treatment, relative to
/// baseline efficacy.
///
/// For SAM the treated edge scales with `eff / eff_base` and the untreated
/// edge with `(1 - eff) / (1 - eff_base)`. For MAM the single remission edge
/// scales with
/// `(eff * ux + (1 - eff) * tx) / (eff_base * ux + (1 - eff_base) * tx)`
/// where `ux` and `tx` are the untreated and treated recovery times.
///
/// The SAM ratios are undefined when baseline efficacy is exactly 0 or 1.
pub fn treatment_relative_risks(
    treatment: &TreatmentParameters,
    config: &WastingConfig,
) -> Result<Vec<TreatmentRelativeRisk>> {
    let index = treatment.recovery_time.index();
    let baseline = &treatment.efficacy;
    if treatment.category == TreatedCategory::Severe {
        if let Some(efficacy) = baseline.iter().find(|e| !(**e > 0.0 && **e < 1.0)) {
            return Err(WastingError::InvalidConfig(format!(
                "{} relative risks need baseline efficacy in (0, 1), got {}",
                treatment.category.treatment_name(),
                efficacy
            )));
        }
    }
    let mut risks = Vec::new();

    for category in TreatmentCategory::ALL {
        let efficacy = category.efficacy(baseline);
        match treatment.category {
            TreatedCategory::Severe => {
                let treated = &efficacy / baseline;
                let untreated = (1.0 - &efficacy) / (1.0 - baseline);
                risks.push(TreatmentRelativeRisk {
                    transition: Transition::SevereToMild,
                    category,
                    values: DrawTable::broadcast_draws(index.clone(), &treated),
                });
                risks.push(TreatmentRelativeRisk {
                    transition: Transition::SevereToModerate,
                    category,
                    values: DrawTable::broadcast_draws(index.clone(), &untreated),
                });
            }
            TreatedCategory::Moderate => {
                let ux = config.mam_untreated_recovery_time;
                let tx = treatment.recovery_time.values();
                let numerator = tx * &(1.0 - &efficacy) + &(&efficacy * ux);
                let denominator = tx * &(1.0 - baseline) + &(baseline * ux);
                risks.push(TreatmentRelativeRisk {
                    transition: Transition::ModerateToMild,
                    category,
                    values: treatment.recovery_time.with_values(numerator / denominator)?,
                });
            }
        }
    }
    Ok(risks)
}
