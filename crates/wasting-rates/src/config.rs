//! Configuration of the rate derivation.
//!
//! Every field has a default, so a JSON document only needs the values it
//! overrides, e.g. `{"mild_wasting_untreated_recovery_time": 730.0}`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use wasting_core::constants::{self, distributions};
use wasting_core::{Result, WastingError};

use crate::sampling::{ParameterDistribution, RandomVariable, DEFAULT_QUANTILES};

/// What to do when a derived rate is negative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NegativeRatePolicy {
    /// Keep the value, log a warning and list it in the diagnostics
    #[default]
    Report,
    /// Fail with [`WastingError::NegativeRate`] at the first negative cell
    Reject,
}

/// Treated recovery time in days, split at the treatment age boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecoveryTimes {
    /// Used by strata starting below the boundary
    pub under_boundary: f64,
    /// Used by strata starting at or above the boundary
    pub over_boundary: f64,
}

impl RecoveryTimes {
    /// Recovery time for a stratum starting at `age_start`
    pub fn for_age(&self, age_start: f64, boundary: f64) -> f64 {
        if age_start < boundary {
            self.under_boundary
        } else {
            self.over_boundary
        }
    }
}

/// Distributions of the parameters sampled once per draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawParameterConfig {
    /// Baseline fraction of SAM cases reached by treatment
    pub sam_tx_coverage: RandomVariable,
    /// Baseline fraction of MAM cases reached by treatment
    pub mam_tx_coverage: RandomVariable,
    /// Probability that SAM treatment succeeds
    pub sam_tx_efficacy: RandomVariable,
    /// Probability that MAM treatment succeeds
    pub mam_tx_efficacy: RandomVariable,
    /// Total annual exit rate from SAM
    pub sam_k: RandomVariable,
    /// Diarrheal episode duration in days
    pub diarrhea_duration: RandomVariable,
}

impl Default for DrawParameterConfig {
    fn default() -> Self {
        let unit_truncnorm = |(name, mean, lower, upper): (&str, f64, f64, f64)| {
            RandomVariable::new(
                name,
                ParameterDistribution::truncnorm_from_quantiles(
                    mean,
                    lower,
                    upper,
                    DEFAULT_QUANTILES,
                    (0.0, 1.0),
                ),
            )
        };
        let (sam_k, median, lower, upper) = distributions::SAM_K;
        let (diarrhea, mean, d_lower, d_upper) = distributions::DIARRHEA_DURATION;

        Self {
            sam_tx_coverage: unit_truncnorm(distributions::BASELINE_SAM_TX_COVERAGE),
            mam_tx_coverage: unit_truncnorm(distributions::BASELINE_MAM_TX_COVERAGE),
            sam_tx_efficacy: unit_truncnorm(distributions::BASELINE_SAM_TX_EFFICACY),
            mam_tx_efficacy: unit_truncnorm(distributions::BASELINE_MAM_TX_EFFICACY),
            sam_k: RandomVariable::new(
                sam_k,
                ParameterDistribution::lognormal_from_quantiles(median, lower, upper, DEFAULT_QUANTILES),
            ),
            diarrhea_duration: RandomVariable::new(
                diarrhea,
                ParameterDistribution::normal_from_quantiles(mean, d_lower, d_upper, DEFAULT_QUANTILES),
            ),
        }
    }
}

impl DrawParameterConfig {
    /// Check every distribution. Coverage and efficacy are fractions, so
    /// their distributions must stay within [0, 1].
    pub fn validate(&self) -> Result<()> {
        for rv in [
            &self.sam_tx_coverage,
            &self.mam_tx_coverage,
            &self.sam_tx_efficacy,
            &self.mam_tx_efficacy,
        ] {
            rv.ensure_support_within(0.0, 1.0)?;
        }
        for rv in [&self.sam_k, &self.diarrhea_duration] {
            rv.distribution.validate(&rv.name)?;
        }
        Ok(())
    }
}

/// Configuration for deriving wasting transition rates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WastingConfig {
    /// Youngest modeled age in years
    pub start_age: f64,
    /// Age in years at which treated recovery times switch
    pub treatment_age_boundary: f64,
    /// Mean untreated recovery time from mild wasting, in days
    pub mild_wasting_untreated_recovery_time: f64,
    /// Mean untreated recovery time from MAM, in days
    pub mam_untreated_recovery_time: f64,
    /// Treated recovery time from MAM, in days
    pub mam_treated_recovery_time: RecoveryTimes,
    /// Treated recovery time from SAM, in days
    pub sam_treated_recovery_time: RecoveryTimes,
    /// Measles episode duration in days
    pub measles_duration: f64,
    /// Lower respiratory infection episode duration in days
    pub lri_duration: f64,
    /// Cause duration used in the age bin starting at 0
    pub early_neonatal_cause_duration: f64,
    /// Distributions of the per-draw parameters
    pub parameters: DrawParameterConfig,
    /// Handling of negative derived rates
    pub negative_rate_policy: NegativeRatePolicy,
}

impl Default for WastingConfig {
    fn default() -> Self {
        Self {
            start_age: constants::START_AGE,
            treatment_age_boundary: constants::TREATMENT_AGE_BOUNDARY,
            mild_wasting_untreated_recovery_time: constants::DEFAULT_MILD_WASTING_UX_RECOVERY_TIME,
            mam_untreated_recovery_time: constants::MAM_UX_RECOVERY_TIME,
            mam_treated_recovery_time: RecoveryTimes {
                under_boundary: constants::MAM_TX_RECOVERY_TIME_UNDER_6MO,
                over_boundary: constants::MAM_TX_RECOVERY_TIME_OVER_6MO,
            },
            sam_treated_recovery_time: RecoveryTimes {
                under_boundary: constants::SAM_TX_RECOVERY_TIME_UNDER_6MO,
                over_boundary: constants::SAM_TX_RECOVERY_TIME_OVER_6MO,
            },
            measles_duration: constants::MEASLES_DURATION,
            lri_duration: constants::LRI_DURATION,
            early_neonatal_cause_duration: constants::EARLY_NEONATAL_CAUSE_DURATION,
            parameters: DrawParameterConfig::default(),
            negative_rate_policy: NegativeRatePolicy::default(),
        }
    }
}

impl WastingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON document; absent fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the mean untreated recovery time from mild wasting, in days
    pub fn with_mild_wasting_untreated_recovery_time(mut self, days: f64) -> Self {
        self.mild_wasting_untreated_recovery_time = days;
        self
    }

    /// Set the youngest modeled age in years
    pub fn with_start_age(mut self, age: f64) -> Self {
        self.start_age = age;
        self
    }

    /// Replace the per-draw parameter distributions
    pub fn with_parameters(mut self, parameters: DrawParameterConfig) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set how negative derived rates are handled
    pub fn with_negative_rate_policy(mut self, policy: NegativeRatePolicy) -> Self {
        self.negative_rate_policy = policy;
        self
    }

    /// Check durations, ages and parameter distributions
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("mild_wasting_untreated_recovery_time", self.mild_wasting_untreated_recovery_time),
            ("mam_untreated_recovery_time", self.mam_untreated_recovery_time),
            ("mam_treated_recovery_time.under_boundary", self.mam_treated_recovery_time.under_boundary),
            ("mam_treated_recovery_time.over_boundary", self.mam_treated_recovery_time.over_boundary),
            ("sam_treated_recovery_time.under_boundary", self.sam_treated_recovery_time.under_boundary),
            ("sam_treated_recovery_time.over_boundary", self.sam_treated_recovery_time.over_boundary),
            ("measles_duration", self.measles_duration),
            ("lri_duration", self.lri_duration),
            ("early_neonatal_cause_duration", self.early_neonatal_cause_duration),
        ];
        for (name, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(WastingError::InvalidConfig(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )));
            }
        }
        if !self.start_age.is_finite() || self.start_age < 0.0 {
            return Err(WastingError::InvalidConfig(format!(
                "start_age must be a non-negative age, got {}",
                self.start_age
            )));
        }
        if !self.treatment_age_boundary.is_finite() {
            return Err(WastingError::InvalidConfig(format!(
                "treatment_age_boundary must be finite, got {}",
                self.treatment_age_boundary
            )));
        }
        self.parameters.validate()
    }
}
