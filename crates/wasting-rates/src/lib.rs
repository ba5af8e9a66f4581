//! Derivation of childhood wasting transition rates.
//!
//! Cross-sectional category exposure, cause-specific mortality and treatment
//! coverage are turned into daily transition probabilities (and annual rates)
//! for the seven edges of the four-state wasting model, for every stratum and
//! draw at once. See [`TransitionRateEngine`].

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod exposure;
pub mod inputs;
pub mod mortality;
pub mod parameters;
pub mod policy;
pub mod sampling;
pub mod transitions;
pub mod treatment;

pub use config::{DrawParameterConfig, NegativeRatePolicy, RecoveryTimes, WastingConfig};
pub use diagnostics::{NegativeRate, RateDiagnostics};
pub use engine::{TransitionRateEngine, WastingTransitionRates};
pub use exposure::{acmr_adjustment, adjust_exposure, birth_prevalence, validate_exposure, BirthPrevalence};
pub use inputs::{ComorbidCauseInputs, MalnutritionMortalityInputs, MortalityInputs, WastingInputs};
pub use mortality::{daily_mortality_probabilities, mortality_rates_by_category, CauseDurations};
pub use parameters::DrawParameters;
pub use policy::reset_underage_transitions;
pub use sampling::{ParameterDistribution, RandomVariable};
pub use transitions::FlowBalance;
pub use treatment::{
    treatment_exposure, treatment_relative_risks, TreatmentCategory, TreatmentExposure, TreatmentParameters,
    TreatmentRelativeRisk,
};
