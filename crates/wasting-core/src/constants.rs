//! Model constants. Durations are in days, ages in years.

/// Days per year used for every annual/daily conversion
pub const YEAR_DURATION: f64 = 365.25;

/// Youngest modeled age. Transitions are zero for strata ending at or below it,
/// and exposure rows ending exactly here are the birth prevalence.
pub const START_AGE: f64 = 0.5;

/// Age at which treated recovery times switch from the under-6-month constants
pub const TREATMENT_AGE_BOUNDARY: f64 = 0.5;

/// Untreated recovery time from mild wasting
pub const DEFAULT_MILD_WASTING_UX_RECOVERY_TIME: f64 = 1000.0;
/// Untreated recovery time from MAM
pub const MAM_UX_RECOVERY_TIME: f64 = 63.0;
pub const MAM_TX_RECOVERY_TIME_UNDER_6MO: f64 = 13.3;
pub const MAM_TX_RECOVERY_TIME_OVER_6MO: f64 = 55.3;
pub const SAM_TX_RECOVERY_TIME_UNDER_6MO: f64 = 13.3;
pub const SAM_TX_RECOVERY_TIME_OVER_6MO: f64 = 48.3;

/// Measles episode duration
pub const MEASLES_DURATION: f64 = 10.0;
/// Lower respiratory infection episode duration
pub const LRI_DURATION: f64 = 7.79;

/// Cause duration inside the early neonatal bin (half its 7 day width)
pub const EARLY_NEONATAL_CAUSE_DURATION: f64 = 3.5;

/// Tolerance on the sum of categorical exposures
pub const EXPOSURE_SUM_TOLERANCE: f64 = 1e-6;

/// (name, mean, lower, upper) of the fitted draw-level distributions
pub mod distributions {
    pub const SAM_K: (&str, f64, f64, f64) = ("sam_k", 6.7, 5.3, 8.4);
    pub const BASELINE_SAM_TX_COVERAGE: (&str, f64, f64, f64) =
        ("sam_tx_coverage", 0.488, 0.374, 0.604);
    pub const BASELINE_MAM_TX_COVERAGE: (&str, f64, f64, f64) =
        ("mam_tx_coverage", 0.15, 0.10, 0.20);
    pub const BASELINE_SAM_TX_EFFICACY: (&str, f64, f64, f64) =
        ("sam_tx_efficacy", 0.700, 0.64, 0.76);
    pub const BASELINE_MAM_TX_EFFICACY: (&str, f64, f64, f64) =
        ("mam_tx_efficacy", 0.731, 0.585, 0.877);
    pub const DIARRHEA_DURATION: (&str, f64, f64, f64) = ("diarrhea_duration", 4.3, 4.2, 4.4);
}
