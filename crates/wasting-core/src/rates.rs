//! Conversions between annual rates and daily transition probabilities.
//!
//! `daily = 1 - exp(-annual / year)` and its inverse. Both use `exp_m1` /
//! `ln_1p` so small rates keep full precision.

use ndarray::{Array, Dimension};

use crate::constants::YEAR_DURATION;
use crate::error::{Result, WastingError};

/// Largest `f64` strictly below one
pub const MAX_DAILY_PROBABILITY: f64 = 1.0 - f64::EPSILON / 2.0;

/// Convert an annual rate to the equivalent daily probability.
///
/// Saturates just below 1 for very large rates. NaN propagates.
pub fn annual_to_daily(rate: f64) -> f64 {
    let probability = -(-rate / YEAR_DURATION).exp_m1();
    if probability > MAX_DAILY_PROBABILITY {
        MAX_DAILY_PROBABILITY
    } else {
        probability
    }
}

/// Convert a daily probability back to an annual rate.
///
/// Fails for probabilities at or above one, where the logarithm is undefined,
/// and for NaN or infinite input.
pub fn daily_to_annual(probability: f64) -> Result<f64> {
    if probability >= 1.0 {
        return Err(WastingError::ProbabilityOutOfDomain { value: probability });
    }
    if !probability.is_finite() {
        return Err(WastingError::NonFiniteProbability { value: probability });
    }
    Ok(-(-probability).ln_1p() * YEAR_DURATION)
}

/// Annual rate of leaving a state with the given mean duration in days
pub fn rate_from_duration(duration_days: f64) -> f64 {
    YEAR_DURATION / duration_days
}

/// Elementwise [`annual_to_daily`]
pub fn annual_to_daily_array<D: Dimension>(rates: &Array<f64, D>) -> Array<f64, D> {
    rates.mapv(annual_to_daily)
}

/// Elementwise [`daily_to_annual`], failing on the first invalid cell
pub fn daily_to_annual_array<D: Dimension>(probabilities: &Array<f64, D>) -> Result<Array<f64, D>> {
    if let Some(&bad) = probabilities.iter().find(|p| **p >= 1.0 || !p.is_finite()) {
        daily_to_annual(bad)?;
    }
    Ok(probabilities.mapv(|p| -(-p).ln_1p() * YEAR_DURATION))
}
