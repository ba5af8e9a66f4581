//! Deterministic draw-level sampling of uncertain scalar parameters.
//!
//! Each (parameter, draw) pair seeds its own generator from a SHA-256 hash of
//! `"{name}_draw_{draw}"`, so a draw's value does not depend on which other
//! draws are sampled or in what order.

use ndarray::Array1;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, LogNormal, Normal};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use wasting_core::{Result, WastingError};

/// Quantile ranks bounding a 95% uncertainty interval
pub const DEFAULT_QUANTILES: (f64, f64) = (0.025, 0.975);

const MAX_REJECTIONS: usize = 10_000;

/// Fitted distribution of a draw-level parameter
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParameterDistribution {
    Fixed { value: f64 },
    Normal { mean: f64, sd: f64 },
    TruncatedNormal { mean: f64, sd: f64, lower: f64, upper: f64 },
    LogNormal { median: f64, sigma: f64 },
}

impl ParameterDistribution {
    /// Normal whose `quantiles` fall at (`lower`, `upper`)
    pub fn normal_from_quantiles(mean: f64, lower: f64, upper: f64, quantiles: (f64, f64)) -> Self {
        let sd = sd_from_quantiles(lower, upper, quantiles);
        ParameterDistribution::Normal { mean, sd }
    }

    /// Normal fitted as in [`Self::normal_from_quantiles`], truncated to `clip`
    pub fn truncnorm_from_quantiles(
        mean: f64,
        lower: f64,
        upper: f64,
        quantiles: (f64, f64),
        clip: (f64, f64),
    ) -> Self {
        let sd = sd_from_quantiles(lower, upper, quantiles);
        Self::truncnorm_from_sd(mean, sd, clip)
    }

    /// Normal with the given moments, truncated to `clip`
    pub fn truncnorm_from_sd(mean: f64, sd: f64, clip: (f64, f64)) -> Self {
        ParameterDistribution::TruncatedNormal {
            mean,
            sd,
            lower: clip.0,
            upper: clip.1,
        }
    }

    /// Log-normal with the given median whose `quantiles` fall approximately
    /// at (`lower`, `upper`)
    pub fn lognormal_from_quantiles(median: f64, lower: f64, upper: f64, quantiles: (f64, f64)) -> Self {
        let sigma = (upper.ln() - lower.ln())
            / (standard_normal_quantile(quantiles.1) - standard_normal_quantile(quantiles.0));
        ParameterDistribution::LogNormal { median, sigma }
    }

    /// Reject parameters the distribution cannot be built from
    pub fn validate(&self, name: &str) -> Result<()> {
        let invalid = |reason: &str| WastingError::InvalidDistribution {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        match *self {
            ParameterDistribution::Fixed { value } if !value.is_finite() => {
                Err(invalid("value must be finite"))
            }
            ParameterDistribution::Normal { mean, sd }
            | ParameterDistribution::TruncatedNormal { mean, sd, .. }
                if !mean.is_finite() || !sd.is_finite() || sd < 0.0 =>
            {
                Err(invalid("mean must be finite and sd non-negative"))
            }
            ParameterDistribution::TruncatedNormal { mean, lower, upper, .. }
                if !(lower < upper) || mean < lower || mean > upper =>
            {
                Err(invalid("truncation bounds must satisfy lower <= mean <= upper"))
            }
            ParameterDistribution::LogNormal { median, sigma }
                if !(median > 0.0) || !sigma.is_finite() || sigma < 0.0 =>
            {
                Err(invalid("median must be positive and sigma non-negative"))
            }
            _ => Ok(()),
        }
    }

    /// Smallest interval holding every value the distribution can produce
    pub fn support(&self) -> (f64, f64) {
        match *self {
            ParameterDistribution::Fixed { value } => (value, value),
            ParameterDistribution::Normal { mean, sd } if sd == 0.0 => (mean, mean),
            ParameterDistribution::Normal { .. } => (f64::NEG_INFINITY, f64::INFINITY),
            ParameterDistribution::TruncatedNormal { lower, upper, .. } => (lower, upper),
            ParameterDistribution::LogNormal { median, sigma } if sigma == 0.0 => (median, median),
            ParameterDistribution::LogNormal { .. } => (0.0, f64::INFINITY),
        }
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        match *self {
            ParameterDistribution::Fixed { value } => value,
            ParameterDistribution::Normal { mean, sd } => match Normal::new(mean, sd) {
                Ok(normal) => normal.sample(rng),
                Err(_) => f64::NAN,
            },
            ParameterDistribution::TruncatedNormal {
                mean,
                sd,
                lower,
                upper,
            } => {
                let Ok(normal) = Normal::new(mean, sd) else {
                    return f64::NAN;
                };
                for _ in 0..MAX_REJECTIONS {
                    let value = normal.sample(rng);
                    if (lower..=upper).contains(&value) {
                        return value;
                    }
                }
                log::debug!(
                    "Truncated normal N({}, {}) on [{}, {}] rejected {} samples, using the mean",
                    mean,
                    sd,
                    lower,
                    upper,
                    MAX_REJECTIONS
                );
                mean
            }
            ParameterDistribution::LogNormal { median, sigma } => {
                match LogNormal::new(median.ln(), sigma) {
                    Ok(lognormal) => lognormal.sample(rng),
                    Err(_) => f64::NAN,
                }
            }
        }
    }
}

/// A named parameter with its distribution
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RandomVariable {
    /// Name seeding the per-draw generator
    pub name: String,
    pub distribution: ParameterDistribution,
}

impl RandomVariable {
    pub fn new(name: impl Into<String>, distribution: ParameterDistribution) -> Self {
        Self {
            name: name.into(),
            distribution,
        }
    }

    /// Parameter with the same value in every draw
    pub fn fixed(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, ParameterDistribution::Fixed { value })
    }

    /// Fail unless every sample falls within `lower..=upper`
    pub fn ensure_support_within(&self, lower: f64, upper: f64) -> Result<()> {
        self.distribution.validate(&self.name)?;
        let (low, high) = self.distribution.support();
        if low < lower || high > upper {
            return Err(WastingError::InvalidDistribution {
                name: self.name.clone(),
                reason: format!(
                    "support [{}, {}] is not contained in [{}, {}]",
                    low, high, lower, upper
                ),
            });
        }
        Ok(())
    }

    /// Value of this parameter for one draw
    pub fn sample(&self, draw: usize) -> Result<f64> {
        self.distribution.validate(&self.name)?;
        let seed = stable_hash(&format!("{}_draw_{}", self.name, draw));
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        Ok(self.distribution.sample(&mut rng))
    }

    /// Values for every draw in `draws`, in order
    pub fn draws(&self, draws: &[usize]) -> Result<Array1<f64>> {
        draws.iter().map(|&draw| self.sample(draw)).collect()
    }
}

/// Stable 64-bit hash of a key (first eight bytes of its SHA-256 digest)
pub fn stable_hash(key: &str) -> u64 {
    let digest = Sha256::digest(key.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

fn sd_from_quantiles(lower: f64, upper: f64, quantiles: (f64, f64)) -> f64 {
    (upper - lower) / (standard_normal_quantile(quantiles.1) - standard_normal_quantile(quantiles.0))
}

/// Inverse CDF of the standard normal distribution.
///
/// Acklam's rational approximation, relative error below 1.2e-9 on (0, 1).
pub fn standard_normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_690e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.024_25;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}
