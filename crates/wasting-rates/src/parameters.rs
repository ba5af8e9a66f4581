use ndarray::Array1;

use wasting_core::{Result, TreatedCategory};

use crate::config::DrawParameterConfig;

/// Draw-level scalars resolved for one set of draws.
///
/// Each array holds one value per requested draw, in the order of `draws`,
/// matching the draw columns of the input tables.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawParameters {
    draws: Vec<usize>,
    pub sam_tx_coverage: Array1<f64>,
    pub mam_tx_coverage: Array1<f64>,
    pub sam_tx_efficacy: Array1<f64>,
    pub mam_tx_efficacy: Array1<f64>,
    /// Total annual exit rate from SAM
    pub sam_k: Array1<f64>,
    /// Diarrheal episode duration in days
    pub diarrhea_duration: Array1<f64>,
}

impl DrawParameters {
    /// Validate `config` and sample every parameter for `draws`
    pub fn sample(config: &DrawParameterConfig, draws: &[usize]) -> Result<Self> {
        config.validate()?;
        log::debug!("Sampling draw-level parameters for {} draws", draws.len());
        Ok(Self {
            draws: draws.to_vec(),
            sam_tx_coverage: config.sam_tx_coverage.draws(draws)?,
            mam_tx_coverage: config.mam_tx_coverage.draws(draws)?,
            sam_tx_efficacy: config.sam_tx_efficacy.draws(draws)?,
            mam_tx_efficacy: config.mam_tx_efficacy.draws(draws)?,
            sam_k: config.sam_k.draws(draws)?,
            diarrhea_duration: config.diarrhea_duration.draws(draws)?,
        })
    }

    /// Draw numbers, one per column
    pub fn draws(&self) -> &[usize] {
        &self.draws
    }

    pub fn n_draws(&self) -> usize {
        self.draws.len()
    }

    /// Baseline treatment coverage of `category`
    pub fn coverage(&self, category: TreatedCategory) -> &Array1<f64> {
        match category {
            TreatedCategory::Severe => &self.sam_tx_coverage,
            TreatedCategory::Moderate => &self.mam_tx_coverage,
        }
    }

    /// Baseline treatment efficacy of `category`
    pub fn efficacy(&self, category: TreatedCategory) -> &Array1<f64> {
        match category {
            TreatedCategory::Severe => &self.sam_tx_efficacy,
            TreatedCategory::Moderate => &self.mam_tx_efficacy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::RandomVariable;

    #[test]
    fn test_sample_is_reproducible() {
        let config = DrawParameterConfig::default();
        let a = DrawParameters::sample(&config, &[0, 5, 42]).unwrap();
        let b = DrawParameters::sample(&config, &[0, 5, 42]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.n_draws(), 3);
        assert_eq!(a.draws(), &[0, 5, 42]);
    }

    #[test]
    fn test_default_parameters_are_in_range() {
        let draws: Vec<usize> = (0..100).collect();
        let params = DrawParameters::sample(&DrawParameterConfig::default(), &draws).unwrap();
        for category in [TreatedCategory::Severe, TreatedCategory::Moderate] {
            assert!(params.coverage(category).iter().all(|c| (0.0..=1.0).contains(c)));
            assert!(params.efficacy(category).iter().all(|e| (0.0..=1.0).contains(e)));
        }
        assert!(params.sam_k.iter().all(|k| *k > 0.0));
        assert!(params.diarrhea_duration.iter().all(|d| (3.5..5.0).contains(d)));
    }

    #[test]
    fn test_fixed_overrides() {
        let config = DrawParameterConfig {
            sam_tx_coverage: RandomVariable::fixed("sam_tx_coverage", 0.0),
            ..DrawParameterConfig::default()
        };
        let params = DrawParameters::sample(&config, &[3, 4]).unwrap();
        assert!(params.sam_tx_coverage.iter().all(|c| *c == 0.0));
    }
}
