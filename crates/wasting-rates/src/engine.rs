//! Derivation of all seven wasting transition rates for a set of draws.

use wasting_core::rates::daily_to_annual_array;
use wasting_core::{
    CategoryTable, DrawTable, Result, StratumIndex, Transition, TreatedCategory, WastingCategory,
    WastingError,
};

use crate::config::WastingConfig;
use crate::diagnostics::RateDiagnostics;
use crate::exposure::{acmr_adjustment, birth_prevalence, BirthPrevalence};
use crate::inputs::WastingInputs;
use crate::mortality::{daily_mortality_probabilities, CauseDurations};
use crate::parameters::DrawParameters;
use crate::transitions::{self, FlowBalance};
use crate::treatment::TreatmentParameters;

/// Rates for every edge of the wasting model over one stratum index
#[derive(Debug, Clone)]
pub struct WastingTransitionRates {
    draws: Vec<usize>,
    daily: [DrawTable; 7],
    annual: [DrawTable; 7],
    /// Daily mortality probability by category
    pub mortality_probabilities: CategoryTable,
    /// Exposure deflated by all-cause mortality
    pub adjusted_exposure: CategoryTable,
    /// Anomalies found during the derivation
    pub diagnostics: RateDiagnostics,
}

impl WastingTransitionRates {
    /// Annual rate of `transition`, the form the disease model consumes
    pub fn get(&self, transition: Transition) -> &DrawTable {
        &self.annual[transition.position()]
    }

    /// Daily transition probability of `transition`
    pub fn daily(&self, transition: Transition) -> &DrawTable {
        &self.daily[transition.position()]
    }

    /// Annual rates of every edge, in [`Transition::ALL`] order
    pub fn iter(&self) -> impl Iterator<Item = (Transition, &DrawTable)> + '_ {
        Transition::ALL.into_iter().zip(self.annual.iter())
    }

    /// Strata shared by every rate table
    pub fn index(&self) -> &StratumIndex {
        self.annual[0].index()
    }

    /// Draw numbers, one per column
    pub fn draws(&self) -> &[usize] {
        &self.draws
    }
}

/// Derives wasting transition rates from epidemiological inputs
#[derive(Debug, Clone, Default)]
pub struct TransitionRateEngine {
    config: WastingConfig,
}

impl TransitionRateEngine {
    /// Validate `config` and build an engine around it
    pub fn new(config: WastingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &WastingConfig {
        &self.config
    }

    /// Sample draw-level parameters for `draws` and derive every rate.
    ///
    /// Column `j` of every input table must hold draw `draws[j]`.
    pub fn derive(&self, inputs: &WastingInputs, draws: &[usize]) -> Result<WastingTransitionRates> {
        let parameters = DrawParameters::sample(&self.config.parameters, draws)?;
        self.derive_with_parameters(inputs, &parameters)
    }

    /// Derive every rate under baseline treatment coverage
    pub fn derive_with_parameters(
        &self,
        inputs: &WastingInputs,
        parameters: &DrawParameters,
    ) -> Result<WastingTransitionRates> {
        let index = inputs.index();
        let sam = TreatmentParameters::baseline(TreatedCategory::Severe, index, parameters, &self.config);
        let mam = TreatmentParameters::baseline(TreatedCategory::Moderate, index, parameters, &self.config);
        self.derive_with_treatment(inputs, parameters, &sam, &mam)
    }

    /// Derive every rate under the given SAM and MAM treatment
    pub fn derive_with_treatment(
        &self,
        inputs: &WastingInputs,
        parameters: &DrawParameters,
        sam: &TreatmentParameters,
        mam: &TreatmentParameters,
    ) -> Result<WastingTransitionRates> {
        let start_age = self.config.start_age;
        inputs.validate(start_age)?;

        let index = inputs.index();
        let n_draws = inputs.n_draws();
        if parameters.n_draws() != n_draws {
            return Err(WastingError::DrawCountMismatch {
                entity: "draw parameters".to_string(),
                expected: n_draws,
                actual: parameters.n_draws(),
            });
        }
        sam.ensure_compatible(index, n_draws)?;
        mam.ensure_compatible(index, n_draws)?;

        log::debug!(
            "Deriving wasting transition rates for {} strata and {} draws",
            index.len(),
            n_draws
        );

        let durations = CauseDurations::from_parameters(parameters, &self.config);
        let mortality = daily_mortality_probabilities(&inputs.mortality, &durations)?;
        let adjustment = acmr_adjustment(&inputs.mortality.all_cause_mortality_rate);
        let balance = FlowBalance::new(inputs.exposure.clone(), adjustment, mortality)?;
        log::debug!("Built mortality probabilities and adjusted exposure");

        let r1 = transitions::mild_remission_probability(
            index,
            n_draws,
            self.config.mild_wasting_untreated_recovery_time,
            start_age,
        )?;
        let r3 = transitions::mam_remission_probability(
            mam,
            self.config.mam_untreated_recovery_time,
            start_age,
        )?;
        let t1 = transitions::sam_treated_remission_probability(sam, start_age)?;
        let r2 = transitions::sam_untreated_remission_probability(
            balance.mortality(),
            &t1,
            &parameters.sam_k,
            start_age,
        )?;
        let i3 = transitions::mild_incidence_probability(&balance, &r1, start_age)?;
        let i2 = transitions::mam_incidence_probability(&balance, &t1, &r3, start_age)?;
        let i1 = transitions::sam_incidence_probability(&balance, &r2, &t1, start_age)?;
        log::debug!("Solved all transition edges");

        let daily = [i3, r1, i2, r3, i1, r2, t1];
        let mut diagnostics = RateDiagnostics::new();
        for (transition, table) in Transition::ALL.into_iter().zip(daily.iter()) {
            diagnostics.check_negative(transition, table, self.config.negative_rate_policy)?;
        }

        let annual = [
            annual_rate(&daily[0])?,
            annual_rate(&daily[1])?,
            annual_rate(&daily[2])?,
            annual_rate(&daily[3])?,
            annual_rate(&daily[4])?,
            annual_rate(&daily[5])?,
            annual_rate(&daily[6])?,
        ];

        Ok(WastingTransitionRates {
            draws: parameters.draws().to_vec(),
            daily,
            annual,
            mortality_probabilities: balance.mortality().clone(),
            adjusted_exposure: balance.adjusted_exposure().clone(),
            diagnostics,
        })
    }

    /// Prevalence of `category` at the youngest modeled age
    pub fn birth_prevalence(&self, inputs: &WastingInputs, category: WastingCategory) -> Vec<BirthPrevalence> {
        birth_prevalence(&inputs.exposure, category, self.config.start_age)
    }
}

fn annual_rate(daily: &DrawTable) -> Result<DrawTable> {
    daily.with_values(daily_to_annual_array(daily.values())?)
}
