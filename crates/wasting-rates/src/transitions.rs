//! Per-edge transition probability solvers.
//!
//! Remission edges are composed directly from recovery times and treatment
//! coverage. Incidence edges invert the steady-state flow balance of the four
//! category stocks. With categories numbered severe (1) to TMREL (4), `e_k`
//! the raw exposure, `ap_k` the mortality-adjusted exposure, `d_k` the daily
//! mortality probability and `adj` the all-cause adjustment:
//!
//! ```text
//! i3 = adj*e4/ap4 + ap3*r1/ap4 - d4
//! i2 = adj*(e3 + e4)/ap3 + ap1*t1/ap3 + ap2*r3/ap3 - d3 - ap4*d4/ap3
//! i1 = adj*(e2 + e3 + e4)/ap2 + ap1*(r2 + t1)/ap2 - d2 - ap3*d3/ap2 - ap4*d4/ap2
//! ```
//!
//! Every solver returns daily probabilities with underage strata reset to
//! zero as its last step.

use ndarray::{Array1, Array2};

use wasting_core::rates::{annual_to_daily_array, daily_to_annual_array};
use wasting_core::{
    rate_from_duration, CategoryTable, DrawTable, Result, StratumIndex, TreatedCategory, WastingCategory,
    WastingError,
};

use crate::exposure::adjust_exposure;
use crate::policy::reset_underage_transitions;
use crate::treatment::TreatmentParameters;

use wasting_core::WastingCategory::{Mild, Moderate, Severe, Tmrel};

/// Category stocks and mortality entering the incidence flow balances
#[derive(Debug, Clone)]
pub struct FlowBalance {
    exposure: CategoryTable,
    adjusted_exposure: CategoryTable,
    adjustment: DrawTable,
    mortality: CategoryTable,
}

impl FlowBalance {
    /// Build from raw exposure, the daily all-cause adjustment and daily
    /// mortality probabilities by category
    pub fn new(exposure: CategoryTable, adjustment: DrawTable, mortality: CategoryTable) -> Result<Self> {
        let adjusted_exposure = adjust_exposure(&exposure, &adjustment)?;
        mortality.ensure_compatible(
            "daily mortality probabilities",
            "child_wasting.exposure",
            exposure.index(),
            exposure.n_draws(),
        )?;
        Ok(Self {
            exposure,
            adjusted_exposure,
            adjustment,
            mortality,
        })
    }

    /// Strata shared by every table in the balance
    pub fn index(&self) -> &StratumIndex {
        self.exposure.index()
    }

    /// Number of draws per stratum
    pub fn n_draws(&self) -> usize {
        self.exposure.n_draws()
    }

    /// Raw category exposure `e_k`
    pub fn exposure(&self) -> &CategoryTable {
        &self.exposure
    }

    /// Mortality-adjusted stocks `ap_k = e_k / (1 + adj)`
    pub fn adjusted_exposure(&self) -> &CategoryTable {
        &self.adjusted_exposure
    }

    /// Daily all-cause adjustment `adj`
    pub fn adjustment(&self) -> &DrawTable {
        &self.adjustment
    }

    /// Daily mortality probability `d_k` by category
    pub fn mortality(&self) -> &CategoryTable {
        &self.mortality
    }

    fn raw(&self, category: WastingCategory) -> &Array2<f64> {
        self.exposure.get(category)
    }

    fn stock(&self, category: WastingCategory) -> &Array2<f64> {
        self.adjusted_exposure.get(category)
    }

    fn death(&self, category: WastingCategory) -> &Array2<f64> {
        self.mortality.get(category)
    }

    /// Mortality-adjusted inflow into `category` from every category in `sources`
    fn inflow(&self, sources: &[WastingCategory], category: WastingCategory) -> Array2<f64> {
        let raw = sources
            .iter()
            .skip(1)
            .fold(self.raw(sources[0]).clone(), |acc, source| acc + self.raw(*source));
        raw * self.adjustment.values() / self.stock(category)
    }

    /// Deaths in `source` expressed per unit of the `category` stock
    fn deaths_relative_to(&self, source: WastingCategory, category: WastingCategory) -> Array2<f64> {
        self.stock(source) * self.death(source) / self.stock(category)
    }

    /// Flow from `source` at daily probability `rate`, per unit of the `category` stock
    fn flow_relative_to(
        &self,
        source: WastingCategory,
        rate: &DrawTable,
        category: WastingCategory,
    ) -> Array2<f64> {
        self.stock(source) * rate.values() / self.stock(category)
    }

    fn finish(&self, values: Array2<f64>, start_age: f64) -> Result<DrawTable> {
        finish_on(self.index(), values, start_age)
    }

    fn ensure_rate_compatible(&self, name: &str, rate: &DrawTable) -> Result<()> {
        rate.ensure_compatible(name, "child_wasting.exposure", self.index(), self.n_draws())
    }
}

fn finish_on(index: &StratumIndex, values: Array2<f64>, start_age: f64) -> Result<DrawTable> {
    let mut table = DrawTable::new(index.clone(), values)?;
    reset_underage_transitions(&mut table, start_age);
    Ok(table)
}

fn ensure_treats(treatment: &TreatmentParameters, category: TreatedCategory) -> Result<()> {
    if treatment.category != category {
        return Err(WastingError::InvalidConfig(format!(
            "expected {} parameters, got {}",
            category.treatment_name(),
            treatment.category.treatment_name()
        )));
    }
    Ok(())
}

/// Mild to TMREL: `annual_to_daily(year / recovery_time)`
pub fn mild_remission_probability(
    index: &StratumIndex,
    n_draws: usize,
    untreated_recovery_time: f64,
    start_age: f64,
) -> Result<DrawTable> {
    let daily = wasting_core::annual_to_daily(rate_from_duration(untreated_recovery_time));
    finish_on(index, Array2::from_elem((index.len(), n_draws), daily), start_age)
}

/// Moderate to mild: treated and untreated recovery blended by effective coverage
pub fn mam_remission_probability(
    mam: &TreatmentParameters,
    untreated_recovery_time: f64,
    start_age: f64,
) -> Result<DrawTable> {
    ensure_treats(mam, TreatedCategory::Moderate)?;
    let effective = mam.effective_coverage();
    let untreated = rate_from_duration(untreated_recovery_time);
    let annual = &effective * &mam.treated_recovery_rate() + (1.0 - &effective) * untreated;
    finish_on(mam.coverage.index(), annual_to_daily_array(&annual), start_age)
}

/// Severe to mild: `effective_coverage * year / treated_recovery_time`
pub fn sam_treated_remission_probability(sam: &TreatmentParameters, start_age: f64) -> Result<DrawTable> {
    ensure_treats(sam, TreatedCategory::Severe)?;
    let annual = sam.effective_coverage() * sam.treated_recovery_rate();
    finish_on(sam.coverage.index(), annual_to_daily_array(&annual), start_age)
}

/// Severe to moderate: `sam_k - t1 - d1` on the annual scale.
///
/// The only edge derived by subtraction. It is not clamped and turns
/// negative when treated remission and SAM mortality exceed `sam_k`.
pub fn sam_untreated_remission_probability(
    mortality: &CategoryTable,
    sam_treated_remission: &DrawTable,
    sam_k: &Array1<f64>,
    start_age: f64,
) -> Result<DrawTable> {
    let index = mortality.index();
    sam_treated_remission.ensure_compatible(
        "sam treated remission",
        "daily mortality probabilities",
        index,
        mortality.n_draws(),
    )?;
    if sam_k.len() != mortality.n_draws() {
        return Err(WastingError::DrawCountMismatch {
            entity: "sam_k".to_string(),
            expected: mortality.n_draws(),
            actual: sam_k.len(),
        });
    }

    let treated = daily_to_annual_array(sam_treated_remission.values())?;
    let deaths = daily_to_annual_array(mortality.get(Severe))?;
    let mut annual = DrawTable::broadcast_draws(index.clone(), sam_k).into_values();
    annual -= &treated;
    annual -= &deaths;
    finish_on(index, annual_to_daily_array(&annual), start_age)
}

/// TMREL to mild
pub fn mild_incidence_probability(
    balance: &FlowBalance,
    mild_remission: &DrawTable,
    start_age: f64,
) -> Result<DrawTable> {
    balance.ensure_rate_compatible("mild remission", mild_remission)?;
    let i3 = balance.inflow(&[Tmrel], Tmrel) + balance.flow_relative_to(Mild, mild_remission, Tmrel)
        - balance.death(Tmrel);
    balance.finish(i3, start_age)
}

/// Mild to moderate
pub fn mam_incidence_probability(
    balance: &FlowBalance,
    sam_treated_remission: &DrawTable,
    mam_remission: &DrawTable,
    start_age: f64,
) -> Result<DrawTable> {
    balance.ensure_rate_compatible("sam treated remission", sam_treated_remission)?;
    balance.ensure_rate_compatible("mam remission", mam_remission)?;
    let i2 = balance.inflow(&[Mild, Tmrel], Mild)
        + balance.flow_relative_to(Severe, sam_treated_remission, Mild)
        + balance.flow_relative_to(Moderate, mam_remission, Mild)
        - balance.death(Mild)
        - balance.deaths_relative_to(Tmrel, Mild);
    balance.finish(i2, start_age)
}

/// Moderate to severe
pub fn sam_incidence_probability(
    balance: &FlowBalance,
    sam_untreated_remission: &DrawTable,
    sam_treated_remission: &DrawTable,
    start_age: f64,
) -> Result<DrawTable> {
    balance.ensure_rate_compatible("sam untreated remission", sam_untreated_remission)?;
    balance.ensure_rate_compatible("sam treated remission", sam_treated_remission)?;
    let i1 = balance.inflow(&[Moderate, Mild, Tmrel], Moderate)
        + balance.flow_relative_to(Severe, sam_untreated_remission, Moderate)
        + balance.flow_relative_to(Severe, sam_treated_remission, Moderate)
        - balance.death(Moderate)
        - balance.deaths_relative_to(Mild, Moderate)
        - balance.deaths_relative_to(Tmrel, Moderate);
    balance.finish(i1, start_age)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WastingConfig;
    use crate::exposure::acmr_adjustment;
    use approx::assert_relative_eq;
    use wasting_core::{annual_to_daily, Sex, Stratum};

    const START_AGE: f64 = 0.5;

    fn index() -> StratumIndex {
        StratumIndex::new(vec![
            Stratum::new(Sex::Female, 0.0, 0.5, 2022, 2023),
            Stratum::new(Sex::Female, 0.5, 1.0, 2022, 2023),
            Stratum::new(Sex::Female, 1.0, 2.0, 2022, 2023),
        ])
    }

    fn category_table(index: &StratumIndex, values: [f64; 4]) -> CategoryTable {
        CategoryTable::new(
            index.clone(),
            values.map(|v| Array2::from_elem((index.len(), 2), v)),
        )
        .unwrap()
    }

    fn balance(acmr: f64) -> FlowBalance {
        let index = index();
        let adjustment = acmr_adjustment(&DrawTable::filled(index.clone(), 2, acmr));
        let daily = annual_to_daily(acmr);
        FlowBalance::new(
            category_table(&index, [0.05, 0.15, 0.3, 0.5]),
            adjustment,
            category_table(&index, [daily; 4]),
        )
        .unwrap()
    }

    fn treatment(category: TreatedCategory, coverage: f64, efficacy: f64) -> TreatmentParameters {
        let index = index();
        let config = WastingConfig::default();
        let times = match category {
            TreatedCategory::Severe => config.sam_treated_recovery_time,
            TreatedCategory::Moderate => config.mam_treated_recovery_time,
        };
        TreatmentParameters {
            category,
            coverage: DrawTable::filled(index.clone(), 2, coverage),
            efficacy: Array1::from_elem(2, efficacy),
            recovery_time: DrawTable::from_strata(index, 2, |s| times.for_age(s.age_start, 0.5)),
        }
    }

    #[test]
    fn test_mild_remission() {
        let r1 = mild_remission_probability(&index(), 2, 1000.0, START_AGE).unwrap();
        assert!(r1.values().row(0).iter().all(|v| *v == 0.0));
        assert_eq!(r1.values()[[1, 0]], annual_to_daily(365.25 / 1000.0));
    }

    #[test]
    fn test_zero_coverage_remission() {
        let r3 = mam_remission_probability(&treatment(TreatedCategory::Moderate, 0.0, 0.7), 63.0, START_AGE)
            .unwrap();
        assert_relative_eq!(r3.values()[[2, 1]], annual_to_daily(365.25 / 63.0));

        let t1 = sam_treated_remission_probability(&treatment(TreatedCategory::Severe, 0.0, 0.7), START_AGE)
            .unwrap();
        assert!(t1.values().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_remission_increases_with_coverage() {
        let mut previous_r3 = f64::NEG_INFINITY;
        let mut previous_t1 = f64::NEG_INFINITY;
        for coverage in [0.0, 0.2, 0.4, 0.6, 0.8, 1.0] {
            let r3 = mam_remission_probability(
                &treatment(TreatedCategory::Moderate, coverage, 0.731),
                63.0,
                START_AGE,
            )
            .unwrap();
            let t1 = sam_treated_remission_probability(&treatment(TreatedCategory::Severe, coverage, 0.7), START_AGE)
                .unwrap();
            assert!(r3.values()[[1, 0]] > previous_r3);
            assert!(t1.values()[[1, 0]] > previous_t1);
            previous_r3 = r3.values()[[1, 0]];
            previous_t1 = t1.values()[[1, 0]];
        }
    }

    #[test]
    fn test_sam_treated_remission_value() {
        let t1 = sam_treated_remission_probability(&treatment(TreatedCategory::Severe, 0.5, 0.7), START_AGE)
            .unwrap();
        assert_relative_eq!(t1.values()[[2, 0]], annual_to_daily(0.35 * 365.25 / 48.3), epsilon = 1e-15);
    }

    #[test]
    fn test_wrong_treatment_category_is_rejected() {
        let sam = treatment(TreatedCategory::Severe, 0.5, 0.7);
        assert!(mam_remission_probability(&sam, 63.0, START_AGE).is_err());
    }

    #[test]
    fn test_sam_untreated_remission_is_not_clamped() {
        let balance = balance(0.01);
        let t1 = sam_treated_remission_probability(&treatment(TreatedCategory::Severe, 1.0, 1.0), START_AGE)
            .unwrap();
        let sam_k = Array1::from_elem(2, 1.0);
        let r2 = sam_untreated_remission_probability(balance.mortality(), &t1, &sam_k, START_AGE).unwrap();
        assert!(r2.values().row(0).iter().all(|v| *v == 0.0));
        assert!(r2.values()[[1, 0]] < 0.0);

        let annual = wasting_core::daily_to_annual(r2.values()[[1, 0]]).unwrap();
        let expected = 1.0 - 365.25 / 48.3 - 0.01;
        assert_relative_eq!(annual, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_sam_untreated_remission_rejects_certain_death() {
        let index = index();
        let mortality = category_table(&index, [1.0, 0.0, 0.0, 0.0]);
        let t1 = DrawTable::filled(index, 2, 0.0);
        let err = sam_untreated_remission_probability(&mortality, &t1, &Array1::from_elem(2, 6.7), START_AGE)
            .unwrap_err();
        assert!(matches!(err, WastingError::ProbabilityOutOfDomain { .. }));
    }

    #[test]
    fn test_incidence_is_positive_without_treatment() {
        let balance = balance(0.01);
        let index = balance.index().clone();
        let r1 = mild_remission_probability(&index, 2, 1000.0, START_AGE).unwrap();
        let r3 = mam_remission_probability(&treatment(TreatedCategory::Moderate, 0.0, 0.7), 63.0, START_AGE)
            .unwrap();
        let t1 = sam_treated_remission_probability(&treatment(TreatedCategory::Severe, 0.0, 0.7), START_AGE)
            .unwrap();
        let r2 = sam_untreated_remission_probability(balance.mortality(), &t1, &Array1::from_elem(2, 6.7), START_AGE)
            .unwrap();

        let i3 = mild_incidence_probability(&balance, &r1, START_AGE).unwrap();
        let i2 = mam_incidence_probability(&balance, &t1, &r3, START_AGE).unwrap();
        let i1 = sam_incidence_probability(&balance, &r2, &t1, START_AGE).unwrap();
        for rate in [&i3, &i2, &i1] {
            assert!(rate.values().row(0).iter().all(|v| *v == 0.0));
            for row in 1..3 {
                assert!(rate.values().row(row).iter().all(|v| v.is_finite() && *v > 0.0));
            }
        }

        // with equal mortality in every category, i3 reduces to adj^2 + (e3/e4) * r1
        let adj = annual_to_daily(0.01);
        assert_relative_eq!(
            i3.values()[[1, 0]],
            adj * adj + 0.6 * r1.values()[[1, 0]],
            epsilon = 1e-15
        );
    }

    const EXPOSURE: [f64; 4] = [0.05, 0.15, 0.3, 0.5];
    const MORTALITY: [f64; 4] = [0.004, 0.003, 0.002, 0.001];

    fn unequal_mortality_balance(acmr: f64) -> FlowBalance {
        let index = index();
        FlowBalance::new(
            category_table(&index, EXPOSURE),
            acmr_adjustment(&DrawTable::filled(index.clone(), 2, acmr)),
            category_table(&index, MORTALITY),
        )
        .unwrap()
    }

    #[test]
    fn test_mam_incidence_matches_flow_balance() {
        let balance = unequal_mortality_balance(0.01);
        let index = balance.index().clone();
        let (t1, r3) = (0.02, 0.015);
        let i2 = mam_incidence_probability(
            &balance,
            &DrawTable::filled(index.clone(), 2, t1),
            &DrawTable::filled(index, 2, r3),
            START_AGE,
        )
        .unwrap();

        let adj = annual_to_daily(0.01);
        let [_, _, e3, e4] = EXPOSURE;
        let [_, _, d3, d4] = MORTALITY;
        let [ap1, ap2, ap3, ap4] = EXPOSURE.map(|e| e / (1.0 + adj));
        let expected = adj * e3 / ap3 + adj * e4 / ap3 + ap1 * t1 / ap3 + ap2 * r3 / ap3 - d3 - ap4 * d4 / ap3;

        assert!(i2.values().row(0).iter().all(|v| *v == 0.0));
        for row in 1..3 {
            for draw in 0..2 {
                assert_relative_eq!(i2.values()[[row, draw]], expected, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn test_sam_incidence_matches_flow_balance() {
        let balance = unequal_mortality_balance(0.01);
        let index = balance.index().clone();
        let (r2, t1) = (0.03, 0.02);
        let i1 = sam_incidence_probability(
            &balance,
            &DrawTable::filled(index.clone(), 2, r2),
            &DrawTable::filled(index, 2, t1),
            START_AGE,
        )
        .unwrap();

        let adj = annual_to_daily(0.01);
        let [_, e2, e3, e4] = EXPOSURE;
        let [_, d2, d3, d4] = MORTALITY;
        let [ap1, ap2, ap3, ap4] = EXPOSURE.map(|e| e / (1.0 + adj));
        let expected =
            adj * (e2 + e3 + e4) / ap2 + ap1 * (r2 + t1) / ap2 - d2 - ap3 * d3 / ap2 - ap4 * d4 / ap2;

        assert!(i1.values().row(0).iter().all(|v| *v == 0.0));
        for row in 1..3 {
            for draw in 0..2 {
                assert_relative_eq!(i1.values()[[row, draw]], expected, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn test_flow_balance_rejects_misaligned_mortality() {
        let index = index();
        let other = StratumIndex::new(vec![Stratum::new(Sex::Male, 1.0, 2.0, 2022, 2023)]);
        let result = FlowBalance::new(
            category_table(&index, [0.05, 0.15, 0.3, 0.5]),
            DrawTable::filled(index.clone(), 2, 0.0),
            category_table(&other, [0.0; 4]),
        );
        assert!(matches!(result, Err(WastingError::IndexMismatch { .. })));
    }
}
