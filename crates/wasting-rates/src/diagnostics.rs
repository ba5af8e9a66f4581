//! Checks on derived rates that are reported rather than silently fixed.

use serde::Serialize;

use wasting_core::{DrawTable, Result, Stratum, Transition, WastingError};

use crate::config::NegativeRatePolicy;

/// A negative value in a derived daily probability series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NegativeRate {
    /// Edge the value was derived for
    pub transition: Transition,
    pub stratum: Stratum,
    /// Column position within the processed draws
    pub draw: usize,
    /// Derived daily probability
    pub value: f64,
}

/// Anomalies found while deriving one set of rates
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RateDiagnostics {
    /// Negative cells in derivation order
    pub negative_rates: Vec<NegativeRate>,
}

impl RateDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing was reported
    pub fn is_clean(&self) -> bool {
        self.negative_rates.is_empty()
    }

    /// Negative cells of one transition
    pub fn negative_rates_for(&self, transition: Transition) -> impl Iterator<Item = &NegativeRate> + '_ {
        self.negative_rates
            .iter()
            .filter(move |negative| negative.transition == transition)
    }

    /// Record every negative cell of `table`, or fail on the first one under
    /// [`NegativeRatePolicy::Reject`]
    pub fn check_negative(
        &mut self,
        transition: Transition,
        table: &DrawTable,
        policy: NegativeRatePolicy,
    ) -> Result<()> {
        let before = self.negative_rates.len();
        for ((row, draw), value) in table.values().indexed_iter() {
            if *value >= 0.0 || value.is_nan() {
                continue;
            }
            let stratum = table.index()[row];
            if policy == NegativeRatePolicy::Reject {
                return Err(WastingError::NegativeRate {
                    transition,
                    stratum,
                    draw,
                    value: *value,
                });
            }
            self.negative_rates.push(NegativeRate {
                transition,
                stratum,
                draw,
                value: *value,
            });
        }

        let found = self.negative_rates.len() - before;
        if found > 0 {
            log::warn!(
                "{} has {} negative daily probabilities (most negative {:.3e})",
                transition,
                found,
                self.negative_rates[before..]
                    .iter()
                    .map(|negative| negative.value)
                    .fold(f64::INFINITY, f64::min)
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasting_core::{Sex, StratumIndex};

    fn table() -> DrawTable {
        let index = StratumIndex::new(vec![
            Stratum::new(Sex::Male, 0.5, 1.0, 2022, 2023),
            Stratum::new(Sex::Male, 1.0, 2.0, 2022, 2023),
        ]);
        let mut table = DrawTable::filled(index, 3, 0.01);
        table.values_mut()[[1, 2]] = -0.002;
        table.values_mut()[[0, 1]] = -0.001;
        table
    }

    #[test]
    fn test_report_collects_negative_cells() {
        let mut diagnostics = RateDiagnostics::new();
        diagnostics
            .check_negative(Transition::SevereToModerate, &table(), NegativeRatePolicy::Report)
            .unwrap();
        assert!(!diagnostics.is_clean());
        assert_eq!(diagnostics.negative_rates.len(), 2);
        assert_eq!(diagnostics.negative_rates[0].draw, 1);
        assert_eq!(diagnostics.negative_rates[1].stratum.age_start, 1.0);
        assert_eq!(diagnostics.negative_rates_for(Transition::SevereToModerate).count(), 2);
        assert_eq!(diagnostics.negative_rates_for(Transition::MildToTmrel).count(), 0);
    }

    #[test]
    fn test_reject_fails_on_first_negative_cell() {
        let mut diagnostics = RateDiagnostics::new();
        let err = diagnostics
            .check_negative(Transition::SevereToModerate, &table(), NegativeRatePolicy::Reject)
            .unwrap_err();
        match err {
            WastingError::NegativeRate { transition, draw, value, .. } => {
                assert_eq!(transition, Transition::SevereToModerate);
                assert_eq!(draw, 1);
                assert_eq!(value, -0.001);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_clean_table() {
        let mut diagnostics = RateDiagnostics::new();
        let index = StratumIndex::new(vec![Stratum::new(Sex::Female, 0.0, 0.5, 2022, 2023)]);
        diagnostics
            .check_negative(Transition::TmrelToMild, &DrawTable::filled(index, 2, 0.0), NegativeRatePolicy::Reject)
            .unwrap();
        assert!(diagnostics.is_clean());
    }
}
