//! Strata that end at or below the modeled start age carry birth prevalence
//! only. Nobody transitions there, so every derived rate is zero.

use ndarray::Axis;

use wasting_core::DrawTable;

/// Zero every row of `table` whose stratum ends at or below `start_age`
pub fn reset_underage_transitions(table: &mut DrawTable, start_age: f64) {
    let underage = table.index().age_end_at_or_below(start_age);
    for (mut row, reset) in table.values_mut().axis_iter_mut(Axis(0)).zip(underage) {
        if reset {
            row.fill(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasting_core::{Sex, Stratum, StratumIndex};

    #[test]
    fn test_reset_underage_transitions() {
        let index = StratumIndex::new(vec![
            Stratum::new(Sex::Male, 0.0, 0.01917808, 2022, 2023),
            Stratum::new(Sex::Male, 0.07671233, 0.5, 2022, 2023),
            Stratum::new(Sex::Male, 0.5, 1.0, 2022, 2023),
        ]);
        let mut table = DrawTable::filled(index, 2, f64::NAN);
        reset_underage_transitions(&mut table, 0.5);
        let values = table.values();
        assert!(values.row(0).iter().all(|v| *v == 0.0));
        assert!(values.row(1).iter().all(|v| *v == 0.0));
        assert!(values.row(2).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_reset_overrides_negative_and_infinite_values() {
        let index = StratumIndex::new(vec![Stratum::new(Sex::Female, 0.0, 0.5, 2022, 2023)]);
        let mut table = DrawTable::filled(index, 3, -2.0);
        table.values_mut()[[0, 1]] = f64::INFINITY;
        reset_underage_transitions(&mut table, 0.5);
        assert!(table.values().iter().all(|v| *v == 0.0));
    }
}
