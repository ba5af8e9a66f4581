//! Draw-indexed tables over a [`StratumIndex`].
//!
//! Every table stores one row per stratum and one column per uncertainty draw,
//! so formulas written against the value arrays apply to all draws at once.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use super::category::WastingCategory;
use super::stratum::{Stratum, StratumIndex};
use crate::error::{Result, WastingError};

/// Long-format row of a draw-level input table
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DrawRecord {
    #[serde(flatten)]
    pub stratum: Stratum,
    /// One value per draw, in draw order
    pub draws: Vec<f64>,
}

/// Long-format row of a categorical input table
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CategoryRecord {
    #[serde(flatten)]
    pub stratum: Stratum,
    /// Category label, stored under `parameter` as in the input files
    #[serde(rename = "parameter")]
    pub category: WastingCategory,
    /// One value per draw, in draw order
    pub draws: Vec<f64>,
}

/// Strata x draws table of values
#[derive(Clone, Debug)]
pub struct DrawTable {
    index: StratumIndex,
    values: Array2<f64>,
}

impl DrawTable {
    /// Wrap a strata x draws array, which must have one row per stratum
    pub fn new(index: StratumIndex, values: Array2<f64>) -> Result<Self> {
        if values.nrows() != index.len() {
            return Err(WastingError::ShapeMismatch {
                entity: "draw table".to_string(),
                expected: index.len(),
                actual: values.nrows(),
            });
        }
        Ok(Self { index, values })
    }

    /// Table holding the same value in every cell
    pub fn filled(index: StratumIndex, n_draws: usize, value: f64) -> Self {
        let values = Array2::from_elem((index.len(), n_draws), value);
        Self { index, values }
    }

    /// Table whose rows all equal the per-draw vector `draws`
    pub fn broadcast_draws(index: StratumIndex, draws: &Array1<f64>) -> Self {
        let mut values = Array2::zeros((index.len(), draws.len()));
        for mut row in values.rows_mut() {
            row.assign(draws);
        }
        Self { index, values }
    }

    /// Table whose columns all equal the per-stratum values produced by `f`
    pub fn from_strata<F>(index: StratumIndex, n_draws: usize, f: F) -> Self
    where
        F: Fn(&Stratum) -> f64,
    {
        let mut values = Array2::zeros((index.len(), n_draws));
        for (mut row, stratum) in values.rows_mut().into_iter().zip(index.iter()) {
            row.fill(f(stratum));
        }
        Self { index, values }
    }

    /// Reindex long-format records onto `index`.
    ///
    /// Records for strata outside the index are ignored. A stratum of the
    /// index with no record, or with more than one, is an error.
    pub fn from_records<I>(entity: &str, index: &StratumIndex, n_draws: usize, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = DrawRecord>,
    {
        let mut values = Array2::from_elem((index.len(), n_draws), f64::NAN);
        let mut seen = vec![false; index.len()];

        for record in records {
            let Some(row) = index.position(&record.stratum) else {
                continue;
            };
            if seen[row] {
                return Err(WastingError::DuplicateStratum {
                    entity: entity.to_string(),
                    stratum: record.stratum,
                });
            }
            if record.draws.len() != n_draws {
                return Err(WastingError::DrawCountMismatch {
                    entity: entity.to_string(),
                    expected: n_draws,
                    actual: record.draws.len(),
                });
            }
            values.row_mut(row).assign(&ArrayView1::from(&record.draws[..]));
            seen[row] = true;
        }

        if let Some(missing) = seen.iter().position(|s| !s) {
            return Err(WastingError::MissingStratum {
                entity: entity.to_string(),
                stratum: index[missing],
            });
        }

        Ok(Self {
            index: index.clone(),
            values,
        })
    }

    /// Strata labelling the rows
    pub fn index(&self) -> &StratumIndex {
        &self.index
    }

    /// Strata x draws values
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Mutable values; the shape stays tied to the index
    pub fn values_mut(&mut self) -> &mut Array2<f64> {
        &mut self.values
    }

    /// Consume the table, keeping only its values
    pub fn into_values(self) -> Array2<f64> {
        self.values
    }

    /// Number of draw columns
    pub fn n_draws(&self) -> usize {
        self.values.ncols()
    }

    /// Number of stratum rows
    pub fn n_strata(&self) -> usize {
        self.values.nrows()
    }

    /// Draw values for one stratum
    pub fn get(&self, stratum: &Stratum) -> Option<ArrayView1<'_, f64>> {
        self.index
            .position(stratum)
            .map(|row| self.values.index_axis(Axis(0), row))
    }

    /// New table over the same index
    pub fn with_values(&self, values: Array2<f64>) -> Result<Self> {
        if values.dim() != self.values.dim() {
            return Err(WastingError::ShapeMismatch {
                entity: "draw table".to_string(),
                expected: self.values.nrows(),
                actual: values.nrows(),
            });
        }
        Ok(Self {
            index: self.index.clone(),
            values,
        })
    }

    /// Apply `f` to every cell
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        Self {
            index: self.index.clone(),
            values: self.values.mapv(f),
        }
    }

    /// Iterate stratum labels with their draw rows
    pub fn rows(&self) -> impl Iterator<Item = (&Stratum, ArrayView1<'_, f64>)> {
        self.index.iter().zip(self.values.rows())
    }

    /// Check that this table shares `index` and has `n_draws` columns
    pub fn ensure_compatible(
        &self,
        entity: &str,
        reference: &str,
        index: &StratumIndex,
        n_draws: usize,
    ) -> Result<()> {
        if self.index != *index {
            return Err(WastingError::IndexMismatch {
                entity: entity.to_string(),
                reference: reference.to_string(),
            });
        }
        if self.n_draws() != n_draws {
            return Err(WastingError::DrawCountMismatch {
                entity: entity.to_string(),
                expected: n_draws,
                actual: self.n_draws(),
            });
        }
        Ok(())
    }

    /// Fail on the first missing (NaN) cell
    pub fn ensure_complete(&self, entity: &str) -> Result<()> {
        ensure_no_missing(entity, &self.index, &self.values)
    }
}

fn ensure_no_missing(entity: &str, index: &StratumIndex, values: &Array2<f64>) -> Result<()> {
    for ((row, draw), value) in values.indexed_iter() {
        if value.is_nan() {
            return Err(WastingError::MissingValue {
                entity: entity.to_string(),
                stratum: index[row],
                draw,
            });
        }
    }
    Ok(())
}

/// One strata x draws array per wasting category over a shared index
#[derive(Clone, Debug)]
pub struct CategoryTable {
    index: StratumIndex,
    values: [Array2<f64>; 4],
}

impl CategoryTable {
    /// Build from arrays ordered as [`WastingCategory::ALL`]
    pub fn new(index: StratumIndex, values: [Array2<f64>; 4]) -> Result<Self> {
        let n_draws = values[0].ncols();
        for (category, array) in WastingCategory::ALL.iter().zip(values.iter()) {
            if array.nrows() != index.len() {
                return Err(WastingError::ShapeMismatch {
                    entity: category.to_string(),
                    expected: index.len(),
                    actual: array.nrows(),
                });
            }
            if array.ncols() != n_draws {
                return Err(WastingError::DrawCountMismatch {
                    entity: category.to_string(),
                    expected: n_draws,
                    actual: array.ncols(),
                });
            }
        }
        Ok(Self { index, values })
    }

    /// Build from one table per category, all over the same index
    pub fn from_tables(tables: [DrawTable; 4]) -> Result<Self> {
        let index = tables[0].index().clone();
        let n_draws = tables[0].n_draws();
        for (category, table) in WastingCategory::ALL.iter().zip(tables.iter()) {
            table.ensure_compatible(category.label(), WastingCategory::Severe.label(), &index, n_draws)?;
        }
        let values = tables.map(DrawTable::into_values);
        Ok(Self { index, values })
    }

    /// Pivot long-format categorical records onto `index`
    pub fn from_records<I>(entity: &str, index: &StratumIndex, n_draws: usize, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = CategoryRecord>,
    {
        let mut by_category: [Vec<DrawRecord>; 4] = Default::default();
        for record in records {
            by_category[record.category.position()].push(DrawRecord {
                stratum: record.stratum,
                draws: record.draws,
            });
        }

        let mut values: [Array2<f64>; 4] = Default::default();
        for (category, records) in WastingCategory::ALL.iter().zip(by_category) {
            let name = format!("{}.{}", entity, category.label());
            values[category.position()] =
                DrawTable::from_records(&name, index, n_draws, records)?.into_values();
        }
        Self::new(index.clone(), values)
    }

    /// Strata shared by every category
    pub fn index(&self) -> &StratumIndex {
        &self.index
    }

    /// Number of draw columns
    pub fn n_draws(&self) -> usize {
        self.values[0].ncols()
    }

    /// Strata x draws array of one category
    pub fn get(&self, category: WastingCategory) -> &Array2<f64> {
        &self.values[category.position()]
    }

    /// Copy one category out as its own table
    pub fn table(&self, category: WastingCategory) -> DrawTable {
        DrawTable {
            index: self.index.clone(),
            values: self.values[category.position()].clone(),
        }
    }

    /// Apply `f` to every category array
    pub fn map_arrays<F>(&self, f: F) -> Self
    where
        F: Fn(WastingCategory, &Array2<f64>) -> Array2<f64>,
    {
        let values = WastingCategory::ALL.map(|category| f(category, self.get(category)));
        Self {
            index: self.index.clone(),
            values,
        }
    }

    /// Sum across categories
    pub fn total(&self) -> Array2<f64> {
        self.values
            .iter()
            .skip(1)
            .fold(self.values[0].clone(), |acc, array| acc + array)
    }

    /// Fail on the first missing (NaN) cell of any category
    pub fn ensure_complete(&self, entity: &str) -> Result<()> {
        for category in WastingCategory::ALL {
            let name = format!("{}.{}", entity, category.label());
            ensure_no_missing(&name, &self.index, self.get(category))?;
        }
        Ok(())
    }

    /// Check that every category shares `index` and has `n_draws` columns
    pub fn ensure_compatible(
        &self,
        entity: &str,
        reference: &str,
        index: &StratumIndex,
        n_draws: usize,
    ) -> Result<()> {
        if self.index != *index {
            return Err(WastingError::IndexMismatch {
                entity: entity.to_string(),
                reference: reference.to_string(),
            });
        }
        if self.n_draws() != n_draws {
            return Err(WastingError::DrawCountMismatch {
                entity: entity.to_string(),
                expected: n_draws,
                actual: self.n_draws(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sex;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn index() -> StratumIndex {
        StratumIndex::new(vec![
            Stratum::new(Sex::Male, 0.0, 0.5, 2022, 2023),
            Stratum::new(Sex::Male, 0.5, 1.0, 2022, 2023),
        ])
    }

    fn record(stratum: Stratum, draws: Vec<f64>) -> DrawRecord {
        DrawRecord { stratum, draws }
    }

    #[test]
    fn test_from_records_reindexes() {
        let index = index();
        let records = vec![record(index[1], vec![3.0, 4.0]), record(index[0], vec![1.0, 2.0])];
        let table = DrawTable::from_records("acmr", &index, 2, records).unwrap();
        assert_eq!(table.values(), &array![[1.0, 2.0], [3.0, 4.0]]);
    }

    #[test]
    fn test_from_records_missing_stratum() {
        let index = index();
        let records = vec![record(index[0], vec![1.0, 2.0])];
        let err = DrawTable::from_records("acmr", &index, 2, records).unwrap_err();
        assert!(matches!(err, WastingError::MissingStratum { .. }));
    }

    #[test]
    fn test_from_records_duplicate_stratum() {
        let index = index();
        let records = vec![
            record(index[0], vec![1.0, 2.0]),
            record(index[1], vec![3.0, 4.0]),
            record(index[0], vec![5.0, 6.0]),
        ];
        match DrawTable::from_records("acmr", &index, 2, records).unwrap_err() {
            WastingError::DuplicateStratum { entity, stratum } => {
                assert_eq!(entity, "acmr");
                assert_eq!(stratum, index[0]);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_category_table_rejects_duplicate_category_rows() {
        let index = index();
        let mut records = Vec::new();
        for category in WastingCategory::ALL {
            for stratum in index.iter() {
                records.push(CategoryRecord {
                    stratum: *stratum,
                    category,
                    draws: vec![0.25],
                });
            }
        }
        records.push(CategoryRecord {
            stratum: index[1],
            category: WastingCategory::Moderate,
            draws: vec![0.5],
        });
        assert!(matches!(
            CategoryTable::from_records("exposure", &index, 1, records).unwrap_err(),
            WastingError::DuplicateStratum { .. }
        ));
    }

    #[test]
    fn test_from_records_wrong_draw_count() {
        let index = index();
        let records = vec![record(index[0], vec![1.0])];
        let err = DrawTable::from_records("acmr", &index, 2, records).unwrap_err();
        assert!(matches!(
            err,
            WastingError::DrawCountMismatch { expected: 2, actual: 1, .. }
        ));
    }

    #[test]
    fn test_broadcast_draws() {
        let table = DrawTable::broadcast_draws(index(), &array![0.1, 0.2, 0.3]);
        assert_eq!(table.n_strata(), 2);
        assert_eq!(table.n_draws(), 3);
        assert_abs_diff_eq!(table.values()[[1, 2]], 0.3);
    }

    #[test]
    fn test_from_strata() {
        let table = DrawTable::from_strata(index(), 2, |s| s.age_end);
        assert_eq!(table.values(), &array![[0.5, 0.5], [1.0, 1.0]]);
    }

    #[test]
    fn test_ensure_complete_reports_location() {
        let mut table = DrawTable::filled(index(), 2, 1.0);
        table.values_mut()[[1, 0]] = f64::NAN;
        match table.ensure_complete("emr").unwrap_err() {
            WastingError::MissingValue { stratum, draw, .. } => {
                assert_eq!(stratum, index()[1]);
                assert_eq!(draw, 0);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_category_table_from_records() {
        let index = index();
        let mut records = Vec::new();
        for (category, value) in WastingCategory::ALL.iter().zip([0.1, 0.2, 0.3, 0.4]) {
            for stratum in index.iter() {
                records.push(CategoryRecord {
                    stratum: *stratum,
                    category: *category,
                    draws: vec![value],
                });
            }
        }
        let table = CategoryTable::from_records("exposure", &index, 1, records).unwrap();
        assert_abs_diff_eq!(table.get(WastingCategory::Mild)[[0, 0]], 0.3);
        assert_abs_diff_eq!(table.total()[[1, 0]], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_category_table_rejects_mismatched_index() {
        let other = StratumIndex::new(vec![Stratum::new(Sex::Female, 0.0, 0.5, 2022, 2023)]);
        let tables = [
            DrawTable::filled(index(), 1, 0.25),
            DrawTable::filled(index(), 1, 0.25),
            DrawTable::filled(other, 1, 0.25),
            DrawTable::filled(index(), 1, 0.25),
        ];
        assert!(matches!(
            CategoryTable::from_tables(tables).unwrap_err(),
            WastingError::IndexMismatch { .. }
        ));
    }
}
