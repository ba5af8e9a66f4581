use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Sex dimension of the demographic index
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sex {
    Female,
    Male,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Female => write!(f, "Female"),
            Sex::Male => write!(f, "Male"),
        }
    }
}

/// One (sex, age, year) cell of the demographic index.
///
/// Ages are in years, bin edges are half-open `[age_start, age_end)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stratum {
    pub sex: Sex,
    /// Inclusive lower age bound
    pub age_start: f64,
    /// Exclusive upper age bound
    pub age_end: f64,
    pub year_start: i32,
    pub year_end: i32,
}

impl Stratum {
    pub fn new(sex: Sex, age_start: f64, age_end: f64, year_start: i32, year_end: i32) -> Self {
        Self {
            sex,
            age_start,
            age_end,
            year_start,
            year_end,
        }
    }

    /// Hashable identity of the stratum (ages compared bitwise)
    pub fn key(&self) -> StratumKey {
        StratumKey {
            sex: self.sex,
            age_start: self.age_start.to_bits(),
            age_end: self.age_end.to_bits(),
            year_start: self.year_start,
            year_end: self.year_end,
        }
    }
}

impl fmt::Display for Stratum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} age [{}, {}) year [{}, {})",
            self.sex, self.age_start, self.age_end, self.year_start, self.year_end
        )
    }
}

/// Hashable form of a [`Stratum`], ages compared by bit pattern
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StratumKey {
    sex: Sex,
    age_start: u64,
    age_end: u64,
    year_start: i32,
    year_end: i32,
}

/// Ordered, immutable list of strata shared by every table built over it.
///
/// Cloning is cheap; two indexes compare equal when they list the same strata
/// in the same order.
#[derive(Clone, Debug)]
pub struct StratumIndex {
    strata: Arc<[Stratum]>,
    positions: Arc<HashMap<StratumKey, usize>>,
}

impl StratumIndex {
    /// Build an index, keeping the first occurrence of any duplicated stratum
    pub fn new(strata: Vec<Stratum>) -> Self {
        let mut positions = HashMap::with_capacity(strata.len());
        let mut unique = Vec::with_capacity(strata.len());
        for stratum in strata {
            if let std::collections::hash_map::Entry::Vacant(entry) = positions.entry(stratum.key())
            {
                entry.insert(unique.len());
                unique.push(stratum);
            }
        }

        Self {
            strata: unique.into(),
            positions: Arc::new(positions),
        }
    }

    /// Row position of a stratum, if present
    pub fn position(&self, stratum: &Stratum) -> Option<usize> {
        self.positions.get(&stratum.key()).copied()
    }

    /// Whether the stratum has a row in this index
    pub fn contains(&self, stratum: &Stratum) -> bool {
        self.positions.contains_key(&stratum.key())
    }

    /// Per-row mask of strata whose `age_end` is at or below `age`
    pub fn age_end_at_or_below(&self, age: f64) -> Vec<bool> {
        self.strata.iter().map(|s| s.age_end <= age).collect()
    }
}

impl Deref for StratumIndex {
    type Target = [Stratum];

    fn deref(&self) -> &Self::Target {
        &self.strata
    }
}

impl PartialEq for StratumIndex {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.strata, &other.strata) || *self.strata == *other.strata
    }
}

impl FromIterator<Stratum> for StratumIndex {
    fn from_iter<I: IntoIterator<Item = Stratum>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
