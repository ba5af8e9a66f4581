use std::fmt;

use serde::{Deserialize, Serialize};

/// Wasting severity, ordered most severe to least severe
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WastingCategory {
    /// Severe acute malnutrition (cat1)
    #[serde(rename = "cat1")]
    Severe,
    /// Moderate acute malnutrition (cat2)
    #[serde(rename = "cat2")]
    Moderate,
    /// Mild wasting (cat3)
    #[serde(rename = "cat3")]
    Mild,
    /// Theoretical minimum risk exposure level (cat4)
    #[serde(rename = "cat4")]
    Tmrel,
}

impl WastingCategory {
    /// Every category, most severe first
    pub const ALL: [WastingCategory; 4] = [
        WastingCategory::Severe,
        WastingCategory::Moderate,
        WastingCategory::Mild,
        WastingCategory::Tmrel,
    ];

    /// Zero-based position in [`WastingCategory::ALL`]
    pub fn position(self) -> usize {
        match self {
            WastingCategory::Severe => 0,
            WastingCategory::Moderate => 1,
            WastingCategory::Mild => 2,
            WastingCategory::Tmrel => 3,
        }
    }

    /// GBD exposure label
    pub fn label(self) -> &'static str {
        match self {
            WastingCategory::Severe => "cat1",
            WastingCategory::Moderate => "cat2",
            WastingCategory::Mild => "cat3",
            WastingCategory::Tmrel => "cat4",
        }
    }

    /// Name of the disease-model state holding this category
    pub fn state_name(self) -> &'static str {
        match self {
            WastingCategory::Severe => "severe_acute_malnutrition",
            WastingCategory::Moderate => "moderate_acute_malnutrition",
            WastingCategory::Mild => "mild_child_wasting",
            WastingCategory::Tmrel => "susceptible_to_child_wasting",
        }
    }

    /// Inverse of [`Self::label`]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }

    /// Whether the category carries severe-malnutrition (PEM) prevalence
    pub fn is_acutely_malnourished(self) -> bool {
        matches!(self, WastingCategory::Severe | WastingCategory::Moderate)
    }
}

impl fmt::Display for WastingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Causes whose incidence is modified by wasting and which contribute
/// excess mortality to each wasting category
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComorbidCause {
    DiarrhealDiseases,
    Measles,
    LowerRespiratoryInfections,
}

impl ComorbidCause {
    /// Every comorbid cause
    pub const ALL: [ComorbidCause; 3] = [
        ComorbidCause::DiarrhealDiseases,
        ComorbidCause::Measles,
        ComorbidCause::LowerRespiratoryInfections,
    ];

    /// Cause name as used in input keys
    pub fn name(self) -> &'static str {
        match self {
            ComorbidCause::DiarrhealDiseases => "diarrheal_diseases",
            ComorbidCause::Measles => "measles",
            ComorbidCause::LowerRespiratoryInfections => "lower_respiratory_infections",
        }
    }
}

impl fmt::Display for ComorbidCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Treated wasting categories
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatedCategory {
    Severe,
    Moderate,
}

impl TreatedCategory {
    /// Wasting category the treatment applies to
    pub fn category(self) -> WastingCategory {
        match self {
            TreatedCategory::Severe => WastingCategory::Severe,
            TreatedCategory::Moderate => WastingCategory::Moderate,
        }
    }

    /// Name of the treatment intervention
    pub fn treatment_name(self) -> &'static str {
        match self {
            TreatedCategory::Severe => "severe_acute_malnutrition_treatment",
            TreatedCategory::Moderate => "moderate_acute_malnutrition_treatment",
        }
    }
}

impl TryFrom<WastingCategory> for TreatedCategory {
    type Error = WastingCategory;

    fn try_from(category: WastingCategory) -> Result<Self, Self::Error> {
        match category {
            WastingCategory::Severe => Ok(TreatedCategory::Severe),
            WastingCategory::Moderate => Ok(TreatedCategory::Moderate),
            other => Err(other),
        }
    }
}
