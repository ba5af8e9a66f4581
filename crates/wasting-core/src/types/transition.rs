use std::fmt;

use serde::{Deserialize, Serialize};

use super::category::WastingCategory;

/// The seven directed edges of the wasting disease model
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Mild wasting incidence
    TmrelToMild,
    /// Mild wasting remission
    MildToTmrel,
    /// MAM incidence
    MildToModerate,
    /// MAM remission
    ModerateToMild,
    /// SAM incidence
    ModerateToSevere,
    /// Untreated SAM remission
    SevereToModerate,
    /// Treated SAM remission
    SevereToMild,
}

impl Transition {
    /// Every edge, in output order
    pub const ALL: [Transition; 7] = [
        Transition::TmrelToMild,
        Transition::MildToTmrel,
        Transition::MildToModerate,
        Transition::ModerateToMild,
        Transition::ModerateToSevere,
        Transition::SevereToModerate,
        Transition::SevereToMild,
    ];

    /// Zero-based position in [`Transition::ALL`]
    pub fn position(self) -> usize {
        match self {
            Transition::TmrelToMild => 0,
            Transition::MildToTmrel => 1,
            Transition::MildToModerate => 2,
            Transition::ModerateToMild => 3,
            Transition::ModerateToSevere => 4,
            Transition::SevereToModerate => 5,
            Transition::SevereToMild => 6,
        }
    }

    /// Category the edge leaves
    pub fn source(self) -> WastingCategory {
        match self {
            Transition::TmrelToMild => WastingCategory::Tmrel,
            Transition::MildToTmrel | Transition::MildToModerate => WastingCategory::Mild,
            Transition::ModerateToMild | Transition::ModerateToSevere => WastingCategory::Moderate,
            Transition::SevereToModerate | Transition::SevereToMild => WastingCategory::Severe,
        }
    }

    /// Category the edge enters
    pub fn target(self) -> WastingCategory {
        match self {
            Transition::MildToTmrel => WastingCategory::Tmrel,
            Transition::TmrelToMild | Transition::ModerateToMild | Transition::SevereToMild => {
                WastingCategory::Mild
            }
            Transition::MildToModerate | Transition::SevereToModerate => WastingCategory::Moderate,
            Transition::ModerateToSevere => WastingCategory::Severe,
        }
    }

    /// Key of the edge in the disease model, `{source_state}_to_{target_state}`
    pub fn key(self) -> String {
        format!("{}_to_{}", self.source().state_name(), self.target().state_name())
    }

    /// Edges whose value is a remission (toward a less severe category)
    pub fn is_remission(self) -> bool {
        self.target() > self.source()
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
