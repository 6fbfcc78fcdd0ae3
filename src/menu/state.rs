//! Menu states: the closed set of places a USSD dialog can be in.

use serde::{Deserialize, Serialize};

/// Which branch of the menu tree a caller is routed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// Phone not yet known to the user service: registration wizard.
    Unregistered,
    /// Phone registered: main menu navigation.
    Registered,
}

impl Regime {
    pub fn from_registered(registered: bool) -> Self {
        if registered {
            Self::Registered
        } else {
            Self::Unregistered
        }
    }

    /// The state a fresh dialog opens in.
    pub fn entry_state(&self) -> MenuState {
        match self {
            Self::Unregistered => MenuState::Welcome,
            Self::Registered => MenuState::Main,
        }
    }
}

/// Every state of the menu engine.
///
/// Wizard states progress Welcome → NameEntry → GenderEntry → AgeEntry →
/// DistrictEntry → BusinessStageEntry. Registered states branch from Main.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuState {
    Welcome,
    NameEntry,
    GenderEntry,
    AgeEntry,
    DistrictEntry,
    BusinessStageEntry,
    Main,
    Opportunities,
    Profile,
}

impl MenuState {
    /// The regime this state belongs to.
    pub fn regime(&self) -> Regime {
        use MenuState::*;
        match self {
            Welcome | NameEntry | GenderEntry | AgeEntry | DistrictEntry | BusinessStageEntry => {
                Regime::Unregistered
            }
            Main | Opportunities | Profile => Regime::Registered,
        }
    }
}

impl std::fmt::Display for MenuState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Welcome => "welcome",
            Self::NameEntry => "name_entry",
            Self::GenderEntry => "gender_entry",
            Self::AgeEntry => "age_entry",
            Self::DistrictEntry => "district_entry",
            Self::BusinessStageEntry => "business_stage_entry",
            Self::Main => "main",
            Self::Opportunities => "opportunities",
            Self::Profile => "profile",
        };
        write!(f, "{s}")
    }
}
