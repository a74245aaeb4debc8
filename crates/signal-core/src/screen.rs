//! Screen Flow
//!
//! The app's views form a small state machine. Clients drive it with
//! `ScreenAction`s; the transition table lives here so every front end
//! agrees on it.
//!
//! ```text
//! Landing ──Start──▶ Onboarding(Baseline) ──Next──▶ Onboarding(Mission) ──Finish──▶ Dashboard
//!    │                      ▲                            │                          │  ▲
//!    └──Start (profiles)────┼────────────────────────────┼──────────────────────────┘  │
//!                           └──────ProfilesEmptied───────┴─────── Lab / Profiles ──────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalError};
use crate::profile::NewProfile;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    /// Name, income, expenses, allocation
    Baseline,
    /// Holdings and target
    Mission,
}

/// Navigation tabs available once a profile exists
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    Dashboard,
    Lab,
    Profiles,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "screen", content = "step", rename_all = "snake_case")]
pub enum Screen {
    #[default]
    Landing,
    Onboarding(OnboardingStep),
    Dashboard,
    Lab,
    Profiles,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "tab", rename_all = "snake_case")]
pub enum ScreenAction {
    Start,
    Next,
    Back,
    Finish,
    Open(Tab),
    Home,
    /// The last profile was deleted
    ProfilesEmptied,
    /// Profile edits were saved
    Saved,
}

/// Facts the transitions depend on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScreenContext {
    pub has_profiles: bool,
    /// Baseline step has income and expenses filled in
    pub baseline_complete: bool,
}

impl Tab {
    pub const fn screen(self) -> Screen {
        match self {
            Self::Dashboard => Screen::Dashboard,
            Self::Lab => Screen::Lab,
            Self::Profiles => Screen::Profiles,
        }
    }
}

impl Screen {
    /// Next screen for `action`. Actions that make no sense here leave the
    /// screen unchanged.
    pub fn on(self, action: ScreenAction, ctx: ScreenContext) -> Self {
        use OnboardingStep::{Baseline, Mission};

        match (self, action) {
            (_, ScreenAction::ProfilesEmptied) => Self::Onboarding(Baseline),
            (_, ScreenAction::Home) => Self::Landing,

            (Self::Landing, ScreenAction::Start) if ctx.has_profiles => Self::Dashboard,
            (Self::Landing, ScreenAction::Start) => Self::Onboarding(Baseline),

            (Self::Onboarding(Baseline), ScreenAction::Next) if ctx.baseline_complete => {
                Self::Onboarding(Mission)
            }
            (Self::Onboarding(Mission), ScreenAction::Back) => Self::Onboarding(Baseline),
            (Self::Onboarding(Mission), ScreenAction::Finish) => Self::Dashboard,

            (Self::Profiles, ScreenAction::Saved) => Self::Dashboard,

            (Self::Onboarding(_), ScreenAction::Open(_)) => self,
            (_, ScreenAction::Open(tab)) if ctx.has_profiles => tab.screen(),

            (current, _) => current,
        }
    }
}

/// Form state collected across the two onboarding steps
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnboardingDraft {
    pub name: String,
    pub income: Option<Decimal>,
    pub expenses: Option<Decimal>,
    pub allocation: Decimal,
    pub holdings: Decimal,
    pub target: Decimal,
}

impl Default for OnboardingDraft {
    fn default() -> Self {
        let defaults = NewProfile::default();
        Self {
            name: defaults.name,
            income: None,
            expenses: None,
            allocation: defaults.allocation,
            holdings: defaults.holdings,
            target: defaults.target,
        }
    }
}

impl OnboardingDraft {
    /// Zero is a valid entry; only blank fields block the step
    pub const fn baseline_complete(&self) -> bool {
        self.income.is_some() && self.expenses.is_some()
    }

    pub fn finish(self) -> Result<NewProfile> {
        let (Some(income), Some(expenses)) = (self.income, self.expenses) else {
            return Err(SignalError::InvalidField {
                field: "income",
                reason: "income and expenses are required".into(),
            });
        };

        Ok(NewProfile {
            name: self.name,
            income,
            expenses,
            allocation: self.allocation,
            holdings: self.holdings,
            target: self.target,
        })
    }
}
