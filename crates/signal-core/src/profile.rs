//! Profiles
//!
//! `ProfileBook` is the explicit state object for the profile collection and
//! the active selection. It changes only through `ProfileCommand`s.
//! `ProfileService` pairs a book with a store so that every applied command
//! is persisted before anyone can observe it.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{Result, SignalError};
use crate::model::{Profile, ProfileId, lenient};
use crate::store::ProfileStore;

// ============================================================================
// New profiles
// ============================================================================

/// Input for creating a profile
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewProfile {
    pub name: String,
    pub income: Decimal,
    pub expenses: Decimal,
    pub allocation: Decimal,
    pub holdings: Decimal,
    pub target: Decimal,
}

impl Default for NewProfile {
    /// Onboarding defaults
    fn default() -> Self {
        Self {
            name: "My Portfolio".into(),
            income: Decimal::ZERO,
            expenses: Decimal::ZERO,
            allocation: dec!(0.2),
            holdings: Decimal::ZERO,
            target: dec!(1.0),
        }
    }
}

impl NewProfile {
    /// Profile added from the profile manager with a starter budget
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            income: dec!(5000),
            expenses: dec!(3000),
            ..Self::default()
        }
    }

    fn into_profile(self) -> Result<Profile> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(invalid(ProfileField::Name, "must not be empty"));
        }

        let profile = Profile {
            id: ProfileId::generate(),
            name: name.to_string(),
            income: self.income,
            expenses: self.expenses,
            allocation: self.allocation,
            holdings: self.holdings,
            target: self.target,
            spent_so_far: Decimal::ZERO,
        };

        for field in ProfileField::NUMERIC {
            field.check(field.read(&profile))?;
        }
        Ok(profile)
    }
}

// ============================================================================
// Field edits
// ============================================================================

/// Editable profile field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProfileField {
    Name,
    Income,
    Expenses,
    Allocation,
    Holdings,
    Target,
    SpentSoFar,
}

impl ProfileField {
    const NUMERIC: [Self; 6] = [
        Self::Income,
        Self::Expenses,
        Self::Allocation,
        Self::Holdings,
        Self::Target,
        Self::SpentSoFar,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Income => "income",
            Self::Expenses => "expenses",
            Self::Allocation => "allocation",
            Self::Holdings => "holdings",
            Self::Target => "target",
            Self::SpentSoFar => "spentSoFar",
        }
    }

    fn read(self, profile: &Profile) -> Decimal {
        match self {
            Self::Name => Decimal::ZERO,
            Self::Income => profile.income,
            Self::Expenses => profile.expenses,
            Self::Allocation => profile.allocation,
            Self::Holdings => profile.holdings,
            Self::Target => profile.target,
            Self::SpentSoFar => profile.spent_so_far,
        }
    }

    /// Range rule for numeric fields
    fn check(self, value: Decimal) -> Result<()> {
        match self {
            Self::Allocation if value <= Decimal::ZERO || value > Decimal::ONE => {
                Err(invalid(self, "must be above 0 and at most 1"))
            }
            Self::Target if value <= Decimal::ZERO => Err(invalid(self, "must be above 0")),
            _ if value < Decimal::ZERO => Err(invalid(self, "must not be negative")),
            _ => Ok(()),
        }
    }

    fn apply(self, profile: &mut Profile, raw: &str) -> Result<()> {
        let slot = match self {
            Self::Name => {
                let name = raw.trim();
                if name.is_empty() {
                    return Err(invalid(self, "must not be empty"));
                }
                profile.name = name.to_string();
                return Ok(());
            }
            Self::Income => &mut profile.income,
            Self::Expenses => &mut profile.expenses,
            Self::Allocation => &mut profile.allocation,
            Self::Holdings => &mut profile.holdings,
            Self::Target => &mut profile.target,
            Self::SpentSoFar => &mut profile.spent_so_far,
        };

        let value = lenient::parse_decimal(raw)
            .ok_or_else(|| invalid(self, &format!("'{raw}' is not a number")))?;
        self.check(value)?;
        *slot = value;
        Ok(())
    }
}

fn invalid(field: ProfileField, reason: &str) -> SignalError {
    SignalError::InvalidField {
        field: field.as_str(),
        reason: reason.into(),
    }
}

// ============================================================================
// Commands
// ============================================================================

/// A mutation of the profile book
#[derive(Clone, Debug, PartialEq)]
pub enum ProfileCommand {
    /// Add a profile. It becomes active when `activate` is set or when the
    /// book had no active profile.
    Create { profile: NewProfile, activate: bool },

    /// Set one field of the active profile from user text
    Edit { field: ProfileField, value: String },

    /// Make another profile active
    Select(ProfileId),

    /// Record a purchase on the active profile
    ExecuteBuy { amount: Decimal, price: Decimal },

    /// Remove a profile
    Delete(ProfileId),

    /// Start a new budgeting period for the active profile
    ResetPeriod,
}

/// Whether a command changed anything
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOutcome {
    Applied,
    Ignored,
}

/// Profile collection plus the active selection
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileBook {
    profiles: Vec<Profile>,
    active: Option<ProfileId>,
}

impl ProfileBook {
    /// Book over stored profiles; the first one becomes active
    pub fn from_profiles(profiles: Vec<Profile>) -> Self {
        let active = profiles.first().map(|p| p.id.clone());
        Self { profiles, active }
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn get(&self, id: &ProfileId) -> Option<&Profile> {
        self.profiles.iter().find(|p| &p.id == id)
    }

    pub const fn active_id(&self) -> Option<&ProfileId> {
        self.active.as_ref()
    }

    pub fn active(&self) -> Option<&Profile> {
        self.active.as_ref().and_then(|id| self.get(id))
    }

    fn active_mut(&mut self) -> Option<&mut Profile> {
        let id = self.active.clone()?;
        self.profiles.iter_mut().find(|p| p.id == id)
    }

    fn ensure_exists(&self, id: &ProfileId) -> Result<()> {
        self.get(id)
            .map(|_| ())
            .ok_or_else(|| SignalError::ProfileNotFound(id.to_string()))
    }

    /// Apply a command in place
    pub fn apply(&mut self, command: ProfileCommand) -> Result<CommandOutcome> {
        match command {
            ProfileCommand::Create { profile, activate } => {
                let profile = profile.into_profile()?;
                tracing::info!("Created profile '{}' ({})", profile.name, profile.id);
                if activate || self.active.is_none() {
                    self.active = Some(profile.id.clone());
                }
                self.profiles.push(profile);
            }

            ProfileCommand::Edit { field, value } => {
                let profile = self.active_mut().ok_or(SignalError::NoActiveProfile)?;
                field.apply(profile, &value)?;
            }

            ProfileCommand::Select(id) => {
                self.ensure_exists(&id)?;
                self.active = Some(id);
            }

            ProfileCommand::ExecuteBuy { amount, price } => {
                if amount <= Decimal::ZERO {
                    return Ok(CommandOutcome::Ignored);
                }
                let Some(profile) = self.active_mut() else {
                    return Ok(CommandOutcome::Ignored);
                };
                if price <= Decimal::ZERO {
                    return Err(SignalError::InvalidPrice(price));
                }

                let bought = amount
                    .checked_div(price)
                    .ok_or(SignalError::InvalidPrice(price))?;
                profile.spent_so_far = profile.spent_so_far.saturating_add(amount);
                profile.holdings = profile.holdings.saturating_add(bought);
                tracing::info!(
                    "Bought {} units for {} at {} on '{}'",
                    bought,
                    amount,
                    price,
                    profile.name
                );
            }

            ProfileCommand::Delete(id) => {
                self.ensure_exists(&id)?;
                self.profiles.retain(|p| p.id != id);
                if self.active.as_ref() == Some(&id) {
                    self.active = self.profiles.first().map(|p| p.id.clone());
                }
                tracing::info!("Deleted profile {}", id);
            }

            ProfileCommand::ResetPeriod => {
                let profile = self.active_mut().ok_or(SignalError::NoActiveProfile)?;
                profile.spent_so_far = Decimal::ZERO;
            }
        }

        Ok(CommandOutcome::Applied)
    }
}

// ============================================================================
// Service
// ============================================================================

/// Result of a command run through the service
#[derive(Clone, Debug, Serialize)]
pub struct CommandReceipt {
    pub outcome: CommandOutcome,
    pub book: ProfileBook,
}

/// Profile book backed by durable storage.
///
/// The lock is held across the save: a command is visible to readers only
/// after it has been written, and a failed write leaves the book untouched.
pub struct ProfileService {
    book: Mutex<ProfileBook>,
    store: Arc<dyn ProfileStore>,
}

impl ProfileService {
    /// Load the stored profiles
    pub async fn open(store: Arc<dyn ProfileStore>) -> Result<Self> {
        let profiles = store.load().await?;
        tracing::info!("Loaded {} profile(s)", profiles.len());

        Ok(Self {
            book: Mutex::new(ProfileBook::from_profiles(profiles)),
            store,
        })
    }

    pub async fn book(&self) -> ProfileBook {
        self.book.lock().await.clone()
    }

    pub async fn active(&self) -> Option<Profile> {
        self.book.lock().await.active().cloned()
    }

    pub async fn apply(&self, command: ProfileCommand) -> Result<CommandReceipt> {
        let mut book = self.book.lock().await;

        let mut next = book.clone();
        let outcome = next.apply(command)?;

        if outcome == CommandOutcome::Applied {
            self.store.save(next.profiles()).await?;
            *book = next;
        }

        Ok(CommandReceipt {
            outcome,
            book: book.clone(),
        })
    }
}
