//! Domain Models
//!
//! Core data types for the accumulation engine.
//! Uses `rust_decimal` for all monetary values - never use f64 for money!

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};

/// Lenient numeric parsing for stored and user-entered values.
///
/// Accepts JSON numbers and numeric strings. Anything else parses to `None`
/// so callers can substitute their documented default.
pub mod lenient {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn parse_decimal(raw: &str) -> Option<Decimal> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }
        Decimal::from_str(s)
            .or_else(|_| Decimal::from_scientific(s))
            .ok()
    }

    pub fn from_value(value: &Value) -> Option<Decimal> {
        match value {
            Value::Number(n) => parse_decimal(&n.to_string()),
            Value::String(s) => parse_decimal(s),
            _ => None,
        }
    }

    pub fn option<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(from_value))
    }

    pub fn or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(option(deserializer)?.unwrap_or(Decimal::ZERO))
    }

    /// `0` is not a usable target, so it falls back to one whole unit as well.
    pub fn target<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(option(deserializer)?
            .filter(|t| !t.is_zero())
            .unwrap_or(dec!(1.0)))
    }
}

// ============================================================================
// Market
// ============================================================================

/// Point-in-time view of the market, as delivered by a provider.
///
/// Every indicator is optional: a missing or unparseable value is replaced
/// by the engine default rather than rejected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketState {
    /// Current unit price in USD
    #[serde(default, deserialize_with = "lenient::option")]
    pub price: Option<Decimal>,

    /// Fear & Greed index, 0 (panic) to 100 (greed)
    #[serde(default, deserialize_with = "lenient::option")]
    pub fear_index: Option<Decimal>,

    /// 24-hour high
    #[serde(default, rename = "high24h", deserialize_with = "lenient::option")]
    pub high_24h: Option<Decimal>,

    /// Signed 7-day percent change
    #[serde(default, rename = "change7d", deserialize_with = "lenient::option")]
    pub change_7d: Option<Decimal>,

    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,

    /// Set when the snapshot is the offline fallback, not live data
    #[serde(default)]
    pub is_mock: bool,
}

impl MarketState {
    pub fn new(price: Decimal, fear_index: Decimal, high_24h: Decimal, change_7d: Decimal) -> Self {
        Self {
            price: Some(price),
            fear_index: Some(fear_index),
            high_24h: Some(high_24h),
            change_7d: Some(change_7d),
            last_updated: Some(Utc::now()),
            is_mock: false,
        }
    }

    /// Snapshot installed when live retrieval fails on startup
    pub fn fallback() -> Self {
        Self {
            is_mock: true,
            ..Self::new(dec!(92000), dec!(45), dec!(94000), dec!(-2.5))
        }
    }
}

// ============================================================================
// Profile
// ============================================================================

/// Opaque profile identifier.
///
/// New profiles get a UUID; ids read from older stores may be numeric.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ProfileId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Number(n) => Self(n.to_string()),
        })
    }
}

/// A named budget profile
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: ProfileId,

    /// Display label
    #[serde(default)]
    pub name: String,

    /// Monthly net income
    #[serde(default, deserialize_with = "lenient::or_zero")]
    pub income: Decimal,

    /// Monthly expenses
    #[serde(default, deserialize_with = "lenient::or_zero")]
    pub expenses: Decimal,

    /// Fraction of the monthly surplus to invest (0, 1]
    #[serde(default, deserialize_with = "lenient::or_zero")]
    pub allocation: Decimal,

    /// Units already held
    #[serde(default, deserialize_with = "lenient::or_zero")]
    pub holdings: Decimal,

    /// Goal quantity
    #[serde(default = "default_target", deserialize_with = "lenient::target")]
    pub target: Decimal,

    /// Amount spent in the current budgeting period
    #[serde(default, deserialize_with = "lenient::or_zero")]
    pub spent_so_far: Decimal,
}

fn default_target() -> Decimal {
    dec!(1.0)
}

impl Profile {
    /// Fraction of the goal already reached, `None` when the target is unusable
    pub fn progress(&self) -> Option<Decimal> {
        if self.target <= Decimal::ZERO {
            return None;
        }
        self.holdings.checked_div(self.target)
    }
}

// ============================================================================
// Recommendation
// ============================================================================

/// The five tiered factors behind a recommendation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Multipliers {
    pub fear: Decimal,
    pub trend: Decimal,
    pub dip: Decimal,
    pub goal: Decimal,
    pub cooldown: Decimal,
}

impl Multipliers {
    pub fn total(&self) -> Decimal {
        self.fear * self.trend * self.dip * self.goal * self.cooldown
    }
}

/// Market inputs as the engine saw them, after defaults
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStats {
    pub fear: Decimal,
    /// Percent distance from the reference fair value
    pub deviation: Decimal,
    /// Percent distance from the 24h high (≤ 0 below the high)
    pub drawdown: Decimal,
    #[serde(rename = "change7d")]
    pub change_7d: Decimal,
    pub price: Decimal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSnapshot {
    pub monthly_budget: Decimal,
    pub remaining_budget: Decimal,
    pub days_remaining: u32,
    pub min_daily_reserve: Decimal,
}

/// Engine output for one day
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Suggested spend for today after every clamp
    pub final_buy: Decimal,

    /// Multiplier-adjusted amount before clamping
    pub raw_suggested: Decimal,

    /// Most that can be spent today while keeping the daily reserve
    pub max_today_by_reserve: Decimal,

    pub is_capped_by_reserve: bool,

    pub total_mult: Decimal,

    pub multipliers: Multipliers,

    pub stats: MarketStats,

    pub budget: BudgetSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_reads_numeric_strings_and_numbers() {
        let json = r#"{
            "id": 1714000000000,
            "name": "Main",
            "income": "5000",
            "expenses": 3000,
            "allocation": "0.2",
            "holdings": "abc",
            "target": "",
            "spentSoFar": 12.5
        }"#;

        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.id.as_str(), "1714000000000");
        assert_eq!(profile.income, dec!(5000));
        assert_eq!(profile.expenses, dec!(3000));
        assert_eq!(profile.allocation, dec!(0.2));
        assert_eq!(profile.holdings, Decimal::ZERO);
        assert_eq!(profile.target, dec!(1.0));
        assert_eq!(profile.spent_so_far, dec!(12.5));
    }

    #[test]
    fn test_zero_target_falls_back_to_one() {
        let profile: Profile = serde_json::from_str(r#"{"id": "a", "target": 0}"#).unwrap();
        assert_eq!(profile.target, dec!(1.0));
    }

    #[test]
    fn test_market_state_missing_fields() {
        let state: MarketState = serde_json::from_str(r#"{"price": 91000.5}"#).unwrap();
        assert_eq!(state.price, Some(dec!(91000.5)));
        assert_eq!(state.fear_index, None);
        assert!(!state.is_mock);
    }

    #[test]
    fn test_fallback_is_flagged() {
        let state = MarketState::fallback();
        assert!(state.is_mock);
        assert_eq!(state.price, Some(dec!(92000)));
        assert_eq!(state.change_7d, Some(dec!(-2.5)));
    }

    #[test]
    fn test_progress_guard() {
        let mut profile: Profile = serde_json::from_str(r#"{"id": "a", "holdings": 0.25}"#).unwrap();
        assert_eq!(profile.progress(), Some(dec!(0.25)));

        profile.target = dec!(-1);
        assert_eq!(profile.progress(), None);
    }
}
