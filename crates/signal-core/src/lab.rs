//! Simulation Lab
//!
//! What-if runs of the engine against hand-picked market conditions, projected
//! over a full 30-day period.
//!
//! The synthetic price follows the trend slider: `85000 * (1 + trend / 100)`.
//! Both the market snapshot and the sats conversion use that price rather
//! than a fixed quote, so moving the slider moves the trend multiplier.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::engine::{self, FAIR_VALUE};
use crate::model::{MarketState, Profile, Recommendation};

/// Days the lab simulates per month
pub const LAB_PERIOD_DAYS: u32 = 30;

const SATS_PER_UNIT: Decimal = dec!(100_000_000);
const HORIZON_YEARS: Decimal = dec!(50);

/// Slider positions, in percent except the fear index
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabConditions {
    pub fear_index: Decimal,
    pub price_vs_trend: Decimal,
    pub drawdown: Decimal,
    pub recent_pump: Decimal,
}

impl Default for LabConditions {
    fn default() -> Self {
        Self {
            fear_index: dec!(25),
            price_vs_trend: dec!(-10),
            drawdown: dec!(-15),
            recent_pump: dec!(5),
        }
    }
}

impl LabConditions {
    /// Pin every slider to its range
    pub fn clamped(self) -> Self {
        Self {
            fear_index: self.fear_index.clamp(dec!(0), dec!(100)),
            price_vs_trend: self.price_vs_trend.clamp(dec!(-50), dec!(50)),
            drawdown: self.drawdown.clamp(dec!(-50), dec!(0)),
            recent_pump: self.recent_pump.clamp(dec!(-20), dec!(50)),
        }
    }

    /// Synthetic snapshot matching these conditions
    pub fn market(&self) -> MarketState {
        let price = FAIR_VALUE * (Decimal::ONE + self.price_vs_trend / dec!(100));
        let high_24h = price * (Decimal::ONE + self.drawdown.abs() / dec!(100));

        MarketState {
            is_mock: true,
            ..MarketState::new(price, self.fear_index, high_24h, self.recent_pump)
        }
    }
}

/// How long until holdings reach the target at the simulated pace
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "years", rename_all = "snake_case")]
pub enum GoalProjection {
    Reached,
    Years(Decimal),
    BeyondFiftyYears,
    /// Nothing is being accumulated
    Unreachable,
}

impl GoalProjection {
    /// Values too large to represent count as beyond the horizon
    fn project(profile: &Profile, units_per_month: Decimal) -> Self {
        let Some(missing) = profile.target.checked_sub(profile.holdings) else {
            return Self::BeyondFiftyYears;
        };
        if missing <= Decimal::ZERO {
            return Self::Reached;
        }
        if units_per_month <= Decimal::ZERO {
            return Self::Unreachable;
        }

        match missing
            .checked_div(units_per_month)
            .and_then(|months| months.checked_div(dec!(12)))
        {
            Some(years) if years <= HORIZON_YEARS => Self::Years(years.round_dp(1)),
            _ => Self::BeyondFiftyYears,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabReport {
    pub conditions: LabConditions,
    pub market: MarketState,
    pub recommendation: Recommendation,
    pub monthly_accumulation: Decimal,
    pub units_per_month: Decimal,
    pub sats_per_month: Decimal,
    pub goal: GoalProjection,
}

/// Run the engine under `conditions` for `profile`
pub fn simulate(conditions: LabConditions, profile: &Profile) -> LabReport {
    let conditions = conditions.clamped();
    let market = conditions.market();
    let recommendation = engine::compute(&market, profile, LAB_PERIOD_DAYS);

    let monthly_accumulation = recommendation
        .final_buy
        .saturating_mul(Decimal::from(LAB_PERIOD_DAYS));
    let units_per_month = market
        .price
        .filter(|p| *p > Decimal::ZERO)
        .and_then(|p| monthly_accumulation.checked_div(p))
        .unwrap_or(Decimal::ZERO);
    let sats_per_month = units_per_month.saturating_mul(SATS_PER_UNIT).floor();

    LabReport {
        goal: GoalProjection::project(profile, units_per_month),
        conditions,
        market,
        recommendation,
        monthly_accumulation,
        units_per_month,
        sats_per_month,
    }
}
