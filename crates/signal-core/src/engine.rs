//! Recommendation Engine
//!
//! Turns a market snapshot and a budget profile into a bounded daily buy.
//!
//! ```text
//! market ──▶ deviation, drawdown ──▶ fear · trend · dip · goal · cooldown
//!                                                   │
//! profile ──▶ surplus ──▶ monthly budget ──▶ remaining / days ──▶ × total
//!                                                   │
//!                          min(raw, reserve ceiling, remaining), floored at 0
//! ```
//!
//! The engine is a pure function: no I/O, no clock, no hidden state.
//! Arithmetic saturates instead of overflowing so that hostile profile values
//! still produce a result.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::model::{BudgetSnapshot, MarketState, MarketStats, Multipliers, Profile, Recommendation};

/// Reference fair value the trend signal is measured against
pub const FAIR_VALUE: Decimal = dec!(85000);

/// Amount that must stay available for every future day of the period
pub const MIN_DAILY_RESERVE: Decimal = dec!(10);

pub const DEFAULT_FEAR_INDEX: Decimal = dec!(50);
pub const DEFAULT_PRICE: Decimal = dec!(90000);
pub const DEFAULT_HIGH_24H: Decimal = dec!(95000);

const HUNDRED: Decimal = dec!(100);

/// Compute today's recommendation.
pub fn compute(market: &MarketState, profile: &Profile, days_remaining: u32) -> Recommendation {
    let stats = market_stats(market);

    let multipliers = Multipliers {
        fear: fear_multiplier(stats.fear),
        trend: trend_multiplier(stats.deviation),
        dip: dip_multiplier(stats.drawdown),
        goal: goal_multiplier(profile.progress()),
        cooldown: cooldown_multiplier(stats.change_7d),
    };
    let total_mult = multipliers.total();

    // Budget
    let monthly_surplus = profile.income.saturating_sub(profile.expenses).max(Decimal::ZERO);
    let monthly_budget = monthly_surplus.saturating_mul(profile.allocation);
    let remaining_budget = monthly_budget
        .saturating_sub(profile.spent_so_far)
        .max(Decimal::ZERO);

    // Reserve policy
    let base_today = if days_remaining > 0 {
        remaining_budget / Decimal::from(days_remaining)
    } else {
        Decimal::ZERO
    };
    let raw_suggested = base_today.saturating_mul(total_mult);

    let future_days = Decimal::from(days_remaining.saturating_sub(1));
    let max_today_by_reserve =
        remaining_budget.saturating_sub(MIN_DAILY_RESERVE.saturating_mul(future_days));

    let final_buy = raw_suggested
        .min(max_today_by_reserve)
        .min(remaining_budget)
        .max(Decimal::ZERO);

    Recommendation {
        final_buy,
        raw_suggested,
        max_today_by_reserve,
        is_capped_by_reserve: raw_suggested > max_today_by_reserve,
        total_mult,
        multipliers,
        stats,
        budget: BudgetSnapshot {
            monthly_budget,
            remaining_budget,
            days_remaining,
            min_daily_reserve: MIN_DAILY_RESERVE,
        },
    }
}

/// Resolve defaults and derive the two relative price signals
pub fn market_stats(market: &MarketState) -> MarketStats {
    let fear = market.fear_index.unwrap_or(DEFAULT_FEAR_INDEX);
    let price = market.price.unwrap_or(DEFAULT_PRICE);
    let high = market.high_24h.unwrap_or(DEFAULT_HIGH_24H);
    let change_7d = market.change_7d.unwrap_or(Decimal::ZERO);

    let drawdown = if high > Decimal::ZERO {
        percent_from(price, high)
    } else {
        Decimal::ZERO
    };

    MarketStats {
        fear,
        deviation: percent_from(price, FAIR_VALUE),
        drawdown,
        change_7d,
        price,
    }
}

fn percent_from(value: Decimal, reference: Decimal) -> Decimal {
    value
        .saturating_sub(reference)
        .checked_div(reference)
        .map_or(Decimal::ZERO, |ratio| ratio.saturating_mul(HUNDRED))
}

// ============================================================================
// Multiplier tiers
// ============================================================================

/// Buy more in fear, less in greed
pub fn fear_multiplier(fear: Decimal) -> Decimal {
    if fear <= dec!(20) {
        dec!(1.5)
    } else if fear <= dec!(40) {
        dec!(1.2)
    } else if fear >= dec!(75) {
        dec!(0.8)
    } else {
        dec!(1.0)
    }
}

/// Distance from fair value, in percent
pub fn trend_multiplier(deviation: Decimal) -> Decimal {
    if deviation < dec!(-20) {
        dec!(1.3)
    } else if deviation < Decimal::ZERO {
        dec!(1.1)
    } else if deviation > dec!(20) {
        dec!(0.9)
    } else {
        dec!(1.0)
    }
}

/// Distance below the 24h high, in percent
pub fn dip_multiplier(drawdown: Decimal) -> Decimal {
    if drawdown < dec!(-10) {
        dec!(1.25)
    } else if drawdown < dec!(-5) {
        dec!(1.1)
    } else {
        dec!(1.0)
    }
}

/// Boost while less than half of the goal is reached.
///
/// `None` (unusable target) is treated as far enough along: neutral.
pub fn goal_multiplier(progress: Option<Decimal>) -> Decimal {
    match progress {
        Some(p) if p < dec!(0.5) => dec!(1.1),
        _ => dec!(1.0),
    }
}

/// Dampen buying into a sharp rally, lean in after a sharp drop
pub fn cooldown_multiplier(change_7d: Decimal) -> Decimal {
    if change_7d > dec!(20) {
        dec!(0.6)
    } else if change_7d > dec!(10) {
        dec!(0.8)
    } else if change_7d < dec!(-10) {
        dec!(1.1)
    } else {
        dec!(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProfileId;

    fn profile(income: Decimal, expenses: Decimal, allocation: Decimal) -> Profile {
        Profile {
            id: ProfileId::from_string("test"),
            name: "Test".into(),
            income,
            expenses,
            allocation,
            holdings: Decimal::ZERO,
            target: dec!(1.0),
            spent_so_far: Decimal::ZERO,
        }
    }

    fn market(price: Decimal, fear: Decimal, high: Decimal, change: Decimal) -> MarketState {
        MarketState {
            last_updated: None,
            ..MarketState::new(price, fear, high, change)
        }
    }

    fn close(a: Decimal, b: Decimal) -> bool {
        (a - b).abs() < dec!(0.000001)
    }

    #[test]
    fn test_reference_scenario() {
        let p = profile(dec!(5000), dec!(3000), dec!(0.2));
        let m = market(dec!(90000), dec!(15), dec!(95000), dec!(0));

        let rec = compute(&m, &p, 30);

        assert_eq!(rec.budget.monthly_budget, dec!(400));
        assert_eq!(rec.budget.remaining_budget, dec!(400));
        assert_eq!(rec.multipliers.fear, dec!(1.5));
        assert_eq!(rec.multipliers.trend, dec!(1.0));
        assert_eq!(rec.multipliers.dip, dec!(1.1));
        assert_eq!(rec.multipliers.goal, dec!(1.1));
        assert_eq!(rec.multipliers.cooldown, dec!(1.0));
        assert_eq!(rec.total_mult, dec!(1.815));
        assert!(close(rec.stats.deviation, dec!(5.882352941)));
        assert!(close(rec.stats.drawdown, dec!(-5.263157895)));
        assert!(close(rec.raw_suggested, dec!(24.2)));
        assert_eq!(rec.max_today_by_reserve, dec!(110));
        assert!(!rec.is_capped_by_reserve);
        assert_eq!(rec.final_buy, rec.raw_suggested);
    }

    #[test]
    fn test_capped_by_reserve() {
        // total = 1.5 * 1.3 * 1.25 * 1.1 * 1.1 = 2.949375
        let p = profile(dec!(1000), dec!(400), dec!(0.2));
        let m = market(dec!(60000), dec!(10), dec!(70000), dec!(-15));

        let rec = compute(&m, &p, 10);

        assert_eq!(rec.total_mult, dec!(2.949375));
        assert_eq!(rec.raw_suggested, dec!(35.3925));
        assert_eq!(rec.max_today_by_reserve, dec!(30));
        assert!(rec.is_capped_by_reserve);
        assert_eq!(rec.final_buy, dec!(30));
    }

    #[test]
    fn test_zero_days_remaining() {
        let p = profile(dec!(5000), dec!(0), dec!(1));
        let m = market(dec!(50000), dec!(5), dec!(90000), dec!(-30));

        let rec = compute(&m, &p, 0);

        assert_eq!(rec.final_buy, Decimal::ZERO);
        assert_eq!(rec.raw_suggested, Decimal::ZERO);
        assert_eq!(rec.max_today_by_reserve, dec!(5000));
        assert!(!rec.is_capped_by_reserve);
    }

    #[test]
    fn test_negative_reserve_ceiling_floors_at_zero() {
        // 100 left, 20 days: ceiling = 100 - 190 = -90
        let mut p = profile(dec!(1000), dec!(500), dec!(0.5));
        p.spent_so_far = dec!(150);
        let rec = compute(&MarketState::default(), &p, 20);

        assert_eq!(rec.budget.remaining_budget, dec!(100));
        assert_eq!(rec.max_today_by_reserve, dec!(-90));
        assert!(rec.is_capped_by_reserve);
        assert_eq!(rec.final_buy, Decimal::ZERO);
    }

    #[test]
    fn test_overspent_budget_clamps_remaining() {
        let mut p = profile(dec!(5000), dec!(3000), dec!(0.2));
        p.spent_so_far = dec!(900);
        let rec = compute(&MarketState::default(), &p, 5);

        assert_eq!(rec.budget.remaining_budget, Decimal::ZERO);
        assert_eq!(rec.final_buy, Decimal::ZERO);
    }

    #[test]
    fn test_expenses_above_income() {
        let p = profile(dec!(2000), dec!(3000), dec!(0.5));
        let rec = compute(&MarketState::default(), &p, 12);
        assert_eq!(rec.budget.monthly_budget, Decimal::ZERO);
        assert_eq!(rec.final_buy, Decimal::ZERO);
    }

    #[test]
    fn test_market_defaults() {
        let stats = market_stats(&MarketState::default());
        assert_eq!(stats.fear, dec!(50));
        assert_eq!(stats.price, dec!(90000));
        assert_eq!(stats.change_7d, Decimal::ZERO);
        assert!(close(stats.drawdown, dec!(-5.263157895)));
    }

    #[test]
    fn test_non_positive_high_has_no_drawdown() {
        let m = MarketState {
            high_24h: Some(Decimal::ZERO),
            ..MarketState::default()
        };
        assert_eq!(market_stats(&m).drawdown, Decimal::ZERO);
    }

    #[test]
    fn test_non_positive_target_is_neutral() {
        let mut p = profile(dec!(5000), dec!(3000), dec!(0.2));
        p.target = Decimal::ZERO;
        assert_eq!(compute(&MarketState::default(), &p, 30).multipliers.goal, dec!(1.0));

        p.target = dec!(-2);
        assert_eq!(compute(&MarketState::default(), &p, 30).multipliers.goal, dec!(1.0));
    }

    #[test]
    fn test_goal_progress_threshold() {
        let mut p = profile(dec!(5000), dec!(3000), dec!(0.2));
        p.target = dec!(2);
        p.holdings = dec!(0.99);
        assert_eq!(compute(&MarketState::default(), &p, 30).multipliers.goal, dec!(1.1));

        p.holdings = dec!(1);
        assert_eq!(compute(&MarketState::default(), &p, 30).multipliers.goal, dec!(1.0));
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(fear_multiplier(dec!(20)), dec!(1.5));
        assert_eq!(fear_multiplier(dec!(21)), dec!(1.2));
        assert_eq!(fear_multiplier(dec!(40)), dec!(1.2));
        assert_eq!(fear_multiplier(dec!(74)), dec!(1.0));
        assert_eq!(fear_multiplier(dec!(75)), dec!(0.8));

        assert_eq!(trend_multiplier(dec!(-20)), dec!(1.1));
        assert_eq!(trend_multiplier(dec!(-20.01)), dec!(1.3));
        assert_eq!(trend_multiplier(dec!(0)), dec!(1.0));
        assert_eq!(trend_multiplier(dec!(20)), dec!(1.0));
        assert_eq!(trend_multiplier(dec!(20.01)), dec!(0.9));

        assert_eq!(dip_multiplier(dec!(-5)), dec!(1.0));
        assert_eq!(dip_multiplier(dec!(-5.01)), dec!(1.1));
        assert_eq!(dip_multiplier(dec!(-10)), dec!(1.1));
        assert_eq!(dip_multiplier(dec!(-10.01)), dec!(1.25));

        assert_eq!(cooldown_multiplier(dec!(20.5)), dec!(0.6));
        assert_eq!(cooldown_multiplier(dec!(20)), dec!(0.8));
        assert_eq!(cooldown_multiplier(dec!(10)), dec!(1.0));
        assert_eq!(cooldown_multiplier(dec!(-10)), dec!(1.0));
        assert_eq!(cooldown_multiplier(dec!(-10.5)), dec!(1.1));
    }

    #[test]
    fn test_multipliers_only_read_their_own_signal() {
        let p = profile(dec!(5000), dec!(3000), dec!(0.2));
        let base = market(dec!(90000), dec!(30), dec!(95000), dec!(0));
        let pumped = MarketState {
            change_7d: Some(dec!(35)),
            ..base.clone()
        };

        let a = compute(&base, &p, 30);
        let b = compute(&pumped, &p, 30);

        assert_eq!(a.multipliers.fear, b.multipliers.fear);
        assert_eq!(a.multipliers.trend, b.multipliers.trend);
        assert_eq!(a.multipliers.dip, b.multipliers.dip);
        assert_eq!(a.multipliers.goal, b.multipliers.goal);
        assert_ne!(a.multipliers.cooldown, b.multipliers.cooldown);
        assert_eq!(b.total_mult, b.multipliers.total());
    }

    #[test]
    fn test_deterministic() {
        let p = profile(dec!(4200), dec!(2900.5), dec!(0.35));
        let m = market(dec!(81234.56), dec!(38), dec!(88000), dec!(-11.2));

        assert_eq!(compute(&m, &p, 17), compute(&m, &p, 17));
    }

    #[test]
    fn test_final_buy_bounds_over_grid() {
        let markets = [
            market(dec!(40000), dec!(3), dec!(60000), dec!(-25)),
            market(dec!(85000), dec!(50), dec!(85000), dec!(0)),
            market(dec!(130000), dec!(90), dec!(131000), dec!(30)),
        ];
        let spends = [dec!(0), dec!(120), dec!(399), dec!(1000)];

        for m in &markets {
            for spent in spends {
                for days in [0_u32, 1, 2, 15, 31] {
                    let mut p = profile(dec!(5000), dec!(3000), dec!(0.2));
                    p.spent_so_far = spent;
                    let rec = compute(m, &p, days);

                    assert!(rec.final_buy >= Decimal::ZERO);
                    assert!(rec.final_buy <= rec.budget.remaining_budget);
                    if rec.max_today_by_reserve >= Decimal::ZERO {
                        assert!(rec.final_buy <= rec.max_today_by_reserve);
                    }
                }
            }
        }
    }

    #[test]
    fn test_extreme_values_do_not_panic() {
        let mut p = profile(Decimal::MAX, Decimal::MIN, Decimal::MAX);
        p.spent_so_far = Decimal::MIN;
        let m = market(Decimal::MAX, Decimal::MIN, dec!(0.0000001), Decimal::MAX);

        let rec = compute(&m, &p, u32::MAX);
        assert!(rec.final_buy >= Decimal::ZERO);
    }
}
