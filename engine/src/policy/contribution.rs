//! Contribution formulas: the share of a stake credited to the pool.

use jackpot_types::money::{self, MONEY_SCALE};
use jackpot_types::{Jackpot, PolicyKey, Slot};
use rust_decimal::Decimal;

use crate::params;
use crate::policy::{interpolated_percent, ContributionFormula};

/// Fixed percentage of the stake.
///
/// Blob: `{"percent": "20.0", "scale": 2}`. `percent` is clamped to
/// `[0, 100]`; a missing or malformed blob contributes nothing.
#[derive(Debug)]
pub struct FixedContribution;

impl ContributionFormula for FixedContribution {
    fn policy_key(&self) -> PolicyKey {
        PolicyKey::Fixed
    }

    fn compute(&self, stake: Decimal, jackpot: &Jackpot) -> Decimal {
        let Some(entry) = jackpot.config.entry_for(Slot::Contribution) else {
            return money::zero(MONEY_SCALE);
        };
        let Some(root) = params::read_blob(&entry.config_blob) else {
            return money::zero(MONEY_SCALE);
        };
        let Some(percent) = params::decimal_field(&root, "percent") else {
            return money::zero(MONEY_SCALE);
        };
        let percent = params::clamp_percent(percent);
        let scale = params::scale_field(&root, 2);
        money::with_scale(stake * percent / Decimal::ONE_HUNDRED, scale)
    }
}

/// Percentage interpolated linearly across a pool interval.
///
/// Blob: `{"startPercent": "30.0", "endPercent": "10.0", "fromPool":
/// "0.00", "toPool": "100000", "scale": 2}`. At or below `fromPool` the
/// percent is `startPercent`, at or above `toPool` it is `endPercent`,
/// linear in between. A degenerate interval (`toPool <= fromPool`)
/// reduces to the fixed `startPercent` case.
#[derive(Debug)]
pub struct VariableContribution;

impl ContributionFormula for VariableContribution {
    fn policy_key(&self) -> PolicyKey {
        PolicyKey::Variable
    }

    fn compute(&self, stake: Decimal, jackpot: &Jackpot) -> Decimal {
        let Some(entry) = jackpot.config.entry_for(Slot::Contribution) else {
            return money::zero(MONEY_SCALE);
        };
        let Some(root) = params::read_blob(&entry.config_blob) else {
            return money::zero(MONEY_SCALE);
        };
        let (Some(start), Some(end)) = (
            params::decimal_field(&root, "startPercent"),
            params::decimal_field(&root, "endPercent"),
        ) else {
            return money::zero(MONEY_SCALE);
        };
        let start = params::clamp_percent(start);
        let end = params::clamp_percent(end);
        let from_pool = params::decimal_field(&root, "fromPool")
            .filter(|value| *value >= Decimal::ZERO)
            .unwrap_or(Decimal::ZERO);
        let to_pool = params::decimal_field(&root, "toPool");
        let scale = params::scale_field(&root, 2);
        let pool = jackpot.current_amount;

        let effective = match to_pool {
            None => start,
            Some(to_pool) if to_pool <= from_pool => start,
            Some(_) if pool <= from_pool => start,
            Some(to_pool) if pool >= to_pool => end,
            Some(to_pool) => interpolated_percent(start, end, from_pool, to_pool, pool),
        };
        money::with_scale(stake * effective / Decimal::ONE_HUNDRED, scale)
    }
}
