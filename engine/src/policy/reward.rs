//! Reward formulas: whether a bet wins the pool.
//!
//! Each formula draws `u ∈ [0, 100)` from its injected [`ChanceSource`]
//! and wins iff `u` falls under the effective chance. The draw is an
//! `f64` compared against the decimal percent; the chance itself is
//! computed in decimal.

use jackpot_types::{Jackpot, PolicyKey, Slot};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::params;
use crate::policy::{interpolated_percent, RewardFormula};
use crate::policy::chance::ChanceSource;

/// Constant win chance per bet.
///
/// Blob: `{"chancePercent": "5.0"}`, clamped to `[0, 100]`. A missing or
/// malformed blob never wins.
pub struct FixedReward {
    chance: Arc<dyn ChanceSource>,
}

impl FixedReward {
    pub fn new(chance: Arc<dyn ChanceSource>) -> Self {
        Self { chance }
    }
}

impl RewardFormula for FixedReward {
    fn policy_key(&self) -> PolicyKey {
        PolicyKey::Fixed
    }

    fn is_winner(&self, jackpot: &Jackpot) -> bool {
        let Some(entry) = jackpot.config.entry_for(Slot::Reward) else {
            return false;
        };
        let Some(root) = params::read_blob(&entry.config_blob) else {
            return false;
        };
        let Some(chance_percent) = params::decimal_field(&root, "chancePercent") else {
            return false;
        };
        let chance_percent = params::clamp_percent(chance_percent);
        self.chance.draw_percent() < chance_percent.to_f64().unwrap_or(0.0)
    }
}

/// Win chance interpolated across a pool interval, guaranteed at the cap.
///
/// Blob: `{"startPercent": "1.0", "endPercent": "100.0", "fromPool":
/// "0.00", "toPool": "200000"}`. At or below `fromPool` the chance is
/// `startPercent`; at or above `toPool` the win is guaranteed (100, not
/// `endPercent`); linear in between. A degenerate interval reduces to
/// `startPercent`.
pub struct VariableReward {
    chance: Arc<dyn ChanceSource>,
}

impl VariableReward {
    pub fn new(chance: Arc<dyn ChanceSource>) -> Self {
        Self { chance }
    }
}

impl RewardFormula for VariableReward {
    fn policy_key(&self) -> PolicyKey {
        PolicyKey::Variable
    }

    fn is_winner(&self, jackpot: &Jackpot) -> bool {
        let Some(entry) = jackpot.config.entry_for(Slot::Reward) else {
            return false;
        };
        let Some(root) = params::read_blob(&entry.config_blob) else {
            return false;
        };
        let (Some(start), Some(end), Some(to_pool)) = (
            params::decimal_field(&root, "startPercent"),
            params::decimal_field(&root, "endPercent"),
            params::decimal_field(&root, "toPool"),
        ) else {
            return false;
        };
        let start = params::clamp_percent(start);
        let end = params::clamp_percent(end);
        let from_pool = params::decimal_field(&root, "fromPool")
            .filter(|value| *value >= Decimal::ZERO)
            .unwrap_or(Decimal::ZERO);
        let pool = jackpot.current_amount;

        let effective = if to_pool <= from_pool || pool <= from_pool {
            start
        } else if pool >= to_pool {
            Decimal::ONE_HUNDRED
        } else {
            interpolated_percent(start, end, from_pool, to_pool, pool)
        };
        self.chance.draw_percent() < effective.to_f64().unwrap_or(0.0)
    }
}
