//! Persistent entities: jackpots, their policy configuration, and the
//! contribution/reward rows recorded against them.

use rust_decimal::Decimal;
use std::fmt;

/// Role a config entry plays within a [`JackpotConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Selects the formula crediting bets into the pool.
    Contribution,
    /// Selects the formula deciding whether a bet wins the pool.
    Reward,
}

impl Slot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Contribution => "CONTRIBUTION",
            Slot::Reward => "REWARD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CONTRIBUTION" => Some(Slot::Contribution),
            "REWARD" => Some(Slot::Reward),
            _ => None,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag selecting which formula implements a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PolicyKey {
    Fixed,
    Variable,
}

impl PolicyKey {
    /// Every key a registry must cover for each formula kind.
    pub const ALL: [PolicyKey; 2] = [PolicyKey::Fixed, PolicyKey::Variable];

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKey::Fixed => "FIXED",
            PolicyKey::Variable => "VARIABLE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FIXED" => Some(PolicyKey::Fixed),
            "VARIABLE" => Some(PolicyKey::Variable),
            _ => None,
        }
    }
}

impl fmt::Display for PolicyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One formula binding inside a config bundle, e.g. CONTRIBUTION/FIXED.
///
/// `config_blob` is a free-form JSON object interpreted by the bound
/// formula; malformed blobs degrade to a zero contribution or a
/// non-winning roll rather than an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigEntry {
    pub entry_id: i64,
    pub config_id: String,
    pub slot: Slot,
    pub policy_key: PolicyKey,
    pub config_blob: String,
}

/// Named bundle of config entries, shared across jackpots.
/// Immutable after seeding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JackpotConfig {
    pub config_id: String,
    pub name: String,
    pub entries: Vec<ConfigEntry>,
}

impl JackpotConfig {
    /// The single entry bound to `slot`, if one was seeded.
    pub fn entry_for(&self, slot: Slot) -> Option<&ConfigEntry> {
        self.entries.iter().find(|entry| entry.slot == slot)
    }
}

/// A named pool that grows with contributions and resets on a win.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Jackpot {
    pub jackpot_id: i64,
    pub name: String,
    pub initial_amount: Decimal,
    pub current_amount: Decimal,
    /// Completed pool lifetimes; increments each time the pool is won.
    pub cycle: i64,
    /// Optimistic lock for frequent contribution updates.
    pub version: i64,
    pub config: JackpotConfig,
}

impl Jackpot {
    /// Close the current cycle after a win: restore the initial pool and
    /// advance to the next cycle.
    pub fn reset_to_initial(&mut self) {
        self.current_amount = self.initial_amount;
        self.cycle += 1;
    }
}

/// The portion of one bet credited to a jackpot pool. Unique per `bet_id`.
///
/// `pool_snapshot` and `cycle_snapshot` capture the jackpot immediately
/// before this contribution was added; evaluation uses them for fairness
/// decisions long after the pool has moved on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contribution {
    pub contribution_id: i64,
    pub bet_id: i64,
    pub user_id: i64,
    pub jackpot_id: i64,
    pub stake_amount: Decimal,
    pub contribution_amount: Decimal,
    pub pool_snapshot: Decimal,
    pub cycle_snapshot: i64,
    pub evaluated: bool,
    pub winning: bool,
}

/// Payout record for a winning bet. Unique per `bet_id` and per
/// `(jackpot_id, cycle_at_win)`; the latter is the hard single-winner
/// guarantee.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reward {
    pub reward_id: i64,
    pub bet_id: i64,
    pub user_id: i64,
    pub jackpot_id: i64,
    pub amount: Decimal,
    pub cycle_at_win: i64,
}
