//! Policy registry binding contribution and reward formulas to their
//! policy keys.
//!
//! The registry is assembled once at startup; a duplicate or missing
//! formula for any key is a startup error, never a request error.

pub mod chance;
pub mod contribution;
pub mod reward;

use jackpot_types::{Jackpot, PolicyKey};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use chance::{ChanceSource, OsChance};
use contribution::{FixedContribution, VariableContribution};
use reward::{FixedReward, VariableReward};

/// Computes the share of a stake credited to the pool.
/// Results are non-negative decimals; parameter problems yield zero.
pub trait ContributionFormula: Send + Sync + std::fmt::Debug {
    fn policy_key(&self) -> PolicyKey;

    fn compute(&self, stake: Decimal, jackpot: &Jackpot) -> Decimal;
}

/// Decides whether a bet wins the pool it contributed to.
/// Parameter problems yield a non-winner.
pub trait RewardFormula: Send + Sync {
    fn policy_key(&self) -> PolicyKey;

    fn is_winner(&self, jackpot: &Jackpot) -> bool;
}

/// Linear interpolation of a percent across the open pool interval
/// `(from_pool, to_pool)`. Callers handle the boundary and degenerate
/// cases themselves; this computes only the strict-middle branch, with
/// the fraction rounded half-up at the interim scale before applying.
pub(crate) fn interpolated_percent(
    start: Decimal,
    end: Decimal,
    from_pool: Decimal,
    to_pool: Decimal,
    pool: Decimal,
) -> Decimal {
    let range = to_pool - from_pool;
    let fraction = jackpot_types::money::round_half_up(
        (pool - from_pool) / range,
        jackpot_types::money::INTERP_SCALE,
    );
    start + (end - start) * fraction
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate {kind} formula for policy key {key}")]
    Duplicate { kind: &'static str, key: PolicyKey },
    #[error("missing {kind} formula for policy key {key}")]
    Missing { kind: &'static str, key: PolicyKey },
}

/// Index of formulas by kind and policy key.
pub struct PolicyRegistry {
    contributions: HashMap<PolicyKey, Arc<dyn ContributionFormula>>,
    rewards: HashMap<PolicyKey, Arc<dyn RewardFormula>>,
}

impl PolicyRegistry {
    /// Build a registry, verifying at startup that every policy key has
    /// exactly one formula of each kind.
    pub fn new(
        contributions: Vec<Arc<dyn ContributionFormula>>,
        rewards: Vec<Arc<dyn RewardFormula>>,
    ) -> Result<Self, RegistryError> {
        let mut contribution_index = HashMap::new();
        for formula in contributions {
            let key = formula.policy_key();
            if contribution_index.insert(key, formula).is_some() {
                return Err(RegistryError::Duplicate {
                    kind: "contribution",
                    key,
                });
            }
        }
        let mut reward_index = HashMap::new();
        for formula in rewards {
            let key = formula.policy_key();
            if reward_index.insert(key, formula).is_some() {
                return Err(RegistryError::Duplicate {
                    kind: "reward",
                    key,
                });
            }
        }
        for key in PolicyKey::ALL {
            if !contribution_index.contains_key(&key) {
                return Err(RegistryError::Missing {
                    kind: "contribution",
                    key,
                });
            }
            if !reward_index.contains_key(&key) {
                return Err(RegistryError::Missing {
                    kind: "reward",
                    key,
                });
            }
        }
        Ok(Self {
            contributions: contribution_index,
            rewards: reward_index,
        })
    }

    /// The standard formula set with a secure chance source.
    pub fn standard() -> Self {
        Self::standard_with_chance(Arc::new(OsChance))
    }

    /// The standard formula set with an injected chance source; tests use
    /// this to pin the reward roll.
    pub fn standard_with_chance(chance: Arc<dyn ChanceSource>) -> Self {
        Self::new(
            vec![
                Arc::new(FixedContribution),
                Arc::new(VariableContribution),
            ],
            vec![
                Arc::new(FixedReward::new(Arc::clone(&chance))),
                Arc::new(VariableReward::new(chance)),
            ],
        )
        .expect("standard formula set covers every policy key")
    }

    pub fn contribution(&self, key: PolicyKey) -> Option<&Arc<dyn ContributionFormula>> {
        self.contributions.get(&key)
    }

    pub fn reward(&self, key: PolicyKey) -> Option<&Arc<dyn RewardFormula>> {
        self.rewards.get(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::chance::FixedChance;

    #[test]
    fn test_standard_registry_covers_all_keys() {
        let registry = PolicyRegistry::standard_with_chance(Arc::new(FixedChance(50.0)));
        for key in PolicyKey::ALL {
            assert!(registry.contribution(key).is_some(), "{key} contribution");
            assert!(registry.reward(key).is_some(), "{key} reward");
        }
    }

    #[test]
    fn test_duplicate_key_is_startup_error() {
        let result = PolicyRegistry::new(
            vec![
                Arc::new(FixedContribution),
                Arc::new(FixedContribution),
            ],
            vec![],
        );
        assert_eq!(
            result.err(),
            Some(RegistryError::Duplicate {
                kind: "contribution",
                key: PolicyKey::Fixed,
            })
        );
    }

    #[test]
    fn test_missing_key_is_startup_error() {
        let chance: Arc<dyn ChanceSource> = Arc::new(FixedChance(50.0));
        let result = PolicyRegistry::new(
            vec![Arc::new(FixedContribution)],
            vec![
                Arc::new(FixedReward::new(Arc::clone(&chance))),
                Arc::new(VariableReward::new(chance)),
            ],
        );
        assert_eq!(
            result.err(),
            Some(RegistryError::Missing {
                kind: "contribution",
                key: PolicyKey::Variable,
            })
        );
    }
}
