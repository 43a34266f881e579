//! Resolves the formula bound to a jackpot's config slot.

use jackpot_types::{Jackpot, Slot};
use std::sync::Arc;

use crate::policy::{ContributionFormula, PolicyRegistry, RewardFormula};
use crate::EngineError;

/// Binds a jackpot to its formulas through the persisted config graph.
///
/// A jackpot without an entry for the requested slot, or with a policy
/// key the registry does not know, is a configuration error on the
/// seeded data, not a request error.
pub struct PolicyResolver {
    registry: Arc<PolicyRegistry>,
}

impl PolicyResolver {
    pub fn new(registry: Arc<PolicyRegistry>) -> Self {
        Self { registry }
    }

    pub fn contribution_for(
        &self,
        jackpot: &Jackpot,
    ) -> Result<Arc<dyn ContributionFormula>, EngineError> {
        let entry = jackpot
            .config
            .entry_for(Slot::Contribution)
            .ok_or(EngineError::MissingConfigEntry {
                slot: Slot::Contribution,
                jackpot_id: jackpot.jackpot_id,
            })?;
        self.registry
            .contribution(entry.policy_key)
            .cloned()
            .ok_or(EngineError::UnknownPolicyKey {
                kind: "contribution",
                key: entry.policy_key,
            })
    }

    pub fn reward_for(&self, jackpot: &Jackpot) -> Result<Arc<dyn RewardFormula>, EngineError> {
        let entry = jackpot
            .config
            .entry_for(Slot::Reward)
            .ok_or(EngineError::MissingConfigEntry {
                slot: Slot::Reward,
                jackpot_id: jackpot.jackpot_id,
            })?;
        self.registry
            .reward(entry.policy_key)
            .cloned()
            .ok_or(EngineError::UnknownPolicyKey {
                kind: "reward",
                key: entry.policy_key,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::chance::FixedChance;
    use jackpot_types::{ConfigEntry, JackpotConfig, PolicyKey};
    use rust_decimal_macros::dec;

    fn jackpot_with_entries(entries: Vec<ConfigEntry>) -> Jackpot {
        Jackpot {
            jackpot_id: 9,
            name: "Main".to_string(),
            initial_amount: dec!(10000.00),
            current_amount: dec!(10000.00),
            cycle: 0,
            version: 0,
            config: JackpotConfig {
                config_id: "cfg".to_string(),
                name: "cfg".to_string(),
                entries,
            },
        }
    }

    fn entry(slot: Slot, key: PolicyKey) -> ConfigEntry {
        ConfigEntry {
            entry_id: 1,
            config_id: "cfg".to_string(),
            slot,
            policy_key: key,
            config_blob: "{}".to_string(),
        }
    }

    fn resolver() -> PolicyResolver {
        PolicyResolver::new(Arc::new(PolicyRegistry::standard_with_chance(Arc::new(
            FixedChance(50.0),
        ))))
    }

    #[test]
    fn test_resolves_formula_for_each_slot() {
        let jackpot = jackpot_with_entries(vec![
            entry(Slot::Contribution, PolicyKey::Fixed),
            entry(Slot::Reward, PolicyKey::Variable),
        ]);
        let resolver = resolver();
        let contribution = resolver.contribution_for(&jackpot).unwrap();
        assert_eq!(contribution.policy_key(), PolicyKey::Fixed);
        let reward = resolver.reward_for(&jackpot).unwrap();
        assert_eq!(reward.policy_key(), PolicyKey::Variable);
    }

    #[test]
    fn test_missing_entry_is_config_error() {
        let jackpot = jackpot_with_entries(vec![entry(Slot::Reward, PolicyKey::Fixed)]);
        let err = resolver().contribution_for(&jackpot).unwrap_err();
        assert!(matches!(
            err,
            EngineError::MissingConfigEntry {
                slot: Slot::Contribution,
                jackpot_id: 9,
            }
        ));
    }
}
