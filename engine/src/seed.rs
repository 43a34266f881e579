//! Deploy-time seeding of demo jackpots.
//!
//! Four jackpots, one per contribution/reward policy pairing, each
//! starting at 10000.00 in cycle 0. Seeding is idempotent so restarts
//! never duplicate or reset live rows.

use jackpot_types::{ConfigEntry, Jackpot, JackpotConfig, PolicyKey, Slot};
use rusqlite::params;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::info;

use crate::store::{jackpots, Store};
use crate::EngineError;

const INITIAL_AMOUNT: &str = "10000.00";

const FIXED_CONTRIBUTION_BLOB: &str = r#"{"percent": "20.0", "scale": 2}"#;
const VARIABLE_CONTRIBUTION_BLOB: &str =
    r#"{"startPercent": "30.0", "endPercent": "10.0", "fromPool": "0.00", "toPool": "100000", "scale": 2}"#;
const FIXED_REWARD_BLOB: &str = r#"{"chancePercent": "5.0"}"#;
const VARIABLE_REWARD_BLOB: &str =
    r#"{"startPercent": "1.0", "endPercent": "100.0", "fromPool": "0.00", "toPool": "200000"}"#;

struct SeedJackpot {
    jackpot_id: i64,
    name: &'static str,
    contribution: PolicyKey,
    reward: PolicyKey,
}

const SEED_JACKPOTS: [SeedJackpot; 4] = [
    SeedJackpot {
        jackpot_id: 1,
        name: "Main Fixed",
        contribution: PolicyKey::Fixed,
        reward: PolicyKey::Fixed,
    },
    SeedJackpot {
        jackpot_id: 2,
        name: "Fixed Feed, Variable Chance",
        contribution: PolicyKey::Fixed,
        reward: PolicyKey::Variable,
    },
    SeedJackpot {
        jackpot_id: 3,
        name: "Progressive",
        contribution: PolicyKey::Variable,
        reward: PolicyKey::Variable,
    },
    SeedJackpot {
        jackpot_id: 4,
        name: "Variable Feed, Fixed Chance",
        contribution: PolicyKey::Variable,
        reward: PolicyKey::Fixed,
    },
];

/// Insert the demo configs and jackpots unless they already exist.
pub fn seed_demo_jackpots(store: &Store) -> Result<(), EngineError> {
    store.with_tx(|tx| {
        let mut seeded = 0usize;
        for preset in &SEED_JACKPOTS {
            let exists: i64 = tx.query_row(
                "SELECT COUNT(*) FROM jackpots WHERE jackpot_id = ?1",
                [preset.jackpot_id],
                |row| row.get(0),
            )?;
            if exists > 0 {
                continue;
            }
            let config = insert_config(tx, preset)?;
            let initial = Decimal::from_str(INITIAL_AMOUNT)
                .map_err(|err| EngineError::Integrity(err.to_string()))?;
            jackpots::insert(
                tx,
                &Jackpot {
                    jackpot_id: preset.jackpot_id,
                    name: preset.name.to_string(),
                    initial_amount: initial,
                    current_amount: initial,
                    cycle: 0,
                    version: 0,
                    config,
                },
            )?;
            seeded += 1;
        }
        if seeded > 0 {
            info!(seeded, "seeded demo jackpots");
        }
        Ok(())
    })
}

fn config_id_for(preset: &SeedJackpot) -> String {
    format!(
        "{}-{}",
        preset.contribution.as_str().to_lowercase(),
        preset.reward.as_str().to_lowercase()
    )
}

fn insert_config(
    conn: &rusqlite::Connection,
    preset: &SeedJackpot,
) -> Result<JackpotConfig, EngineError> {
    let config_id = config_id_for(preset);
    conn.execute(
        "INSERT OR IGNORE INTO jackpot_configs (config_id, name) VALUES (?1, ?2)",
        params![config_id, format!("{} pairing", config_id)],
    )?;

    let mut entries = Vec::new();
    for (slot, key) in [
        (Slot::Contribution, preset.contribution),
        (Slot::Reward, preset.reward),
    ] {
        let blob = blob_for(slot, key);
        conn.execute(
            "INSERT OR IGNORE INTO config_entries (config_id, slot, policy_key, config_blob)
             VALUES (?1, ?2, ?3, ?4)",
            params![config_id, slot.as_str(), key.as_str(), blob],
        )?;
        let entry_id: i64 = conn.query_row(
            "SELECT entry_id FROM config_entries WHERE config_id = ?1 AND slot = ?2",
            params![config_id, slot.as_str()],
            |row| row.get(0),
        )?;
        entries.push(ConfigEntry {
            entry_id,
            config_id: config_id.clone(),
            slot,
            policy_key: key,
            config_blob: blob.to_string(),
        });
    }

    Ok(JackpotConfig {
        config_id: config_id.clone(),
        name: format!("{config_id} pairing"),
        entries,
    })
}

fn blob_for(slot: Slot, key: PolicyKey) -> &'static str {
    match (slot, key) {
        (Slot::Contribution, PolicyKey::Fixed) => FIXED_CONTRIBUTION_BLOB,
        (Slot::Contribution, PolicyKey::Variable) => VARIABLE_CONTRIBUTION_BLOB,
        (Slot::Reward, PolicyKey::Fixed) => FIXED_REWARD_BLOB,
        (Slot::Reward, PolicyKey::Variable) => VARIABLE_REWARD_BLOB,
    }
}

/// Replace a seeded entry's parameter blob. Test hook for exercising
/// blank and malformed operator configuration.
#[cfg(test)]
pub(crate) fn override_entry_blob(
    store: &Store,
    jackpot_id: i64,
    slot: Slot,
    blob: &str,
) -> Result<(), EngineError> {
    store.with_tx(|tx| {
        tx.execute(
            "UPDATE config_entries SET config_blob = ?1
             WHERE slot = ?2 AND config_id =
                 (SELECT config_id FROM jackpots WHERE jackpot_id = ?3)",
            params![blob, slot.as_str(), jackpot_id],
        )?;
        Ok(())
    })
}
