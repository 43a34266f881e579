//! Jackpot repository: config-eager reads, a write-locked read for
//! finalization, and version-guarded saves.

use jackpot_types::money;
use jackpot_types::{ConfigEntry, Jackpot, JackpotConfig, PolicyKey, Slot};
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::store::{column_error, decimal_column};
use crate::EngineError;

/// Load a jackpot with its config and entries in one shot, so formula
/// resolution needs no further fetches.
pub fn find_by_id_with_config(
    conn: &Connection,
    jackpot_id: i64,
) -> Result<Option<Jackpot>, EngineError> {
    let header = conn
        .query_row(
            "SELECT name, initial_amount, current_amount, cycle, version, config_id
             FROM jackpots WHERE jackpot_id = ?1",
            [jackpot_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    decimal_column(row, 1)?,
                    decimal_column(row, 2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        )
        .optional()?;

    let Some((name, initial_amount, current_amount, cycle, version, config_id)) = header else {
        return Ok(None);
    };
    let config = load_config(conn, &config_id)?;
    Ok(Some(Jackpot {
        jackpot_id,
        name,
        initial_amount,
        current_amount,
        cycle,
        version,
        config,
    }))
}

/// Re-read a jackpot for finalization. Requires the store's write
/// transaction; under SQLite that transaction is the row lock, so this
/// is a plain re-read inside the critical section. Taking the
/// transaction rather than a bare connection keeps a lock-free caller
/// from compiling.
pub fn find_by_id_for_update(
    tx: &Transaction<'_>,
    jackpot_id: i64,
) -> Result<Option<Jackpot>, EngineError> {
    find_by_id_with_config(tx, jackpot_id)
}

/// Persist the mutable jackpot fields with optimistic concurrency keyed
/// on `version`. A lost version race aborts with
/// [`EngineError::VersionConflict`]; the bus redelivers the event.
pub fn save(conn: &Connection, jackpot: &mut Jackpot) -> Result<(), EngineError> {
    let updated = conn.execute(
        "UPDATE jackpots
         SET name = ?1, current_amount = ?2, cycle = ?3, version = version + 1
         WHERE jackpot_id = ?4 AND version = ?5",
        params![
            jackpot.name,
            money::to_storage(jackpot.current_amount),
            jackpot.cycle,
            jackpot.jackpot_id,
            jackpot.version,
        ],
    )?;
    if updated == 0 {
        return Err(EngineError::VersionConflict(jackpot.jackpot_id));
    }
    jackpot.version += 1;
    Ok(())
}

/// Insert a jackpot row during seeding.
pub fn insert(conn: &Connection, jackpot: &Jackpot) -> Result<(), EngineError> {
    conn.execute(
        "INSERT INTO jackpots
             (jackpot_id, name, initial_amount, current_amount, cycle, version, config_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            jackpot.jackpot_id,
            jackpot.name,
            money::to_storage(jackpot.initial_amount),
            money::to_storage(jackpot.current_amount),
            jackpot.cycle,
            jackpot.version,
            jackpot.config.config_id,
        ],
    )?;
    Ok(())
}

fn load_config(conn: &Connection, config_id: &str) -> Result<JackpotConfig, EngineError> {
    let name: String = conn
        .query_row(
            "SELECT name FROM jackpot_configs WHERE config_id = ?1",
            [config_id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| {
            // A jackpot row always references a seeded config.
            EngineError::Integrity(format!("jackpot references missing config {config_id}"))
        })?;

    let mut stmt = conn.prepare(
        "SELECT entry_id, slot, policy_key, config_blob
         FROM config_entries WHERE config_id = ?1 ORDER BY entry_id",
    )?;
    let rows = stmt.query_map([config_id], |row| {
        let slot_text: String = row.get(1)?;
        let key_text: String = row.get(2)?;
        Ok(ConfigEntry {
            entry_id: row.get(0)?,
            config_id: config_id.to_string(),
            slot: Slot::parse(&slot_text)
                .ok_or_else(|| column_error(1, format!("unknown slot {slot_text}")))?,
            policy_key: PolicyKey::parse(&key_text)
                .ok_or_else(|| column_error(2, format!("unknown policy key {key_text}")))?,
            config_blob: row.get(3)?,
        })
    })?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }
    Ok(JackpotConfig {
        config_id: config_id.to_string(),
        name,
        entries,
    })
}
