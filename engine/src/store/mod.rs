//! SQLite-backed persistence for jackpots, contributions, and rewards.
//!
//! All shared state lives here; the services keep no in-process cache of
//! jackpot state. Uniqueness guarantees (`bet_id`, `(jackpot_id, cycle)`)
//! are enforced by the storage layer, not by the services.

pub mod contributions;
pub mod jackpots;
pub mod rewards;

use anyhow::Context;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use crate::EngineError;

const SCHEMA: &str = "PRAGMA journal_mode=WAL;
     PRAGMA foreign_keys=ON;
     CREATE TABLE IF NOT EXISTS jackpot_configs (
         config_id TEXT PRIMARY KEY,
         name TEXT NOT NULL
     );
     CREATE TABLE IF NOT EXISTS config_entries (
         entry_id INTEGER PRIMARY KEY AUTOINCREMENT,
         config_id TEXT NOT NULL REFERENCES jackpot_configs(config_id),
         slot TEXT NOT NULL,
         policy_key TEXT NOT NULL,
         config_blob TEXT NOT NULL,
         UNIQUE (config_id, slot)
     );
     CREATE TABLE IF NOT EXISTS jackpots (
         jackpot_id INTEGER PRIMARY KEY,
         name TEXT NOT NULL,
         initial_amount TEXT NOT NULL,
         current_amount TEXT NOT NULL,
         cycle INTEGER NOT NULL,
         version INTEGER NOT NULL,
         config_id TEXT NOT NULL REFERENCES jackpot_configs(config_id)
     );
     CREATE TABLE IF NOT EXISTS jackpot_contributions (
         contribution_id INTEGER PRIMARY KEY AUTOINCREMENT,
         bet_id INTEGER NOT NULL UNIQUE,
         user_id INTEGER NOT NULL,
         jackpot_id INTEGER NOT NULL,
         stake_amount TEXT NOT NULL,
         contribution_amount TEXT NOT NULL,
         pool_snapshot TEXT NOT NULL,
         cycle_snapshot INTEGER NOT NULL,
         evaluated INTEGER NOT NULL DEFAULT 0,
         winning INTEGER NOT NULL DEFAULT 0
     );
     CREATE TABLE IF NOT EXISTS jackpot_rewards (
         reward_id INTEGER PRIMARY KEY AUTOINCREMENT,
         bet_id INTEGER NOT NULL UNIQUE,
         user_id INTEGER NOT NULL,
         jackpot_id INTEGER NOT NULL,
         amount TEXT NOT NULL,
         cycle_at_win INTEGER NOT NULL,
         UNIQUE (jackpot_id, cycle_at_win)
     );";

/// Handle to the jackpot database.
///
/// Writers run inside [`Store::with_tx`], which begins an IMMEDIATE
/// transaction; under SQLite's single-writer model that transaction is
/// the pessimistic critical section the evaluation pipeline relies on.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path).context("open jackpot store")?;
        conn.execute_batch(SCHEMA).context("init jackpot store schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory jackpot store")?;
        conn.execute_batch(SCHEMA).context("init jackpot store schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` inside one write transaction. Commits on `Ok`, rolls back
    /// on `Err`.
    pub fn with_tx<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Run `f` against the connection without opening a write transaction.
    pub fn read<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let conn = self.lock();
        f(&conn)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("store mutex poisoned")
    }
}

/// Whether `error` is a unique-constraint (or primary-key) violation.
/// The contribution pipeline recovers from these; everywhere else they
/// are integrity failures.
pub fn is_unique_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

pub(crate) fn decimal_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
    })
}

pub(crate) fn column_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        message.into(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_tx_commits_on_ok() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_tx(|tx| {
                tx.execute(
                    "INSERT INTO jackpot_configs (config_id, name) VALUES ('a', 'A')",
                    [],
                )?;
                Ok(())
            })
            .unwrap();
        let count: i64 = store
            .read(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM jackpot_configs", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_with_tx_rolls_back_on_err() {
        let store = Store::open_in_memory().unwrap();
        let result: Result<(), EngineError> = store.with_tx(|tx| {
            tx.execute(
                "INSERT INTO jackpot_configs (config_id, name) VALUES ('a', 'A')",
                [],
            )?;
            Err(EngineError::Integrity("forced".to_string()))
        });
        assert!(result.is_err());
        let count: i64 = store
            .read(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM jackpot_configs", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_is_unique_violation_detects_duplicate() {
        let store = Store::open_in_memory().unwrap();
        let result: Result<(), EngineError> = store.with_tx(|tx| {
            tx.execute(
                "INSERT INTO jackpot_configs (config_id, name) VALUES ('a', 'A')",
                [],
            )?;
            tx.execute(
                "INSERT INTO jackpot_configs (config_id, name) VALUES ('a', 'B')",
                [],
            )?;
            Ok(())
        });
        match result {
            Err(EngineError::Storage(err)) => assert!(is_unique_violation(&err)),
            other => panic!("expected storage error, got {other:?}"),
        }
    }
}
