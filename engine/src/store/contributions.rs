//! Contribution repository. One row per bet, enforced by the unique
//! `bet_id` constraint at the storage layer.

use jackpot_types::money;
use jackpot_types::Contribution;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::store::decimal_column;
use crate::EngineError;

/// Field set for a fresh contribution row; flags start cleared.
pub struct NewContribution {
    pub bet_id: i64,
    pub user_id: i64,
    pub jackpot_id: i64,
    pub stake_amount: Decimal,
    pub contribution_amount: Decimal,
    pub pool_snapshot: Decimal,
    pub cycle_snapshot: i64,
}

pub fn find_by_bet_id(
    conn: &Connection,
    bet_id: i64,
) -> Result<Option<Contribution>, EngineError> {
    let contribution = conn
        .query_row(
            "SELECT contribution_id, user_id, jackpot_id, stake_amount, contribution_amount,
                    pool_snapshot, cycle_snapshot, evaluated, winning
             FROM jackpot_contributions WHERE bet_id = ?1",
            [bet_id],
            |row| {
                Ok(Contribution {
                    contribution_id: row.get(0)?,
                    bet_id,
                    user_id: row.get(1)?,
                    jackpot_id: row.get(2)?,
                    stake_amount: decimal_column(row, 3)?,
                    contribution_amount: decimal_column(row, 4)?,
                    pool_snapshot: decimal_column(row, 5)?,
                    cycle_snapshot: row.get(6)?,
                    evaluated: row.get(7)?,
                    winning: row.get(8)?,
                })
            },
        )
        .optional()?;
    Ok(contribution)
}

/// Insert a contribution. A unique-constraint failure on `bet_id` is
/// returned untranslated so the contribution pipeline can recover it as
/// an idempotent duplicate.
pub fn insert(conn: &Connection, new: &NewContribution) -> Result<Contribution, EngineError> {
    conn.execute(
        "INSERT INTO jackpot_contributions
             (bet_id, user_id, jackpot_id, stake_amount, contribution_amount,
              pool_snapshot, cycle_snapshot, evaluated, winning)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, 0)",
        params![
            new.bet_id,
            new.user_id,
            new.jackpot_id,
            money::to_storage(new.stake_amount),
            money::to_storage(new.contribution_amount),
            money::to_storage(new.pool_snapshot),
            new.cycle_snapshot,
        ],
    )?;
    Ok(Contribution {
        contribution_id: conn.last_insert_rowid(),
        bet_id: new.bet_id,
        user_id: new.user_id,
        jackpot_id: new.jackpot_id,
        stake_amount: money::with_scale(new.stake_amount, money::MONEY_SCALE),
        contribution_amount: money::with_scale(new.contribution_amount, money::MONEY_SCALE),
        pool_snapshot: money::with_scale(new.pool_snapshot, money::MONEY_SCALE),
        cycle_snapshot: new.cycle_snapshot,
        evaluated: false,
        winning: false,
    })
}

/// Flip `evaluated`; one-way, set once per bet.
pub fn mark_evaluated(conn: &Connection, contribution_id: i64) -> Result<(), EngineError> {
    conn.execute(
        "UPDATE jackpot_contributions SET evaluated = 1 WHERE contribution_id = ?1",
        [contribution_id],
    )?;
    Ok(())
}

/// Flip `winning`; terminal state, set for at most one bet per cycle.
pub fn mark_winning(conn: &Connection, contribution_id: i64) -> Result<(), EngineError> {
    conn.execute(
        "UPDATE jackpot_contributions SET winning = 1 WHERE contribution_id = ?1",
        [contribution_id],
    )?;
    Ok(())
}
