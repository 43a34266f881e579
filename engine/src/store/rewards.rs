//! Reward repository. Unique `(jackpot_id, cycle_at_win)` is the hard
//! single-winner-per-cycle guarantee; unique `bet_id` backs per-bet
//! idempotency.

use jackpot_types::money;
use jackpot_types::Reward;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use crate::store::is_unique_violation;
use crate::EngineError;

pub struct NewReward {
    pub bet_id: i64,
    pub user_id: i64,
    pub jackpot_id: i64,
    pub amount: Decimal,
    pub cycle_at_win: i64,
}

pub fn exists_for_cycle(
    conn: &Connection,
    jackpot_id: i64,
    cycle: i64,
) -> Result<bool, EngineError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM jackpot_rewards WHERE jackpot_id = ?1 AND cycle_at_win = ?2",
        [jackpot_id, cycle],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Insert a reward. The finalizer checks `exists_for_cycle` first, so a
/// constraint failure here means the algorithm's proof was violated and
/// surfaces as an integrity error.
pub fn insert(conn: &Connection, new: &NewReward) -> Result<Reward, EngineError> {
    let inserted = conn.execute(
        "INSERT INTO jackpot_rewards (bet_id, user_id, jackpot_id, amount, cycle_at_win)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            new.bet_id,
            new.user_id,
            new.jackpot_id,
            money::to_storage(new.amount),
            new.cycle_at_win,
        ],
    );
    if let Err(err) = inserted {
        if is_unique_violation(&err) {
            return Err(EngineError::Integrity(format!(
                "reward already exists for jackpot_id={} cycle={} or bet_id={}",
                new.jackpot_id, new.cycle_at_win, new.bet_id
            )));
        }
        return Err(err.into());
    }
    Ok(Reward {
        reward_id: conn.last_insert_rowid(),
        bet_id: new.bet_id,
        user_id: new.user_id,
        jackpot_id: new.jackpot_id,
        amount: money::with_scale(new.amount, money::MONEY_SCALE),
        cycle_at_win: new.cycle_at_win,
    })
}
