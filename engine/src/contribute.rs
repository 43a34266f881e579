//! Contribution pipeline: idempotent ingestion of bet events into a
//! jackpot pool.

use jackpot_types::BetEvent;
use jackpot_types::Contribution;
use rusqlite::Transaction;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

use crate::resolver::PolicyResolver;
use crate::store::contributions::{self, NewContribution};
use crate::store::{is_unique_violation, jackpots, Store};
use crate::EngineError;

/// Records bet contributions. Safe to call concurrently and to redeliver:
/// `bet_id` idempotency absorbs duplicates, and the optimistic pool
/// update turns write races into a retryable [`EngineError::VersionConflict`].
pub struct ContributionService {
    store: Arc<Store>,
    resolver: Arc<PolicyResolver>,
}

impl ContributionService {
    pub fn new(store: Arc<Store>, resolver: Arc<PolicyResolver>) -> Self {
        Self { store, resolver }
    }

    /// Record `event`'s contribution and grow the jackpot pool, all
    /// inside one transaction.
    ///
    /// Returns the existing row unchanged when the bet was already
    /// processed; in that case nothing else is touched.
    pub fn contribute(&self, event: &BetEvent) -> Result<Contribution, EngineError> {
        validate(event)?;
        self.store.with_tx(|tx| self.contribute_in_tx(tx, event))
    }

    fn contribute_in_tx(
        &self,
        tx: &Transaction<'_>,
        event: &BetEvent,
    ) -> Result<Contribution, EngineError> {
        if let Some(existing) = contributions::find_by_bet_id(tx, event.bet_id)? {
            warn!(
                bet_id = event.bet_id,
                contribution_id = existing.contribution_id,
                "bet already contributed; returning existing row"
            );
            return Ok(existing);
        }

        let mut jackpot = jackpots::find_by_id_with_config(tx, event.jackpot_id)?
            .ok_or(EngineError::JackpotNotFound(event.jackpot_id))?;

        let formula = self.resolver.contribution_for(&jackpot)?;
        let contribution_amount = formula.compute(event.bet_amount, &jackpot);
        if contribution_amount < Decimal::ZERO {
            return Err(EngineError::NegativeContribution(event.bet_id));
        }

        // Snapshot the pool and cycle BEFORE the update; evaluation's
        // fairness checks and the audit trail both hang off these.
        let pool_before = jackpot.current_amount;
        let cycle_snapshot = jackpot.cycle;

        let saved = insert_idempotent(
            tx,
            &NewContribution {
                bet_id: event.bet_id,
                user_id: event.user_id,
                jackpot_id: event.jackpot_id,
                stake_amount: event.bet_amount,
                contribution_amount,
                pool_snapshot: pool_before,
                cycle_snapshot,
            },
        )?;

        // Saved even when the contribution is zero, so every processed
        // bet advances the jackpot version uniformly.
        jackpot.current_amount = pool_before + contribution_amount;
        jackpots::save(tx, &mut jackpot)?;

        info!(
            bet_id = event.bet_id,
            jackpot_id = event.jackpot_id,
            user_id = event.user_id,
            stake = %event.bet_amount,
            contribution = %contribution_amount,
            pool_before = %pool_before,
            pool_after = %jackpot.current_amount,
            cycle = cycle_snapshot,
            "contribution processed"
        );
        Ok(saved)
    }
}

/// Insert the contribution row, recovering a concurrent duplicate: if the
/// unique `bet_id` constraint fires, re-read and return the winner's row;
/// anything else re-raises.
fn insert_idempotent(
    tx: &Transaction<'_>,
    new: &NewContribution,
) -> Result<Contribution, EngineError> {
    match contributions::insert(tx, new) {
        Ok(saved) => Ok(saved),
        Err(EngineError::Storage(err)) if is_unique_violation(&err) => {
            match contributions::find_by_bet_id(tx, new.bet_id)? {
                Some(duplicate) => {
                    warn!(
                        bet_id = new.bet_id,
                        contribution_id = duplicate.contribution_id,
                        "concurrent duplicate contribution; returning existing row"
                    );
                    Ok(duplicate)
                }
                None => Err(EngineError::Storage(err)),
            }
        }
        Err(err) => Err(err),
    }
}

fn validate(event: &BetEvent) -> Result<(), EngineError> {
    if event.bet_id <= 0 {
        return Err(EngineError::InvalidInput { field: "bet_id" });
    }
    if event.user_id <= 0 {
        return Err(EngineError::InvalidInput { field: "user_id" });
    }
    if event.jackpot_id <= 0 {
        return Err(EngineError::InvalidInput { field: "jackpot_id" });
    }
    if event.bet_amount <= Decimal::ZERO {
        return Err(EngineError::InvalidInput { field: "bet_amount" });
    }
    Ok(())
}
