//! Evaluation pipeline: decides whether a bet wins its jackpot and
//! finalizes the win so exactly one bet wins a given cycle.
//!
//! The read path (idempotency, cycle fairness, the reward roll) runs
//! without the jackpot write lock; the lock is taken only once the roll
//! has already said "win", so evaluators contend only when a payout is
//! actually on the line. The cycle re-check and the rewards existence
//! check under the lock make the unlocked roll safe.

use jackpot_types::{Contribution, EvalOutcome, EvaluateResponse};
use rusqlite::Transaction;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

use crate::resolver::PolicyResolver;
use crate::store::{contributions, jackpots, rewards, Store};
use crate::EngineError;

/// Bounded wait for ingestion lag: the contribution may still be in
/// flight on the bus when the evaluation request arrives.
#[derive(Clone, Copy, Debug)]
pub struct AwaitSettings {
    /// Total time budget before giving up with `PENDING_INGESTION`.
    pub budget: Duration,
    /// First sleep between polls; doubles each round.
    pub initial_delay: Duration,
    /// Cap on a single sleep.
    pub max_delay: Duration,
}

impl Default for AwaitSettings {
    fn default() -> Self {
        Self {
            budget: Duration::from_millis(3000),
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(250),
        }
    }
}

/// Evaluates bets against their jackpot and finalizes wins.
pub struct EvaluationService {
    store: Arc<Store>,
    resolver: Arc<PolicyResolver>,
    await_settings: AwaitSettings,
}

impl EvaluationService {
    pub fn new(store: Arc<Store>, resolver: Arc<PolicyResolver>) -> Self {
        Self {
            store,
            resolver,
            await_settings: AwaitSettings::default(),
        }
    }

    /// Shrink or stretch the ingestion await. Tests use this to avoid
    /// sleeping through the full production budget.
    pub fn with_await_settings(mut self, settings: AwaitSettings) -> Self {
        self.await_settings = settings;
        self
    }

    /// Evaluate a bet; on a win, atomically create the cycle's single
    /// reward, mark the contribution winning, and reset the jackpot.
    ///
    /// Every recoverable outcome returns a `ZERO` response whose message
    /// prefix names the category; errors abort the transaction.
    pub async fn evaluate_and_reward(
        &self,
        bet_id: i64,
    ) -> Result<EvaluateResponse, EngineError> {
        if !self.await_contribution(bet_id).await? {
            info!(
                bet_id,
                budget_ms = self.await_settings.budget.as_millis() as u64,
                "contribution still absent after await"
            );
            return Ok(EvaluateResponse::zero(
                EvalOutcome::PendingIngestion,
                bet_id,
                None,
                None,
                "bet is still being ingested, retry shortly",
            ));
        }
        self.store.with_tx(|tx| self.evaluate_in_tx(tx, bet_id))
    }

    /// Poll until the contribution is visible or the budget runs out.
    /// Exponential backoff keeps early polls snappy without hammering the
    /// store for slow buses.
    async fn await_contribution(&self, bet_id: i64) -> Result<bool, EngineError> {
        let found = |store: &Store| {
            store.read(|conn| Ok(contributions::find_by_bet_id(conn, bet_id)?.is_some()))
        };
        if found(&self.store)? {
            return Ok(true);
        }
        let deadline = Instant::now() + self.await_settings.budget;
        let mut delay = self.await_settings.initial_delay;
        while Instant::now() < deadline {
            tokio::time::sleep(delay).await;
            if found(&self.store)? {
                info!(bet_id, "contribution appeared after await");
                return Ok(true);
            }
            delay = (delay * 2).min(self.await_settings.max_delay);
        }
        Ok(false)
    }

    fn evaluate_in_tx(
        &self,
        tx: &Transaction<'_>,
        bet_id: i64,
    ) -> Result<EvaluateResponse, EngineError> {
        // Re-read inside the transaction; the awaited row is the one the
        // decision must be based on.
        let Some(contribution) = contributions::find_by_bet_id(tx, bet_id)? else {
            return Ok(EvaluateResponse::zero(
                EvalOutcome::PendingIngestion,
                bet_id,
                None,
                None,
                "bet is still being ingested, retry shortly",
            ));
        };

        let jackpot_id = contribution.jackpot_id;
        let user_id = contribution.user_id;

        // Per-bet idempotency: winning is terminal, evaluated is one-way.
        if contribution.winning {
            return Ok(EvaluateResponse::zero(
                EvalOutcome::AlreadyRewarded,
                bet_id,
                Some(jackpot_id),
                Some(user_id),
                "bet was already rewarded for a previous win",
            ));
        }
        if contribution.evaluated {
            return Ok(EvaluateResponse::zero(
                EvalOutcome::AlreadyEvaluated,
                bet_id,
                Some(jackpot_id),
                Some(user_id),
                "bet was already evaluated before",
            ));
        }
        contributions::mark_evaluated(tx, contribution.contribution_id)?;

        let Some(jackpot) = jackpots::find_by_id_with_config(tx, jackpot_id)? else {
            info!(bet_id, jackpot_id, "jackpot missing at evaluation");
            return Ok(EvaluateResponse::zero(
                EvalOutcome::JackpotMissing,
                bet_id,
                Some(jackpot_id),
                Some(user_id),
                "jackpot not found",
            ));
        };

        // Cycle fairness before any lock: a stale snapshot means another
        // bet already won and reset this pool.
        if jackpot.cycle != contribution.cycle_snapshot {
            info!(
                bet_id,
                jackpot_id,
                contributed_cycle = contribution.cycle_snapshot,
                current_cycle = jackpot.cycle,
                "cycle closed before evaluation"
            );
            return Ok(EvaluateResponse::zero(
                EvalOutcome::CycleClosed,
                bet_id,
                Some(jackpot_id),
                Some(user_id),
                "cycle closed before evaluation; another bet already won",
            ));
        }

        // Roll against the unlocked read. Losing evaluators never touch
        // the lock at all.
        let formula = self.resolver.reward_for(&jackpot)?;
        if !formula.is_winner(&jackpot) {
            info!(bet_id, jackpot_id, user_id, "bet did not win");
            return Ok(EvaluateResponse::zero(
                EvalOutcome::Lose,
                bet_id,
                Some(jackpot_id),
                Some(user_id),
                "not a winning bet",
            ));
        }

        self.finalize_win_under_lock(tx, &contribution)
    }

    /// Short critical section for a winning roll: lock the jackpot row,
    /// re-validate fairness, and write the cycle's single reward.
    fn finalize_win_under_lock(
        &self,
        tx: &Transaction<'_>,
        contribution: &Contribution,
    ) -> Result<EvaluateResponse, EngineError> {
        let bet_id = contribution.bet_id;
        let jackpot_id = contribution.jackpot_id;
        let user_id = contribution.user_id;
        let contributed_cycle = contribution.cycle_snapshot;

        let Some(mut locked) = jackpots::find_by_id_for_update(tx, jackpot_id)? else {
            // The read path just saw it; only a concurrent teardown gets here.
            return Ok(EvaluateResponse::zero(
                EvalOutcome::JackpotMissingUnderLock,
                bet_id,
                Some(jackpot_id),
                Some(user_id),
                "jackpot not found under lock",
            ));
        };

        if locked.cycle != contributed_cycle {
            info!(
                bet_id,
                jackpot_id,
                contributed_cycle,
                current_cycle = locked.cycle,
                "cycle closed under lock; someone else won first"
            );
            return Ok(EvaluateResponse::zero(
                EvalOutcome::CycleClosed,
                bet_id,
                Some(jackpot_id),
                Some(user_id),
                "cycle closed before evaluation; someone else won first",
            ));
        }

        if rewards::exists_for_cycle(tx, jackpot_id, contributed_cycle)? {
            info!(
                bet_id,
                jackpot_id, contributed_cycle, "cycle already rewarded"
            );
            return Ok(EvaluateResponse::zero(
                EvalOutcome::CycleAlreadyRewarded,
                bet_id,
                Some(jackpot_id),
                Some(user_id),
                "cycle already has a winner",
            ));
        }

        let payout = locked.current_amount;
        rewards::insert(
            tx,
            &rewards::NewReward {
                bet_id,
                user_id,
                jackpot_id,
                amount: payout,
                cycle_at_win: contributed_cycle,
            },
        )?;
        contributions::mark_winning(tx, contribution.contribution_id)?;

        let before_cycle = locked.cycle;
        locked.reset_to_initial();
        jackpots::save(tx, &mut locked)?;

        info!(
            jackpot_id,
            bet_id,
            user_id,
            payout = %payout,
            cycle_before = before_cycle,
            cycle_after = locked.cycle,
            "jackpot won; pool reset to initial"
        );
        Ok(EvaluateResponse::win(bet_id, jackpot_id, user_id, payout))
    }
}
