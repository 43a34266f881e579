//! Wire DTOs for the bet bus and the HTTP surface.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money;

/// A wager flowing from the HTTP surface over the bus into the
/// contribution pipeline. All ids and the amount must be strictly
/// positive; the engine validates before touching storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetEvent {
    pub bet_id: i64,
    pub user_id: i64,
    pub jackpot_id: i64,
    pub bet_amount: Decimal,
}

/// Category of an evaluation outcome.
///
/// The category is embedded as a stable prefix of
/// [`EvaluateResponse::message`] so clients can branch on it without a
/// separate field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvalOutcome {
    Win,
    /// Contribution not yet visible after the bounded await; retry later.
    PendingIngestion,
    AlreadyRewarded,
    AlreadyEvaluated,
    JackpotMissing,
    /// Jackpot vanished between the read path and the write lock.
    JackpotMissingUnderLock,
    /// The bet's cycle ended before evaluation; another bet already won.
    CycleClosed,
    /// A concurrent evaluator finalized this cycle first.
    CycleAlreadyRewarded,
    Lose,
}

impl EvalOutcome {
    pub fn prefix(&self) -> &'static str {
        match self {
            EvalOutcome::Win => "WIN",
            EvalOutcome::PendingIngestion => "PENDING_INGESTION",
            EvalOutcome::AlreadyRewarded => "ALREADY_REWARDED",
            EvalOutcome::AlreadyEvaluated => "ALREADY_EVALUATED",
            EvalOutcome::JackpotMissing => "JACKPOT_MISSING",
            EvalOutcome::JackpotMissingUnderLock => "JACKPOT_MISSING_UNDER_LOCK",
            EvalOutcome::CycleClosed => "CYCLE_CLOSED",
            EvalOutcome::CycleAlreadyRewarded => "CYCLE_ALREADY_REWARDED",
            EvalOutcome::Lose => "LOSE",
        }
    }
}

/// Result of evaluating a bet. `payout` is zero for every non-winning
/// outcome; `jackpot_id`/`user_id` are absent when the contribution was
/// never found.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    pub bet_id: i64,
    pub jackpot_id: Option<i64>,
    pub user_id: Option<i64>,
    pub payout: Decimal,
    pub message: String,
}

impl EvaluateResponse {
    pub fn zero(
        outcome: EvalOutcome,
        bet_id: i64,
        jackpot_id: Option<i64>,
        user_id: Option<i64>,
        detail: &str,
    ) -> Self {
        Self {
            bet_id,
            jackpot_id,
            user_id,
            payout: money::zero(money::MONEY_SCALE),
            message: format!("{}: {}", outcome.prefix(), detail),
        }
    }

    pub fn win(bet_id: i64, jackpot_id: i64, user_id: i64, payout: Decimal) -> Self {
        Self {
            bet_id,
            jackpot_id: Some(jackpot_id),
            user_id: Some(user_id),
            payout: money::with_scale(payout, money::MONEY_SCALE),
            message: format!(
                "{}: payout issued and jackpot reset",
                EvalOutcome::Win.prefix()
            ),
        }
    }

    /// The machine-parseable category prefix of the message.
    pub fn category(&self) -> &str {
        self.message
            .split_once(':')
            .map(|(prefix, _)| prefix)
            .unwrap_or(&self.message)
    }
}
