//! Jackpot engine: contribution and evaluation pipelines over a SQLite
//! store, with policy-driven contribution and reward formulas.
//!
//! The engine is the coordination layer between the bet bus and the
//! persistence state of a jackpot:
//!
//! - [`contribute::ContributionService`] ingests bet events idempotently
//!   and grows the pool under optimistic concurrency.
//! - [`evaluate::EvaluationService`] decides whether a bet wins the pool
//!   and, on a win, finalizes pessimistically so exactly one bet wins a
//!   given cycle.
//!
//! The two pipelines never talk to each other directly; they coordinate
//! only through the jackpot row.

pub mod contribute;
pub mod evaluate;
pub mod params;
pub mod policy;
pub mod resolver;
pub mod seed;
pub mod store;

mod scenario_tests;

use jackpot_types::{PolicyKey, Slot};
use thiserror::Error;

/// Errors surfaced by the contribution and evaluation pipelines.
///
/// Everything here aborts the surrounding transaction. Recoverable
/// evaluation outcomes (pending ingestion, cycle fairness, lost rolls)
/// are not errors; they travel as `ZERO` responses instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{field} must be positive")]
    InvalidInput { field: &'static str },

    #[error("jackpot not found: id={0}")]
    JackpotNotFound(i64),

    /// A contribution formula produced a negative amount; operator or
    /// formula bug, never a caller error.
    #[error("computed negative contribution for bet_id={0}")]
    NegativeContribution(i64),

    #[error("no {slot} config entry for jackpot_id={jackpot_id}")]
    MissingConfigEntry { slot: Slot, jackpot_id: i64 },

    #[error("no {kind} formula registered for policy key {key}")]
    UnknownPolicyKey { kind: &'static str, key: PolicyKey },

    /// Optimistic update lost the version race; the bus redelivers.
    #[error("version conflict updating jackpot_id={0}")]
    VersionConflict(i64),

    /// A unique constraint fired where the algorithm proved it could not.
    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}
