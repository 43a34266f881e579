//! Shared domain types for the jackpot engine.
//!
//! This crate holds the persistent entities (jackpots, configs,
//! contributions, rewards), the wire DTOs exchanged with the bet bus and
//! the HTTP surface, and the fixed-scale money arithmetic used by both.
//! It performs no I/O.

pub mod api;
pub mod model;
pub mod money;

pub use api::{BetEvent, EvalOutcome, EvaluateResponse};
pub use model::{ConfigEntry, Contribution, Jackpot, JackpotConfig, PolicyKey, Reward, Slot};
