//! HTTP surface and bet bus wiring around the jackpot engine.
//!
//! Bet submissions are accepted on the HTTP surface, published to an
//! in-process bus partitioned by `jackpot_id`, and drained into the
//! contribution pipeline with per-jackpot FIFO order. Evaluation
//! requests hit the engine synchronously.

pub mod api;
pub mod bus;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use jackpot_engine::evaluate::EvaluationService;

use crate::bus::BetBus;

/// Shared state behind the HTTP handlers.
pub struct App {
    pub bus: BetBus,
    pub evaluation: EvaluationService,
}

impl App {
    pub fn router(self: Arc<Self>) -> Router {
        Router::new()
            .route("/healthz", get(api::healthz))
            .route("/api/bets", post(api::submit_bet))
            .route("/api/evaluations/:bet_id", get(api::evaluate))
            .layer(TraceLayer::new_for_http())
            .with_state(self)
    }
}
