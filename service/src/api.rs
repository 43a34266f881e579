//! HTTP handlers: bet submission and bet evaluation.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, info};

use jackpot_types::BetEvent;

use crate::App;

#[derive(Serialize)]
struct HealthzResponse {
    ok: bool,
}

pub async fn healthz() -> Response {
    Json(HealthzResponse { ok: true }).into_response()
}

/// Accept a bet and publish it to the bus. 202 means "queued", not
/// "persisted"; the contribution lands asynchronously.
pub async fn submit_bet(State(app): State<Arc<App>>, Json(event): Json<BetEvent>) -> Response {
    info!(
        bet_id = event.bet_id,
        jackpot_id = event.jackpot_id,
        user_id = event.user_id,
        amount = %event.bet_amount,
        "publishing bet event"
    );
    match app.bus.publish(event).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(err) => {
            error!(%err, "failed to publish bet event");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

/// Evaluate a bet. Non-winning outcomes are 200 responses with a zero
/// payout and a categorized message; only engine faults become 500s.
pub async fn evaluate(State(app): State<Arc<App>>, Path(bet_id): Path<i64>) -> Response {
    match app.evaluation.evaluate_and_reward(bet_id).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => {
            error!(bet_id, %err, "evaluation failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
