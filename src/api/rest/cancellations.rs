use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::routing::post;
use axum::Json;
use axum::Router;
use chrono::Utc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::cancellation::{CancellationIntent, CancellationRecord, CancellationResult};
use crate::models::event::LedgerEvent;
use crate::state::AppState;
use crate::store::{CancellationRepository, RecordFilter};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/cancellations",
            post(create_cancellation).get(list_cancellations),
        )
        .route("/cancellations/:id/process", post(process_recorded_cancellation))
        .route("/drivers/:id/cancellations", post(cancel_trip))
}

async fn create_cancellation(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CancellationIntent>,
) -> Result<Json<CancellationRecord>, AppError> {
    let now = Utc::now();
    let record = state
        .ledger
        .record_cancellation(payload, now.date_naive(), now)?;
    Ok(Json(record))
}

async fn list_cancellations(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<RecordFilter>,
) -> Result<Json<Vec<CancellationRecord>>, AppError> {
    Ok(Json(state.store.cancellations(&filter)?))
}

async fn process_recorded_cancellation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CancellationResult>, AppError> {
    let now = Utc::now();
    let started = Instant::now();
    let outcome = state
        .ledger
        .process_recorded_cancellation(id, now.date_naive(), now);
    state
        .metrics
        .observe_latency("process_cancellation", started, outcome.is_ok());

    let result = outcome?;
    publish_penalty(&state, &result);
    Ok(Json(result))
}

/// Records and penalizes a cancellation in one call.
async fn cancel_trip(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
    Json(payload): Json<CancellationIntent>,
) -> Result<Json<CancellationResult>, AppError> {
    let now = Utc::now();
    let started = Instant::now();
    let outcome = state
        .ledger
        .process_cancellation(&driver_id, payload, now.date_naive(), now);
    state
        .metrics
        .observe_latency("process_cancellation", started, outcome.is_ok());

    let result = outcome?;
    publish_penalty(&state, &result);
    Ok(Json(result))
}

fn publish_penalty(state: &AppState, result: &CancellationResult) {
    state
        .metrics
        .penalty_coins_total
        .inc_by(u64::from(result.penalty_coins));
    state.publish(LedgerEvent::CancellationProcessed(result.clone()));
}
