use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use crate::error::AppError;
use crate::models::event::LedgerEvent;
use crate::models::trip::{TripIntent, TripOutcome, TripRecord, TripResult};
use crate::state::AppState;
use crate::store::{RecordFilter, TripRepository};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/trips", post(create_trip).get(list_trips))
        .route("/trips/:id", get(get_trip))
        .route("/trips/:id/process", post(process_recorded_trip))
        .route("/drivers/:id/trips", post(complete_trip))
}

#[derive(Deserialize)]
pub struct CreateTripRequest {
    pub driver_id: String,
    #[serde(flatten)]
    pub intent: TripIntent,
}

async fn create_trip(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateTripRequest>,
) -> Result<Json<TripRecord>, AppError> {
    let now = Utc::now();
    let record = state
        .ledger
        .record_trip(&payload.driver_id, payload.intent, now.date_naive(), now)?;
    Ok(Json(record))
}

async fn list_trips(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<RecordFilter>,
) -> Result<Json<Vec<TripRecord>>, AppError> {
    Ok(Json(state.store.trips(&filter)?))
}

async fn get_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TripRecord>, AppError> {
    let trip = state
        .store
        .trip(&id)?
        .ok_or(AppError::TripNotFound(id))?;
    Ok(Json(trip))
}

async fn process_recorded_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TripResult>, AppError> {
    let record = state
        .store
        .trip(&id)?
        .ok_or(AppError::TripNotFound(id))?;
    let result = process_and_publish(&state, &record.driver_id, &record.intent)?;
    Ok(Json(result))
}

/// Processes a completed trip in one call, without recording it first.
async fn complete_trip(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
    Json(intent): Json<TripIntent>,
) -> Result<Json<TripResult>, AppError> {
    let result = process_and_publish(&state, &driver_id, &intent)?;
    Ok(Json(result))
}

fn process_and_publish(
    state: &AppState,
    driver_id: &str,
    intent: &TripIntent,
) -> Result<TripResult, AppError> {
    let now = Utc::now();
    let started = Instant::now();
    let outcome = state
        .ledger
        .process_trip(driver_id, intent, now.date_naive(), now);
    state
        .metrics
        .observe_latency("process_trip", started, outcome.is_ok());

    let label = match &outcome {
        Ok(TripOutcome::Processed(_)) => "processed",
        Ok(TripOutcome::Replayed(_)) => "replayed",
        Err(_) => "error",
    };
    state
        .metrics
        .trips_processed_total
        .with_label_values(&[label])
        .inc();

    match outcome {
        Ok(TripOutcome::Processed(result)) => {
            state
                .metrics
                .coins_awarded_total
                .inc_by(u64::from(result.coins_earned + result.streak_bonus_earned));
            state.publish(LedgerEvent::TripProcessed(result.clone()));
            Ok(result)
        }
        Ok(TripOutcome::Replayed(result)) => Ok(result),
        Err(err) => {
            warn!(driver_id, trip_id = %intent.trip_id, error = %err, "trip processing failed");
            Err(err)
        }
    }
}
