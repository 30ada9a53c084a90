use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::rest::{DateQuery, Page};
use crate::error::AppError;
use crate::models::daily_stat::{DailyStat, MultiplierActivation};
use crate::models::driver::Driver;
use crate::models::event::LedgerEvent;
use crate::models::recommendation::Recommendation;
use crate::state::AppState;
use crate::store::{DriverRepository, LocationRepository};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", post(create_driver).get(list_drivers))
        .route("/drivers/:id", get(get_driver).put(update_driver))
        .route("/drivers/:id/daily-stats", get(get_daily_stats))
        .route("/drivers/:id/reset-daily-stats", post(reset_daily_stats))
        .route("/drivers/:id/activate-multiplier", post(activate_multiplier))
        .route("/drivers/:id/activate-go-home", post(activate_go_home))
        .route(
            "/drivers/:id/go-home-recommendations",
            get(go_home_recommendations),
        )
}

#[derive(Deserialize)]
pub struct CreateDriverRequest {
    pub driver_id: String,
    pub name: String,
    #[serde(default)]
    pub experience_years: u32,
    pub rating: f64,
    pub home_location_id: u64,
    pub current_location_id: u64,
    pub daily_avg_distance_km: f64,
    #[serde(default)]
    pub ride_acceptance_rate: f64,
    #[serde(default)]
    pub cancellation_rate: f64,
    #[serde(default)]
    pub consecutive_target_days: u32,
}

#[derive(Deserialize)]
pub struct UpdateDriverRequest {
    pub name: Option<String>,
    pub experience_years: Option<u32>,
    pub rating: Option<f64>,
    pub home_location_id: Option<u64>,
    pub current_location_id: Option<u64>,
    pub daily_avg_distance_km: Option<f64>,
    pub ride_acceptance_rate: Option<f64>,
    pub cancellation_rate: Option<f64>,
    pub consecutive_target_days: Option<u32>,
}

#[derive(Serialize)]
pub struct RecommendationsResponse {
    pub driver_id: String,
    pub message: String,
    pub recommendations: Vec<Recommendation>,
}

async fn create_driver(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDriverRequest>,
) -> Result<Json<Driver>, AppError> {
    if payload.driver_id.trim().is_empty() {
        return Err(AppError::BadRequest("driver_id cannot be empty".to_string()));
    }

    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    if payload.daily_avg_distance_km <= 0.0 {
        return Err(AppError::InvalidDailyAverage(payload.daily_avg_distance_km));
    }

    require_locations(&state, &[payload.home_location_id, payload.current_location_id])?;

    let mut driver = Driver {
        id: payload.driver_id,
        name: payload.name,
        experience_years: payload.experience_years,
        rating: payload.rating.clamp(0.0, 5.0),
        home_location_id: payload.home_location_id,
        current_location_id: payload.current_location_id,
        daily_avg_distance_km: payload.daily_avg_distance_km,
        target_distance_60_percent: 0.0,
        target_distance_100_percent: 0.0,
        ride_acceptance_rate: payload.ride_acceptance_rate.clamp(0.0, 100.0),
        cancellation_rate: payload.cancellation_rate.clamp(0.0, 100.0),
        consecutive_target_days: payload.consecutive_target_days,
        created_at: Utc::now(),
    };
    driver.refresh_targets();

    state.store.insert_driver(driver.clone())?;
    info!(driver_id = %driver.id, "driver registered");
    Ok(Json(driver))
}

async fn list_drivers(
    State(state): State<Arc<AppState>>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Driver>>, AppError> {
    let drivers = state
        .store
        .drivers()?
        .into_iter()
        .skip(page.skip)
        .take(page.limit)
        .collect();
    Ok(Json(drivers))
}

async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Driver>, AppError> {
    let driver = state
        .store
        .driver(&id)?
        .ok_or(AppError::DriverNotFound(id))?;
    Ok(Json(driver))
}

async fn update_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateDriverRequest>,
) -> Result<Json<Driver>, AppError> {
    let mut driver = state
        .store
        .driver(&id)?
        .ok_or_else(|| AppError::DriverNotFound(id.clone()))?;

    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("name cannot be empty".to_string()));
        }
        driver.name = name;
    }

    let location_ids: Vec<u64> = [payload.home_location_id, payload.current_location_id]
        .into_iter()
        .flatten()
        .collect();
    require_locations(&state, &location_ids)?;

    if let Some(home) = payload.home_location_id {
        driver.home_location_id = home;
    }
    if let Some(current) = payload.current_location_id {
        driver.current_location_id = current;
    }
    if let Some(years) = payload.experience_years {
        driver.experience_years = years;
    }
    if let Some(rating) = payload.rating {
        driver.rating = rating.clamp(0.0, 5.0);
    }
    if let Some(rate) = payload.ride_acceptance_rate {
        driver.ride_acceptance_rate = rate.clamp(0.0, 100.0);
    }
    if let Some(rate) = payload.cancellation_rate {
        driver.cancellation_rate = rate.clamp(0.0, 100.0);
    }
    if let Some(days) = payload.consecutive_target_days {
        driver.consecutive_target_days = days;
    }
    if let Some(average) = payload.daily_avg_distance_km {
        if average <= 0.0 {
            return Err(AppError::InvalidDailyAverage(average));
        }
        driver.daily_avg_distance_km = average;
        driver.refresh_targets();
    }

    state.store.update_driver(driver.clone())?;
    info!(driver_id = %driver.id, "driver updated");
    Ok(Json(driver))
}

async fn get_daily_stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<Json<DailyStat>, AppError> {
    let stat = state.ledger.get_or_create_daily_stat(&id, query.or_today())?;
    Ok(Json(stat))
}

async fn reset_daily_stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<Json<DailyStat>, AppError> {
    let stat = state.ledger.reset_daily_stat(&id, query.or_today())?;
    Ok(Json(stat))
}

async fn activate_multiplier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MultiplierActivation>, AppError> {
    let now = Utc::now();
    let started = Instant::now();
    let outcome = state.ledger.activate_multiplier(&id, now.date_naive(), now);
    state
        .metrics
        .observe_latency("activate_multiplier", started, outcome.is_ok());

    let label = match &outcome {
        Ok(_) => "activated",
        Err(AppError::InsufficientCoins { .. }) => "insufficient_coins",
        Err(AppError::MultiplierAlreadyActive) => "already_active",
        Err(_) => "error",
    };
    state
        .metrics
        .multiplier_activations_total
        .with_label_values(&[label])
        .inc();

    let activation = outcome?;
    state.publish(LedgerEvent::MultiplierActivated(activation.clone()));
    Ok(Json(activation))
}

async fn activate_go_home(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DailyStat>, AppError> {
    let date = Utc::now().date_naive();
    let stat = state.ledger.activate_go_home(&id, date)?;

    state.publish(LedgerEvent::GoHomeActivated {
        driver_id: id,
        date,
    });
    Ok(Json(stat))
}

async fn go_home_recommendations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RecommendationsResponse>, AppError> {
    let now = Utc::now();
    let started = Instant::now();
    let outcome = state.ledger.recommend(&id, now.date_naive(), now);
    state
        .metrics
        .observe_latency("recommend", started, outcome.is_ok());

    let recommendations = outcome?;
    Ok(Json(RecommendationsResponse {
        message: format!(
            "Found {} potential trips for go-home",
            recommendations.len()
        ),
        driver_id: id,
        recommendations,
    }))
}

fn require_locations(state: &AppState, ids: &[u64]) -> Result<(), AppError> {
    for &id in ids {
        if state.store.location(id)?.is_none() {
            return Err(AppError::BadRequest(format!("location {id} does not exist")));
        }
    }
    Ok(())
}
