use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::api::rest::Page;
use crate::error::AppError;
use crate::models::location::Location;
use crate::state::AppState;
use crate::store::LocationRepository;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/locations", post(create_location).get(list_locations))
        .route("/locations/:id", get(get_location))
}

#[derive(Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

async fn create_location(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateLocationRequest>,
) -> Result<Json<Location>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    if !(-90.0..=90.0).contains(&payload.latitude) || !(-180.0..=180.0).contains(&payload.longitude) {
        return Err(AppError::BadRequest(
            "latitude/longitude out of range".to_string(),
        ));
    }

    let location = state
        .store
        .insert_location(payload.name, payload.latitude, payload.longitude)?;
    Ok(Json(location))
}

async fn list_locations(
    State(state): State<Arc<AppState>>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Location>>, AppError> {
    let locations = state
        .store
        .locations()?
        .into_iter()
        .skip(page.skip)
        .take(page.limit)
        .collect();
    Ok(Json(locations))
}

async fn get_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Location>, AppError> {
    let location = state
        .store
        .location(id)?
        .ok_or(AppError::LocationNotFound(id))?;
    Ok(Json(location))
}
