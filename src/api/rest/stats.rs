use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Json;
use axum::Router;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::rest::today;
use crate::engine::reports::{self, EarningsReport, LeaderboardEntry};
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats/driver-leaderboard", get(driver_leaderboard))
        .route("/stats/driver-earnings", get(driver_earnings))
}

#[derive(Deserialize)]
pub struct LeaderboardQuery {
    pub date: Option<NaiveDate>,
    #[serde(default = "default_leaderboard_limit")]
    pub limit: usize,
}

fn default_leaderboard_limit() -> usize {
    10
}

#[derive(Deserialize)]
pub struct EarningsQuery {
    pub driver_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

async fn driver_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let date = query.date.unwrap_or_else(today);
    let entries = reports::leaderboard(state.ledger.store().as_ref(), date, query.limit)?;
    Ok(Json(entries))
}

async fn driver_earnings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EarningsQuery>,
) -> Result<Json<EarningsReport>, AppError> {
    let report = reports::driver_earnings(
        state.ledger.store().as_ref(),
        &query.driver_id,
        query.start_date,
        query.end_date,
    )?;
    Ok(Json(report))
}
