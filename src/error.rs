use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("driver {0} not found")]
    DriverNotFound(String),

    #[error("location {0} not found")]
    LocationNotFound(u64),

    #[error("trip {0} not found")]
    TripNotFound(String),

    #[error("cancellation {0} not found")]
    CancellationNotFound(Uuid),

    #[error("multiplier already active")]
    MultiplierAlreadyActive,

    #[error("driver {0} is not in go-home mode")]
    NotInGoHomeMode(String),

    #[error("not enough coins: need {required} coins for multiplier activation, have {available}")]
    InsufficientCoins { required: u32, available: u32 },

    #[error("daily average distance must be positive, got {0}")]
    InvalidDailyAverage(f64),

    #[error("{0} already processed")]
    AlreadyProcessed(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::DriverNotFound(_)
            | AppError::LocationNotFound(_)
            | AppError::TripNotFound(_)
            | AppError::CancellationNotFound(_) => StatusCode::NOT_FOUND,
            AppError::MultiplierAlreadyActive
            | AppError::NotInGoHomeMode(_)
            | AppError::AlreadyProcessed(_)
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InsufficientCoins { .. } | AppError::InvalidDailyAverage(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
