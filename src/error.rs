use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("User already exists")]
    DuplicateAccount,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    InvalidInput(&'static str),

    #[error("Donation not found")]
    NotFound,

    #[error("Donation state does not allow this action")]
    InvalidTransition,

    #[error("Geocoding failed: {0}")]
    GeocodingFailed(String),

    #[error("Store error: {0}")]
    Store(#[from] mongodb::error::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::DuplicateAccount | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InvalidTransition => StatusCode::CONFLICT,
            AppError::GeocodingFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {self}");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
