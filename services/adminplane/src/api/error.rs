//! API error types and helpers.
//!
//! # Purpose and responsibility
//! Turns catalog errors and store failures into the uniform
//! `{"Version","Code","Message"}` error body.
//!
//! # Key invariants and assumptions
//! - The HTTP status always comes from the raised error, never from the
//!   handler.
//! - Internal errors log details server-side and return a generic message.
use crate::api::types::{API_VERSION, ErrorResponse};
use crate::store::StoreError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use lumen_schema::ConfigError;

/// Structured API error returned by handlers.
///
/// # What it does
/// Couples an HTTP status code with a JSON error body.
///
/// # Invariants
/// - `status` matches the category behind `body.code`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        api_config(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Config(err) => api_config(err),
            other => api_internal("configuration store failure", &other),
        }
    }
}

/// Build an error response from a catalog error.
///
/// # Errors
/// - Does not fail. An unusable status falls back to 400.
pub fn api_config(err: ConfigError) -> ApiError {
    let status = StatusCode::from_u16(err.status).unwrap_or(StatusCode::BAD_REQUEST);
    ApiError {
        status,
        body: ErrorResponse {
            version: API_VERSION.to_string(),
            code: err.code().to_string(),
            message: err.message,
        },
    }
}

/// Build a 500 Internal Server Error from a store error.
///
/// # What it does
/// Logs the store error and returns the generic internal catalog error.
///
/// # Errors
/// - Does not fail.
pub fn api_internal(message: &str, err: &StoreError) -> ApiError {
    tracing::error!(error = ?err, "admin plane storage error");
    api_config(ConfigError::internal(message))
}
