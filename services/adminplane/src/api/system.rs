//! System/health API handlers.
//!
//! # Purpose and responsibility
//! Lightweight endpoints for service metadata and health checks.
//!
//! # Key invariants and assumptions
//! - Health checks are fast and side-effect free.
use crate::api::error::{ApiError, api_internal};
use crate::api::types::{HealthStatus, SystemInfo};
use crate::app::AppState;
use axum::Json;
use axum::extract::State;

#[utoipa::path(
    get,
    path = "/v1/system/info",
    tag = "system",
    responses(
        (status = 200, description = "Server identity and pending restart flag", body = SystemInfo)
    )
)]
/// Return admin-plane identity.
///
/// # What it does
/// Exposes the server name, API version, store backend and whether committed
/// changes are waiting for a restart.
///
/// # Errors
/// - Returns 500 if the store cannot be read.
pub(crate) async fn system_info(
    State(state): State<AppState>,
) -> Result<Json<SystemInfo>, ApiError> {
    let restart_required = state
        .store
        .restart_pending()
        .await
        .map_err(|err| api_internal("failed to read restart state", &err))?;
    Ok(Json(SystemInfo {
        server_name: state.server_name.clone(),
        api_version: state.api_version.clone(),
        backend: state.store.backend_name().to_string(),
        restart_required,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/system/health",
    tag = "system",
    responses(
        (status = 200, description = "Admin plane health", body = HealthStatus)
    )
)]
/// Return admin-plane health status.
///
/// # Errors
/// - Returns 500 if the store health check fails.
pub(crate) async fn system_health(
    State(state): State<AppState>,
) -> Result<Json<HealthStatus>, ApiError> {
    if let Err(err) = state.store.health_check().await {
        return Err(api_internal("storage unavailable", &err));
    }
    Ok(Json(HealthStatus {
        status: "ok".to_string(),
    }))
}
