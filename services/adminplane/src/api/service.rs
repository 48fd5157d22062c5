//! Service API handlers: restart and status.
//!
//! # Purpose
//! Thin wrappers over the `ServiceSupervisor`. A restart request answers as
//! soon as it is queued; callers poll `/v1/service/status` until the server
//! leaves `Restarting`.
use crate::api::error::ApiError;
use crate::api::types::{API_VERSION, AckResponse, ServiceStatusResponse};
use crate::app::AppState;
use crate::service::RestartRequest;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use lumen_schema::{Acknowledgement, ConfigError};

#[utoipa::path(
    post,
    path = "/v1/service/restart",
    tag = "service",
    request_body(content = String, description = "{\"Service\":\"Server\"[,\"Maintenance\":\"start\"|\"stop\"]}"),
    responses(
        (status = 200, description = "Restart queued", body = AckResponse),
        (status = 400, description = "Invalid restart request", body = crate::api::types::ErrorResponse)
    )
)]
/// Restart the server, optionally entering or leaving maintenance mode.
///
/// # What it does
/// Validates the body, flips the server to `Restarting` and queues the
/// restart in the background.
///
/// # Errors
/// - Returns 400 for an unknown key or an invalid `Service`/`Maintenance`.
pub(crate) async fn restart(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AckResponse>, ApiError> {
    let request = RestartRequest::parse(&body)?;
    state.supervisor.restart(request).await;
    Ok(Json(Acknowledgement::Applied.into()))
}

#[utoipa::path(
    get,
    path = "/v1/service/status",
    tag = "service",
    responses(
        (status = 200, description = "Status of every component", body = ServiceStatusResponse)
    )
)]
pub(crate) async fn status(
    State(state): State<AppState>,
) -> Result<Json<ServiceStatusResponse>, ApiError> {
    let server = state.supervisor.server_status().await?;
    let cluster = state.supervisor.cluster_status().await;
    Ok(Json(ServiceStatusResponse {
        version: API_VERSION.to_string(),
        server: Some(server),
        cluster: Some(cluster),
    }))
}

#[utoipa::path(
    get,
    path = "/v1/service/status/{Component}",
    tag = "service",
    params(("Component" = String, Path, description = "`Server` or `Cluster`")),
    responses(
        (status = 200, description = "Status of one component", body = ServiceStatusResponse),
        (status = 400, description = "Unknown component", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn status_component(
    Path(component): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ServiceStatusResponse>, ApiError> {
    let mut response = ServiceStatusResponse {
        version: API_VERSION.to_string(),
        server: None,
        cluster: None,
    };
    if component.eq_ignore_ascii_case("server") {
        response.server = Some(state.supervisor.server_status().await?);
    } else if component.eq_ignore_ascii_case("cluster") {
        response.cluster = Some(state.supervisor.cluster_status().await);
    } else {
        return Err(ConfigError::invalid_request(&component).into());
    }
    Ok(Json(response))
}
