//! Committed change feed handlers.
//!
//! # Purpose
//! Lets a broker supervisor follow committed configuration: take a snapshot
//! once, then poll `changes?since=<next_seq>`.
use crate::api::error::{ApiError, api_internal};
use crate::api::types::{ConfigChangesResponse, ConfigSnapshotResponse};
use crate::app::AppState;
use axum::Json;
use axum::extract::{Query, State};
use std::collections::HashMap;

#[utoipa::path(
    get,
    path = "/v1/configuration-changes/snapshot",
    tag = "changes",
    responses(
        (status = 200, description = "Every committed object", body = ConfigSnapshotResponse)
    )
)]
pub(crate) async fn config_snapshot(
    State(state): State<AppState>,
) -> Result<Json<ConfigSnapshotResponse>, ApiError> {
    let snapshot = state
        .store
        .snapshot()
        .await
        .map_err(|err| api_internal("failed to load configuration snapshot", &err))?;
    Ok(Json(ConfigSnapshotResponse {
        items: snapshot.items,
        next_seq: snapshot.next_seq,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/configuration-changes",
    tag = "changes",
    params(
        ("since" = Option<u64>, Query, description = "Last seen sequence")
    ),
    responses(
        (status = 200, description = "Committed change list", body = ConfigChangesResponse)
    )
)]
pub(crate) async fn config_changes(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Result<Json<ConfigChangesResponse>, ApiError> {
    let since = params
        .get("since")
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(0);
    let changes = state
        .store
        .changes(since)
        .await
        .map_err(|err| api_internal("failed to load configuration changes", &err))?;
    Ok(Json(ConfigChangesResponse {
        items: changes.items,
        next_seq: changes.next_seq,
    }))
}
