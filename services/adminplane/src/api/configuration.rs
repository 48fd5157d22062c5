//! Configuration object API handlers.
//!
//! # Purpose
//! Reads render stored objects with defaults filled in and secrets masked.
//! Writes decode the body into a change batch and hand it to the store, which
//! applies it atomically.
use crate::api::error::ApiError;
use crate::api::types::{API_VERSION, AckResponse, ConfigDocument};
use crate::app::AppState;
use crate::engine::request::{ChangeBatch, ChangeEntry, parse_batch};
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use lumen_schema::{ConfigError, Registry};
use serde_json::{Map, Value};

fn envelope(object_type: &str, body: Value) -> Json<ConfigDocument> {
    let mut out = Map::new();
    out.insert("Version".to_string(), Value::String(API_VERSION.to_string()));
    out.insert(object_type.to_string(), body);
    Json(ConfigDocument(Value::Object(out)))
}

#[utoipa::path(
    get,
    path = "/v1/configuration/{Type}",
    tag = "configuration",
    params(("Type" = String, Path, description = "Object type")),
    responses(
        (status = 200, description = "All objects of the type, or the singleton body", body = ConfigDocument),
        (status = 400, description = "Unknown object type", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_type(
    Path(object_type): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ConfigDocument>, ApiError> {
    let body = state.store.read_type(&object_type).await?;
    Ok(envelope(&object_type, body))
}

#[utoipa::path(
    get,
    path = "/v1/configuration/{Type}/{Name}",
    tag = "configuration",
    params(
        ("Type" = String, Path, description = "Object type"),
        ("Name" = String, Path, description = "Object name")
    ),
    responses(
        (status = 200, description = "Single object", body = ConfigDocument),
        (status = 404, description = "Object not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_object(
    Path((object_type, name)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<ConfigDocument>, ApiError> {
    let body = state.store.read_object(&object_type, &name).await?;
    Ok(envelope(&object_type, body))
}

#[utoipa::path(
    post,
    path = "/v1/configuration",
    tag = "configuration",
    request_body(content = ConfigDocument, description = "Objects keyed by type, then by name"),
    responses(
        (status = 200, description = "Change applied", body = AckResponse),
        (status = 400, description = "Validation failure", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Delete not allowed", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Referenced object not found", body = crate::api::types::ErrorResponse)
    )
)]
/// Create, update or delete objects.
///
/// # What it does
/// Applies every object in the body as one transaction. A `null` instance
/// deletes it; a `null` property resets it to its default.
///
/// # Errors
/// - Returns the first catalog error met. Nothing is applied on error.
pub(crate) async fn post_configuration(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AckResponse>, ApiError> {
    let batch = parse_batch(Registry::global(), &body).map_err(rejected)?;
    apply(&state, batch).await
}

#[utoipa::path(
    delete,
    path = "/v1/configuration/{Type}/{Name}",
    tag = "configuration",
    params(
        ("Type" = String, Path, description = "Object type"),
        ("Name" = String, Path, description = "Object name")
    ),
    responses(
        (status = 200, description = "Object deleted", body = AckResponse),
        (status = 400, description = "Object still referenced", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Delete not allowed", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Object not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_object(
    Path((object_type, name)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<AckResponse>, ApiError> {
    let object = Registry::global()
        .lookup(&object_type)
        .ok_or_else(|| rejected(ConfigError::invalid_request(&object_type)))?;
    let batch = ChangeBatch::single(ChangeEntry::Delete {
        object_type: object.name,
        name,
    });
    apply(&state, batch).await
}

async fn apply(state: &AppState, batch: ChangeBatch) -> Result<Json<AckResponse>, ApiError> {
    let maintenance = state.supervisor.maintenance().await;
    let applied = state.store.apply(batch, maintenance).await?;
    Ok(Json(applied.acknowledgement().into()))
}

// Requests refused before reaching the store.
fn rejected(err: ConfigError) -> ApiError {
    tracing::debug!(code = err.code(), message = %err.message, "configuration request rejected");
    metrics::counter!("lumen_config_rejections_total", "code" => err.code()).increment(1);
    err.into()
}
