//! OpenAPI schema aggregation for the admin-plane API.
//!
//! # Purpose
//! Collects all routes and schema types into a single OpenAPI document,
//! served as JSON for client generation.
use crate::api::{
    changes, configuration, service, system,
    types::{
        AckResponse, ConfigChangesResponse, ConfigDocument, ConfigSnapshotResponse,
        ErrorResponse, HealthStatus, ServiceStatusResponse, SystemInfo,
    },
};
use crate::model::{ChangeOp, ConfigChange, ObjectKey, RenderedObject};
use crate::service::{ClusterStatus, ServerState, ServerStatus};
use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "lumen-adminplane",
        version = "v1",
        description = "Lumen messaging server configuration API"
    ),
    paths(
        system::system_info,
        system::system_health,
        configuration::get_type,
        configuration::get_object,
        configuration::post_configuration,
        configuration::delete_object,
        service::restart,
        service::status,
        service::status_component,
        changes::config_snapshot,
        changes::config_changes
    ),
    components(schemas(
        SystemInfo,
        HealthStatus,
        ErrorResponse,
        AckResponse,
        ConfigDocument,
        ServiceStatusResponse,
        ServerStatus,
        ServerState,
        ClusterStatus,
        ConfigSnapshotResponse,
        ConfigChangesResponse,
        ConfigChange,
        ChangeOp,
        ObjectKey,
        RenderedObject
    )),
    tags(
        (name = "system", description = "System and discovery endpoints"),
        (name = "configuration", description = "Configuration objects"),
        (name = "service", description = "Server restart and status"),
        (name = "changes", description = "Committed configuration change feed")
    )
)]
pub struct ApiDoc;

pub(crate) async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
