//! Admin-plane HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures middleware, and defines the shared
//! application state injected into handlers.
use crate::api;
use crate::observability;
use crate::service::ServiceSupervisor;
use crate::store::ConfigStore;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;

#[derive(Clone)]
pub struct AppState {
    pub server_name: String,
    pub api_version: String,
    pub store: Arc<dyn ConfigStore>,
    pub supervisor: ServiceSupervisor,
}

impl AppState {
    /// State over `store` with a supervisor that restarts after `restart_delay`.
    pub fn new(
        server_name: impl Into<String>,
        store: Arc<dyn ConfigStore>,
        restart_delay: std::time::Duration,
    ) -> Self {
        Self {
            server_name: server_name.into(),
            api_version: api::types::API_VERSION.to_string(),
            supervisor: ServiceSupervisor::new(store.clone(), restart_delay),
            store,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    Router::new()
        .route(
            "/v1/system/info",
            axum::routing::get(api::system::system_info),
        )
        .route(
            "/v1/system/health",
            axum::routing::get(api::system::system_health),
        )
        .route(
            "/v1/configuration",
            axum::routing::post(api::configuration::post_configuration),
        )
        .route(
            "/v1/configuration/:object_type",
            axum::routing::get(api::configuration::get_type),
        )
        .route(
            "/v1/configuration/:object_type/:name",
            axum::routing::get(api::configuration::get_object)
                .delete(api::configuration::delete_object),
        )
        .route(
            "/v1/configuration-changes",
            axum::routing::get(api::changes::config_changes),
        )
        .route(
            "/v1/configuration-changes/snapshot",
            axum::routing::get(api::changes::config_snapshot),
        )
        .route(
            "/v1/service/restart",
            axum::routing::post(api::service::restart),
        )
        .route(
            "/v1/service/status",
            axum::routing::get(api::service::status),
        )
        .route(
            "/v1/service/status/:component",
            axum::routing::get(api::service::status_component),
        )
        .route(
            "/v1/openapi.json",
            axum::routing::get(api::openapi::openapi_json),
        )
        .layer(trace_layer)
        .with_state(state)
}
