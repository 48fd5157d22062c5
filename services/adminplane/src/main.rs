//! Lumen admin-plane HTTP service entry point.
//!
//! # Purpose
//! Wires configuration, the configuration store and the service supervisor
//! into the HTTP router, then serves the admin API and the metrics endpoint.
//!
//! # Notes
//! The `build_state` helper keeps wiring testable and minimizes main setup logic.
use adminplane::app::{AppState, build_router};
use adminplane::capability::{DefaultBindVerifier, StaticCertificateStore};
use adminplane::config::AdminPlaneConfig;
use adminplane::observability;
use adminplane::store::{ConfigStore, StoreConfig, memory::InMemoryStore};
use anyhow::Context;
use std::future::Future;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AdminPlaneConfig::from_env_or_yaml().context("admin plane config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: AdminPlaneConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("lumen-adminplane");
    let state = build_state(config.clone());
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = build_router(state.clone());

    let addr = config.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind admin listener {addr}"))?;
    tracing::info!(
        %addr,
        server = %state.server_name,
        backend = state.store.backend_name(),
        "admin plane listening"
    );
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result?;
        }
        _ = &mut shutdown => {
            tracing::info!("admin plane shutting down");
        }
    }

    metrics_task.abort();
    let _ = metrics_task.await;
    Ok(())
}

fn build_state(config: AdminPlaneConfig) -> AppState {
    let store_config = StoreConfig {
        changes_limit: config.changes_limit,
        change_retention: config.change_retention,
    };
    let store: Arc<dyn ConfigStore> = Arc::new(InMemoryStore::with_capabilities(
        store_config,
        Arc::new(StaticCertificateStore::new(config.certificates)),
        Arc::new(DefaultBindVerifier),
    ));
    AppState::new(config.server_name, store, config.restart_delay)
}
