use adminplane::app::{AppState, build_router};
use adminplane::store::StoreConfig;
use adminplane::store::memory::InMemoryStore;
use axum::body::Body;
use std::sync::Arc;
use std::time::Duration;

pub type TestApp = axum::routing::RouterIntoService<Body, ()>;

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub fn app() -> TestApp {
    let store = InMemoryStore::new(StoreConfig {
        changes_limit: adminplane::config::DEFAULT_CHANGES_LIMIT,
        change_retention: adminplane::config::DEFAULT_CHANGE_RETENTION,
    });
    let state = AppState::new("lumen-test", Arc::new(store), Duration::from_millis(20));
    build_router(state).into_service()
}
