//! Storage abstraction for the committed configuration.
//!
//! # Purpose
//! The API talks to a `ConfigStore` rather than to the engine directly. The
//! store serialises mutations, owns the change feed and publishes metrics.
use crate::engine::AppliedBatch;
use crate::engine::request::ChangeBatch;
use crate::model::{ConfigChange, RenderedObject};
use async_trait::async_trait;
use lumen_schema::ConfigError;
use serde_json::{Map, Value};
use thiserror::Error;

pub mod memory;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Max entries returned per change-feed poll.
    pub changes_limit: u64,
    /// Entries kept in the change log before the oldest are evicted.
    pub change_retention: usize,
}

impl StoreConfig {
    pub fn change_window(&self) -> usize {
        self.change_retention.max(self.changes_limit as usize)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            changes_limit: 100,
            change_retention: 1000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub items: Vec<T>,
    pub next_seq: u64,
}

#[derive(Debug, Clone)]
pub struct ChangeSet<T> {
    pub items: Vec<T>,
    pub next_seq: u64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn read_type(&self, object_type: &str) -> StoreResult<Value>;
    async fn read_object(&self, object_type: &str, name: &str) -> StoreResult<Value>;
    /// Apply a decoded request atomically. `maintenance` reflects the current
    /// server mode.
    async fn apply(&self, batch: ChangeBatch, maintenance: bool) -> StoreResult<AppliedBatch>;
    async fn snapshot(&self) -> StoreResult<Snapshot<RenderedObject>>;
    async fn changes(&self, since: u64) -> StoreResult<ChangeSet<ConfigChange>>;
    /// Stored (unmasked) properties of a singleton type.
    async fn singleton(&self, object_type: &str) -> StoreResult<Map<String, Value>>;
    async fn restart_pending(&self) -> StoreResult<bool>;
    async fn clear_restart_pending(&self) -> StoreResult<()>;

    async fn health_check(&self) -> StoreResult<()>;
    fn backend_name(&self) -> &'static str;
}
