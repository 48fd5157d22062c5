//! In-memory configuration store.
//!
//! # Purpose
//! Holds the committed `ConfigSet` and its change log behind one
//! `tokio::sync::RwLock`. Every mutation takes the write lock for the whole
//! validate/check/commit sequence, so readers observe either the state before
//! a request or the state after it.
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - **Single writer**: requests are applied one at a time.
//!
//! # Change stream
//! Each committed object change is appended to a bounded log. Consumers poll
//! with a `since` checkpoint and fall back to `snapshot()` once they drop
//! behind the retention window.
use super::{ChangeSet, ConfigStore, Snapshot, StoreConfig, StoreError, StoreResult};
use crate::capability::{
    CertificateStore, DefaultBindVerifier, LdapBindVerifier, StaticCertificateStore,
};
use crate::engine::request::ChangeBatch;
use crate::engine::{AppliedBatch, ApplyContext, ConfigSet};
use crate::model::{ConfigChange, RenderedObject};
use async_trait::async_trait;
use lumen_schema::{ConfigError, Registry};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Bounded, append-only log keyed by a process-local sequence number.
#[derive(Debug)]
struct ChangeLog<T> {
    next_seq: u64,
    capacity: usize,
    items: VecDeque<T>,
}

impl<T> ChangeLog<T> {
    fn new(capacity: usize) -> Self {
        Self {
            next_seq: 0,
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    fn record(&mut self, item: impl FnOnce(u64) -> T) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.items.push_back(item(seq));
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
        seq
    }
}

struct State {
    config: ConfigSet,
    changes: ChangeLog<ConfigChange>,
}

pub struct InMemoryStore {
    config: StoreConfig,
    state: Arc<RwLock<State>>,
    certificates: Arc<dyn CertificateStore>,
    binder: Arc<dyn LdapBindVerifier>,
}

impl InMemoryStore {
    /// Store with no installed certificates and the syntactic bind verifier.
    pub fn new(config: StoreConfig) -> Self {
        Self::with_capabilities(
            config,
            Arc::new(StaticCertificateStore::default()),
            Arc::new(DefaultBindVerifier),
        )
    }

    pub fn with_capabilities(
        config: StoreConfig,
        certificates: Arc<dyn CertificateStore>,
        binder: Arc<dyn LdapBindVerifier>,
    ) -> Self {
        let capacity = config.change_window();
        let state = State {
            config: ConfigSet::new(Registry::global()),
            changes: ChangeLog::new(capacity),
        };
        publish_gauges(&state.config);
        Self {
            config,
            state: Arc::new(RwLock::new(state)),
            certificates,
            binder,
        }
    }

    fn limit(&self) -> usize {
        self.config.changes_limit as usize
    }
}

fn publish_gauges(config: &ConfigSet) {
    for object in config.registry().types() {
        metrics::gauge!("lumen_config_objects", "type" => object.name)
            .set(config.count(object.name) as f64);
    }
    metrics::gauge!("lumen_restart_pending").set(if config.restart_pending() {
        1.0
    } else {
        0.0
    });
}

#[async_trait]
impl ConfigStore for InMemoryStore {
    async fn read_type(&self, object_type: &str) -> StoreResult<Value> {
        Ok(self.state.read().await.config.read_type(object_type)?)
    }

    async fn read_object(&self, object_type: &str, name: &str) -> StoreResult<Value> {
        Ok(self
            .state
            .read()
            .await
            .config
            .read_object(object_type, name)?)
    }

    async fn apply(&self, batch: ChangeBatch, maintenance: bool) -> StoreResult<AppliedBatch> {
        let mut state = self.state.write().await;
        let ctx = ApplyContext {
            maintenance,
            certificates: self.certificates.as_ref(),
            binder: self.binder.as_ref(),
        };
        let applied = match state.config.apply(batch, &ctx) {
            Ok(applied) => applied,
            Err(err) => {
                tracing::debug!(code = err.code(), message = %err.message, "configuration change rejected");
                metrics::counter!("lumen_config_rejections_total", "code" => err.code())
                    .increment(1);
                return Err(StoreError::Config(err));
            }
        };

        for change in &applied.changes {
            let seq = state.changes.record(|seq| ConfigChange {
                seq,
                op: change.op,
                key: change.key.clone(),
                object: change.object.clone(),
                restart_required: change.restart_required,
            });
            tracing::info!(
                seq,
                op = change.op.as_str(),
                object = %change.key,
                restart_required = change.restart_required,
                "configuration change committed"
            );
            metrics::counter!("lumen_config_changes_total", "op" => change.op.as_str())
                .increment(1);
        }
        publish_gauges(&state.config);
        Ok(applied)
    }

    async fn snapshot(&self) -> StoreResult<Snapshot<RenderedObject>> {
        let state = self.state.read().await;
        Ok(Snapshot {
            items: state.config.rendered(),
            next_seq: state.changes.next_seq,
        })
    }

    async fn changes(&self, since: u64) -> StoreResult<ChangeSet<ConfigChange>> {
        let state = self.state.read().await;
        let items = state
            .changes
            .items
            .iter()
            .filter(|item| item.seq >= since)
            .take(self.limit())
            .cloned()
            .collect();
        Ok(ChangeSet {
            items,
            next_seq: state.changes.next_seq,
        })
    }

    async fn singleton(&self, object_type: &str) -> StoreResult<Map<String, Value>> {
        let state = self.state.read().await;
        state
            .config
            .singleton(object_type)
            .cloned()
            .ok_or_else(|| StoreError::Config(ConfigError::invalid_request(object_type)))
    }

    async fn restart_pending(&self) -> StoreResult<bool> {
        Ok(self.state.read().await.config.restart_pending())
    }

    async fn clear_restart_pending(&self) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.config.clear_restart_pending();
        publish_gauges(&state.config);
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
