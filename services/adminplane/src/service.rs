//! Server process supervisor: restart and status reporting.
//!
//! # Purpose
//! Models the messaging server the configuration belongs to. A restart
//! request flips the server to `Restarting` and returns at once; a background
//! task then applies the committed configuration as the new running
//! configuration, clears the restart-pending flag and settles in `Running` or
//! `Maintenance`. Callers poll `status` to see the restart finish.
//!
//! # Key invariants
//! - Restarts run one at a time, in request order.
//! - The server only leaves `Restarting` once no restart is queued.
//! - Maintenance mode persists across restarts unless a request changes it.
use crate::store::{ConfigStore, StoreResult};
use lumen_schema::catalog::CLUSTER_MEMBERSHIP;
use lumen_schema::value::shown;
use lumen_schema::{ConfigError, ConfigResult, ErrorKind, Registry};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum ServerState {
    Running,
    Maintenance,
    Restarting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceChange {
    Start,
    Stop,
}

/// Decoded `POST /service/restart` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartRequest {
    pub maintenance: Option<MaintenanceChange>,
}

impl RestartRequest {
    /// Parse a restart body: `{"Service":"Server"[,"Maintenance":"start"|"stop"]}`.
    pub fn parse(body: &[u8]) -> ConfigResult<Self> {
        let root: Value = serde_json::from_slice(body).map_err(|err| {
            ConfigError::new(ErrorKind::MalformedBody, &[err.to_string().as_str()])
        })?;
        let Value::Object(fields) = root else {
            return Err(ConfigError::invalid_request(&root.to_string()));
        };
        if let Some(key) = fields
            .keys()
            .find(|key| !matches!(key.as_str(), "Service" | "Maintenance"))
        {
            return Err(ConfigError::new(
                ErrorKind::UnknownProperty,
                &["Service", "restart", key.as_str()],
            ));
        }
        match fields.get("Service") {
            None | Some(Value::Null) => return Err(ConfigError::required("Service")),
            Some(Value::String(service)) if service.eq_ignore_ascii_case("server") => {}
            Some(other) => return Err(ConfigError::invalid_value("Service", &shown(other))),
        }
        let maintenance = match fields.get("Maintenance") {
            None | Some(Value::Null) => None,
            Some(Value::String(mode)) if mode.eq_ignore_ascii_case("start") => {
                Some(MaintenanceChange::Start)
            }
            Some(Value::String(mode)) if mode.eq_ignore_ascii_case("stop") => {
                Some(MaintenanceChange::Stop)
            }
            Some(other) => return Err(ConfigError::invalid_value("Maintenance", &shown(other))),
        };
        Ok(Self { maintenance })
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ServerStatus {
    pub status: ServerState,
    pub restart_required: bool,
    pub up_time_seconds: u64,
    pub error_code: u32,
    pub error_message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ClusterStatus {
    /// `Active` or `Inactive`.
    pub status: String,
    pub enabled: bool,
    pub name: String,
}

struct Inner {
    state: ServerState,
    maintenance: bool,
    queued: u32,
    started: Instant,
    /// ClusterMembership properties as of the last restart.
    running_cluster: Map<String, Value>,
}

#[derive(Clone)]
pub struct ServiceSupervisor {
    store: Arc<dyn ConfigStore>,
    inner: Arc<RwLock<Inner>>,
    restart_lock: Arc<Mutex<()>>,
    restart_delay: Duration,
}

impl ServiceSupervisor {
    pub fn new(store: Arc<dyn ConfigStore>, restart_delay: Duration) -> Self {
        let running_cluster = Registry::global()
            .lookup(CLUSTER_MEMBERSHIP)
            .map(|object| object.defaults())
            .unwrap_or_default();
        Self {
            store,
            inner: Arc::new(RwLock::new(Inner {
                state: ServerState::Running,
                maintenance: false,
                queued: 0,
                started: Instant::now(),
                running_cluster,
            })),
            restart_lock: Arc::new(Mutex::new(())),
            restart_delay,
        }
    }

    pub async fn maintenance(&self) -> bool {
        self.inner.read().await.maintenance
    }

    pub async fn state(&self) -> ServerState {
        self.inner.read().await.state
    }

    /// Queue a restart and return immediately.
    pub async fn restart(&self, request: RestartRequest) {
        {
            let mut inner = self.inner.write().await;
            inner.state = ServerState::Restarting;
            inner.queued += 1;
        }
        metrics::counter!("lumen_restarts_total").increment(1);
        tracing::info!(maintenance = ?request.maintenance, "server restart requested");
        let supervisor = self.clone();
        tokio::spawn(async move { supervisor.run_restart(request).await });
    }

    async fn run_restart(&self, request: RestartRequest) {
        let _serial = self.restart_lock.lock().await;
        tokio::time::sleep(self.restart_delay).await;

        if let Err(err) = self.store.clear_restart_pending().await {
            tracing::error!(error = %err, "failed to clear restart-pending flag");
        }
        let running_cluster = match self.store.singleton(CLUSTER_MEMBERSHIP).await {
            Ok(properties) => Some(properties),
            Err(err) => {
                tracing::error!(error = %err, "failed to read cluster membership");
                None
            }
        };

        let mut inner = self.inner.write().await;
        match request.maintenance {
            Some(MaintenanceChange::Start) => inner.maintenance = true,
            Some(MaintenanceChange::Stop) => inner.maintenance = false,
            None => {}
        }
        if let Some(properties) = running_cluster {
            inner.running_cluster = properties;
        }
        inner.started = Instant::now();
        inner.queued = inner.queued.saturating_sub(1);
        if inner.queued == 0 {
            inner.state = if inner.maintenance {
                ServerState::Maintenance
            } else {
                ServerState::Running
            };
        }
        tracing::info!(state = ?inner.state, "server restart completed");
    }

    pub async fn server_status(&self) -> StoreResult<ServerStatus> {
        let restart_required = self.store.restart_pending().await?;
        let inner = self.inner.read().await;
        Ok(ServerStatus {
            status: inner.state,
            restart_required,
            up_time_seconds: inner.started.elapsed().as_secs(),
            error_code: 0,
            error_message: String::new(),
        })
    }

    pub async fn cluster_status(&self) -> ClusterStatus {
        let inner = self.inner.read().await;
        let enabled = inner
            .running_cluster
            .get("EnableClusterMembership")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let name = inner
            .running_cluster
            .get("ClusterName")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let active = enabled && inner.state == ServerState::Running;
        ClusterStatus {
            status: if active { "Active" } else { "Inactive" }.to_string(),
            enabled,
            name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::request::parse_batch;
    use crate::store::StoreConfig;
    use crate::store::memory::InMemoryStore;
    use serde_json::json;

    fn supervisor() -> (ServiceSupervisor, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new(StoreConfig::default()));
        let supervisor = ServiceSupervisor::new(store.clone(), Duration::from_millis(20));
        (supervisor, store)
    }

    async fn wait_for(supervisor: &ServiceSupervisor, state: ServerState) {
        for _ in 0..100 {
            if supervisor.state().await == state {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("server never reached {state:?}");
    }

    #[test]
    fn restart_body_validation() {
        assert_eq!(
            RestartRequest::parse(br#"{"Service":"Server"}"#).expect("plain"),
            RestartRequest { maintenance: None }
        );
        assert_eq!(
            RestartRequest::parse(br#"{"Service":"Server","Maintenance":"start"}"#)
                .expect("maintenance")
                .maintenance,
            Some(MaintenanceChange::Start)
        );
        let err = RestartRequest::parse(br#"{}"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RequiredMissing);
        let err = RestartRequest::parse(br#"{"Service":"Broker"}"#).unwrap_err();
        assert_eq!(
            err.message,
            "The property value is not valid: Property: Service Value: \"Broker\"."
        );
        let err = RestartRequest::parse(br#"{"Service":"Server","Maintenance":true}"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidValue);
        let err = RestartRequest::parse(br#"{"Service":"Server","Force":true}"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownProperty);
    }

    #[tokio::test]
    async fn restart_clears_pending_and_enters_maintenance() {
        let (supervisor, store) = supervisor();
        let batch = parse_batch(
            Registry::global(),
            br#"{"ClusterMembership":{"ControlPort":9300}}"#,
        )
        .expect("batch");
        store.apply(batch, false).await.expect("apply");
        assert!(supervisor.server_status().await.expect("status").restart_required);

        supervisor
            .restart(RestartRequest {
                maintenance: Some(MaintenanceChange::Start),
            })
            .await;
        assert_eq!(supervisor.state().await, ServerState::Restarting);
        wait_for(&supervisor, ServerState::Maintenance).await;

        let status = supervisor.server_status().await.expect("status");
        assert!(!status.restart_required);
        assert!(supervisor.maintenance().await);

        supervisor.restart(RestartRequest { maintenance: None }).await;
        wait_for(&supervisor, ServerState::Maintenance).await;
        supervisor
            .restart(RestartRequest {
                maintenance: Some(MaintenanceChange::Stop),
            })
            .await;
        wait_for(&supervisor, ServerState::Running).await;
    }

    #[tokio::test]
    async fn cluster_status_follows_running_config() {
        let (supervisor, store) = supervisor();
        let body = json!({"ClusterMembership": {
            "EnableClusterMembership": true,
            "ClusterName": "c1",
            "ControlAddress": "10.0.0.1"
        }});
        let batch =
            parse_batch(Registry::global(), body.to_string().as_bytes()).expect("batch");
        store.apply(batch, false).await.expect("enable");

        let status = supervisor.cluster_status().await;
        assert_eq!(status.status, "Inactive");
        assert!(!status.enabled);

        supervisor.restart(RestartRequest { maintenance: None }).await;
        wait_for(&supervisor, ServerState::Running).await;
        let status = supervisor.cluster_status().await;
        assert_eq!(status.status, "Active");
        assert_eq!(status.name, "c1");
    }
}
