//! HTTP API request/response types.
//!
//! # Purpose
//! Payload shapes shared by the admin-plane handlers and the OpenAPI document.
//! Configuration bodies are dynamic JSON keyed by object type, so only the
//! fixed envelopes are typed here.
use crate::model::{ConfigChange, RenderedObject};
use crate::service::{ClusterStatus, ServerStatus};
use lumen_schema::Acknowledgement;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

pub const API_VERSION: &str = "v1";

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorResponse {
    pub version: String,
    pub code: String,
    pub message: String,
}

/// A configuration document: objects keyed by type, then by name. Singleton
/// types carry their properties directly under the type.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[schema(value_type = Object)]
pub struct ConfigDocument(pub Value);

/// Success envelope for mutating calls.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct AckResponse {
    pub version: String,
    pub code: String,
    pub message: String,
}

impl From<Acknowledgement> for AckResponse {
    fn from(ack: Acknowledgement) -> Self {
        Self {
            version: API_VERSION.to_string(),
            code: ack.code().to_string(),
            message: ack.message().to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceStatusResponse {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ClusterStatus>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct SystemInfo {
    pub server_name: String,
    pub api_version: String,
    pub backend: String,
    pub restart_required: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ConfigSnapshotResponse {
    pub items: Vec<RenderedObject>,
    pub next_seq: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ConfigChangesResponse {
    pub items: Vec<ConfigChange>,
    pub next_seq: u64,
}
