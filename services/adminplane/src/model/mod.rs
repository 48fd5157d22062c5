//! Stored configuration objects and change-feed payloads.
//!
//! # Purpose
//! Defines object identity, the stored object record and the change entries
//! recorded for every committed mutation.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use utoipa::ToSchema;

/// Identity of a configuration object: its type and name.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectKey {
    #[serde(rename = "Type")]
    pub object_type: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(object_type: &str, name: &str) -> Self {
        Self {
            object_type: object_type.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.object_type, self.name)
    }
}

/// A stored object. `properties` holds every stored property with its
/// effective value, defaults included.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigObject {
    pub key: ObjectKey,
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum ChangeOp {
    Created,
    Updated,
    Deleted,
}

impl ChangeOp {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeOp::Created => "created",
            ChangeOp::Updated => "updated",
            ChangeOp::Deleted => "deleted",
        }
    }
}

/// One committed object change as published on the change feed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConfigChange {
    pub seq: u64,
    pub op: ChangeOp,
    pub key: ObjectKey,
    /// Rendered object after the change, secrets masked. Absent for deletes.
    #[schema(value_type = Option<Object>)]
    pub object: Option<Value>,
    pub restart_required: bool,
}

/// An object as readers see it, used by snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RenderedObject {
    pub key: ObjectKey,
    #[schema(value_type = Object)]
    pub object: Value,
}
