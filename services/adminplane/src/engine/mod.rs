//! Configuration engine: the committed object set and its transaction applier.
//!
//! # Purpose
//! `ConfigSet` owns every stored object, the reference graph between them and
//! the restart-pending flag. A request is applied as one batch against a
//! staged copy. Only when every entry validates, every reference resolves and
//! no deleted object is still referenced is the staged copy swapped in.
//!
//! # Key invariants
//! - A failed batch leaves the set untouched.
//! - Singleton objects always exist, seeded with their defaults.
//! - After every commit, each reference edge points at an existing object.
//! - Updates to restart-classified properties of existing objects set the
//!   restart-pending flag; creations and deletions never do.
pub mod cluster;
pub mod graph;
pub mod request;
pub mod rules;

use crate::capability::{CertificateStore, LdapBindVerifier};
use crate::model::{ChangeOp, ConfigObject, ObjectKey, RenderedObject};
use cluster::{Transition, check_locked, state_of, transition};
use graph::DependencyGraph;
use lumen_schema::catalog::MAX_NAME_LEN;
use lumen_schema::normalize::{ignored_for_variant, render, resolve};
use lumen_schema::value::is_unset;
use lumen_schema::{
    Acknowledgement, Assignment, ConfigError, ConfigResult, ErrorKind, ObjectType, Registry,
    Subject, validate,
};
use request::{ChangeBatch, ChangeEntry};
use rules::RuleContext;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Per-request inputs that do not live in the object set.
pub struct ApplyContext<'a> {
    /// Server is running in maintenance mode.
    pub maintenance: bool,
    pub certificates: &'a dyn CertificateStore,
    pub binder: &'a dyn LdapBindVerifier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppliedChange {
    pub op: ChangeOp,
    pub key: ObjectKey,
    /// Rendered object after the change. `None` for deletes.
    pub object: Option<Value>,
    pub restart_required: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppliedBatch {
    pub changes: Vec<AppliedChange>,
    pub restart_required: bool,
}

impl AppliedBatch {
    pub fn acknowledgement(&self) -> Acknowledgement {
        if self.restart_required {
            Acknowledgement::RestartPending
        } else {
            Acknowledgement::Applied
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigSet {
    registry: &'static Registry,
    objects: BTreeMap<&'static str, BTreeMap<String, ConfigObject>>,
    graph: DependencyGraph,
    restart_pending: bool,
}

impl ConfigSet {
    pub fn new(registry: &'static Registry) -> Self {
        let mut objects = BTreeMap::new();
        for object in registry.types() {
            let mut instances = BTreeMap::new();
            if let Some(instance) = object.singleton {
                instances.insert(
                    instance.to_string(),
                    ConfigObject {
                        key: ObjectKey::new(object.name, instance),
                        properties: object.defaults(),
                    },
                );
            }
            objects.insert(object.name, instances);
        }
        Self {
            registry,
            objects,
            graph: DependencyGraph::default(),
            restart_pending: false,
        }
    }

    pub fn registry(&self) -> &'static Registry {
        self.registry
    }

    /// Resolve a type name from a request path.
    pub fn object_type(&self, object_type: &str) -> ConfigResult<&'static ObjectType> {
        self.registry
            .lookup(object_type)
            .ok_or_else(|| ConfigError::invalid_request(object_type))
    }

    /// Body of `GET /configuration/{Type}`: the singleton's properties, or
    /// every instance keyed by name.
    pub fn read_type(&self, object_type: &str) -> ConfigResult<Value> {
        let object = self.object_type(object_type)?;
        if object.is_singleton() {
            let stored = self
                .instances(object.name)
                .next()
                .map(|item| render(object, &item.properties))
                .unwrap_or_else(|| render(object, &object.defaults()));
            return Ok(Value::Object(stored));
        }
        let mut out = Map::new();
        for item in self.instances(object.name) {
            out.insert(
                item.key.name.clone(),
                Value::Object(render(object, &item.properties)),
            );
        }
        Ok(Value::Object(out))
    }

    /// Body of `GET /configuration/{Type}/{Name}`.
    pub fn read_object(&self, object_type: &str, name: &str) -> ConfigResult<Value> {
        let object = self.object_type(object_type)?;
        let item = self
            .get(object.name, name)
            .ok_or_else(|| ConfigError::not_found(object.name, name))?;
        let rendered = Value::Object(render(object, &item.properties));
        if object.is_singleton() {
            return Ok(rendered);
        }
        let mut out = Map::new();
        out.insert(item.key.name.clone(), rendered);
        Ok(Value::Object(out))
    }

    pub fn get(&self, object_type: &str, name: &str) -> Option<&ConfigObject> {
        self.objects
            .get(object_type)
            .and_then(|instances| instances.get(name))
    }

    /// Stored properties of a singleton type.
    pub fn singleton(&self, object_type: &str) -> Option<&Map<String, Value>> {
        let object = self.registry.lookup(object_type)?;
        let instance = object.singleton?;
        self.get(object.name, instance).map(|item| &item.properties)
    }

    pub fn instances(&self, object_type: &str) -> impl Iterator<Item = &ConfigObject> {
        self.objects
            .get(object_type)
            .into_iter()
            .flat_map(|instances| instances.values())
    }

    pub fn count(&self, object_type: &str) -> usize {
        self.objects.get(object_type).map_or(0, BTreeMap::len)
    }

    /// Every stored object rendered for readers, in type then name order.
    pub fn rendered(&self) -> Vec<RenderedObject> {
        let mut out = Vec::new();
        for object in self.registry.types() {
            for item in self.instances(object.name) {
                out.push(RenderedObject {
                    key: item.key.clone(),
                    object: Value::Object(render(object, &item.properties)),
                });
            }
        }
        out
    }

    pub fn restart_pending(&self) -> bool {
        self.restart_pending
    }

    pub fn clear_restart_pending(&mut self) {
        self.restart_pending = false;
    }

    /// Apply a batch atomically.
    ///
    /// # Errors
    /// Returns the first catalog error met. Entries are staged in request
    /// order; reference and in-use checks run once every entry is staged, so
    /// a batch may create an object together with the objects it references.
    pub fn apply(
        &mut self,
        batch: ChangeBatch,
        ctx: &ApplyContext<'_>,
    ) -> ConfigResult<AppliedBatch> {
        let mut staged = self.clone();
        let mut applied = AppliedBatch::default();
        let mut upserted = Vec::new();
        let mut deleted = Vec::new();

        for entry in batch.entries {
            let change = match entry {
                ChangeEntry::Upsert {
                    object_type,
                    name,
                    properties,
                } => {
                    let object = staged.object_type(object_type)?;
                    let change = staged.stage_upsert(object, name, properties, ctx)?;
                    if let Some(change) = &change {
                        upserted.push(change.key.clone());
                    }
                    change
                }
                ChangeEntry::Delete { object_type, name } => {
                    let object = staged.object_type(object_type)?;
                    let change = staged.stage_delete(object, &name)?;
                    deleted.push(change.key.clone());
                    Some(change)
                }
            };
            if let Some(change) = change {
                applied.restart_required |= change.restart_required;
                applied.changes.push(change);
            }
        }

        staged.check_references(&upserted)?;
        staged.check_unreferenced(&deleted)?;
        staged.restart_pending |= applied.restart_required;
        *self = staged;
        Ok(applied)
    }

    // Returns `None` when the merged object equals the stored one.
    fn stage_upsert(
        &mut self,
        object: &'static ObjectType,
        name: String,
        submitted: Map<String, Value>,
        ctx: &ApplyContext<'_>,
    ) -> ConfigResult<Option<AppliedChange>> {
        if !object.is_singleton() {
            check_name(object, &name)?;
        }
        let key = ObjectKey::new(object.name, &name);
        let existing = self.get(object.name, &name).map(|item| &item.properties);
        let is_new = existing.is_none();
        let before = existing.cloned().unwrap_or_else(|| object.defaults());

        let before_state = state_of(object, &before);
        let mut merged = if object.reset_on_empty && submitted.is_empty() {
            object.defaults()
        } else {
            before.clone()
        };
        let variant_active = object.variant.is_some_and(|variant| match submitted.get(variant) {
            Some(value) => !is_unset(value),
            None => merged.get(variant).is_some_and(|value| !is_unset(value)),
        });

        let subject = Subject::new(object, &name);
        let mut triggers = Vec::new();
        for (property, raw) in &submitted {
            if property == "Name" {
                if object.is_singleton() || raw.as_str() != Some(name.as_str()) {
                    return Err(ConfigError::new(ErrorKind::NameNotUpdatable, &[]));
                }
                continue;
            }
            let Some(schema) = object.property(property) else {
                return Err(ConfigError::new(
                    ErrorKind::UnknownProperty,
                    &[object.name, name.as_str(), property.as_str()],
                )
                .with_status(object.unknown_property_status));
            };
            if ignored_for_variant(schema, variant_active) {
                continue;
            }
            let assignment = validate(&subject, schema, raw)?;
            if schema.transient {
                if assignment == Assignment::Set(Value::Bool(true)) {
                    triggers.push(schema.name);
                }
                continue;
            }
            merged.insert(schema.name.to_string(), resolve(schema, assignment));
        }
        if variant_active {
            for schema in object.properties.iter().filter(|s| s.ignored_for_variant) {
                merged.insert(schema.name.to_string(), schema.default.clone());
            }
        }

        check_locked(object, &before, &merged, ctx.maintenance)?;

        if !object.is_singleton() {
            let missing = object.properties.iter().find(|schema| {
                schema.required && merged.get(schema.name).is_none_or(is_unset)
            });
            if let Some(schema) = missing {
                return Err(subject.required_error(schema, &Value::Null));
            }
        }

        rules::check(
            object,
            &merged,
            &triggers,
            &RuleContext {
                certificates: ctx.certificates,
                binder: ctx.binder,
            },
        )?;

        match transition(before_state, state_of(object, &merged)) {
            Transition::Enabling => tracing::info!(object = object.name, "activation requested"),
            Transition::Disabling => tracing::info!(object = object.name, "deactivation requested"),
            Transition::Unchanged => {}
        }

        if !is_new && merged == before {
            return Ok(None);
        }
        let restart_required = !is_new
            && object
                .properties
                .iter()
                .filter(|schema| schema.restart_required)
                .any(|schema| before.get(schema.name) != merged.get(schema.name));

        let edges = DependencyGraph::edges_for(object, &key, &merged);
        self.graph.replace_outgoing(&key, edges);
        let rendered = Value::Object(render(object, &merged));
        self.objects.entry(object.name).or_default().insert(
            name,
            ConfigObject {
                key: key.clone(),
                properties: merged,
            },
        );
        Ok(Some(AppliedChange {
            op: if is_new {
                ChangeOp::Created
            } else {
                ChangeOp::Updated
            },
            key,
            object: Some(rendered),
            restart_required,
        }))
    }

    fn stage_delete(&mut self, object: &'static ObjectType, name: &str) -> ConfigResult<AppliedChange> {
        if !object.deletable {
            return Err(ConfigError::new(ErrorKind::DeleteNotAllowed, &[object.name]));
        }
        let removed = self
            .objects
            .get_mut(object.name)
            .and_then(|instances| instances.remove(name))
            .ok_or_else(|| ConfigError::not_found(object.name, name))?;
        self.graph.remove_outgoing(&removed.key);
        Ok(AppliedChange {
            op: ChangeOp::Deleted,
            key: removed.key,
            object: None,
            restart_required: false,
        })
    }

    fn check_references(&self, upserted: &[ObjectKey]) -> ConfigResult<()> {
        for key in upserted {
            for edge in self.graph.outgoing(key) {
                if self.get(&edge.to.object_type, &edge.to.name).is_none() {
                    return Err(ConfigError::new(
                        ErrorKind::ReferenceNotFound,
                        &[
                            edge.to.object_type.as_str(),
                            edge.to.name.as_str(),
                            key.object_type.as_str(),
                            key.name.as_str(),
                        ],
                    ));
                }
            }
        }
        Ok(())
    }

    fn check_unreferenced(&self, deleted: &[ObjectKey]) -> ConfigResult<()> {
        for key in deleted {
            if self.get(&key.object_type, &key.name).is_some() {
                continue;
            }
            if let Some(edge) = self.graph.dependents(key).next() {
                return Err(ConfigError::new(
                    ErrorKind::InUse,
                    &[
                        edge.property,
                        key.name.as_str(),
                        edge.from.object_type.as_str(),
                        edge.from.name.as_str(),
                    ],
                ));
            }
        }
        Ok(())
    }
}

fn check_name(object: &ObjectType, name: &str) -> ConfigResult<()> {
    if name.trim().is_empty() || name.trim() != name || name.chars().any(char::is_control) {
        return Err(ConfigError::invalid_value("Name", name));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ConfigError::new(
            ErrorKind::NameTooLong,
            &[object.name, name],
        ));
    }
    Ok(())
}
