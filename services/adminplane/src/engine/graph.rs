//! Reference edges between configuration objects.
//!
//! # Purpose
//! Keeps the directed edge set derived from reference properties, indexed
//! both by source and by target so "who uses this object" is a single map
//! lookup.
//!
//! # Key invariants
//! - `incoming` is the exact inverse of `outgoing` after every mutation.
//! - Edges are rebuilt per object from its stored reference properties.
use crate::model::ObjectKey;
use lumen_schema::ObjectType;
use lumen_schema::normalize::stored_reference_names;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReferenceEdge {
    pub from: ObjectKey,
    pub property: &'static str,
    pub to: ObjectKey,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    outgoing: HashMap<ObjectKey, Vec<ReferenceEdge>>,
    incoming: HashMap<ObjectKey, BTreeSet<ReferenceEdge>>,
}

impl DependencyGraph {
    /// Edges implied by an object's stored reference properties.
    pub fn edges_for(
        object: &ObjectType,
        from: &ObjectKey,
        properties: &Map<String, Value>,
    ) -> Vec<ReferenceEdge> {
        let mut edges = Vec::new();
        for schema in object.reference_properties() {
            let Some((target, _)) = schema.reference_target() else {
                continue;
            };
            let Some(value) = properties.get(schema.name) else {
                continue;
            };
            for name in stored_reference_names(value) {
                edges.push(ReferenceEdge {
                    from: from.clone(),
                    property: schema.name,
                    to: ObjectKey::new(target, &name),
                });
            }
        }
        edges
    }

    pub fn replace_outgoing(&mut self, from: &ObjectKey, edges: Vec<ReferenceEdge>) {
        self.remove_outgoing(from);
        for edge in &edges {
            self.incoming
                .entry(edge.to.clone())
                .or_default()
                .insert(edge.clone());
        }
        if !edges.is_empty() {
            self.outgoing.insert(from.clone(), edges);
        }
    }

    pub fn remove_outgoing(&mut self, from: &ObjectKey) {
        let Some(edges) = self.outgoing.remove(from) else {
            return;
        };
        for edge in edges {
            if let Some(sources) = self.incoming.get_mut(&edge.to) {
                sources.remove(&edge);
                if sources.is_empty() {
                    self.incoming.remove(&edge.to);
                }
            }
        }
    }

    pub fn outgoing(&self, from: &ObjectKey) -> &[ReferenceEdge] {
        self.outgoing.get(from).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Edges pointing at `target`, in a stable order.
    pub fn dependents(&self, target: &ObjectKey) -> impl Iterator<Item = &ReferenceEdge> {
        self.incoming.get(target).into_iter().flatten()
    }
}
