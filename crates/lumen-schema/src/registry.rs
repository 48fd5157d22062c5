//! Process-wide schema registry.
//!
//! # Purpose
//! Holds the object type tables, loaded once on first use and read-only
//! afterwards.
use crate::catalog;
use crate::schema::{ObjectType, PropertySchema};
use std::collections::HashMap;
use std::sync::OnceLock;

static GLOBAL: OnceLock<Registry> = OnceLock::new();

#[derive(Debug)]
pub struct Registry {
    types: Vec<ObjectType>,
    by_name: HashMap<&'static str, usize>,
}

impl Registry {
    pub fn new(types: Vec<ObjectType>) -> Self {
        let by_name = types
            .iter()
            .enumerate()
            .map(|(idx, object)| (object.name, idx))
            .collect();
        Self { types, by_name }
    }

    /// Registry holding the built-in object types.
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(|| Registry::new(catalog::builtin_types()))
    }

    pub fn lookup(&self, object_type: &str) -> Option<&ObjectType> {
        self.by_name
            .get(object_type)
            .and_then(|idx| self.types.get(*idx))
    }

    pub fn lookup_property(&self, object_type: &str, property: &str) -> Option<&PropertySchema> {
        self.lookup(object_type)
            .and_then(|object| object.property(property))
    }

    pub fn types(&self) -> impl Iterator<Item = &ObjectType> {
        self.types.iter()
    }

    pub fn singletons(&self) -> impl Iterator<Item = &ObjectType> {
        self.types.iter().filter(|object| object.is_singleton())
    }
}
