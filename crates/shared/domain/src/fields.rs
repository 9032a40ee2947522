//! Field tables for patching entities from loosely typed key/value data.
//!
//! Each entity type registers, once, a table mapping field names to typed
//! setters. Lookup checks the fields declared on the entity itself first and
//! then the fields of its embedded parent record. Keys found in neither are
//! reported back as skipped rather than failing the patch.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{DomainError, DomainResult};

/// Loosely typed field data keyed by field name.
pub type FieldMap = Map<String, Value>;

type Setter<E> = Arc<dyn Fn(&mut E, &Value) -> Result<(), serde_json::Error> + Send + Sync>;

/// Registered setters for one entity type.
pub struct FieldTable<E> {
    own: HashMap<&'static str, Setter<E>>,
    inherited: HashMap<&'static str, Setter<E>>,
}

/// Outcome of applying a field map to an entity.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldPatch {
    /// Keys that matched a field and were assigned
    pub applied: Vec<String>,
    /// Keys that matched no field and were ignored
    pub skipped: Vec<String>,
}

impl<E: 'static> FieldTable<E> {
    pub fn builder() -> FieldTableBuilder<E> {
        FieldTableBuilder {
            own: HashMap::new(),
            inherited: HashMap::new(),
        }
    }

    /// Check whether `name` resolves to a field on the entity or its parent.
    pub fn contains(&self, name: &str) -> bool {
        self.own.contains_key(name) || self.inherited.contains_key(name)
    }

    /// Names of every assignable field, own fields first.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut own: Vec<_> = self.own.keys().copied().collect();
        let mut inherited: Vec<_> = self.inherited.keys().copied().collect();
        own.sort_unstable();
        inherited.sort_unstable();
        own.extend(inherited);
        own
    }

    /// Apply every recognised key of `data` to `entity`.
    ///
    /// Unknown keys are collected in [`FieldPatch::skipped`]. A known key whose
    /// value cannot be converted to the field's type fails the whole call;
    /// fields assigned before the failing key keep their new values.
    pub fn apply(&self, entity: &mut E, data: &FieldMap) -> DomainResult<FieldPatch> {
        let mut patch = FieldPatch::default();

        for (name, value) in data {
            let setter = self
                .own
                .get(name.as_str())
                .or_else(|| self.inherited.get(name.as_str()));

            match setter {
                Some(setter) => {
                    setter(entity, value).map_err(|e| DomainError::field(name, e.to_string()))?;
                    patch.applied.push(name.clone());
                }
                None => patch.skipped.push(name.clone()),
            }
        }

        Ok(patch)
    }
}

impl<E> fmt::Debug for FieldTable<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldTable")
            .field("own", &self.own.keys().collect::<Vec<_>>())
            .field("inherited", &self.inherited.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`FieldTable`].
pub struct FieldTableBuilder<E> {
    own: HashMap<&'static str, Setter<E>>,
    inherited: HashMap<&'static str, Setter<E>>,
}

impl<E: 'static> FieldTableBuilder<E> {
    /// Register a field declared directly on the entity.
    pub fn field<T, F>(mut self, name: &'static str, set: F) -> Self
    where
        T: DeserializeOwned,
        F: Fn(&mut E, T) + Send + Sync + 'static,
    {
        let setter: Setter<E> = Arc::new(move |entity: &mut E, value: &Value| {
            let typed = T::deserialize(value)?;
            set(entity, typed);
            Ok(())
        });
        self.own.insert(name, setter);
        self
    }

    /// Inherit the fields declared on an embedded parent record.
    ///
    /// Only the parent's own fields are lifted, not what the parent itself
    /// inherits.
    pub fn parent<P: 'static>(mut self, parent: &FieldTable<P>, project: fn(&mut E) -> &mut P) -> Self {
        for (name, parent_setter) in &parent.own {
            let parent_setter = Arc::clone(parent_setter);
            let setter: Setter<E> = Arc::new(move |entity: &mut E, value: &Value| {
                parent_setter(project(entity), value)
            });
            self.inherited.insert(*name, setter);
        }
        self
    }

    pub fn build(self) -> FieldTable<E> {
        FieldTable {
            own: self.own,
            inherited: self.inherited,
        }
    }
}
