//! # Property Binding Table
//!
//! Maps property names to extractors. For each item the table writes one
//! wire key per property into the item's payload:
//!
//! ```text
//! bind("name", |p| p.full_name)   item { full_name: "Ada" }
//!            │                                  │
//!            └──────────► "rr_ab12cd34ef56ab78_name": "Ada"
//! ```
//!
//! Generation only reads the table, so it can run for many items at once.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use rowcast_shared::Namespace;

use crate::error::{RendererError, RendererResult};

type Extractor<T> = Arc<dyn Fn(&T) -> serde_json::Result<Value> + Send + Sync>;

/// Property name -> value extractor.
pub struct PropertyBindingTable<T> {
    extractors: HashMap<String, Extractor<T>>,
}

impl<T> PropertyBindingTable<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Registers or replaces the extractor for `property`.
    ///
    /// # Errors
    ///
    /// Returns [`RendererError::InvalidArgument`] if `property` is empty.
    pub fn bind<V, F>(&mut self, property: &str, extractor: F) -> RendererResult<()>
    where
        T: 'static,
        V: Serialize + 'static,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        if property.is_empty() {
            return Err(RendererError::InvalidArgument(
                "property name must not be empty".to_string(),
            ));
        }

        self.extractors.insert(
            property.to_string(),
            Arc::new(move |item: &T| serde_json::to_value(extractor(item))),
        );
        Ok(())
    }

    /// Copy of the table sharing the same extractors.
    ///
    /// Generating from a snapshot needs no lock on the original table.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        Self {
            extractors: self.extractors.clone(),
        }
    }

    /// Number of bound properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Bound property names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.extractors.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Writes `namespace + property -> value` for every bound property into
    /// `payload`. Existing keys outside the namespace are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RendererError::Serialization`] if an extractor's value
    /// cannot be represented as JSON. Keys written before the failure stay
    /// in `payload`.
    pub fn generate(
        &self,
        namespace: &Namespace,
        item: &T,
        payload: &mut Map<String, Value>,
    ) -> RendererResult<()> {
        for (property, extractor) in &self.extractors {
            let value = extractor(item).map_err(|e| RendererError::Serialization {
                property: property.clone(),
                reason: e.to_string(),
            })?;
            payload.insert(namespace.key_for(property), value);
        }
        Ok(())
    }
}

impl<T> Default for PropertyBindingTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for PropertyBindingTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyBindingTable")
            .field("properties", &self.names())
            .finish()
    }
}
