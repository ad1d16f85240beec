// Builtin component registry
//
// BuiltinComponents maps library identifiers (the part of a builtin
// specifier after the namespace prefix) to host namespaces, and serves
// them to the builtin translator.

use std::collections::HashMap;

use crate::error::LoaderError;
use crate::host::{ComponentRegistry, LoadedComponent};
use crate::value::HostNamespace;

/// In-memory registry of builtin libraries
#[derive(Debug, Default)]
pub struct BuiltinComponents {
    /// Namespaces indexed by library identifier
    by_id: HashMap<String, HostNamespace>,
}

impl BuiltinComponents {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a library under an identifier
    ///
    /// # Returns
    /// * `Ok(())` - Library registered
    /// * `Err(LoaderError::DuplicateComponent)` - Identifier already taken
    pub fn register(&mut self, id: impl Into<String>, namespace: HostNamespace) -> Result<(), LoaderError> {
        let id = id.into();

        if self.by_id.contains_key(&id) {
            return Err(LoaderError::DuplicateComponent(id));
        }

        self.by_id.insert(id, namespace);
        Ok(())
    }

    /// Builder-style registration; a duplicate identifier replaces the
    /// earlier library.
    pub fn with(mut self, id: impl Into<String>, namespace: HostNamespace) -> Self {
        self.by_id.insert(id.into(), namespace);
        self
    }

    /// Get a library by identifier
    pub fn get(&self, id: &str) -> Option<&HostNamespace> {
        self.by_id.get(id)
    }

    /// Check if a library is registered
    pub fn is_registered(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// All registered identifiers
    pub fn ids(&self) -> Vec<String> {
        self.by_id.keys().cloned().collect()
    }

    /// Remove a library
    pub fn remove(&mut self, id: &str) -> Option<HostNamespace> {
        self.by_id.remove(id)
    }

    /// Number of registered libraries
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl ComponentRegistry for BuiltinComponents {
    fn load(&self, id: &str) -> Result<LoadedComponent, LoaderError> {
        let namespace = self
            .by_id
            .get(id)
            .ok_or_else(|| LoaderError::UnknownBuiltin(id.to_string()))?;

        Ok(LoadedComponent {
            namespace: namespace.clone(),
            export_names: namespace.names(),
        })
    }
}
