use indexmap::{IndexMap, map::Keys};
use thiserror::Error;

use super::path::join_key;
use crate::allocator::TensorId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Tensor with key \"{0}\" is already registered.")]
    DuplicateKey(String),
    #[error("Tensor with key \"{0}\" not found.")]
    KeyNotFound(String),
    #[error("Couldn't find any tensors with prefix \"{0}\".")]
    SubtreeNotFound(String),
}

/// Name → tensor index handed to the weight loading stage.
///
/// Iterates in registration order, which is the deterministic construction
/// order of the graph builder.
#[derive(Debug, Default)]
pub struct TensorRegistry {
    index: IndexMap<String, TensorId>,
}

impl TensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        key: String,
        id: TensorId,
    ) -> Result<(), RegistryError> {
        if self.index.contains_key(&key) {
            return Err(RegistryError::DuplicateKey(key));
        }
        self.index.insert(key, id);
        Ok(())
    }

    pub fn contains(
        &self,
        key: &str,
    ) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Result<TensorId, RegistryError> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| RegistryError::KeyNotFound(key.to_string()))
    }

    pub fn keys(&self) -> Keys<'_, String, TensorId> {
        self.index.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, TensorId)> {
        self.index.iter().map(|(key, id)| (key.as_str(), *id))
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn tree(&self) -> ParameterTree<'_> {
        ParameterTree {
            registry: self,
            prefix: None,
        }
    }
}

/// Read-only view of the registry scoped to a dotted key prefix.
pub struct ParameterTree<'registry> {
    registry: &'registry TensorRegistry,
    prefix: Option<String>,
}

impl<'registry> ParameterTree<'registry> {
    pub fn path_prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    fn join_prefix(
        &self,
        name: &str,
    ) -> String {
        join_key(self.prefix.as_deref(), name)
    }

    pub fn subtree(
        &self,
        name: &str,
    ) -> Result<Self, RegistryError> {
        let new_prefix = self.join_prefix(name);
        let dotted_prefix = format!("{new_prefix}.");
        let has_children = self
            .registry
            .keys()
            .any(|key| key.starts_with(&dotted_prefix));
        if has_children {
            Ok(Self {
                registry: self.registry,
                prefix: Some(new_prefix),
            })
        } else {
            Err(RegistryError::SubtreeNotFound(new_prefix))
        }
    }

    pub fn leaf(
        &self,
        name: &str,
    ) -> Result<TensorId, RegistryError> {
        self.registry.get(&self.join_prefix(name))
    }

    /// Registered entries below this prefix, in registration order.
    pub fn entries(&self) -> impl Iterator<Item = (&'registry str, TensorId)> {
        let dotted_prefix = self.prefix.as_ref().map(|p| format!("{p}."));
        self.registry.iter().filter(move |(key, _)| {
            dotted_prefix
                .as_deref()
                .is_none_or(|prefix| key.starts_with(prefix))
        })
    }
}
