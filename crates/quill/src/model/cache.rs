use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::error::ResolutionError;

use super::{Model, ModelDescriptor};

/// Caches one resolved descriptor per record type.
///
/// Resolution failures are not cached and are reported again on the next
/// lookup.
#[derive(Debug, Default)]
pub struct DescriptorCache {
    entries: RwLock<HashMap<TypeId, Arc<ModelDescriptor>>>,
}

impl DescriptorCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the descriptor of `M`, resolving it on first use.
    pub fn descriptor<M: Model>(&self) -> Result<Arc<ModelDescriptor>, ResolutionError> {
        let key = TypeId::of::<M>();
        if let Some(found) = self.entries.read().get(&key) {
            return Ok(Arc::clone(found));
        }

        let resolved = Arc::new(ModelDescriptor::of::<M>()?);
        trace!(
            type_name = resolved.type_name(),
            table = resolved.table(),
            "Resolved model descriptor"
        );

        let mut entries = self.entries.write();
        Ok(Arc::clone(entries.entry(key).or_insert(resolved)))
    }

    /// Returns the number of cached descriptors.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drops every cached descriptor.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
