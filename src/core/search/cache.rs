//! Process-wide cache of loaded collections.
//!
//! A cached handle is reused while the collection's `CURRENT`
//! pointer still names the cached generation. A rebuild changes the
//! pointer, so the next `get` reloads. Builds in this process also
//! call [`HandleCache::invalidate`] directly.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::core::error::Result;
use crate::core::storage::{CollectionHandle, StorageManager};

#[derive(Default)]
pub struct HandleCache {
    handles: RwLock<HashMap<String, Arc<CollectionHandle>>>,
}

impl HandleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the live handle for `collection_id`, loading on miss
    pub fn get(
        &self,
        storage: &StorageManager,
        collection_id: &str,
    ) -> Result<Arc<CollectionHandle>> {
        let live = storage.current_generation(collection_id)?;

        {
            let handles = self.handles.read().unwrap_or_else(|e| e.into_inner());
            if let Some(handle) = handles.get(collection_id) {
                if live.as_deref() == Some(handle.generation.as_str()) {
                    return Ok(Arc::clone(handle));
                }
            }
        }

        let handle = match storage.open_collection(collection_id) {
            Ok(handle) => Arc::new(handle),
            Err(e) => {
                self.invalidate(collection_id);
                return Err(e);
            }
        };
        tracing::debug!(
            "Loaded collection '{}' generation {} ({} chunks)",
            collection_id,
            handle.generation,
            handle.len()
        );

        let mut handles = self.handles.write().unwrap_or_else(|e| e.into_inner());
        handles.insert(collection_id.to_string(), Arc::clone(&handle));
        Ok(handle)
    }

    /// Drop the cached handle for `collection_id`
    pub fn invalidate(&self, collection_id: &str) {
        let mut handles = self.handles.write().unwrap_or_else(|e| e.into_inner());
        handles.remove(collection_id);
    }

    pub fn len(&self) -> usize {
        self.handles.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
