//! The service: async access to a sequence store.
//!
//! Store calls block on the store's exclusive section and on disk I/O, so
//! each one runs on the blocking pool rather than a runtime worker.

use std::sync::Arc;

use ecf_sequence_core::{Channel, Sequence, TypeCode, TypeDefinition};
use ecf_sequence_store::SequenceStore;

use crate::error::{Result, ServiceError};

/// Async facade over a [`SequenceStore`].
pub struct SequenceService<S: SequenceStore> {
    store: Arc<S>,
}

impl<S: SequenceStore> Clone for SequenceService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: SequenceStore + 'static> SequenceService<S> {
    pub fn new(store: S) -> Self {
        Self::from_arc(Arc::new(store))
    }

    pub fn from_arc(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Every live type definition, in table order.
    pub async fn list_types(&self) -> Result<Vec<TypeDefinition>> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.list_types())
            .await
            .map_err(|e| ServiceError::TaskJoin(e.to_string()))?
            .map_err(ServiceError::from)
    }

    /// Issue the next number for `type_code` on `channel`.
    pub async fn allocate(&self, type_code: TypeCode, channel: Channel) -> Result<Sequence> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.allocate(type_code.as_str(), channel))
            .await
            .map_err(|e| ServiceError::TaskJoin(e.to_string()))?
            .map_err(ServiceError::from)
    }
}
