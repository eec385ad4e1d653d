//! In-memory implementation of the SequenceStore trait.
//!
//! Same matching and increment rules as the DBF store, no persistence.
//! Used for testing layers above the store.

use std::sync::Mutex;

use ecf_sequence_core::{Channel, Sequence, TypeDefinition, SEQUENCE_DIGITS, SEQUENCE_MAX};

use crate::error::{Result, StoreError};
use crate::exclusive::ExclusiveSection;
use crate::traits::SequenceStore;

/// In-memory store. All data is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    section: ExclusiveSection,
    types: Mutex<Vec<TypeDefinition>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `types`, in order.
    pub fn with_types(types: Vec<TypeDefinition>) -> Self {
        Self {
            section: ExclusiveSection::new(),
            types: Mutex::new(types),
        }
    }

    /// Add a type definition at the end.
    pub fn push(&self, definition: TypeDefinition) {
        let _access = self.section.enter();
        self.types
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(definition);
    }
}

impl SequenceStore for MemoryStore {
    fn list_types(&self) -> Result<Vec<TypeDefinition>> {
        let _access = self.section.enter();
        Ok(self.types.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn allocate(&self, type_code: &str, channel: Channel) -> Result<Sequence> {
        let _access = self.section.enter();
        let mut types = self.types.lock().unwrap_or_else(|e| e.into_inner());

        let definition = types
            .iter_mut()
            .find(|def| def.matches(type_code))
            .ok_or_else(|| StoreError::NotFound(type_code.to_string()))?;

        let counter = definition.counter_mut(channel);
        let next = counter
            .checked_add(1)
            .filter(|next| *next <= SEQUENCE_MAX)
            .ok_or_else(|| StoreError::FieldOverflow {
                field: channel.to_string(),
                width: SEQUENCE_DIGITS,
                value: format!("{}+1", counter),
            })?;
        *counter = next;
        Ok(Sequence::new(type_code, next))
    }
}
