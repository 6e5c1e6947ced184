use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::error::{ConversionError, Result};

/// Maps engine-native token ids of one sentence to document-wide indices.
#[derive(Debug, Default, Clone)]
pub struct IndexMapper {
    indices: HashMap<u32, usize>,
}

impl IndexMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `native -> index`. The first mapping for an id wins; returns
    /// false when the id was already present.
    pub fn insert(&mut self, native: u32, index: usize) -> bool {
        match self.indices.entry(native) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(index);
                true
            }
        }
    }

    pub fn get(&self, native: u32) -> Option<usize> {
        self.indices.get(&native).copied()
    }

    pub fn resolve(&self, native: u32) -> Result<usize> {
        self.get(native)
            .ok_or(ConversionError::UnknownToken { id: native })
    }

    pub fn native_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.indices.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
