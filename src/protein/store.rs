use super::models::ProteinEntry;
use crate::errors::{CacheError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory table of proteins keyed by definition.
///
/// Indices are dense and handed out in insertion order, so replaying the same
/// inserts against an empty store reproduces the same indices.
#[derive(Debug, Default)]
pub struct SequenceStore {
    entries: Vec<ProteinEntry>,
    by_definition: HashMap<Arc<str>, u32>,
}

impl SequenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_definition(&mut self, definition: &str) -> Result<u32> {
        self.insert(definition, None)
    }

    pub fn add_definition_and_sequence(&mut self, definition: &str, sequence: &str) -> Result<u32> {
        self.insert(definition, Some(sequence.into()))
    }

    // Callers check `index_of` first; a repeated definition keeps its old index.
    fn insert(&mut self, definition: &str, sequence: Option<Arc<str>>) -> Result<u32> {
        if let Some(&index) = self.by_definition.get(definition) {
            return Ok(index);
        }
        let index = next_index(self.entries.len())?;
        let definition: Arc<str> = definition.into();
        self.by_definition.insert(definition.clone(), index);
        self.entries.push(ProteinEntry {
            index,
            definition,
            sequence,
        });
        Ok(index)
    }

    pub fn index_of(&self, definition: &str) -> Option<u32> {
        self.by_definition.get(definition).copied()
    }

    pub fn get(&self, index: u32) -> Option<&ProteinEntry> {
        self.entries.get(index as usize)
    }

    pub fn sequence_of(&self, index: u32) -> Option<&Arc<str>> {
        self.get(index)?.sequence.as_ref()
    }

    pub fn definition_of(&self, index: u32) -> Option<&Arc<str>> {
        self.get(index).map(|e| &e.definition)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_definition.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_populated(&self) -> bool {
        !self.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProteinEntry> {
        self.entries.iter()
    }
}

/// Indices are `u32`; the store refuses to grow past that.
fn next_index(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| CacheError::CapacityExceeded(len))
}
