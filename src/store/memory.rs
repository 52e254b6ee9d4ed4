//! In-memory storage backend.
//!
//! Provides a fast, non-persistent backend using DashMap for concurrent
//! access. Ideal for testing and embedding where durability isn't needed.

use super::backend::{EntryBackend, InsertOutcome};
use super::record::Record;
use anyhow::Result;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// In-memory storage backend using DashMap.
///
/// All data is lost when the backend is closed or dropped.
#[derive(Default)]
pub struct MemoryBackend {
    data: DashMap<String, Record>,
}

impl MemoryBackend {
    /// Creates a new empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored rows, including expired ones not yet reaped.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if no rows are stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl EntryBackend for MemoryBackend {
    fn insert(&self, key: &str, record: &Record) -> Result<InsertOutcome> {
        match self.data.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(InsertOutcome::Duplicate),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(InsertOutcome::Inserted)
            },
        }
    }

    fn fetch(&self, key: &str) -> Result<Option<Record>> {
        Ok(self.data.get(key).map(|entry| entry.value().clone()))
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.data.remove(key).is_some())
    }

    fn name(&self) -> &'static str {
        "memory"
    }

    fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
