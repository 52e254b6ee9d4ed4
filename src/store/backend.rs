//! Backend trait for the store.
//!
//! Defines the interface that every backing engine must implement. The
//! engine owns durability and key uniqueness; expiry and validation live
//! in [`Store`](super::Store).

use super::record::Record;
use anyhow::Result;

/// Outcome of an insert that never overwrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was written and committed.
    Inserted,
    /// A row with the same key already exists; nothing was written.
    Duplicate,
}

/// Backing engine for a [`Store`](super::Store).
///
/// All backends must be thread-safe (`Send + Sync`). Each method is a
/// single atomic statement and commits before returning.
///
/// # Example
///
/// ```ignore
/// use datastore::store::{EntryBackend, MemoryBackend, Record};
///
/// let backend = MemoryBackend::new();
/// backend.insert("key", &Record::new("{}"))?;
/// let record = backend.fetch("key")?;
/// ```
pub trait EntryBackend: Send + Sync + 'static {
    /// Inserts a row unless the key is already present.
    ///
    /// Expired rows still count as present.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    fn insert(&self, key: &str, record: &Record) -> Result<InsertOutcome>;

    /// Looks up a row by key without evaluating its expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    fn fetch(&self, key: &str) -> Result<Option<Record>>;

    /// Removes a row by key.
    ///
    /// Returns `Ok(true)` if the key existed and was removed,
    /// `Ok(false)` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    fn remove(&self, key: &str) -> Result<bool>;

    /// Short engine name used in log output.
    fn name(&self) -> &'static str;

    /// Flushes pending writes and releases the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush or close fails.
    fn close(self: Box<Self>) -> Result<()>;
}
