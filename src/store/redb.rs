//! Redb-backed storage backend.
//!
//! Provides persistent storage using redb with ACID guarantees. Each row is
//! the JSON encoding of a [`Record`].

use super::backend::{EntryBackend, InsertOutcome};
use super::record::Record;
use anyhow::{Context, Result};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::{Path, PathBuf};

/// Table holding every entry, keyed by entry key.
pub(crate) const DATA_TABLE: TableDefinition<'static, &'static str, &'static [u8]> =
    TableDefinition::new("data");

/// Redb-backed storage backend.
///
/// Every write transaction is committed before the call returns, so rows
/// survive crashes and unclean shutdowns.
pub struct RedbBackend {
    db: Database,
    path: PathBuf,
}

impl RedbBackend {
    /// Opens or creates a redb database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory cannot be created
    /// - Database file cannot be opened or created (permissions, disk full, etc.)
    /// - Initialization transaction fails to begin or commit
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create datastore directory: {}", parent.display())
            })?;
        }

        let db = Database::create(path)
            .with_context(|| format!("Failed to open redb database: {}", path.display()))?;

        // Create the table up front so reads never hit a missing table
        let write_txn = db
            .begin_write()
            .context("Failed to begin initialization transaction")?;
        {
            let _table = write_txn
                .open_table(DATA_TABLE)
                .context("Failed to initialize data table")?;
        }
        write_txn
            .commit()
            .context("Failed to commit initialization transaction")?;

        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EntryBackend for RedbBackend {
    fn insert(&self, key: &str, record: &Record) -> Result<InsertOutcome> {
        let json = serde_json::to_vec(record).context("Failed to serialize record")?;

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;

        let outcome = {
            let mut table = write_txn
                .open_table(DATA_TABLE)
                .context("Failed to open data table")?;

            let exists = table
                .get(key)
                .with_context(|| format!("Failed to read key '{key}'"))?
                .is_some();

            if exists {
                InsertOutcome::Duplicate
            } else {
                table
                    .insert(key, json.as_slice())
                    .with_context(|| format!("Failed to insert key '{key}'"))?;
                InsertOutcome::Inserted
            }
        };

        match outcome {
            InsertOutcome::Inserted => write_txn
                .commit()
                .context("Failed to commit insert transaction")?,
            InsertOutcome::Duplicate => write_txn
                .abort()
                .context("Failed to abort insert transaction")?,
        }

        Ok(outcome)
    }

    fn fetch(&self, key: &str) -> Result<Option<Record>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;

        let table = read_txn
            .open_table(DATA_TABLE)
            .context("Failed to open data table")?;

        let result = table
            .get(key)
            .with_context(|| format!("Failed to read key '{key}'"))?;

        match result {
            Some(guard) => {
                let record = serde_json::from_slice(guard.value())
                    .with_context(|| format!("Failed to deserialize record for key '{key}'"))?;
                Ok(Some(record))
            },
            None => Ok(None),
        }
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;

        let removed = {
            let mut table = write_txn
                .open_table(DATA_TABLE)
                .context("Failed to open data table")?;

            table
                .remove(key)
                .with_context(|| format!("Failed to remove key '{key}'"))?
                .is_some()
        };

        write_txn
            .commit()
            .context("Failed to commit delete transaction")?;

        Ok(removed)
    }

    fn name(&self) -> &'static str {
        "redb"
    }

    fn close(self: Box<Self>) -> Result<()> {
        // Commits are already durable; dropping the handle releases the file lock.
        drop(self);
        Ok(())
    }
}
