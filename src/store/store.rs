//! `Store`: validated, single-key storage with lazy expiry.

use super::backend::{EntryBackend, InsertOutcome};
use super::error::{Error, Result};
use super::memory::MemoryBackend;
use super::record::{Record, unix_now};
use super::redb::RedbBackend;
use super::sqlite::SqliteBackend;
use crate::config::{BackendKind, StoreConfig};
use crate::constants::{MAX_KEY_LEN, MAX_PAYLOAD_BYTES};
use crate::paths;
use anyhow::Context;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Key-value store for JSON objects with optional per-entry TTL.
///
/// Entries are write-once: `put` rejects an existing key instead of
/// replacing it, even when that entry has expired but has not been read
/// since. Expired entries are only removed by the `get` (or `contains`)
/// that discovers them.
///
/// The backing engine is released exactly once, either by [`Store::close`]
/// or, failing that, when the store is dropped.
///
/// # Example
///
/// ```no_run
/// use datastore::Store;
/// use serde_json::json;
/// use std::time::Duration;
///
/// # fn main() -> Result<(), datastore::store::Error> {
/// let store = Store::open("data.db")?;
/// store.put("alice", &json!({"age": 24}), Some(Duration::from_secs(60)))?;
/// assert_eq!(store.get("alice")?, Some(json!({"age": 24})));
/// store.delete("alice")?;
/// store.close()?;
/// # Ok(())
/// # }
/// ```
pub struct Store {
    backend: Option<Box<dyn EntryBackend>>,
    path: Option<PathBuf>,
}

impl Store {
    /// Opens or creates a SQLite-backed store at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let backend = SqliteBackend::open(path)?;
        Ok(Self::new(Box::new(backend), Some(path.to_path_buf())))
    }

    /// Creates a SQLite-backed store under a random name in the working
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn open_random() -> Result<Self> {
        Self::open(paths::resolve_db_path(None))
    }

    /// Opens the backend selected by `config`.
    ///
    /// File-based backends use `config.path`, or a random name when unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open_with(config: &StoreConfig) -> Result<Self> {
        match config.backend {
            BackendKind::Memory => Ok(Self::memory()),
            BackendKind::Sqlite => match &config.path {
                Some(path) => Self::open(path),
                None => Self::open_random(),
            },
            BackendKind::Redb => {
                let backend = RedbBackend::open(paths::resolve_db_path(config.path.clone()))?;
                let path = backend.path().to_path_buf();
                Ok(Self::new(Box::new(backend), Some(path)))
            },
        }
    }

    /// Creates a store backed by process memory.
    ///
    /// Ideal for testing and embedding. All data is lost on close.
    pub fn memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()), None)
    }

    /// Creates a store over a custom backend.
    pub fn with_backend<B: EntryBackend>(backend: B) -> Self {
        Self::new(Box::new(backend), None)
    }

    /// Creates a store from a boxed backend.
    ///
    /// Useful when working with trait objects directly.
    pub fn from_boxed(backend: Box<dyn EntryBackend>) -> Self {
        Self::new(backend, None)
    }

    fn new(backend: Box<dyn EntryBackend>, path: Option<PathBuf>) -> Self {
        tracing::info!(
            backend = backend.name(),
            path = ?path,
            "Opened datastore"
        );
        Self {
            backend: Some(backend),
            path,
        }
    }

    /// Path of the backing file, when the engine is file-based.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn backend(&self) -> &dyn EntryBackend {
        // Only `close` and `Drop` take the backend, and both consume the store.
        self.backend
            .as_deref()
            .unwrap_or_else(|| unreachable!("backend is held until the store is released"))
    }

    /// Stores `value` under `key`, expiring after `ttl` if given.
    ///
    /// Checks run in a fixed order and the first failure wins:
    /// TTL, key length, empty key, value type, encoded size, duplicate key.
    /// The 16 KiB limit applies to the compact JSON encoding (no spaces after
    /// `,` or `:`, non-ASCII kept as UTF-8).
    ///
    /// # Errors
    ///
    /// - [`Error::TtlNotPositive`] if `ttl` is zero
    /// - [`Error::KeyTooLong`] if `key` has more than 32 characters
    /// - [`Error::EmptyKey`] if `key` is empty
    /// - [`Error::NotAMapping`] if `value` is not a JSON object
    /// - [`Error::PayloadTooLarge`] if the encoded value exceeds 16 KiB
    /// - [`Error::DuplicateKey`] if the key is already stored
    /// - [`Error::Backend`] if the storage operation fails
    pub fn put(&self, key: &str, value: &Value, ttl: Option<Duration>) -> Result<()> {
        validate_ttl(ttl)?;
        validate_key(key)?;

        if !value.is_object() {
            return Err(Error::NotAMapping);
        }

        let payload = value.to_string();
        if payload.len() > MAX_PAYLOAD_BYTES {
            return Err(Error::PayloadTooLarge {
                size: payload.len(),
            });
        }

        let record = match ttl {
            Some(ttl) => Record::with_ttl(payload, ttl, unix_now()?),
            None => Record::new(payload),
        };

        match self.backend().insert(key, &record)? {
            InsertOutcome::Inserted => {
                tracing::debug!(key, expires_at = ?record.expires_at, "Stored entry");
                Ok(())
            },
            InsertOutcome::Duplicate => Err(Error::duplicate_key(key)),
        }
    }

    /// Serializes `value` and stores it like [`Store::put`].
    ///
    /// # Errors
    ///
    /// Same as [`Store::put`]; a value that does not serialize to a JSON
    /// object fails with [`Error::NotAMapping`].
    pub fn put_as<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<()> {
        validate_ttl(ttl)?;
        validate_key(key)?;

        let value = serde_json::to_value(value).map_err(|_| Error::NotAMapping)?;
        self.put(key, &value, ttl)
    }

    /// Reads the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key doesn't exist. An expired entry is
    /// removed and reported as [`Error::Expired`]; later reads then see
    /// `Ok(None)`.
    ///
    /// # Errors
    ///
    /// - [`Error::Expired`] if the entry's TTL has passed
    /// - [`Error::Backend`] if the storage operation fails
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        let Some(record) = self.backend().fetch(key)? else {
            return Ok(None);
        };

        if record.is_expired_at(unix_now()?) {
            self.reap(key);
            return Err(Error::expired(key));
        }

        let value: Value = serde_json::from_str(&record.payload)
            .with_context(|| format!("Failed to decode stored value for key '{key}'"))?;
        Ok(Some(value))
    }

    /// Reads the value under `key` and decodes it into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`Store::get`], plus [`Error::TypeMismatch`] if the stored
    /// object does not decode into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(value) = self.get(key)? else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|source| Error::TypeMismatch { source })
    }

    /// Returns true if a live entry exists under `key`.
    ///
    /// An expired entry is removed and reported as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn contains(&self, key: &str) -> Result<bool> {
        let Some(record) = self.backend().fetch(key)? else {
            return Ok(false);
        };

        if record.is_expired_at(unix_now()?) {
            self.reap(key);
            return Ok(false);
        }
        Ok(true)
    }

    /// Removes the entry under `key`, live or expired. Missing keys are a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn delete(&self, key: &str) -> Result<()> {
        let removed = self.backend().remove(key)?;
        tracing::debug!(key, removed, "Deleted entry");
        Ok(())
    }

    /// Best-effort removal of an expired entry; failures are logged only.
    fn reap(&self, key: &str) {
        match self.backend().remove(key) {
            Ok(_) => tracing::debug!(key, "Reaped expired entry"),
            Err(e) => tracing::warn!(
                key,
                error = %format!("{e:#}"),
                "Failed to remove expired entry; it will be retried on the next read"
            ),
        }
    }

    /// Flushes and closes the backing engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush or close fails.
    pub fn close(mut self) -> Result<()> {
        self.release()?;
        Ok(())
    }

    fn release(&mut self) -> anyhow::Result<()> {
        if let Some(backend) = self.backend.take() {
            let name = backend.name();
            backend.close()?;
            tracing::debug!(backend = name, "Closed datastore");
        }
        Ok(())
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!(error = %format!("{e:#}"), "Failed to close datastore");
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.backend.as_ref().map(|b| b.name()))
            .field("path", &self.path)
            .finish()
    }
}

/// Converts a TTL given in (possibly fractional or negative) seconds.
///
/// # Errors
///
/// Returns [`Error::TtlNotPositive`] if `secs` is not a finite number above zero.
pub fn ttl_from_secs(secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(Error::TtlNotPositive);
    }
    Duration::try_from_secs_f64(secs).map_err(|_| Error::TtlNotPositive)
}

fn validate_ttl(ttl: Option<Duration>) -> Result<()> {
    match ttl {
        Some(ttl) if ttl.is_zero() => Err(Error::TtlNotPositive),
        _ => Ok(()),
    }
}

fn validate_key(key: &str) -> Result<()> {
    let len = key.chars().count();
    if len > MAX_KEY_LEN {
        return Err(Error::KeyTooLong { len });
    }
    if len == 0 {
        return Err(Error::EmptyKey);
    }
    Ok(())
}
