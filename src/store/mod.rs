//! Key-value store for JSON objects with lazy TTL expiry.
//!
//! A [`Store`] validates writes, enforces write-once keys, and evaluates
//! expiry when an entry is read. Durable storage is delegated to a
//! pluggable backend:
//!
//! - **SqliteBackend**: Single-table SQLite file (default)
//! - **RedbBackend**: redb file with ACID write transactions
//! - **MemoryBackend**: Non-persistent storage (testing/embedding)
//!
//! # Example
//!
//! ```ignore
//! use datastore::Store;
//! use serde_json::json;
//!
//! // In-memory (testing/embedding)
//! let store = Store::memory();
//! store.put("alice", &json!({"age": 24}), None)?;
//!
//! // Persistent (production)
//! let store = Store::open("data.db")?;
//! store.put("alice", &json!({"age": 24}), None)?;
//! store.close()?;
//! ```
//!
//! # Custom Backends
//!
//! Implement the `EntryBackend` trait to use custom storage:
//!
//! ```ignore
//! use datastore::store::{EntryBackend, Store};
//!
//! struct RocksBackend { /* ... */ }
//! impl EntryBackend for RocksBackend { /* ... */ }
//!
//! let store = Store::with_backend(RocksBackend::new());
//! ```

mod backend;
mod error;
mod memory;
mod record;
mod redb;
mod sqlite;
#[allow(clippy::module_inception)]
mod store;


// Re-export the public API
pub use self::redb::RedbBackend;
pub use backend::{EntryBackend, InsertOutcome};
pub use error::{Error, ErrorKind, Result};
pub use memory::MemoryBackend;
pub use record::{Record, unix_now};
pub use sqlite::SqliteBackend;
pub use store::{Store, ttl_from_secs};
