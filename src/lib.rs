//! datastore: a single-file key-value store for JSON objects.
//!
//! Entries are write-once JSON objects keyed by short strings, with an
//! optional TTL that is checked lazily on read. See [`Store`] for the
//! full contract.

pub mod config;
pub mod constants;
pub mod paths;
pub mod store;

pub use store::{Error, ErrorKind, Store};
