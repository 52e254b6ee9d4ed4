//! Backing-file naming.
//!
//! When no path is configured, a store lives in the working directory under
//! a random name such as `3f9a0c17b2e4.db`. The name is incidental, not a
//! secret.

use std::path::PathBuf;
use uuid::Uuid;

use crate::constants::{DB_EXTENSION, RANDOM_NAME_LEN};

/// Generate a random file name: `<12 hex chars>.db`
pub fn random_db_name() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}.{DB_EXTENSION}", &id[..RANDOM_NAME_LEN])
}

/// Resolve the backing file: the configured path, or a random name in the
/// working directory.
pub fn resolve_db_path(configured: Option<PathBuf>) -> PathBuf {
    configured.unwrap_or_else(|| PathBuf::from(random_db_name()))
}
