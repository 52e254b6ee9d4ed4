//! Limits and defaults shared across the store, configuration, and CLI.

/// Maximum key length, counted in characters.
pub const MAX_KEY_LEN: usize = 32;

/// Maximum size of a value once encoded as JSON text (16 KiB).
pub const MAX_PAYLOAD_BYTES: usize = 16 * 1024;

/// File extension used for randomly named backing files.
pub const DB_EXTENSION: &str = "db";

/// Number of hex characters in a randomly generated file stem.
pub const RANDOM_NAME_LEN: usize = 12;

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "datastore.toml";

/// Log filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_LEVEL: &str = "warn";
