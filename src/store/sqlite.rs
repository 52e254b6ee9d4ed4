//! SQLite-backed storage backend.
//!
//! Keeps every entry in a single `data` table. Statements run in
//! autocommit mode, so each insert or delete is durable once it returns.

use super::backend::{EntryBackend, InsertOutcome};
use super::record::Record;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{Connection, ErrorCode, OptionalExtension, ffi, params};
use std::path::{Path, PathBuf};

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS data(
        key VARCHAR(32) PRIMARY KEY NOT NULL,
        value TEXT NOT NULL,
        ttl REAL
    );
";

/// SQLite-backed storage backend.
///
/// The connection is guarded by a mutex, so a single backend can be shared
/// across threads. SQLite enforces key uniqueness through the primary key.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteBackend {
    /// Opens or creates a SQLite database at the given path.
    ///
    /// Creates parent directories if needed and the `data` table if it is
    /// missing, so existing files reopen with their entries intact.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory cannot be created
    /// - Database file cannot be opened or created
    /// - The `data` table cannot be created
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create datastore directory: {}", parent.display())
            })?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite database: {}", path.display()))?;

        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Opens a private in-memory SQLite database.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch(CREATE_TABLE)
            .context("Failed to initialize data table")?;

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Path of the database file, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Only a primary-key clash means "duplicate"; other constraint failures are errors.
fn is_primary_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

impl EntryBackend for SqliteBackend {
    fn insert(&self, key: &str, record: &Record) -> Result<InsertOutcome> {
        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO data(key, value, ttl) VALUES (?1, ?2, ?3)",
            params![key, record.payload, record.expires_at],
        );

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e) if is_primary_key_violation(&e) => Ok(InsertOutcome::Duplicate),
            Err(e) => Err(e).with_context(|| format!("Failed to insert key '{key}'")),
        }
    }

    fn fetch(&self, key: &str) -> Result<Option<Record>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT value, ttl FROM data WHERE key = ?1",
            params![key],
            |row| {
                Ok(Record {
                    payload: row.get(0)?,
                    expires_at: row.get(1)?,
                })
            },
        )
        .optional()
        .with_context(|| format!("Failed to read key '{key}'"))
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let removed = conn
            .execute("DELETE FROM data WHERE key = ?1", params![key])
            .with_context(|| format!("Failed to remove key '{key}'"))?;
        Ok(removed > 0)
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn close(self: Box<Self>) -> Result<()> {
        let Self { conn, .. } = *self;
        conn.into_inner()
            .close()
            .map_err(|(_, e)| e)
            .context("Failed to close SQLite database")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_duplicate_insert_is_reported_not_raised() {
        let backend = SqliteBackend::open_in_memory().unwrap();

        let first = backend.insert("alice", &Record::new("{}")).unwrap();
        let second = backend.insert("alice", &Record::new(r#"{"a":1}"#)).unwrap();

        assert_eq!(first, InsertOutcome::Inserted);
        assert_eq!(second, InsertOutcome::Duplicate);
        assert_eq!(backend.fetch("alice").unwrap().unwrap().payload, "{}");
    }

    #[test]
    fn test_only_primary_key_clashes_count_as_duplicates() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(CREATE_TABLE).unwrap();
        conn.execute("INSERT INTO data(key, value) VALUES ('k', '{}')", [])
            .unwrap();

        let duplicate = conn
            .execute("INSERT INTO data(key, value) VALUES ('k', '{}')", [])
            .unwrap_err();
        assert!(is_primary_key_violation(&duplicate));

        let not_null = conn
            .execute("INSERT INTO data(key, value) VALUES ('other', NULL)", [])
            .unwrap_err();
        assert!(!is_primary_key_violation(&not_null));

        conn.execute_batch("CREATE TABLE checked(n INTEGER CHECK (n > 0));")
            .unwrap();
        let check = conn
            .execute("INSERT INTO checked(n) VALUES (-1)", [])
            .unwrap_err();
        assert!(!is_primary_key_violation(&check));
    }

    #[test]
    fn test_expiry_round_trips_as_real() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let record = Record {
            payload: "{}".to_string(),
            expires_at: Some(1_700_000_000.25),
        };

        backend.insert("k", &record).unwrap();
        assert_eq!(backend.fetch("k").unwrap(), Some(record));
    }

    #[test]
    fn test_remove_reports_existence() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend.insert("k", &Record::new("{}")).unwrap();

        assert!(backend.remove("k").unwrap());
        assert!(!backend.remove("k").unwrap());
        assert!(backend.fetch("k").unwrap().is_none());
    }

    #[test]
    fn test_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("dir").join("data.db");

        let backend = SqliteBackend::open(&path).unwrap();
        assert_eq!(backend.path(), Some(path.as_path()));
        Box::new(backend).close().unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_reopen_keeps_rows() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.db");

        let backend = Box::new(SqliteBackend::open(&path).unwrap());
        backend.insert("persistent", &Record::new(r#"{"v":1}"#)).unwrap();
        backend.close().unwrap();

        let backend = SqliteBackend::open(&path).unwrap();
        let record = backend.fetch("persistent").unwrap().unwrap();
        assert_eq!(record.payload, r#"{"v":1}"#);
    }
}
