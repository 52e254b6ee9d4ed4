//! CLI command implementations for datastore.
//!
//! Each command runs against an already opened [`Store`] and writes its
//! output to the supplied writer, so handlers are testable without a
//! terminal.

use anyhow::{Context, Result};
use clap::Subcommand;
use serde_json::Value;
use std::io::Write;
use std::process::ExitCode;

use datastore::Store;
use datastore::store::ttl_from_secs;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store a JSON object under KEY (fails if KEY already exists)
    Put {
        /// Entry key (1-32 characters)
        key: String,
        /// JSON object, e.g. '{"age": 24}'
        value: String,
        /// Seconds until the entry expires
        #[arg(long, allow_hyphen_values = true)]
        ttl: Option<f64>,
    },
    /// Print the JSON object stored under KEY (exit status 1 if absent)
    Get {
        /// Entry key
        key: String,
    },
    /// Remove KEY if present
    Delete {
        /// Entry key
        key: String,
    },
}

/// Run `command` against `store`, writing user-facing output to `out`.
pub fn execute(store: &Store, command: Command, out: &mut dyn Write) -> Result<ExitCode> {
    match command {
        Command::Put { key, value, ttl } => put(store, &key, &value, ttl),
        Command::Get { key } => get(store, &key, out),
        Command::Delete { key } => delete(store, &key),
    }
}

fn put(store: &Store, key: &str, value: &str, ttl: Option<f64>) -> Result<ExitCode> {
    let ttl = ttl.map(ttl_from_secs).transpose()?;
    let value: Value = serde_json::from_str(value).context("VALUE must be valid JSON")?;

    store.put(key, &value, ttl)?;
    Ok(ExitCode::SUCCESS)
}

fn get(store: &Store, key: &str, out: &mut dyn Write) -> Result<ExitCode> {
    match store.get(key)? {
        Some(value) => {
            let pretty = serde_json::to_string_pretty(&value).context("Failed to format value")?;
            writeln!(out, "{pretty}").context("Failed to write output")?;
            Ok(ExitCode::SUCCESS)
        },
        None => {
            tracing::info!(key, "Key not found");
            Ok(ExitCode::FAILURE)
        },
    }
}

fn delete(store: &Store, key: &str) -> Result<ExitCode> {
    store.delete(key)?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use datastore::{Error, ErrorKind};

    fn run(store: &Store, command: Command) -> (Result<ExitCode>, String) {
        let mut out = Vec::new();
        let result = execute(store, command, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    fn put_cmd(key: &str, value: &str, ttl: Option<f64>) -> Command {
        Command::Put {
            key: key.to_string(),
            value: value.to_string(),
            ttl,
        }
    }

    fn store_error(err: &anyhow::Error) -> &Error {
        err.downcast_ref::<Error>().unwrap()
    }

    #[test]
    fn test_put_get_delete() {
        let store = Store::memory();

        let (result, _) = run(&store, put_cmd("alice", r#"{"age": 24}"#, None));
        assert_eq!(result.unwrap(), ExitCode::SUCCESS);

        let (result, output) = run(&store, Command::Get { key: "alice".into() });
        assert_eq!(result.unwrap(), ExitCode::SUCCESS);
        assert_eq!(output, "{\n  \"age\": 24\n}\n");

        let (result, _) = run(&store, Command::Delete { key: "alice".into() });
        assert_eq!(result.unwrap(), ExitCode::SUCCESS);

        let (result, output) = run(&store, Command::Get { key: "alice".into() });
        assert_eq!(result.unwrap(), ExitCode::FAILURE);
        assert!(output.is_empty());
    }

    #[test]
    fn test_negative_ttl_rejected() {
        let store = Store::memory();
        let (result, _) = run(&store, put_cmd("alice", "not json", Some(-5.0)));

        let err = result.unwrap_err();
        assert!(matches!(store_error(&err), Error::TtlNotPositive));
    }

    #[test]
    fn test_invalid_json_rejected() {
        let store = Store::memory();
        let (result, _) = run(&store, put_cmd("alice", "{oops", None));

        let err = result.unwrap_err();
        assert!(err.to_string().contains("VALUE must be valid JSON"));
    }

    #[test]
    fn test_non_object_rejected() {
        let store = Store::memory();
        let (result, _) = run(&store, put_cmd("alice", r#""bob""#, Some(3.0)));

        let err = result.unwrap_err();
        assert_eq!(store_error(&err).kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.to_string(), "value has to be a dictionary!");
    }

    #[test]
    fn test_duplicate_put_rejected() {
        let store = Store::memory();
        run(&store, put_cmd("alice", "{}", None)).0.unwrap();

        let (result, _) = run(&store, put_cmd("alice", "{}", None));
        assert_eq!(result.unwrap_err().to_string(), "Key already exists!");
    }
}
