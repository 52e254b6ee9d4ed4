//! datastore command-line interface.

mod commands;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use commands::Command;
use datastore::Store;
use datastore::config::{BackendKind, Config};

/// Single-file key-value store for JSON objects
#[derive(Parser, Debug)]
#[command(name = "datastore", author, version, about)]
struct Cli {
    /// Config file (defaults to ./datastore.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backing file (random name in the working directory if unset)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Backing engine
    #[arg(long, value_enum, global = true)]
    backend: Option<BackendKind>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = Config::discover(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.store.path = Some(db);
    }
    if let Some(backend) = cli.backend {
        config.store.backend = backend;
    }

    init_logging(&config.log.level);

    let validation = config.validate()?;
    for warning in &validation.warnings {
        tracing::warn!("{warning}");
    }

    let store = Store::open_with(&config.store)?;
    if config.store.path.is_none()
        && let Some(path) = store.path()
    {
        eprintln!("Created datastore file: {}", path.display());
    }

    let outcome = commands::execute(&store, cli.command, &mut std::io::stdout().lock());

    // Close before reporting so the file is flushed on every exit path
    let closed = store.close();
    let code = outcome?;
    closed?;

    Ok(code)
}

/// Log to stderr; `RUST_LOG` overrides the configured level.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
