//! Database command handlers.

use super::open_store;
use anyhow::Context;
use stockpile::config::{StockpileConfig, StoreProvider};
use stockpile::storage::sqlite::{InitOutcome, initialize_database};

/// Executes the init-db command.
pub fn cmd_init_db(config: &StockpileConfig) -> anyhow::Result<bool> {
    if config.provider != StoreProvider::Sqlite {
        println!("Provider '{}' needs no initialization", config.provider);
        return Ok(true);
    }
    let db_path = config
        .sqlite
        .db_path
        .as_deref()
        .context("no database path configured (set DB_PATH or [sqlite] db_path)")?;

    let outcome = initialize_database(db_path, config.sqlite.schema_path.as_deref())
        .with_context(|| format!("failed to initialize {}", db_path.display()))?;
    match outcome {
        InitOutcome::Created(path) => println!("Created database {}", path.display()),
        InitOutcome::AlreadyExists(path) => {
            println!("Database {} already exists; nothing to do", path.display());
        },
    }
    Ok(true)
}

/// Executes the status command.
pub fn cmd_status(config: &StockpileConfig) -> anyhow::Result<bool> {
    let store = open_store(config)?;
    let counts = store.counts().context("failed to count rows")?;

    println!("Stockpile Status");
    println!("================");
    println!("Provider: {}", store.provider());
    for (kind, count) in counts {
        println!("  {:<12} {count}", kind.collection());
    }
    Ok(true)
}
