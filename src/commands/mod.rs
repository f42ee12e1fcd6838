//! Command handlers.
//!
//! - `io.rs`: Archive commands (export, import, inspect)
//! - `destroy.rs`: Destructive commands (destroy, guarded delete)
//! - `db.rs`: Database commands (init-db, status)
//!
//! Handlers return `Ok(false)` when the operation ran but reported failure,
//! so `main` can exit non-zero without printing a second error.

mod db;
mod destroy;
mod io;

pub use db::{cmd_init_db, cmd_status};
pub use destroy::{cmd_delete, cmd_destroy};
pub use io::{cmd_export, cmd_import, cmd_inspect};

use anyhow::Context;
use std::sync::Arc;
use stockpile::config::StockpileConfig;
use stockpile::storage::{EntityStore, StoreFactory};

/// Opens the configured store.
fn open_store(config: &StockpileConfig) -> anyhow::Result<Arc<dyn EntityStore>> {
    StoreFactory::create(config)
        .with_context(|| format!("failed to open {} store", config.provider))
}
