//! Schema script and first-run database initialisation.

use super::connection::configure_connection;
use crate::{Error, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Default schema applied when no schema script is configured.
pub const SCHEMA: &str = include_str!("schema.sql");

/// What [`initialize_database`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// A new database file was created and the schema applied.
    Created(PathBuf),
    /// The database file already existed and was left untouched.
    AlreadyExists(PathBuf),
}

/// Creates the `SQLite` database file and applies the schema.
///
/// Does nothing when the file already exists. The parent directory is
/// created if needed. If applying the schema fails, the partially created
/// file is removed so the next run starts clean.
///
/// # Arguments
///
/// * `db_path` - Database file to create
/// * `schema_path` - Schema script to apply; the embedded [`SCHEMA`] when `None`
///
/// # Errors
///
/// Returns an error if the directory, schema file or database cannot be
/// created, read or written.
pub fn initialize_database(db_path: &Path, schema_path: Option<&Path>) -> Result<InitOutcome> {
    if db_path.exists() {
        tracing::info!(path = %db_path.display(), "Database already exists, skipping initialization");
        return Ok(InitOutcome::AlreadyExists(db_path.to_path_buf()));
    }

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::operation("create_db_dir", format!("{}: {e}", parent.display()))
        })?;
    }

    let schema = match schema_path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| {
            Error::operation("read_schema", format!("{}: {e}", path.display()))
        })?,
        None => SCHEMA.to_string(),
    };

    tracing::info!(path = %db_path.display(), "Initializing database");
    if let Err(e) = apply_schema(db_path, &schema) {
        if db_path.exists() {
            match std::fs::remove_file(db_path) {
                Ok(()) => tracing::warn!(
                    path = %db_path.display(),
                    "Removed partially created database file"
                ),
                Err(rm) => tracing::error!(
                    path = %db_path.display(),
                    error = %rm,
                    "Failed to remove partially created database file"
                ),
            }
        }
        return Err(e);
    }

    Ok(InitOutcome::Created(db_path.to_path_buf()))
}

fn apply_schema(db_path: &Path, schema: &str) -> Result<()> {
    let conn = Connection::open(db_path).map_err(|e| Error::remote("open_sqlite", e))?;
    configure_connection(&conn)?;
    conn.execute_batch(schema)
        .map_err(|e| Error::remote("apply_schema", e))?;
    conn.close()
        .map_err(|(_, e)| Error::remote("close_sqlite", e))
}
