//! Shared connection handling for the `SQLite` store.
//!
//! Mutex handling with poison recovery, and per-connection pragmas.

use crate::{Error, Result};
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};

/// Helper to acquire mutex lock with poison recovery.
///
/// If the mutex is poisoned (due to a panic in a previous critical section),
/// we recover the inner value and log a warning. This prevents cascading
/// failures when one operation panics.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Configures a `SQLite` connection for the entity store.
///
/// # Configuration Applied
///
/// - **`foreign_keys`**: Item references are enforced by the database
/// - **WAL mode**: Concurrent readers with a single writer
/// - **NORMAL synchronous**: Balances durability with performance
/// - **`busy_timeout`**: Waits up to 5 seconds on lock contention
///
/// # Errors
///
/// Returns [`Error::Remote`] if foreign key enforcement cannot be enabled.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(|e| Error::remote("configure_connection", e))?;
    // journal_mode returns a row, so failures here are not fatal
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    let _ = conn.pragma_update(None, "busy_timeout", "5000");

    Ok(())
}
