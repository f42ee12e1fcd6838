//! `SQLite` entity store.
//!
//! ## Module Structure
//!
//! - `connection`: Connection handling (lock acquisition with poison recovery, pragmas)
//! - `schema`: Embedded schema script and first-run database initialisation
//! - `rows`: Row conversion for text-encoded UUIDs and timestamps
//! - `store`: The [`SqliteStore`] implementation of [`EntityStore`](crate::storage::EntityStore)

mod connection;
mod rows;
mod schema;
mod store;

pub use connection::{acquire_lock, configure_connection};
pub use schema::{InitOutcome, SCHEMA, initialize_database};
pub use store::SqliteStore;
