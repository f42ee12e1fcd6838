//! Storage layer abstraction.
//!
//! Every engine in this crate talks to an entity store only through the
//! [`EntityStore`] trait. Two backends are provided:
//! - **`SQLite`**: the persistent store (`rusqlite`, bundled)
//! - **Memory**: a process-local store for tests and dry runs

#![allow(clippy::significant_drop_tightening)]

mod factory;
pub mod memory;
pub mod sqlite;
pub mod traits;

pub use factory::StoreFactory;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{DeleteOutcome, EntityStore};
