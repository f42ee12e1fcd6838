//! Storage traits.
//!
//! A single port, [`EntityStore`], covers every collection the archive
//! engines read and write. Implementations must be `Send + Sync`.

mod store;

pub use store::{DeleteOutcome, EntityStore};
