//! Entity store trait.
//!
//! The entity store is the only boundary the export, import and destroy
//! engines talk to. Each call is blocking and may reach a remote service.
//!
//! # Available Implementations
//!
//! | Backend | Use Case | Notes |
//! |---------|----------|-------|
//! | `SqliteStore` | Default; embedded file | `AUTOINCREMENT` ids, foreign keys on |
//! | `MemoryStore` | Tests, dry runs | `RwLock`-guarded maps, ids never reused |
//!
//! # Error Modes and Guarantees
//!
//! | Call | Guarantee |
//! |------|-----------|
//! | `list_*` | Rows ordered by ascending id; failure is `Error::Remote` |
//! | `insert_*` | Returns the newly assigned id and the row's UUID |
//! | `delete` | Idempotent: a missing row is `DeleteOutcome::NotFound`, not an error |
//! | `insert_item` / `update_item` | Creating the attached image and the item is one step |
//!
//! There are no multi-row transactions across calls. Callers that mutate
//! several rows must order their calls so that every intermediate state is
//! referentially valid.

use crate::Result;
use crate::models::{
    EntityKind, ImageBlob, ImageMeta, InsertedItem, InsertedRow, Item, LookupKind, LookupRecord,
    NewItem, NewLookupRecord, RowId,
};
use uuid::Uuid;

/// Result of a single-row delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The row existed and was removed.
    Deleted,
    /// The row was already absent.
    NotFound,
}

impl DeleteOutcome {
    /// Returns true if a row was actually removed.
    #[must_use]
    pub const fn removed(self) -> bool {
        matches!(self, Self::Deleted)
    }
}

/// Trait for entity store backends.
///
/// # Implementor Notes
///
/// - Methods use `&self` to enable sharing via `Arc<dyn EntityStore>`
/// - Use interior mutability (e.g., `Mutex<Connection>`) for mutable state
/// - Deleting an item must also delete its attached image row
/// - Deleting a missing row must return `DeleteOutcome::NotFound`
/// - Report backend failures as [`crate::Error::Remote`]
pub trait EntityStore: Send + Sync {
    /// Short identifier of the backend, recorded in archive manifests.
    fn provider(&self) -> &'static str;

    /// Lists all rows of a lookup kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn list_lookups(&self, kind: LookupKind) -> Result<Vec<LookupRecord>>;

    /// Inserts a lookup row.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the row.
    fn insert_lookup(&self, kind: LookupKind, record: &NewLookupRecord) -> Result<InsertedRow>;

    /// Lists all items.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn list_items(&self) -> Result<Vec<Item>>;

    /// Inserts an item, creating and attaching its image when one is given.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced row is missing or the backend rejects the row.
    fn insert_item(&self, item: &NewItem) -> Result<InsertedItem>;

    /// Replaces an item's fields.
    ///
    /// When `item.image` is set, the previous image (if any) is replaced by the
    /// new one; otherwise the current image stays attached.
    ///
    /// # Errors
    ///
    /// Returns an error if the item or a referenced row is missing.
    fn update_item(&self, id: RowId, item: &NewItem) -> Result<InsertedItem>;

    /// Lists image metadata without payloads.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn list_images(&self) -> Result<Vec<ImageMeta>>;

    /// Resolves an image and its payload by identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read. A missing image is `Ok(None)`.
    fn fetch_image(&self, uuid: &Uuid) -> Result<Option<ImageBlob>>;

    /// Deletes one row.
    ///
    /// # Errors
    ///
    /// Returns an error for any failure other than the row being absent.
    fn delete(&self, kind: EntityKind, id: RowId) -> Result<DeleteOutcome>;

    /// Counts items that reference the given lookup row.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn count_referencing_items(&self, kind: LookupKind, id: RowId) -> Result<usize>;

    /// Returns the number of rows per kind, in [`EntityKind::all`] order.
    ///
    /// # Errors
    ///
    /// Returns an error if any collection cannot be read.
    fn counts(&self) -> Result<Vec<(EntityKind, usize)>> {
        let mut counts = Vec::with_capacity(EntityKind::all().len());
        for kind in LookupKind::all() {
            counts.push(((*kind).into(), self.list_lookups(*kind)?.len()));
        }
        counts.push((EntityKind::Image, self.list_images()?.len()));
        counts.push((EntityKind::Item, self.list_items()?.len()));
        Ok(counts)
    }
}
