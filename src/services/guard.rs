//! Direct deletion of a single location, category or owner.

use crate::models::{LookupKind, RowId};
use crate::storage::{DeleteOutcome, EntityStore};
use crate::Result;
use std::sync::Arc;
use tracing::instrument;

/// Outcome of a guarded single-entity delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// The row was removed.
    Deleted,
    /// The row did not exist.
    AlreadyAbsent,
    /// Items still reference the row; nothing was deleted.
    EntityInUse {
        /// Number of referencing items.
        item_count: usize,
    },
}

impl DeletionOutcome {
    /// Returns a stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Deleted => "DELETED",
            Self::AlreadyAbsent => "NOT_FOUND",
            Self::EntityInUse { .. } => "ENTITY_IN_USE",
        }
    }

    /// Returns true if the row is gone after the call.
    #[must_use]
    pub const fn is_gone(&self) -> bool {
        matches!(self, Self::Deleted | Self::AlreadyAbsent)
    }
}

/// Deletes lookup rows one at a time, refusing while items depend on them.
pub struct EntityDeletionService {
    store: Arc<dyn EntityStore>,
}

impl EntityDeletionService {
    /// Creates a new deletion service.
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Deletes one row unless an item references it.
    ///
    /// # Errors
    ///
    /// Returns an error if the dependent-count query or the delete fails.
    #[instrument(skip(self), fields(kind = %kind, id))]
    pub fn delete(&self, kind: LookupKind, id: RowId) -> Result<DeletionOutcome> {
        let item_count = self.store.count_referencing_items(kind, id)?;
        if item_count > 0 {
            tracing::info!(item_count, "Refusing to delete entity still in use");
            metrics::counter!("stockpile_delete_refused_total", "kind" => kind.as_str())
                .increment(1);
            return Ok(DeletionOutcome::EntityInUse { item_count });
        }

        Ok(match self.store.delete(kind.into(), id)? {
            DeleteOutcome::Deleted => DeletionOutcome::Deleted,
            DeleteOutcome::NotFound => DeletionOutcome::AlreadyAbsent,
        })
    }
}
