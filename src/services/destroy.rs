//! Store wipe in reverse dependency order.

use super::EntityCounts;
use crate::models::{EntityKind, RowId};
use crate::Result;
use crate::storage::EntityStore;
use std::sync::Arc;
use tracing::instrument;

/// Phases in the order they run: dependents before the rows they reference.
const PHASES: [EntityKind; 4] = [
    EntityKind::Item,
    EntityKind::Owner,
    EntityKind::Category,
    EntityKind::Location,
];

/// Outcome of a wipe.
///
/// Deletions made before a failure are not rolled back; `deleted` reports
/// exactly what was removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestroyResult {
    /// True if every phase completed.
    pub success: bool,
    /// Rows removed per kind. Images are removed together with their items
    /// and are not counted separately.
    pub deleted: EntityCounts,
    /// Rows that were already gone when their delete ran.
    pub already_absent: usize,
    /// Image rows still present after the wipe.
    pub orphaned_images: usize,
    /// What failed, for an unsuccessful wipe.
    pub detail: Option<String>,
}

impl DestroyResult {
    /// Returns the total number of rows removed.
    #[must_use]
    pub const fn total_deleted(&self) -> usize {
        self.deleted.total()
    }

    /// Returns whether image rows were left behind.
    #[must_use]
    pub const fn has_orphans(&self) -> bool {
        self.orphaned_images > 0
    }
}

/// Service that deletes every row from every collection.
///
/// Does not consult the in-use guard: removing dependents in an earlier
/// phase is what keeps every intermediate state referentially valid.
pub struct DestroyService {
    store: Arc<dyn EntityStore>,
}

impl DestroyService {
    /// Creates a new destroy service.
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Deletes all items, owners, categories and locations, in that order.
    ///
    /// Never raises: a failing phase stops the wipe and is reported through
    /// [`DestroyResult::detail`].
    #[instrument(skip(self), fields(provider = self.store.provider()))]
    pub fn destroy(&self) -> DestroyResult {
        let mut result = DestroyResult::default();

        for kind in PHASES {
            if let Err(e) = self.run_phase(kind, &mut result) {
                tracing::error!(kind = %kind, error = %e, "Destroy aborted");
                result.detail = Some(format!(
                    "deleting {} failed after removing {}: {e}; the store may be partially wiped",
                    kind.collection(),
                    result.deleted
                ));
                return result;
            }
            tracing::info!(
                kind = %kind,
                deleted = result.deleted.get(kind),
                "Destroy phase complete"
            );
        }

        result.orphaned_images = self.check_orphaned_images();
        result.success = true;
        result
    }

    fn run_phase(&self, kind: EntityKind, result: &mut DestroyResult) -> Result<()> {
        for id in self.list_ids(kind)? {
            if self.store.delete(kind, id)?.removed() {
                result.deleted.add(kind, 1);
                metrics::counter!("stockpile_rows_deleted_total", "kind" => kind.as_str())
                    .increment(1);
            } else {
                tracing::debug!(kind = %kind, id, "Row already absent");
                result.already_absent += 1;
            }
        }
        Ok(())
    }

    fn list_ids(&self, kind: EntityKind) -> Result<Vec<RowId>> {
        if let Some(lookup) = kind.as_lookup() {
            return Ok(self
                .store
                .list_lookups(lookup)?
                .iter()
                .map(|r| r.id)
                .collect());
        }
        Ok(match kind {
            EntityKind::Item => self.store.list_items()?.iter().map(|i| i.id).collect(),
            _ => self.store.list_images()?.iter().map(|i| i.id).collect(),
        })
    }

    /// Best-effort residue check; a listing failure is only logged.
    fn check_orphaned_images(&self) -> usize {
        match self.store.list_images() {
            Ok(images) if !images.is_empty() => {
                tracing::warn!(
                    count = images.len(),
                    "Image rows remain after destroy; they are not referenced by any item"
                );
                images.len()
            },
            Ok(_) => 0,
            Err(e) => {
                tracing::warn!(error = %e, "Could not check for orphaned images");
                0
            },
        }
    }
}
