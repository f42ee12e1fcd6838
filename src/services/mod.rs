//! Business logic services.
//!
//! Services orchestrate an [`EntityStore`](crate::storage::EntityStore) and
//! the archive I/O layer:
//!
//! | Service | Operation |
//! |---------|-----------|
//! | [`ExportService`] | Store → archive bytes |
//! | [`ImportService`] | Archive bytes → store (destructive replace) |
//! | [`DestroyService`] | Wipe all collections in reverse dependency order |
//! | [`EntityDeletionService`] | Delete one location/category/owner unless items still use it |

mod destroy;
mod export;
mod guard;
mod import;

pub use destroy::{DestroyResult, DestroyService};
pub use export::{ExportOptions, ExportResult, ExportService, UnresolvedImage};
pub use guard::{DeletionOutcome, EntityDeletionService};
pub use import::{ImportResult, ImportService, ImportWarning};

use crate::models::EntityKind;

/// Row counts per entity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityCounts {
    /// Locations.
    pub locations: usize,
    /// Categories.
    pub categories: usize,
    /// Owners.
    pub owners: usize,
    /// Images.
    pub images: usize,
    /// Items.
    pub items: usize,
}

impl EntityCounts {
    /// Returns the count for one kind.
    #[must_use]
    pub const fn get(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Location => self.locations,
            EntityKind::Category => self.categories,
            EntityKind::Owner => self.owners,
            EntityKind::Image => self.images,
            EntityKind::Item => self.items,
        }
    }

    /// Adds `n` to one kind's count.
    pub const fn add(&mut self, kind: EntityKind, n: usize) {
        match kind {
            EntityKind::Location => self.locations += n,
            EntityKind::Category => self.categories += n,
            EntityKind::Owner => self.owners += n,
            EntityKind::Image => self.images += n,
            EntityKind::Item => self.items += n,
        }
    }

    /// Returns the sum over all kinds.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.locations + self.categories + self.owners + self.images + self.items
    }
}

impl std::fmt::Display for EntityCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} locations, {} categories, {} owners, {} items, {} images",
            self.locations, self.categories, self.owners, self.items, self.images
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mut counts = EntityCounts::default();
        counts.add(EntityKind::Item, 2);
        counts.add(EntityKind::Owner, 1);
        assert_eq!(counts.get(EntityKind::Item), 2);
        assert_eq!(counts.total(), 3);
        assert_eq!(
            counts.to_string(),
            "0 locations, 0 categories, 1 owners, 2 items, 0 images"
        );
    }
}
