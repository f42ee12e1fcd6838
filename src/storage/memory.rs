//! In-memory entity store.
//!
//! Provides a non-persistent implementation of [`EntityStore`] for tests,
//! dry runs and as an import target when inspecting an archive.

use crate::models::{
    EntityKind, ImageBlob, ImageMeta, ImageUpload, InsertedItem, InsertedRow, Item, LookupKind,
    LookupRecord, NewItem, NewLookupRecord, RowId,
};
use crate::storage::traits::{DeleteOutcome, EntityStore};
use crate::{Error, Result};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// In-memory entity store.
///
/// Uses `RwLock` for thread-safe access. Ids are allocated from a per-kind
/// counter and never reused, so a wipe followed by an import always hands
/// out fresh ids.
///
/// # Example
///
/// ```rust,ignore
/// use stockpile::storage::{EntityStore, MemoryStore};
/// use stockpile::models::{LookupKind, NewLookupRecord};
///
/// let store = MemoryStore::new();
/// let garage = store.insert_lookup(LookupKind::Location, &NewLookupRecord::new("Garage"))?;
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    next_ids: HashMap<EntityKind, RowId>,
    lookups: HashMap<LookupKind, BTreeMap<RowId, LookupRecord>>,
    images: BTreeMap<RowId, ImageBlob>,
    items: BTreeMap<RowId, Item>,
}

impl State {
    fn allocate(&mut self, kind: EntityKind) -> RowId {
        let next = self.next_ids.entry(kind).or_insert(0);
        *next += 1;
        *next
    }

    fn lookup_exists(&self, kind: LookupKind, id: RowId) -> bool {
        self.lookups
            .get(&kind)
            .is_some_and(|rows| rows.contains_key(&id))
    }

    fn check_references(&self, item: &NewItem) -> Result<()> {
        let refs = [
            (LookupKind::Location, item.location_id),
            (LookupKind::Category, item.category_id),
            (LookupKind::Owner, item.owner_id),
        ];
        for (kind, id) in refs {
            if !self.lookup_exists(kind, id) {
                return Err(Error::remote(
                    "insert_item",
                    format!("{kind} {id} does not exist"),
                ));
            }
        }
        Ok(())
    }

    /// Creates or replaces the image with the upload's identity.
    fn put_image(&mut self, upload: &ImageUpload) -> (RowId, Uuid) {
        let uuid = upload.uuid.unwrap_or_else(Uuid::new_v4);
        let existing = self
            .images
            .iter()
            .find(|(_, blob)| blob.meta.uuid == uuid)
            .map(|(id, _)| *id);
        let id = existing.unwrap_or_else(|| self.allocate(EntityKind::Image));
        self.images.insert(
            id,
            ImageBlob {
                meta: ImageMeta {
                    id,
                    uuid,
                    mimetype: upload.mimetype.clone(),
                    filename: upload.filename.clone(),
                    created_at: Utc::now(),
                },
                payload: upload.payload.clone(),
            },
        );
        (id, uuid)
    }
}

impl MemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self, operation: &str) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| Error::remote(operation, "Lock poisoned"))
    }

    fn write(&self, operation: &str) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| Error::remote(operation, "Lock poisoned"))
    }
}

impl EntityStore for MemoryStore {
    fn provider(&self) -> &'static str {
        "memory"
    }

    fn list_lookups(&self, kind: LookupKind) -> Result<Vec<LookupRecord>> {
        let state = self.read("list_lookups")?;
        Ok(state
            .lookups
            .get(&kind)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }

    fn insert_lookup(&self, kind: LookupKind, record: &NewLookupRecord) -> Result<InsertedRow> {
        let mut state = self.write("insert_lookup")?;
        let uuid = record.uuid.unwrap_or_else(Uuid::new_v4);
        let duplicate = state
            .lookups
            .get(&kind)
            .is_some_and(|rows| rows.values().any(|r| r.uuid == uuid));
        if duplicate {
            return Err(Error::remote(
                "insert_lookup",
                format!("{kind} with uuid {uuid} already exists"),
            ));
        }

        let id = state.allocate(kind.into());
        state.lookups.entry(kind).or_default().insert(
            id,
            LookupRecord {
                id,
                uuid,
                name: record.name.clone(),
                description: record.description.clone(),
                created_at: record.created_at.unwrap_or_else(Utc::now),
                updated_at: record.updated_at,
            },
        );
        Ok(InsertedRow { id, uuid })
    }

    fn list_items(&self) -> Result<Vec<Item>> {
        let state = self.read("list_items")?;
        Ok(state.items.values().cloned().collect())
    }

    fn insert_item(&self, item: &NewItem) -> Result<InsertedItem> {
        let mut state = self.write("insert_item")?;
        state.check_references(item)?;

        let uuid = item.uuid.unwrap_or_else(Uuid::new_v4);
        if state.items.values().any(|i| i.uuid == uuid) {
            return Err(Error::remote(
                "insert_item",
                format!("item with uuid {uuid} already exists"),
            ));
        }

        let image = item.image.as_ref().map(|upload| state.put_image(upload));
        let id = state.allocate(EntityKind::Item);
        state.items.insert(
            id,
            Item {
                id,
                uuid,
                name: item.name.clone(),
                description: item.description.clone(),
                price: item.price,
                location_id: item.location_id,
                category_id: item.category_id,
                owner_id: item.owner_id,
                image_id: image.map(|(image_id, _)| image_id),
                image_uuid: image.map(|(_, image_uuid)| image_uuid),
                created_at: item.created_at.unwrap_or_else(Utc::now),
                updated_at: item.updated_at,
            },
        );

        Ok(InsertedItem {
            id,
            uuid,
            image_uuid: image.map(|(_, image_uuid)| image_uuid),
        })
    }

    fn update_item(&self, id: RowId, item: &NewItem) -> Result<InsertedItem> {
        let mut state = self.write("update_item")?;
        state.check_references(item)?;

        let Some(current) = state.items.get(&id).cloned() else {
            return Err(Error::remote("update_item", format!("item {id} does not exist")));
        };

        let (image_id, image_uuid) = match item.image.as_ref() {
            Some(upload) => {
                if let Some(old) = current.image_id {
                    state.images.remove(&old);
                }
                let (image_id, image_uuid) = state.put_image(upload);
                (Some(image_id), Some(image_uuid))
            },
            None => (current.image_id, current.image_uuid),
        };

        let updated = Item {
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price,
            location_id: item.location_id,
            category_id: item.category_id,
            owner_id: item.owner_id,
            image_id,
            image_uuid,
            updated_at: Some(item.updated_at.unwrap_or_else(Utc::now)),
            ..current
        };
        let uuid = updated.uuid;
        state.items.insert(id, updated);

        Ok(InsertedItem {
            id,
            uuid,
            image_uuid,
        })
    }

    fn list_images(&self) -> Result<Vec<ImageMeta>> {
        let state = self.read("list_images")?;
        Ok(state.images.values().map(|blob| blob.meta.clone()).collect())
    }

    fn fetch_image(&self, uuid: &Uuid) -> Result<Option<ImageBlob>> {
        let state = self.read("fetch_image")?;
        Ok(state
            .images
            .values()
            .find(|blob| blob.meta.uuid == *uuid)
            .cloned())
    }

    fn delete(&self, kind: EntityKind, id: RowId) -> Result<DeleteOutcome> {
        let mut state = self.write("delete")?;
        let removed = match kind {
            EntityKind::Location => remove_lookup(&mut state, LookupKind::Location, id)?,
            EntityKind::Category => remove_lookup(&mut state, LookupKind::Category, id)?,
            EntityKind::Owner => remove_lookup(&mut state, LookupKind::Owner, id)?,
            EntityKind::Image => state.images.remove(&id).is_some(),
            EntityKind::Item => match state.items.remove(&id) {
                Some(item) => {
                    if let Some(image_id) = item.image_id {
                        state.images.remove(&image_id);
                    }
                    true
                },
                None => false,
            },
        };

        Ok(if removed {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::NotFound
        })
    }

    fn count_referencing_items(&self, kind: LookupKind, id: RowId) -> Result<usize> {
        let state = self.read("count_referencing_items")?;
        Ok(state
            .items
            .values()
            .filter(|item| references(item, kind, id))
            .count())
    }
}

/// Removes a lookup row, refusing while items still point at it.
fn remove_lookup(state: &mut State, kind: LookupKind, id: RowId) -> Result<bool> {
    if state.items.values().any(|item| references(item, kind, id)) {
        return Err(Error::remote(
            "delete",
            format!("{kind} {id} is still referenced by items"),
        ));
    }
    Ok(state
        .lookups
        .get_mut(&kind)
        .and_then(|rows| rows.remove(&id))
        .is_some())
}

const fn references(item: &Item, kind: LookupKind, id: RowId) -> bool {
    match kind {
        LookupKind::Location => item.location_id == id,
        LookupKind::Category => item.category_id == id,
        LookupKind::Owner => item.owner_id == id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (MemoryStore, RowId, RowId, RowId) {
        let store = MemoryStore::new();
        let loc = store
            .insert_lookup(LookupKind::Location, &NewLookupRecord::new("Garage"))
            .unwrap();
        let cat = store
            .insert_lookup(LookupKind::Category, &NewLookupRecord::new("Tools"))
            .unwrap();
        let own = store
            .insert_lookup(LookupKind::Owner, &NewLookupRecord::new("Alice"))
            .unwrap();
        (store, loc.id, cat.id, own.id)
    }

    fn png(uuid: Option<Uuid>) -> ImageUpload {
        ImageUpload {
            uuid,
            mimetype: "image/png".to_string(),
            filename: "drill.png".to_string(),
            payload: vec![0x89, b'P', b'N', b'G'],
        }
    }

    #[test]
    fn test_insert_preserves_requested_uuid() {
        let store = MemoryStore::new();
        let uuid = Uuid::new_v4();
        let row = store
            .insert_lookup(
                LookupKind::Owner,
                &NewLookupRecord::new("Bob").with_uuid(uuid),
            )
            .unwrap();
        assert_eq!(row.uuid, uuid);
        assert_eq!(store.list_lookups(LookupKind::Owner).unwrap()[0].uuid, uuid);
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let store = MemoryStore::new();
        let first = store
            .insert_lookup(LookupKind::Location, &NewLookupRecord::new("Attic"))
            .unwrap();
        store.delete(EntityKind::Location, first.id).unwrap();
        let second = store
            .insert_lookup(LookupKind::Location, &NewLookupRecord::new("Attic"))
            .unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_insert_item_rejects_dangling_reference() {
        let (store, loc, cat, _) = seeded();
        let result = store.insert_item(&NewItem::new("Drill", loc, cat, 999));
        assert!(matches!(result, Err(Error::Remote { .. })));
    }

    #[test]
    fn test_insert_item_with_image() {
        let (store, loc, cat, own) = seeded();
        let image_uuid = Uuid::new_v4();
        let inserted = store
            .insert_item(&NewItem::new("Drill", loc, cat, own).with_image(png(Some(image_uuid))))
            .unwrap();
        assert_eq!(inserted.image_uuid, Some(image_uuid));

        let blob = store.fetch_image(&image_uuid).unwrap().unwrap();
        assert_eq!(blob.meta.filename, "drill.png");
        assert_eq!(blob.payload, vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_item_delete_removes_image_and_is_idempotent() {
        let (store, loc, cat, own) = seeded();
        let inserted = store
            .insert_item(&NewItem::new("Drill", loc, cat, own).with_image(png(None)))
            .unwrap();
        assert_eq!(store.list_images().unwrap().len(), 1);

        assert_eq!(
            store.delete(EntityKind::Item, inserted.id).unwrap(),
            DeleteOutcome::Deleted
        );
        assert!(store.list_images().unwrap().is_empty());
        let again = store.delete(EntityKind::Item, inserted.id).unwrap();
        assert_eq!(again, DeleteOutcome::NotFound);
        assert!(!again.removed());
    }

    #[test]
    fn test_update_item_replaces_image() {
        let (store, loc, cat, own) = seeded();
        let inserted = store
            .insert_item(&NewItem::new("Drill", loc, cat, own).with_image(png(None)))
            .unwrap();
        let replacement = Uuid::new_v4();
        let updated = store
            .update_item(
                inserted.id,
                &NewItem::new("Cordless drill", loc, cat, own).with_image(png(Some(replacement))),
            )
            .unwrap();

        assert_eq!(updated.uuid, inserted.uuid);
        assert_eq!(updated.image_uuid, Some(replacement));
        assert_eq!(store.list_images().unwrap().len(), 1);
        assert_eq!(store.list_items().unwrap()[0].name, "Cordless drill");
    }

    #[test]
    fn test_count_referencing_items() {
        let (store, loc, cat, own) = seeded();
        store
            .insert_item(&NewItem::new("Drill", loc, cat, own))
            .unwrap();
        store
            .insert_item(&NewItem::new("Saw", loc, cat, own))
            .unwrap();
        assert_eq!(
            store
                .count_referencing_items(LookupKind::Location, loc)
                .unwrap(),
            2
        );
        assert_eq!(
            store
                .count_referencing_items(LookupKind::Location, loc + 100)
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_counts_in_dependency_order() {
        let (store, ..) = seeded();
        let counts = store.counts().unwrap();
        assert_eq!(counts[0], (EntityKind::Location, 1));
        assert_eq!(counts[4], (EntityKind::Item, 0));
    }
}
