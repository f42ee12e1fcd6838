//! `SQLite`-backed entity store.

use super::connection::{acquire_lock, configure_connection};
use super::rows::{
    IMAGE_COLUMNS, ITEM_COLUMNS, LOOKUP_COLUMNS, format_timestamp, image_meta_from_row,
    item_from_row, lookup_from_row,
};
use super::schema::SCHEMA;
use crate::models::{
    EntityKind, ImageBlob, ImageMeta, ImageUpload, InsertedItem, InsertedRow, Item, LookupKind,
    LookupRecord, NewItem, NewLookupRecord, RowId,
};
use crate::storage::traits::{DeleteOutcome, EntityStore};
use crate::{Error, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::instrument;
use uuid::Uuid;

/// `SQLite`-backed entity store.
///
/// # Concurrency Model
///
/// Uses a `Mutex<Connection>` because `rusqlite::Connection` is not `Sync`.
/// Each trait call holds the lock for its own duration only; there is no
/// transaction spanning several calls.
///
/// # Schema
///
/// The schema is applied with `CREATE ... IF NOT EXISTS` on open, so an
/// existing database created by `init-db` (possibly from a custom schema
/// script) is used as-is.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens (or creates) a store at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema applied.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let conn = Connection::open(&db_path).map_err(|e| Error::remote("open_sqlite", e))?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Creates an in-memory store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be applied.
    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| Error::remote("open_sqlite_in_memory", e))?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn initialize(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        configure_connection(&conn)?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| Error::remote("apply_schema", e))
    }
}

const fn reference_column(kind: LookupKind) -> &'static str {
    match kind {
        LookupKind::Location => "location_id",
        LookupKind::Category => "category_id",
        LookupKind::Owner => "owner_id",
    }
}

/// Creates or replaces the image with the upload's identity and returns its id.
fn put_image(tx: &Transaction<'_>, upload: &ImageUpload) -> rusqlite::Result<(RowId, Uuid)> {
    let uuid = upload.uuid.unwrap_or_else(Uuid::new_v4);
    let uuid_text = uuid.to_string();
    tx.execute(
        "INSERT INTO images (uuid, mimetype, filename, data, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(uuid) DO UPDATE SET
             mimetype = excluded.mimetype,
             filename = excluded.filename,
             data = excluded.data",
        params![
            uuid_text,
            upload.mimetype,
            upload.filename,
            upload.payload,
            format_timestamp(&Utc::now()),
        ],
    )?;
    let id = tx.query_row(
        "SELECT id FROM images WHERE uuid = ?1",
        params![uuid_text],
        |row| row.get(0),
    )?;
    Ok((id, uuid))
}

impl EntityStore for SqliteStore {
    fn provider(&self) -> &'static str {
        "sqlite"
    }

    fn list_lookups(&self, kind: LookupKind) -> Result<Vec<LookupRecord>> {
        let operation = format!("list_{}", kind.collection());
        let conn = acquire_lock(&self.conn);
        let sql = format!(
            "SELECT {LOOKUP_COLUMNS} FROM {} ORDER BY id",
            kind.collection()
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::remote(&operation, e))?;
        let rows = stmt
            .query_map([], lookup_from_row)
            .map_err(|e| Error::remote(&operation, e))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::remote(&operation, e))
    }

    #[instrument(skip(self, record), fields(kind = %kind))]
    fn insert_lookup(&self, kind: LookupKind, record: &NewLookupRecord) -> Result<InsertedRow> {
        let operation = format!("insert_{}", kind.as_str());
        let uuid = record.uuid.unwrap_or_else(Uuid::new_v4);
        let created_at = record.created_at.unwrap_or_else(Utc::now);
        let conn = acquire_lock(&self.conn);
        conn.execute(
            &format!(
                "INSERT INTO {} (uuid, name, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                kind.collection()
            ),
            params![
                uuid.to_string(),
                record.name,
                record.description,
                format_timestamp(&created_at),
                record.updated_at.as_ref().map(format_timestamp),
            ],
        )
        .map_err(|e| Error::remote(&operation, e))?;

        Ok(InsertedRow {
            id: conn.last_insert_rowid(),
            uuid,
        })
    }

    fn list_items(&self) -> Result<Vec<Item>> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn
            .prepare(&format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id"))
            .map_err(|e| Error::remote("list_items", e))?;
        let rows = stmt
            .query_map([], item_from_row)
            .map_err(|e| Error::remote("list_items", e))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::remote("list_items", e))
    }

    #[instrument(skip(self, item), fields(name = %item.name, has_image = item.image.is_some()))]
    fn insert_item(&self, item: &NewItem) -> Result<InsertedItem> {
        let uuid = item.uuid.unwrap_or_else(Uuid::new_v4);
        let created_at = item.created_at.unwrap_or_else(Utc::now);
        let mut conn = acquire_lock(&self.conn);
        let tx = conn
            .transaction()
            .map_err(|e| Error::remote("insert_item", e))?;

        let image = item
            .image
            .as_ref()
            .map(|upload| put_image(&tx, upload))
            .transpose()
            .map_err(|e| Error::remote("insert_item_image", e))?;

        tx.execute(
            "INSERT INTO items (uuid, name, description, price, location_id, category_id,
                                owner_id, image_id, image_uuid, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                uuid.to_string(),
                item.name,
                item.description,
                item.price,
                item.location_id,
                item.category_id,
                item.owner_id,
                image.map(|(id, _)| id),
                image.map(|(_, image_uuid)| image_uuid.to_string()),
                format_timestamp(&created_at),
                item.updated_at.as_ref().map(format_timestamp),
            ],
        )
        .map_err(|e| Error::remote("insert_item", e))?;
        let id = tx.last_insert_rowid();
        tx.commit().map_err(|e| Error::remote("insert_item", e))?;

        Ok(InsertedItem {
            id,
            uuid,
            image_uuid: image.map(|(_, image_uuid)| image_uuid),
        })
    }

    #[instrument(skip(self, item), fields(item_id = id))]
    fn update_item(&self, id: RowId, item: &NewItem) -> Result<InsertedItem> {
        let mut conn = acquire_lock(&self.conn);
        let tx = conn
            .transaction()
            .map_err(|e| Error::remote("update_item", e))?;

        let current: Option<(String, Option<RowId>, Option<String>)> = tx
            .query_row(
                "SELECT uuid, image_id, image_uuid FROM items WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(|e| Error::remote("update_item", e))?;
        let Some((uuid_text, old_image_id, old_image_uuid)) = current else {
            return Err(Error::remote("update_item", format!("item {id} does not exist")));
        };
        let uuid = Uuid::parse_str(&uuid_text).map_err(|e| Error::remote("update_item", e))?;

        let (image_id, image_uuid) = match item.image.as_ref() {
            Some(upload) => {
                let (new_id, new_uuid) =
                    put_image(&tx, upload).map_err(|e| Error::remote("update_item_image", e))?;
                (Some(new_id), Some(new_uuid.to_string()))
            },
            None => (old_image_id, old_image_uuid),
        };

        tx.execute(
            "UPDATE items SET name = ?1, description = ?2, price = ?3, location_id = ?4,
                              category_id = ?5, owner_id = ?6, image_id = ?7, image_uuid = ?8,
                              updated_at = ?9
             WHERE id = ?10",
            params![
                item.name,
                item.description,
                item.price,
                item.location_id,
                item.category_id,
                item.owner_id,
                image_id,
                image_uuid,
                format_timestamp(&item.updated_at.unwrap_or_else(Utc::now)),
                id,
            ],
        )
        .map_err(|e| Error::remote("update_item", e))?;

        if let Some(old) = old_image_id.filter(|old| Some(*old) != image_id) {
            tx.execute("DELETE FROM images WHERE id = ?1", params![old])
                .map_err(|e| Error::remote("update_item_image", e))?;
        }
        tx.commit().map_err(|e| Error::remote("update_item", e))?;

        let image_uuid = image_uuid
            .map(|text| Uuid::parse_str(&text))
            .transpose()
            .map_err(|e| Error::remote("update_item", e))?;
        Ok(InsertedItem {
            id,
            uuid,
            image_uuid,
        })
    }

    fn list_images(&self) -> Result<Vec<ImageMeta>> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn
            .prepare(&format!("SELECT {IMAGE_COLUMNS} FROM images ORDER BY id"))
            .map_err(|e| Error::remote("list_images", e))?;
        let rows = stmt
            .query_map([], image_meta_from_row)
            .map_err(|e| Error::remote("list_images", e))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::remote("list_images", e))
    }

    fn fetch_image(&self, uuid: &Uuid) -> Result<Option<ImageBlob>> {
        let conn = acquire_lock(&self.conn);
        conn.query_row(
            &format!("SELECT {IMAGE_COLUMNS}, data FROM images WHERE uuid = ?1"),
            params![uuid.to_string()],
            |row| {
                Ok(ImageBlob {
                    meta: image_meta_from_row(row)?,
                    payload: row.get(5)?,
                })
            },
        )
        .optional()
        .map_err(|e| Error::remote("fetch_image", e))
    }

    #[instrument(skip(self), fields(kind = %kind, id))]
    fn delete(&self, kind: EntityKind, id: RowId) -> Result<DeleteOutcome> {
        let operation = format!("delete_{}", kind.as_str());
        let mut conn = acquire_lock(&self.conn);
        let tx = conn
            .transaction()
            .map_err(|e| Error::remote(&operation, e))?;

        let image_id: Option<RowId> = if kind == EntityKind::Item {
            tx.query_row(
                "SELECT image_id FROM items WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::remote(&operation, e))?
            .flatten()
        } else {
            None
        };

        let changed = tx
            .execute(
                &format!("DELETE FROM {} WHERE id = ?1", kind.collection()),
                params![id],
            )
            .map_err(|e| Error::remote(&operation, e))?;

        if let Some(image_id) = image_id {
            tx.execute("DELETE FROM images WHERE id = ?1", params![image_id])
                .map_err(|e| Error::remote(&operation, e))?;
        }
        tx.commit().map_err(|e| Error::remote(&operation, e))?;

        Ok(if changed > 0 {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::NotFound
        })
    }

    fn count_referencing_items(&self, kind: LookupKind, id: RowId) -> Result<usize> {
        let conn = acquire_lock(&self.conn);
        let count: i64 = conn
            .query_row(
                &format!(
                    "SELECT COUNT(*) FROM items WHERE {} = ?1",
                    reference_column(kind)
                ),
                params![id],
                |row| row.get(0),
            )
            .map_err(|e| Error::remote("count_referencing_items", e))?;
        usize::try_from(count).map_err(|e| Error::remote("count_referencing_items", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (SqliteStore, RowId, RowId, RowId) {
        let store = SqliteStore::in_memory().unwrap();
        let loc = store
            .insert_lookup(
                LookupKind::Location,
                &NewLookupRecord::new("Garage").with_description("Detached, north side"),
            )
            .unwrap();
        let cat = store
            .insert_lookup(LookupKind::Category, &NewLookupRecord::new("Tools"))
            .unwrap();
        let own = store
            .insert_lookup(LookupKind::Owner, &NewLookupRecord::new("Alice"))
            .unwrap();
        (store, loc.id, cat.id, own.id)
    }

    fn jpeg(uuid: Option<Uuid>) -> ImageUpload {
        ImageUpload {
            uuid,
            mimetype: "image/jpeg".to_string(),
            filename: "saw.jpg".to_string(),
            payload: vec![0xFF, 0xD8, 0xFF, 0xE0],
        }
    }

    #[test]
    fn test_lookup_roundtrip() {
        let (store, loc, ..) = seeded();
        let rows = store.list_lookups(LookupKind::Location).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, loc);
        assert_eq!(rows[0].name, "Garage");
        assert_eq!(rows[0].description.as_deref(), Some("Detached, north side"));
        assert!(rows[0].updated_at.is_none());
    }

    #[test]
    fn test_insert_item_with_image_and_fetch() {
        let (store, loc, cat, own) = seeded();
        let image_uuid = Uuid::new_v4();
        let inserted = store
            .insert_item(
                &NewItem::new("Saw", loc, cat, own)
                    .with_price(12.5)
                    .with_image(jpeg(Some(image_uuid))),
            )
            .unwrap();
        assert_eq!(inserted.image_uuid, Some(image_uuid));

        let items = store.list_items().unwrap();
        assert_eq!(items[0].price, Some(12.5));
        assert_eq!(items[0].image_uuid, Some(image_uuid));

        let blob = store.fetch_image(&image_uuid).unwrap().unwrap();
        assert_eq!(blob.meta.mimetype, "image/jpeg");
        assert_eq!(blob.payload, vec![0xFF, 0xD8, 0xFF, 0xE0]);
        assert!(store.fetch_image(&Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let (store, loc, cat, _) = seeded();
        let result = store.insert_item(&NewItem::new("Ghost", loc, cat, 4242));
        assert!(matches!(result, Err(Error::Remote { .. })));
    }

    #[test]
    fn test_delete_item_removes_image() {
        let (store, loc, cat, own) = seeded();
        let inserted = store
            .insert_item(&NewItem::new("Saw", loc, cat, own).with_image(jpeg(None)))
            .unwrap();

        assert_eq!(
            store.delete(EntityKind::Item, inserted.id).unwrap(),
            DeleteOutcome::Deleted
        );
        assert!(store.list_images().unwrap().is_empty());
        assert_eq!(
            store.delete(EntityKind::Item, inserted.id).unwrap(),
            DeleteOutcome::NotFound
        );
    }

    #[test]
    fn test_delete_referenced_lookup_fails() {
        let (store, loc, cat, own) = seeded();
        store.insert_item(&NewItem::new("Saw", loc, cat, own)).unwrap();
        assert!(store.delete(EntityKind::Location, loc).is_err());
        assert_eq!(
            store
                .count_referencing_items(LookupKind::Location, loc)
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_update_item_swaps_image() {
        let (store, loc, cat, own) = seeded();
        let inserted = store
            .insert_item(&NewItem::new("Saw", loc, cat, own).with_image(jpeg(None)))
            .unwrap();
        let replacement = Uuid::new_v4();
        let updated = store
            .update_item(
                inserted.id,
                &NewItem::new("Hand saw", loc, cat, own).with_image(jpeg(Some(replacement))),
            )
            .unwrap();

        assert_eq!(updated.uuid, inserted.uuid);
        assert_eq!(updated.image_uuid, Some(replacement));
        let images = store.list_images().unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].uuid, replacement);
    }

    #[test]
    fn test_ids_not_reused() {
        let store = SqliteStore::in_memory().unwrap();
        let first = store
            .insert_lookup(LookupKind::Owner, &NewLookupRecord::new("Bob"))
            .unwrap();
        store.delete(EntityKind::Owner, first.id).unwrap();
        let second = store
            .insert_lookup(LookupKind::Owner, &NewLookupRecord::new("Bob"))
            .unwrap();
        assert!(second.id > first.id);
    }
}
