//! `SQLite` store integration tests.
//!
//! Exercise file-backed databases, first-run initialisation and moving an
//! archive between providers.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use stockpile::config::{StockpileConfig, StoreProvider};
use stockpile::models::{EntityKind, ImageUpload, LookupKind, NewItem, NewLookupRecord};
use stockpile::services::{DestroyService, ExportOptions, ExportService, ImportService};
use stockpile::storage::sqlite::{InitOutcome, initialize_database};
use stockpile::storage::{EntityStore, MemoryStore, SqliteStore, StoreFactory};
use tempfile::TempDir;

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn seed(store: &dyn EntityStore) {
    let loc = store
        .insert_lookup(LookupKind::Location, &NewLookupRecord::new("Basement"))
        .unwrap();
    let cat = store
        .insert_lookup(
            LookupKind::Category,
            &NewLookupRecord::new("Camping").with_description("Tents, stoves"),
        )
        .unwrap();
    let own = store
        .insert_lookup(LookupKind::Owner, &NewLookupRecord::new("Sam"))
        .unwrap();
    store
        .insert_item(
            &NewItem::new("Lantern", loc.id, cat.id, own.id)
                .with_price(24.99)
                .with_image(ImageUpload {
                    uuid: None,
                    mimetype: "image/png".to_string(),
                    filename: "lantern.png".to_string(),
                    payload: PNG.to_vec(),
                }),
        )
        .unwrap();
    store
        .insert_item(&NewItem::new("Tent", loc.id, cat.id, own.id).with_description("4 person"))
        .unwrap();
}

#[test]
fn test_init_db_creates_then_skips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("inventory.db");

    let first = initialize_database(&path, None).unwrap();
    assert_eq!(first, InitOutcome::Created(path.clone()));
    assert!(path.exists());

    let second = initialize_database(&path, None).unwrap();
    assert_eq!(second, InitOutcome::AlreadyExists(path.clone()));

    let store = SqliteStore::new(&path).unwrap();
    assert!(store.counts().unwrap().iter().all(|(_, n)| *n == 0));
}

#[test]
fn test_data_persists_across_connections() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("inventory.db");

    {
        let store = SqliteStore::new(&path).unwrap();
        seed(&store);
    }

    let reopened = SqliteStore::new(&path).unwrap();
    assert_eq!(reopened.db_path(), Some(path.as_path()));
    let counts: Vec<_> = reopened.counts().unwrap();
    assert!(counts.contains(&(EntityKind::Item, 2)));
    assert!(counts.contains(&(EntityKind::Image, 1)));
}

#[test]
fn test_sqlite_to_memory_round_trip() {
    let dir = TempDir::new().unwrap();
    let config = StockpileConfig::new().with_db_path(dir.path().join("source.db"));
    let source = StoreFactory::create(&config).unwrap();
    assert_eq!(source.provider(), "sqlite");
    seed(source.as_ref());

    let exported = ExportService::new(Arc::clone(&source))
        .export(&ExportOptions::default())
        .unwrap();
    assert_eq!(exported.embedded_images, 1);

    let target = StoreFactory::create(&config.clone().with_provider(StoreProvider::Memory)).unwrap();
    let result = ImportService::new(Arc::clone(&target))
        .import(&exported.archive)
        .unwrap();
    assert!(result.success, "{:?}", result.detail);
    assert_eq!(result.counts.items, 2);

    for kind in LookupKind::all() {
        let mut a: Vec<_> = source
            .list_lookups(*kind)
            .unwrap()
            .into_iter()
            .map(|r| (r.uuid, r.name, r.description))
            .collect();
        let mut b: Vec<_> = target
            .list_lookups(*kind)
            .unwrap()
            .into_iter()
            .map(|r| (r.uuid, r.name, r.description))
            .collect();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }

    let lantern = target
        .list_items()
        .unwrap()
        .into_iter()
        .find(|i| i.name == "Lantern")
        .unwrap();
    assert_eq!(lantern.price, Some(24.99));
    let blob = target
        .fetch_image(&lantern.image_uuid.unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(blob.payload, PNG);
    assert_eq!(blob.meta.mimetype, "image/png");
}

#[test]
fn test_memory_to_sqlite_import_replaces_contents() {
    let source = Arc::new(MemoryStore::new());
    seed(source.as_ref());
    let exported = ExportService::new(source)
        .export(&ExportOptions::default())
        .unwrap();

    let dir = TempDir::new().unwrap();
    let target = Arc::new(SqliteStore::new(dir.path().join("target.db")).unwrap());
    target
        .insert_lookup(LookupKind::Owner, &NewLookupRecord::new("Stale"))
        .unwrap();

    let result = ImportService::new(target.clone())
        .import(&exported.archive)
        .unwrap();
    assert!(result.success, "{:?}", result.detail);
    assert_eq!(result.wiped.owners, 1);

    let owners: Vec<_> = target
        .list_lookups(LookupKind::Owner)
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(owners, vec!["Sam"]);
    assert_eq!(target.list_images().unwrap().len(), 1);
}

#[test]
fn test_sqlite_destroy_clears_images() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    seed(store.as_ref());

    let result = DestroyService::new(store.clone()).destroy();

    assert!(result.success);
    assert_eq!(result.deleted.items, 2);
    assert!(!result.has_orphans());
    assert!(store.list_images().unwrap().is_empty());
}
