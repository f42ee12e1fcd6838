//! Store export.
//!
//! Reads every collection and packs it into one self-contained archive:
//! a manifest, five CSV tables, and the payload of each item's image under
//! `images/<item_id>.<ext>`.

use super::EntityCounts;
use crate::io::archive::layout::{
    self, IMAGE_HEADERS, IMAGES, ITEM_HEADERS, ITEMS, MANIFEST, image_member,
};
use crate::io::archive::mime::{FALLBACK_EXTENSION, extension};
use crate::io::archive::{ArchiveWriter, Manifest, cells};
use crate::io::formats::csv::{self, CsvRow};
use crate::models::{EntityKind, ImageBlob, ImageMeta, Item, LookupKind, LookupRecord, RowId};
use crate::storage::EntityStore;
use crate::{Error, Result};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Options for export.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Abort instead of exporting an item without its image when the image
    /// cannot be resolved.
    pub fail_on_missing_image: bool,
}

impl ExportOptions {
    /// Sets whether an unresolved image aborts the export.
    #[must_use]
    pub const fn with_fail_on_missing_image(mut self, fail: bool) -> Self {
        self.fail_on_missing_image = fail;
        self
    }
}

/// An item whose image reference did not resolve to a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnresolvedImage {
    /// Item id in the source store.
    pub item_id: RowId,
    /// The image identity the item pointed at.
    pub image_uuid: Uuid,
}

/// Result of an export.
#[derive(Debug, Clone)]
pub struct ExportResult {
    /// The archive bytes.
    pub archive: Vec<u8>,
    /// Rows written per table.
    pub counts: EntityCounts,
    /// Image files embedded under `images/`.
    pub embedded_images: usize,
    /// Items exported with empty image fields.
    pub unresolved_images: Vec<UnresolvedImage>,
}

impl ExportResult {
    /// Returns whether any item lost its image in the export.
    #[must_use]
    pub fn has_unresolved(&self) -> bool {
        !self.unresolved_images.is_empty()
    }
}

/// Everything read from the store before encoding starts.
struct Snapshot {
    lookups: Vec<(LookupKind, Vec<LookupRecord>)>,
    items: Vec<Item>,
    images: Vec<ImageMeta>,
}

/// Service for exporting a store to an archive.
pub struct ExportService {
    store: Arc<dyn EntityStore>,
}

impl ExportService {
    /// Creates a new export service.
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Exports the whole store.
    ///
    /// # Errors
    ///
    /// Returns an error if any store read fails (no archive is produced), if
    /// an image is unresolved and `fail_on_missing_image` is set, or if the
    /// archive cannot be encoded.
    #[instrument(skip(self), fields(provider = self.store.provider()))]
    pub fn export(&self, options: &ExportOptions) -> Result<ExportResult> {
        let snapshot = self.read_snapshot()?;

        let mut counts = EntityCounts::default();
        let mut writer = ArchiveWriter::new();
        writer.add(
            MANIFEST,
            Manifest::current(self.store.provider(), Utc::now()).to_json()?,
        );

        for (kind, records) in &snapshot.lookups {
            let rows: Vec<CsvRow> = records.iter().map(|r| lookup_row(*kind, r)).collect();
            let headers = layout::lookup_headers(*kind);
            writer.add(
                layout::lookup_member(*kind),
                csv::encode(&headers, &rows)?.into_bytes(),
            );
            counts.add((*kind).into(), records.len());
        }

        let image_rows: Vec<CsvRow> = snapshot.images.iter().map(image_row).collect();
        writer.add(IMAGES, csv::encode(&IMAGE_HEADERS, &image_rows)?.into_bytes());
        counts.images = snapshot.images.len();

        let mut item_rows = Vec::with_capacity(snapshot.items.len());
        let mut payloads = Vec::new();
        let mut unresolved_images = Vec::new();
        for item in &snapshot.items {
            let blob = match item.image_uuid {
                Some(image_uuid) => {
                    let blob = self.store.fetch_image(&image_uuid)?;
                    if blob.is_none() {
                        if options.fail_on_missing_image {
                            return Err(Error::Validation(format!(
                                "item {} references image {image_uuid} which cannot be resolved",
                                item.id
                            )));
                        }
                        tracing::warn!(
                            item_id = item.id,
                            image_uuid = %image_uuid,
                            "Image not found; exporting item without it"
                        );
                        unresolved_images.push(UnresolvedImage {
                            item_id: item.id,
                            image_uuid,
                        });
                    }
                    blob
                },
                None => None,
            };

            let mut row = item_row(item);
            if let Some(blob) = blob {
                let zip_filename = zip_filename(item.id, &blob);
                attach_image(&mut row, &blob, &zip_filename);
                payloads.push((image_member(&zip_filename), blob.payload));
            }
            item_rows.push(row);
        }
        writer.add(ITEMS, csv::encode(&ITEM_HEADERS, &item_rows)?.into_bytes());
        counts.items = snapshot.items.len();

        let embedded_images = payloads.len();
        for (member, payload) in payloads {
            writer.add(member, payload);
        }

        let archive = writer.finish()?;
        for kind in EntityKind::all() {
            metrics::counter!("stockpile_rows_exported_total", "kind" => kind.as_str())
                .increment(counts.get(*kind) as u64);
        }
        tracing::info!(
            counts = %counts,
            embedded_images,
            unresolved = unresolved_images.len(),
            bytes = archive.len(),
            "Export complete"
        );

        Ok(ExportResult {
            archive,
            counts,
            embedded_images,
            unresolved_images,
        })
    }

    /// Exports the store and writes the archive to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the export fails or the file cannot be written.
    pub fn export_to_file(&self, path: &Path, options: &ExportOptions) -> Result<ExportResult> {
        let result = self.export(options)?;
        std::fs::write(path, &result.archive).map_err(|e| {
            Error::operation("write_export_file", format!("{}: {e}", path.display()))
        })?;
        Ok(result)
    }

    fn read_snapshot(&self) -> Result<Snapshot> {
        let mut lookups = Vec::with_capacity(LookupKind::all().len());
        for kind in LookupKind::all() {
            lookups.push((*kind, self.store.list_lookups(*kind)?));
        }
        let items = self.store.list_items()?;
        let images = self.store.list_images()?;
        Ok(Snapshot {
            lookups,
            items,
            images,
        })
    }
}

fn lookup_row(kind: LookupKind, record: &LookupRecord) -> CsvRow {
    CsvRow::from([
        (layout::id_column(kind).to_string(), record.id.to_string()),
        ("uuid".to_string(), record.uuid.to_string()),
        ("name".to_string(), record.name.clone()),
        (
            "description".to_string(),
            record.description.clone().unwrap_or_default(),
        ),
        ("created_at".to_string(), cells::timestamp(&record.created_at)),
        (
            "updated_at".to_string(),
            cells::optional_timestamp(record.updated_at.as_ref()),
        ),
    ])
}

fn image_row(meta: &ImageMeta) -> CsvRow {
    CsvRow::from([
        ("image_id".to_string(), meta.id.to_string()),
        ("uuid".to_string(), meta.uuid.to_string()),
        ("image_mimetype".to_string(), meta.mimetype.clone()),
        ("image_filename".to_string(), meta.filename.clone()),
        ("created_at".to_string(), cells::timestamp(&meta.created_at)),
    ])
}

/// Item row with empty image columns; see [`attach_image`].
fn item_row(item: &Item) -> CsvRow {
    CsvRow::from([
        ("item_id".to_string(), item.id.to_string()),
        ("uuid".to_string(), item.uuid.to_string()),
        ("name".to_string(), item.name.clone()),
        (
            "description".to_string(),
            item.description.clone().unwrap_or_default(),
        ),
        ("location_id".to_string(), item.location_id.to_string()),
        ("category_id".to_string(), item.category_id.to_string()),
        ("price".to_string(), cells::optional(item.price)),
        ("owner_id".to_string(), item.owner_id.to_string()),
        ("created_at".to_string(), cells::timestamp(&item.created_at)),
        (
            "updated_at".to_string(),
            cells::optional_timestamp(item.updated_at.as_ref()),
        ),
    ])
}

fn attach_image(row: &mut CsvRow, blob: &ImageBlob, zip_filename: &str) {
    row.insert("image_id".to_string(), blob.meta.id.to_string());
    row.insert("image_uuid".to_string(), blob.meta.uuid.to_string());
    row.insert("image_zip_filename".to_string(), zip_filename.to_string());
    row.insert(
        "image_original_filename".to_string(),
        blob.meta.filename.clone(),
    );
}

fn zip_filename(item_id: RowId, blob: &ImageBlob) -> String {
    let ext = extension(&blob.meta.filename).unwrap_or_else(|| FALLBACK_EXTENSION.to_string());
    format!("{item_id}.{ext}")
}
