//! Archive import.
//!
//! Import always replaces the store's contents: the archive is validated and
//! fully decoded, the store is wiped, then rows are recreated in dependency
//! order. Archived integer ids are translated through per-kind remap tables
//! that live only for the duration of one call; UUIDs are carried forward.

use super::{DestroyService, EntityCounts};
use crate::io::archive::layout::{self, IMAGES, ITEMS};
use crate::io::archive::mime::mime_for_filename;
use crate::io::archive::{ArchiveHandle, cells, parse};
use crate::io::formats::csv::CsvRow;
use crate::io::version::{ImportStrategy, dispatch};
use crate::models::{ImageUpload, LookupKind, NewItem, NewLookupRecord, RowId};
use crate::storage::EntityStore;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::instrument;

/// A non-fatal condition recorded during import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportWarning {
    /// An item referenced a location, category or owner that was not
    /// imported; the item was skipped.
    ReferentialSkip {
        /// Item id as recorded in the archive.
        item_id: String,
        /// Item name.
        name: String,
        /// The unresolved references, e.g. `location 4`.
        missing: Vec<String>,
    },
    /// An item named an image file the archive does not contain; the item
    /// was imported without an image.
    MissingImage {
        /// Item id as recorded in the archive.
        item_id: String,
        /// The missing file name under `images/`.
        zip_filename: String,
    },
    /// A cell could not be interpreted and was treated as empty.
    InvalidValue {
        /// Table member the cell came from.
        member: &'static str,
        /// Row id as recorded in the archive.
        row_id: String,
        /// Column name.
        column: &'static str,
        /// The rejected text.
        value: String,
    },
}

impl ImportWarning {
    /// Returns true if the warning means a row was not imported.
    #[must_use]
    pub const fn is_skip(&self) -> bool {
        matches!(self, Self::ReferentialSkip { .. })
    }
}

impl fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReferentialSkip {
                item_id,
                name,
                missing,
            } => write!(
                f,
                "skipped item {item_id} ({name}): unresolved {}",
                missing.join(", ")
            ),
            Self::MissingImage {
                item_id,
                zip_filename,
            } => write!(
                f,
                "item {item_id}: image file {zip_filename} not in archive, imported without image"
            ),
            Self::InvalidValue {
                member,
                row_id,
                column,
                value,
            } => write!(f, "{member} row {row_id}: ignored invalid {column} '{value}'"),
        }
    }
}

/// Result of an import.
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    /// True if every phase ran to completion.
    pub success: bool,
    /// Format version declared by the archive.
    pub version: String,
    /// Rows created per kind.
    pub counts: EntityCounts,
    /// Rows removed by the wipe that preceded the import.
    pub wiped: EntityCounts,
    /// Items not imported.
    pub skipped_items: usize,
    /// Non-fatal conditions, in the order they occurred.
    pub warnings: Vec<ImportWarning>,
    /// What failed, for an unsuccessful import.
    pub detail: Option<String>,
}

impl ImportResult {
    /// Returns whether any warnings were recorded.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    fn fail(mut self, detail: String) -> Self {
        tracing::error!(detail = %detail, counts = %self.counts, "Import aborted");
        self.success = false;
        self.detail = Some(detail);
        self
    }
}

/// Archive tables decoded ahead of any mutation.
struct DecodedTables {
    lookups: Vec<(LookupKind, Vec<CsvRow>)>,
    items: Vec<CsvRow>,
}

/// Call-scoped translation from archived ids to newly assigned ids.
#[derive(Default)]
struct RemapTables {
    tables: HashMap<LookupKind, HashMap<RowId, RowId>>,
}

impl RemapTables {
    fn record(&mut self, kind: LookupKind, archived: RowId, assigned: RowId) {
        self.tables.entry(kind).or_default().insert(archived, assigned);
    }

    fn resolve(&self, kind: LookupKind, archived: Option<RowId>) -> Option<RowId> {
        self.tables.get(&kind)?.get(&archived?).copied()
    }
}

/// Service for importing an archive into a store.
pub struct ImportService {
    store: Arc<dyn EntityStore>,
}

impl ImportService {
    /// Creates a new import service.
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Validates, dispatches and imports archive bytes.
    ///
    /// # Errors
    ///
    /// Structural problems are raised before the store is touched:
    /// [`Error::Validation`] for a malformed archive or table, and
    /// [`Error::UnsupportedVersion`] for an unknown format version.
    /// Failures after the wipe has started are reported through
    /// [`ImportResult::detail`] instead.
    pub fn import(&self, bytes: &[u8]) -> Result<ImportResult> {
        let handle = parse(bytes)?;
        self.import_archive(&handle)
    }

    /// Reads an archive file and imports it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or as [`Self::import`].
    pub fn import_from_file(&self, path: &Path) -> Result<ImportResult> {
        let bytes = std::fs::read(path).map_err(|e| {
            Error::operation("read_import_file", format!("{}: {e}", path.display()))
        })?;
        self.import(&bytes)
    }

    /// Imports an already parsed archive.
    ///
    /// # Errors
    ///
    /// As [`Self::import`].
    #[instrument(skip(self, handle), fields(provider = self.store.provider()))]
    pub fn import_archive(&self, handle: &ArchiveHandle) -> Result<ImportResult> {
        let version = handle.read_version();
        match dispatch(&version)? {
            ImportStrategy::Tabular => {
                let tables = decode_tables(handle)?;
                tracing::info!(version = %version, "Importing archive");
                Ok(self.import_tables(handle, &tables, version))
            },
        }
    }

    fn import_tables(
        &self,
        handle: &ArchiveHandle,
        tables: &DecodedTables,
        version: String,
    ) -> ImportResult {
        let mut result = ImportResult {
            version,
            ..ImportResult::default()
        };

        let destroyed = DestroyService::new(Arc::clone(&self.store)).destroy();
        result.wiped = destroyed.deleted;
        if !destroyed.success {
            let detail = destroyed
                .detail
                .unwrap_or_else(|| "wiping the store failed".to_string());
            return result.fail(format!("import aborted before inserting: {detail}"));
        }

        let mut remap = RemapTables::default();
        for (kind, rows) in &tables.lookups {
            if let Err(e) = self.import_lookups(*kind, rows, &mut remap, &mut result) {
                let detail = format!(
                    "inserting {} failed after creating {}: {e}; the store is partially populated",
                    kind.collection(),
                    result.counts
                );
                return result.fail(detail);
            }
            tracing::info!(kind = %kind, imported = result.counts.get((*kind).into()), "Import phase complete");
        }

        if let Err(e) = self.import_items(handle, &tables.items, &remap, &mut result) {
            let detail = format!(
                "inserting items failed after creating {}: {e}; the store is partially populated",
                result.counts
            );
            return result.fail(detail);
        }
        tracing::info!(
            imported = result.counts.items,
            skipped = result.skipped_items,
            warnings = result.warnings.len(),
            "Import complete"
        );

        result.success = true;
        result
    }

    fn import_lookups(
        &self,
        kind: LookupKind,
        rows: &[CsvRow],
        remap: &mut RemapTables,
        result: &mut ImportResult,
    ) -> Result<()> {
        let member = layout::lookup_member(kind);
        let id_column = layout::id_column(kind);

        for row in rows {
            let archived_id = cells::parse_id(row.get(id_column));
            let row_id = row.get(id_column).cloned().unwrap_or_default();
            let record = NewLookupRecord {
                uuid: cells::parse_uuid(row.get("uuid")),
                name: row.get("name").cloned().unwrap_or_default(),
                description: cells::text(row.get("description")),
                created_at: timestamp_cell(row, member, &row_id, "created_at", result),
                updated_at: timestamp_cell(row, member, &row_id, "updated_at", result),
            };
            let inserted = self.store.insert_lookup(kind, &record)?;
            result.counts.add(kind.into(), 1);
            metrics::counter!("stockpile_rows_imported_total", "kind" => kind.as_str())
                .increment(1);

            match archived_id {
                Some(archived) => remap.record(kind, archived, inserted.id),
                None => result.warnings.push(ImportWarning::InvalidValue {
                    member,
                    value: row_id.clone(),
                    row_id,
                    column: id_column,
                }),
            }
            tracing::debug!(kind = %kind, archived = ?archived_id, assigned = inserted.id, "Imported row");
        }
        Ok(())
    }

    fn import_items(
        &self,
        handle: &ArchiveHandle,
        rows: &[CsvRow],
        remap: &RemapTables,
        result: &mut ImportResult,
    ) -> Result<()> {
        for row in rows {
            let item_id = row.get("item_id").cloned().unwrap_or_default();
            let name = row.get("name").cloned().unwrap_or_default();

            let mut resolved = [0; 3];
            let mut missing = Vec::new();
            for (slot, kind) in resolved.iter_mut().zip(LookupKind::all()) {
                let cell = row.get(layout::id_column(*kind));
                match remap.resolve(*kind, cells::parse_id(cell)) {
                    Some(id) => *slot = id,
                    None => missing.push(format!(
                        "{kind} {}",
                        cell.map_or("<none>", String::as_str)
                    )),
                }
            }
            if !missing.is_empty() {
                tracing::warn!(item_id = %item_id, missing = ?missing, "Skipping item with unresolved references");
                metrics::counter!("stockpile_items_skipped_total").increment(1);
                result.skipped_items += 1;
                result.warnings.push(ImportWarning::ReferentialSkip {
                    item_id,
                    name,
                    missing,
                });
                continue;
            }
            let [location_id, category_id, owner_id] = resolved;

            let price = match cells::non_empty(row.get("price")) {
                Some(text) => text.parse::<f64>().ok().filter(|p| p.is_finite()).or_else(|| {
                    result.warnings.push(ImportWarning::InvalidValue {
                        member: ITEMS,
                        row_id: item_id.clone(),
                        column: "price",
                        value: text.to_string(),
                    });
                    None
                }),
                None => None,
            };

            let image = image_upload(handle, row, &item_id, result);
            let created_at = timestamp_cell(row, ITEMS, &item_id, "created_at", result);
            let updated_at = timestamp_cell(row, ITEMS, &item_id, "updated_at", result);
            let item = NewItem {
                uuid: cells::parse_uuid(row.get("uuid")),
                name,
                description: cells::text(row.get("description")),
                price,
                location_id,
                category_id,
                owner_id,
                image,
                created_at,
                updated_at,
            };

            let inserted = self.store.insert_item(&item)?;
            result.counts.items += 1;
            metrics::counter!("stockpile_rows_imported_total", "kind" => "item").increment(1);
            if inserted.image_uuid.is_some() {
                result.counts.images += 1;
                metrics::counter!("stockpile_rows_imported_total", "kind" => "image")
                    .increment(1);
            }
            tracing::debug!(item_id = %item_id, assigned = inserted.id, "Imported item");
        }
        Ok(())
    }
}

/// Builds the image upload for an item row, if it names an embedded file.
fn image_upload(
    handle: &ArchiveHandle,
    row: &CsvRow,
    item_id: &str,
    result: &mut ImportResult,
) -> Option<ImageUpload> {
    let zip_filename = cells::non_empty(row.get("image_zip_filename"))?;
    let Some(payload) = handle.image(zip_filename) else {
        tracing::warn!(item_id, zip_filename, "Image file missing from archive");
        result.warnings.push(ImportWarning::MissingImage {
            item_id: item_id.to_string(),
            zip_filename: zip_filename.to_string(),
        });
        return None;
    };

    let filename = cells::text(row.get("image_original_filename"))
        .unwrap_or_else(|| zip_filename.to_string());
    Some(ImageUpload {
        uuid: cells::parse_uuid(row.get("image_uuid")),
        mimetype: mime_for_filename(&filename).to_string(),
        filename,
        payload: payload.to_vec(),
    })
}

/// Parses a timestamp column, warning when a non-empty cell is unreadable.
///
/// An unreadable cell is left to the store's default, like an empty one.
fn timestamp_cell(
    row: &CsvRow,
    member: &'static str,
    row_id: &str,
    column: &'static str,
    result: &mut ImportResult,
) -> Option<DateTime<Utc>> {
    let cell = row.get(column);
    let parsed = cells::parse_timestamp(cell);
    if let (None, Some(value)) = (parsed, cells::non_empty(cell)) {
        tracing::warn!(member, row_id, column, value, "Ignoring unreadable timestamp");
        result.warnings.push(ImportWarning::InvalidValue {
            member,
            row_id: row_id.to_string(),
            column,
            value: value.to_string(),
        });
    }
    parsed
}

/// Decodes every table so malformed input is rejected before the wipe.
fn decode_tables(handle: &ArchiveHandle) -> Result<DecodedTables> {
    let mut lookups = Vec::with_capacity(LookupKind::all().len());
    for kind in LookupKind::all() {
        lookups.push((*kind, handle.rows(layout::lookup_member(*kind))?));
    }
    // images.csv is informational; images are recreated from item rows.
    handle.rows(IMAGES)?;
    let items = handle.rows(ITEMS)?;
    Ok(DecodedTables { lookups, items })
}
