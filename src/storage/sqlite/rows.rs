//! Row conversion between `SQLite` text columns and model types.
//!
//! UUIDs and timestamps are stored as text (RFC 3339 for timestamps) so the
//! database stays readable with the stock `sqlite3` shell.

use crate::models::{ImageMeta, Item, LookupRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use uuid::Uuid;

/// Column list matching [`lookup_from_row`].
pub const LOOKUP_COLUMNS: &str = "id, uuid, name, description, created_at, updated_at";

/// Column list matching [`image_meta_from_row`].
pub const IMAGE_COLUMNS: &str = "id, uuid, mimetype, filename, created_at";

/// Column list matching [`item_from_row`].
pub const ITEM_COLUMNS: &str = "id, uuid, name, description, price, location_id, category_id, \
                                owner_id, image_id, image_uuid, created_at, updated_at";

/// Formats a timestamp for storage.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn conversion_error(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text).map_err(|e| conversion_error(idx, e))
}

fn optional_uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let text: Option<String> = row.get(idx)?;
    text.filter(|t| !t.is_empty())
        .map(|t| Uuid::parse_str(&t).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn optional_timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let text: Option<String> = row.get(idx)?;
    text.filter(|t| !t.is_empty())
        .map(|t| {
            DateTime::parse_from_rfc3339(&t)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| conversion_error(idx, e))
        })
        .transpose()
}

/// Builds a lookup record from a row selected with [`LOOKUP_COLUMNS`].
pub fn lookup_from_row(row: &Row<'_>) -> rusqlite::Result<LookupRecord> {
    Ok(LookupRecord {
        id: row.get(0)?,
        uuid: uuid_at(row, 1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: timestamp_at(row, 4)?,
        updated_at: optional_timestamp_at(row, 5)?,
    })
}

/// Builds image metadata from a row selected with [`IMAGE_COLUMNS`].
pub fn image_meta_from_row(row: &Row<'_>) -> rusqlite::Result<ImageMeta> {
    Ok(ImageMeta {
        id: row.get(0)?,
        uuid: uuid_at(row, 1)?,
        mimetype: row.get(2)?,
        filename: row.get(3)?,
        created_at: timestamp_at(row, 4)?,
    })
}

/// Builds an item from a row selected with [`ITEM_COLUMNS`].
pub fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        uuid: uuid_at(row, 1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        price: row.get(4)?,
        location_id: row.get(5)?,
        category_id: row.get(6)?,
        owner_id: row.get(7)?,
        image_id: row.get(8)?,
        image_uuid: optional_uuid_at(row, 9)?,
        created_at: timestamp_at(row, 10)?,
        updated_at: optional_timestamp_at(row, 11)?,
    })
}
