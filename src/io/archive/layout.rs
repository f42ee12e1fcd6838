//! Member names and column orders of the archive.
//!
//! ```text
//! manifest.json
//! locations.csv   location_id,uuid,name,description,created_at,updated_at
//! categories.csv  category_id,uuid,name,description,created_at,updated_at
//! owners.csv      owner_id,uuid,name,description,created_at,updated_at
//! images.csv      image_id,uuid,image_mimetype,image_filename,created_at
//! items.csv       item_id,uuid,name,description,location_id,category_id,price,owner_id,
//!                 image_id,image_uuid,image_zip_filename,image_original_filename,
//!                 created_at,updated_at
//! images/<item_id>.<ext>
//! ```

use crate::models::LookupKind;

/// Manifest member.
pub const MANIFEST: &str = "manifest.json";
/// Locations table.
pub const LOCATIONS: &str = "locations.csv";
/// Categories table.
pub const CATEGORIES: &str = "categories.csv";
/// Owners table.
pub const OWNERS: &str = "owners.csv";
/// Image metadata table.
pub const IMAGES: &str = "images.csv";
/// Items table.
pub const ITEMS: &str = "items.csv";
/// Prefix of embedded image payloads.
pub const IMAGE_DIR: &str = "images/";

/// Members that must be present for an archive to be accepted.
pub const REQUIRED_MEMBERS: [&str; 6] = [MANIFEST, LOCATIONS, CATEGORIES, OWNERS, IMAGES, ITEMS];

/// Columns of `images.csv`.
pub const IMAGE_HEADERS: [&str; 5] = [
    "image_id",
    "uuid",
    "image_mimetype",
    "image_filename",
    "created_at",
];

/// Columns of `items.csv`.
pub const ITEM_HEADERS: [&str; 14] = [
    "item_id",
    "uuid",
    "name",
    "description",
    "location_id",
    "category_id",
    "price",
    "owner_id",
    "image_id",
    "image_uuid",
    "image_zip_filename",
    "image_original_filename",
    "created_at",
    "updated_at",
];

/// Returns the table member holding rows of `kind`.
#[must_use]
pub const fn lookup_member(kind: LookupKind) -> &'static str {
    match kind {
        LookupKind::Location => LOCATIONS,
        LookupKind::Category => CATEGORIES,
        LookupKind::Owner => OWNERS,
    }
}

/// Returns the id column of `kind`'s table (also the foreign key column in `items.csv`).
#[must_use]
pub const fn id_column(kind: LookupKind) -> &'static str {
    match kind {
        LookupKind::Location => "location_id",
        LookupKind::Category => "category_id",
        LookupKind::Owner => "owner_id",
    }
}

/// Returns the columns of `kind`'s table.
#[must_use]
pub const fn lookup_headers(kind: LookupKind) -> [&'static str; 6] {
    [
        id_column(kind),
        "uuid",
        "name",
        "description",
        "created_at",
        "updated_at",
    ]
}

/// Returns the full member name for an image file name recorded in `items.csv`.
#[must_use]
pub fn image_member(zip_filename: &str) -> String {
    format!("{IMAGE_DIR}{zip_filename}")
}
