//! Image rows and payloads.

use super::RowId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Image metadata without the payload bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMeta {
    /// Store-assigned id.
    pub id: RowId,
    /// Durable identity.
    pub uuid: Uuid,
    /// MIME type of the payload.
    pub mimetype: String,
    /// Original file name.
    pub filename: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// An image resolved together with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    /// Metadata of the resolved image.
    pub meta: ImageMeta,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

/// Image data handed to an item insert or update.
///
/// The store creates (or replaces) an image row with the requested identity
/// and attaches it to the item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Identity to preserve; the store assigns one when absent.
    pub uuid: Option<Uuid>,
    /// MIME type of the payload.
    pub mimetype: String,
    /// Original file name.
    pub filename: String,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}
