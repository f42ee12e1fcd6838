//! Inventory items.

use super::{ImageUpload, RowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored item with its foreign keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Store-assigned id.
    pub id: RowId,
    /// Durable identity.
    pub uuid: Uuid,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Price, if recorded.
    pub price: Option<f64>,
    /// Location the item is kept at.
    pub location_id: RowId,
    /// Category the item belongs to.
    pub category_id: RowId,
    /// Owner of the item.
    pub owner_id: RowId,
    /// Attached image row, if any.
    pub image_id: Option<RowId>,
    /// Identity of the attached image.
    ///
    /// Kept alongside `image_id` so the image identity survives id reassignment.
    pub image_uuid: Option<Uuid>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert or update payload for an item.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    /// Identity to carry forward, if any.
    pub uuid: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Price, if recorded.
    pub price: Option<f64>,
    /// Location id in the target store.
    pub location_id: RowId,
    /// Category id in the target store.
    pub category_id: RowId,
    /// Owner id in the target store.
    pub owner_id: RowId,
    /// Image to create and attach.
    pub image: Option<ImageUpload>,
    /// Creation time to preserve.
    pub created_at: Option<DateTime<Utc>>,
    /// Modification time to preserve.
    pub updated_at: Option<DateTime<Utc>>,
}

impl NewItem {
    /// Creates a payload with a name and the three required references.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        location_id: RowId,
        category_id: RowId,
        owner_id: RowId,
    ) -> Self {
        Self {
            uuid: None,
            name: name.into(),
            description: None,
            price: None,
            location_id,
            category_id,
            owner_id,
            image: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the price.
    #[must_use]
    pub const fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Attaches an image.
    #[must_use]
    pub fn with_image(mut self, image: ImageUpload) -> Self {
        self.image = Some(image);
        self
    }
}

/// Identifiers handed back by an item insert or update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertedItem {
    /// Item id.
    pub id: RowId,
    /// Item identity.
    pub uuid: Uuid,
    /// Identity of the attached image after the call.
    pub image_uuid: Option<Uuid>,
}
