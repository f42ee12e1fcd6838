//! Entity kinds and the shared shape of locations, categories and owners.

use super::RowId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Every collection held by an entity store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Where items are kept.
    Location,
    /// How items are grouped.
    Category,
    /// Who items belong to.
    Owner,
    /// Binary image attached to an item.
    Image,
    /// An inventory item.
    Item,
}

impl EntityKind {
    /// Returns all kinds in dependency order (referenced kinds first).
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Location,
            Self::Category,
            Self::Owner,
            Self::Image,
            Self::Item,
        ]
    }

    /// Returns the kind as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::Category => "category",
            Self::Owner => "owner",
            Self::Image => "image",
            Self::Item => "item",
        }
    }

    /// Returns the plural collection name (also the `SQLite` table name).
    #[must_use]
    pub const fn collection(&self) -> &'static str {
        match self {
            Self::Location => "locations",
            Self::Category => "categories",
            Self::Owner => "owners",
            Self::Image => "images",
            Self::Item => "items",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The three kinds that items reference and that share one row shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupKind {
    /// Where items are kept.
    Location,
    /// How items are grouped.
    Category,
    /// Who items belong to.
    Owner,
}

impl LookupKind {
    /// Returns the lookup kinds in import order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Location, Self::Category, Self::Owner]
    }

    /// Returns the kind as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        EntityKind::from_lookup(*self).as_str()
    }

    /// Returns the plural collection name.
    #[must_use]
    pub const fn collection(&self) -> &'static str {
        EntityKind::from_lookup(*self).collection()
    }

    /// Parses a kind name, accepting singular and plural forms.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "location" | "locations" => Some(Self::Location),
            "category" | "categories" => Some(Self::Category),
            "owner" | "owners" => Some(Self::Owner),
            _ => None,
        }
    }
}

impl EntityKind {
    /// Returns the lookup kind for locations, categories and owners.
    #[must_use]
    pub const fn as_lookup(self) -> Option<LookupKind> {
        match self {
            Self::Location => Some(LookupKind::Location),
            Self::Category => Some(LookupKind::Category),
            Self::Owner => Some(LookupKind::Owner),
            Self::Image | Self::Item => None,
        }
    }

    const fn from_lookup(kind: LookupKind) -> Self {
        match kind {
            LookupKind::Location => Self::Location,
            LookupKind::Category => Self::Category,
            LookupKind::Owner => Self::Owner,
        }
    }
}

impl From<LookupKind> for EntityKind {
    fn from(kind: LookupKind) -> Self {
        Self::from_lookup(kind)
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored location, category or owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupRecord {
    /// Store-assigned id.
    pub id: RowId,
    /// Durable identity.
    pub uuid: Uuid,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert payload for a location, category or owner.
///
/// Absent `uuid` and `created_at` are assigned by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewLookupRecord {
    /// Identity to carry forward, if any.
    pub uuid: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Creation time to preserve.
    pub created_at: Option<DateTime<Utc>>,
    /// Modification time to preserve.
    pub updated_at: Option<DateTime<Utc>>,
}

impl NewLookupRecord {
    /// Creates a payload with just a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the UUID to preserve.
    #[must_use]
    pub const fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = Some(uuid);
        self
    }
}

/// Identifiers handed back by an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertedRow {
    /// Newly assigned id.
    pub id: RowId,
    /// Identity of the new row.
    pub uuid: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_kind_parse() {
        assert_eq!(LookupKind::parse("location"), Some(LookupKind::Location));
        assert_eq!(LookupKind::parse("Categories"), Some(LookupKind::Category));
        assert_eq!(LookupKind::parse("OWNER"), Some(LookupKind::Owner));
        assert_eq!(LookupKind::parse("item"), None);
    }

    #[test]
    fn test_lookup_kind_maps_to_entity_kind() {
        for kind in LookupKind::all() {
            let entity: EntityKind = (*kind).into();
            assert_eq!(entity.as_str(), kind.as_str());
            assert_eq!(entity.collection(), kind.collection());
        }
    }

    #[test]
    fn test_entity_kind_dependency_order() {
        let all = EntityKind::all();
        let item = all.iter().position(|k| *k == EntityKind::Item);
        assert_eq!(item, Some(all.len() - 1));
    }
}
