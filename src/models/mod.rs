//! Data models for stockpile.
//!
//! Every stored row carries two identifiers: an integer id assigned by the
//! backing store (reassignable across an export/import cycle) and a UUID that
//! is the durable logical identity.

mod entity;
mod image;
mod item;

pub use entity::{EntityKind, InsertedRow, LookupKind, LookupRecord, NewLookupRecord};
pub use image::{ImageBlob, ImageMeta, ImageUpload};
pub use item::{InsertedItem, Item, NewItem};

/// Integer id assigned by the backing store.
pub type RowId = i64;
