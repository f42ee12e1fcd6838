//! # Stockpile
//!
//! Export, import and wipe engine for the stockpile inventory store.
//!
//! Stockpile turns the full contents of an entity store (locations, categories,
//! owners, images and items) into one self-contained ZIP archive, and can later
//! rebuild a store from such an archive or clear a store in dependency-safe order.
//!
//! ## Features
//!
//! - Portable archives: a manifest, five CSV tables and the raw image payloads
//! - Identity-preserving import: integer ids are remapped, UUIDs survive
//! - Format version dispatch with recognised legacy versions
//! - Reverse-dependency wipe tolerant of already-missing rows
//! - Pluggable store backends (`SQLite`, in-memory) behind one trait
//!
//! ## Example
//!
//! ```rust,ignore
//! use stockpile::services::{ExportOptions, ExportService, ImportService};
//! use stockpile::storage::MemoryStore;
//! use std::sync::Arc;
//!
//! let source = Arc::new(MemoryStore::new());
//! let exported = ExportService::new(source).export(&ExportOptions::default())?;
//!
//! let target = Arc::new(MemoryStore::new());
//! let result = ImportService::new(target).import(&exported.archive)?;
//! assert!(result.success);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
pub mod io;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::{StockpileConfig, StoreProvider};
pub use models::{EntityKind, LookupKind};
pub use services::{
    DeletionOutcome, DestroyResult, DestroyService, EntityDeletionService, ExportOptions,
    ExportResult, ExportService, ImportResult, ImportService,
};
pub use storage::{EntityStore, MemoryStore, SqliteStore, StoreFactory};

/// Error type for stockpile operations.
///
/// Only structural and pre-flight failures are raised through this type.
/// Expected business outcomes (a partially applied import, a skipped item,
/// an entity that is still in use) are returned as result values instead.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `Configuration` | Store provider or database path is missing or invalid |
/// | `Validation` | Archive lacks a required member, or a member cannot be decoded |
/// | `Parse` | CSV text has malformed quoting or ragged rows |
/// | `UnsupportedVersion` | Manifest declares a format version no importer handles |
/// | `Remote` | The entity store rejected a list/insert/delete call |
/// | `OperationFailed` | Local I/O, ZIP container or JSON encoding failures |
#[derive(Debug, ThisError)]
pub enum Error {
    /// The store is not configured well enough to make any call.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The archive is structurally invalid.
    ///
    /// Raised when:
    /// - One of the five CSV members or `manifest.json` is missing
    /// - A CSV member is not valid UTF-8 or fails to parse
    /// - A referenced image cannot be resolved and strict export was requested
    #[error("validation failed: {0}")]
    Validation(String),

    /// CSV text could not be decoded.
    #[error("CSV parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number of the offending record.
        line: u64,
        /// What went wrong.
        message: String,
    },

    /// The manifest declares an unknown export format version.
    #[error("unsupported export format version '{0}'")]
    UnsupportedVersion(String),

    /// A call against the entity store failed.
    ///
    /// The cause carries whatever diagnostic text the backend supplied.
    #[error("store operation '{operation}' failed: {cause}")]
    Remote {
        /// The store operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A local operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Builds a [`Error::Remote`] from an operation name and any displayable cause.
    pub fn remote(operation: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Remote {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }

    /// Builds a [`Error::OperationFailed`] from an operation name and any displayable cause.
    pub fn operation(operation: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for stockpile operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Validation("missing items.csv".to_string());
        assert_eq!(err.to_string(), "validation failed: missing items.csv");

        let err = Error::remote("insert_location", "connection refused");
        assert_eq!(
            err.to_string(),
            "store operation 'insert_location' failed: connection refused"
        );

        let err = Error::Parse {
            line: 3,
            message: "unterminated quoted field".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "CSV parse error on line 3: unterminated quoted field"
        );

        let err = Error::UnsupportedVersion("99.0".to_string());
        assert!(err.to_string().contains("99.0"));
    }
}
