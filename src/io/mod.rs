//! Archive I/O subsystem.
//!
//! # Architecture
//!
//! - [`formats`]: the CSV codec used for every table member
//! - [`archive`]: container layout, manifest, reader (with structural validation) and writer
//! - [`version`]: routes a parsed archive to the importer for its declared format version
//!
//! The engines that move rows between an archive and a store live in
//! [`crate::services`].

pub mod archive;
pub mod formats;
pub mod version;

pub use archive::{ArchiveHandle, ArchiveWriter, Manifest, parse};
pub use version::{CURRENT_VERSION, ImportStrategy, LEGACY_VERSIONS, dispatch};
