//! Archive container: layout, manifest, reading and writing.

pub mod cells;
pub mod layout;
pub mod manifest;
pub mod mime;
mod reader;
mod writer;

pub use manifest::Manifest;
pub use reader::{ArchiveHandle, parse};
pub use writer::ArchiveWriter;
