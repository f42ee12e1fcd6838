//! Archive writer.

use crate::{Error, Result};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Collects members and packs them into a ZIP container.
///
/// Members are written in insertion order with a fixed modification time, so
/// identical input always yields identical bytes.
#[derive(Debug, Default)]
pub struct ArchiveWriter {
    members: Vec<(String, Vec<u8>)>,
}

impl ArchiveWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a member.
    pub fn add(&mut self, name: impl Into<String>, data: Vec<u8>) -> &mut Self {
        self.members.push((name.into(), data));
        self
    }

    /// Returns the number of queued members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true if nothing has been queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Writes the container and returns its bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the ZIP encoder fails.
    pub fn finish(self) -> Result<Vec<u8>> {
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut cursor);
            for (name, data) in &self.members {
                zip.start_file(name.as_str(), options)
                    .map_err(|e| Error::operation("write_archive_member", format!("{name}: {e}")))?;
                zip.write_all(data)
                    .map_err(|e| Error::operation("write_archive_member", format!("{name}: {e}")))?;
            }
            zip.finish()
                .map_err(|e| Error::operation("finish_archive", e))?;
        }
        Ok(cursor.into_inner())
    }
}
