//! Archive reader and structural validation.

use super::layout::{IMAGE_DIR, MANIFEST, REQUIRED_MEMBERS, image_member};
use super::manifest::Manifest;
use crate::io::formats::csv::{self, CsvRow};
use crate::io::version::CURRENT_VERSION;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::io::{Cursor, Read};

/// A parsed archive whose required members are known to be present.
///
/// All members are held in memory; nothing refers back to the source bytes.
#[derive(Debug, Clone)]
pub struct ArchiveHandle {
    members: BTreeMap<String, Vec<u8>>,
}

/// Opens an archive and checks that the manifest and all five tables exist.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the bytes are not a ZIP container or a
/// required member is missing.
pub fn parse(bytes: &[u8]) -> Result<ArchiveHandle> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::Validation(format!("not a readable archive: {e}")))?;

    let mut members = BTreeMap::new();
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| Error::Validation(format!("unreadable archive entry: {e}")))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .map_err(|e| Error::Validation(format!("cannot extract {name}: {e}")))?;
        members.insert(name, data);
    }

    let missing: Vec<&str> = REQUIRED_MEMBERS
        .iter()
        .copied()
        .filter(|m| !members.contains_key(*m))
        .collect();
    if !missing.is_empty() {
        return Err(Error::Validation(format!(
            "archive is missing required member(s): {}",
            missing.join(", ")
        )));
    }

    tracing::debug!(members = members.len(), "Parsed archive");
    Ok(ArchiveHandle { members })
}

impl ArchiveHandle {
    /// Returns the parsed manifest, or `None` if it is unreadable or has no version.
    #[must_use]
    pub fn manifest(&self) -> Option<Manifest> {
        let bytes = self.members.get(MANIFEST)?;
        match Manifest::from_json(bytes) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable manifest");
                None
            },
        }
    }

    /// Returns the declared format version, defaulting to the current one.
    #[must_use]
    pub fn read_version(&self) -> String {
        self.manifest()
            .map_or_else(|| CURRENT_VERSION.to_string(), |m| m.export_format_version)
    }

    /// Returns a member as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the member is absent or not UTF-8.
    pub fn text(&self, member: &str) -> Result<&str> {
        let bytes = self
            .members
            .get(member)
            .ok_or_else(|| Error::Validation(format!("archive has no member {member}")))?;
        std::str::from_utf8(bytes)
            .map_err(|e| Error::Validation(format!("{member} is not valid UTF-8: {e}")))
    }

    /// Decodes a CSV member.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the member is absent, not UTF-8, or
    /// not well-formed CSV.
    pub fn rows(&self, member: &str) -> Result<Vec<CsvRow>> {
        let text = self.text(member)?;
        csv::decode(text).map_err(|e| Error::Validation(format!("{member}: {e}")))
    }

    /// Returns the payload of an embedded image by its recorded file name.
    ///
    /// Names containing path separators or parent components never match.
    #[must_use]
    pub fn image(&self, zip_filename: &str) -> Option<&[u8]> {
        if zip_filename.is_empty()
            || zip_filename.contains(['/', '\\'])
            || zip_filename.contains("..")
        {
            return None;
        }
        self.members
            .get(&image_member(zip_filename))
            .map(Vec::as_slice)
    }

    /// Returns the number of embedded image files.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.members
            .keys()
            .filter(|name| name.starts_with(IMAGE_DIR) && name.len() > IMAGE_DIR.len())
            .count()
    }

    /// Returns all member names in sorted order.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::archive::writer::ArchiveWriter;
    use crate::io::archive::layout::{CATEGORIES, IMAGES, ITEMS, LOCATIONS, OWNERS};

    fn archive_with(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ArchiveWriter::new();
        for (name, data) in members {
            writer.add(*name, data.to_vec());
        }
        writer.finish().unwrap()
    }

    fn minimal(manifest: &[u8]) -> Vec<u8> {
        archive_with(&[
            (MANIFEST, manifest),
            (LOCATIONS, b"location_id,uuid,name,description,created_at,updated_at\n"),
            (CATEGORIES, b"category_id,uuid,name,description,created_at,updated_at\n"),
            (OWNERS, b"owner_id,uuid,name,description,created_at,updated_at\n"),
            (IMAGES, b"image_id,uuid,image_mimetype,image_filename,created_at\n"),
            (ITEMS, b"item_id,uuid,name\n"),
            ("images/1.png", b"\x89PNG"),
        ])
    }

    #[test]
    fn test_parse_minimal() {
        let handle = parse(&minimal(br#"{"exportFormatVersion":"1.1"}"#)).unwrap();
        assert_eq!(handle.read_version(), "1.1");
        assert_eq!(handle.image_count(), 1);
        assert!(handle.rows(LOCATIONS).unwrap().is_empty());
    }

    #[test]
    fn test_missing_member_rejected() {
        let bytes = archive_with(&[(MANIFEST, b"{}"), (LOCATIONS, b"location_id\n")]);
        let err = parse(&bytes).unwrap_err();
        assert!(matches!(&err, Error::Validation(msg) if msg.contains("items.csv")));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(parse(b"definitely not a zip"), Err(Error::Validation(_))));
    }

    #[test]
    fn test_version_defaults_when_manifest_unreadable() {
        let handle = parse(&minimal(b"{ broken")).unwrap();
        assert!(handle.manifest().is_none());
        assert_eq!(handle.read_version(), CURRENT_VERSION);

        let handle = parse(&minimal(br#"{"exportedAt":"2024-01-01T00:00:00Z"}"#)).unwrap();
        assert_eq!(handle.read_version(), CURRENT_VERSION);
    }

    #[test]
    fn test_image_lookup_rejects_traversal() {
        let handle = parse(&minimal(b"{}")).unwrap();
        assert_eq!(handle.image("1.png"), Some(&b"\x89PNG"[..]));
        assert!(handle.image("../1.png").is_none());
        assert!(handle.image("sub/1.png").is_none());
        assert!(handle.image("").is_none());
    }

    #[test]
    fn test_non_utf8_member_rejected() {
        let bytes = archive_with(&[
            (MANIFEST, b"{}"),
            (LOCATIONS, b"\xff\xfe"),
            (CATEGORIES, b""),
            (OWNERS, b""),
            (IMAGES, b""),
            (ITEMS, b""),
        ]);
        let handle = parse(&bytes).unwrap();
        assert!(matches!(handle.rows(LOCATIONS), Err(Error::Validation(_))));
    }
}
