//! Property-based tests for the archive codecs.
//!
//! Uses proptest to verify invariants across random inputs:
//! - CSV decode inverts encode for arbitrary cell text
//! - Image extensions are always safe member-name suffixes
//! - Only the known format versions are routed to an importer

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use std::collections::BTreeSet;
use stockpile::Error;
use stockpile::io::archive::mime;
use stockpile::io::formats::{CsvRow, decode_csv, encode_csv};
use stockpile::io::version::{CURRENT_VERSION, LEGACY_VERSIONS, dispatch, is_supported};

/// Two to five distinct header names.
fn headers() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-z_]{1,10}", 2..=5)
        .prop_map(|set: BTreeSet<String>| set.into_iter().collect())
}

/// Headers plus rows of cell text that includes delimiters, quotes and line
/// breaks.
fn table() -> impl Strategy<Value = (Vec<String>, Vec<Vec<String>>)> {
    headers().prop_flat_map(|headers| {
        let width = headers.len();
        let row = prop::collection::vec("[ -~\n\r\t,\"é]{0,16}", width);
        (Just(headers), prop::collection::vec(row, 0..8))
    })
}

proptest! {
    /// Property: decoding an encoded table yields the same rows.
    #[test]
    fn prop_csv_round_trip((headers, cells) in table()) {
        let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
        let rows: Vec<CsvRow> = cells
            .iter()
            .map(|values| headers.iter().cloned().zip(values.iter().cloned()).collect())
            .collect();

        let text = encode_csv(&header_refs, &rows).unwrap();
        let decoded = decode_csv(&text).unwrap();

        prop_assert_eq!(decoded, rows);
    }

    /// Property: cells without special characters are written bare.
    #[test]
    fn prop_csv_plain_cells_stay_unquoted(cell in "[a-zA-Z0-9 ]{1,20}") {
        let mut row = CsvRow::new();
        row.insert("name".to_string(), cell.clone());
        row.insert("note".to_string(), String::new());

        let text = encode_csv(&["name", "note"], &[row]).unwrap();

        prop_assert_eq!(text, format!("name,note\n{cell},\n"));
    }

    /// Property: a derived extension is lowercase ASCII alphanumeric.
    #[test]
    fn prop_extension_is_member_safe(filename in "\\PC{0,24}") {
        if let Some(ext) = mime::extension(&filename) {
            prop_assert!(!ext.is_empty());
            prop_assert!(ext.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
        prop_assert!(mime::mime_for_filename(&filename).contains('/'));
    }

    /// Property: any version other than the known ones is rejected unchanged.
    #[test]
    fn prop_unknown_versions_rejected(version in "[0-9]{1,2}\\.[0-9]{1,2}") {
        let known = version == CURRENT_VERSION || LEGACY_VERSIONS.contains(&version.as_str());
        prop_assert_eq!(is_supported(&version), known);
        match dispatch(&version) {
            Ok(_) => prop_assert!(known),
            Err(Error::UnsupportedVersion(v)) => {
                prop_assert!(!known);
                prop_assert_eq!(v, version);
            },
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }
}
