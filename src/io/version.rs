//! Format version dispatch.
//!
//! Every recognised version is read by column name, so layouts that lack a
//! later column (1.0 has no `image_zip_filename`) import with that column
//! treated as empty.

use crate::{Error, Result};

/// Format version written by this build.
pub const CURRENT_VERSION: &str = "1.2";

/// Older format versions still accepted on import.
pub const LEGACY_VERSIONS: [&str; 2] = ["1.0", "1.1"];

/// Importer selected for an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStrategy {
    /// The column-name based importer shared by all recognised versions.
    Tabular,
}

impl ImportStrategy {
    /// Returns the strategy name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tabular => "tabular",
        }
    }
}

impl std::fmt::Display for ImportStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true if `version` is current or a recognised legacy version.
#[must_use]
pub fn is_supported(version: &str) -> bool {
    version == CURRENT_VERSION || LEGACY_VERSIONS.contains(&version)
}

/// Selects the importer for a declared format version.
///
/// # Errors
///
/// Returns [`Error::UnsupportedVersion`] for any unrecognised version.
pub fn dispatch(version: &str) -> Result<ImportStrategy> {
    let version = version.trim();
    if is_supported(version) {
        Ok(ImportStrategy::Tabular)
    } else {
        Err(Error::UnsupportedVersion(version.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("1.2" ; "current")]
    #[test_case("1.1" ; "legacy 1.1")]
    #[test_case("1.0" ; "legacy 1.0")]
    #[test_case(" 1.2 " ; "padded")]
    fn test_supported(version: &str) {
        assert_eq!(dispatch(version).unwrap(), ImportStrategy::Tabular);
    }

    #[test_case("99.0" ; "future")]
    #[test_case("" ; "empty")]
    #[test_case("1" ; "truncated")]
    #[test_case("2.0" ; "next major")]
    fn test_unsupported(version: &str) {
        assert!(matches!(dispatch(version), Err(Error::UnsupportedVersion(_))));
    }
}
