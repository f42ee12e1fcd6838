//! `manifest.json`: format version and provenance of an archive.

use crate::io::version::CURRENT_VERSION;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Archive manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Archive format version, e.g. `"1.2"`.
    pub export_format_version: String,
    /// When the archive was produced.
    pub exported_at: Option<DateTime<Utc>>,
    /// Identifier of the store the archive was taken from.
    pub source_provider: Option<String>,
}

impl Manifest {
    /// Creates a manifest for a fresh export at the current format version.
    #[must_use]
    pub fn current(source_provider: &str, exported_at: DateTime<Utc>) -> Self {
        Self {
            export_format_version: CURRENT_VERSION.to_string(),
            exported_at: Some(exported_at),
            source_provider: Some(source_provider.to_string()),
        }
    }

    /// Serializes the manifest as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON encoding fails.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| Error::operation("encode_manifest", e))
    }

    /// Parses a manifest.
    ///
    /// The version may be a JSON string or number. Unknown fields are ignored
    /// and an unparsable `exportedAt` is dropped rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the bytes are not a JSON object or
    /// carry no usable `exportFormatVersion`.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| Error::Validation(format!("manifest.json is not valid JSON: {e}")))?;
        let Value::Object(fields) = value else {
            return Err(Error::Validation(
                "manifest.json is not a JSON object".to_string(),
            ));
        };

        let export_format_version = match fields.get("exportFormatVersion") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(Error::Validation(
                    "manifest.json has no exportFormatVersion".to_string(),
                ));
            },
        };
        let exported_at = fields
            .get("exportedAt")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|ts| ts.with_timezone(&Utc));
        let source_provider = fields
            .get("sourceProvider")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            export_format_version,
            exported_at,
            source_provider,
        })
    }
}
