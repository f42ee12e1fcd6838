//! File extension handling for embedded images.

/// MIME type used when the extension is unknown.
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Extension used for image members when the source filename has none.
pub const FALLBACK_EXTENSION: &str = "bin";

/// Returns the lowercase extension of `filename`, if it has a usable one.
///
/// Only ASCII alphanumeric extensions are accepted, so the result is safe to
/// embed in a member name.
#[must_use]
pub fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Derives a MIME type from a filename's extension.
#[must_use]
pub fn mime_for_filename(filename: &str) -> &'static str {
    match extension(filename).as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        Some("tif" | "tiff") => "image/tiff",
        Some("heic") => "image/heic",
        Some("heif") => "image/heif",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",
        _ => FALLBACK_MIME,
    }
}
