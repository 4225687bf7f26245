//! Image MIME type and file extension mapping.

use std::path::Path;

/// MIME type assumed when nothing better is known.
pub const DEFAULT_MIME: &str = "image/png";

/// MIME type for an image path, from its extension (case-insensitive).
///
/// Unrecognized or missing extensions map to `image/png`.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => DEFAULT_MIME,
    }
}

/// File extension to store an artifact of the given MIME type under.
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "png",
    }
}
