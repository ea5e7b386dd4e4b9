//! MIME type detection based on file extensions.

use std::path::Path;

/// Content type used when the extension is not recognized.
pub const UNKNOWN: &str = "application/octet-stream";

/// Looks up the content type for a file name by its extension.
///
/// Matching is case-insensitive. Returns `None` for unknown or missing
/// extensions.
pub fn lookup(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name).extension()?.to_str()?;

    let mime = match ext.to_ascii_lowercase().as_str() {
        // Text
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "text/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "txt" | "text" | "log" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "bmp" => "image/bmp",

        // Audio/Video
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "swf" => "application/x-shockwave-flash",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",

        // Archives and documents
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "pdf" => "application/pdf",
        "wasm" => "application/wasm",

        _ => return None,
    };

    Some(mime)
}

/// Content type for `file_name`, falling back to [`UNKNOWN`].
pub fn content_type(file_name: &str) -> &'static str {
    lookup(file_name).unwrap_or(UNKNOWN)
}
