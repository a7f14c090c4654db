//! Extension → MIME type table.
//!
//! Deliberately short: requests for anything else get a 415 and a log line
//! asking for the extension to be added here.

/// Known extensions, sorted by extension.
const MIME_TYPES: &[(&str, &str)] = &[
    ("css", "text/css"),
    ("gif", "image/gif"),
    ("gz", "application/gzip"),
    ("html", "text/html"),
    ("ico", "image/x-icon"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("js", "text/javascript"),
    ("json", "application/json"),
    ("map", "application/json"),
    ("mjs", "text/javascript"),
    ("mov", "video/quicktime"),
    ("mp3", "audio/mpeg"),
    ("mp4", "video/mp4"),
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("rss", "text/xml"),
    ("svg", "image/svg+xml"),
    ("wasm", "application/wasm"),
    ("webp", "image/webp"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("xml", "application/xml"),
];

/// MIME type for a lowercased extension without the dot.
pub fn content_type(ext: &str) -> Option<&'static str> {
    MIME_TYPES
        .binary_search_by_key(&ext, |(known, _)| known)
        .ok()
        .map(|i| MIME_TYPES[i].1)
}
