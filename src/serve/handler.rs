//! Static file request handling.
//!
//! [`handle`] maps a request onto the output directory and decides the
//! whole reply without touching the socket, so every status the server
//! can produce is reachable from plain unit tests.
//!
//! ```text
//! /posts/first      ──► 302 /posts/first/
//! /posts/first/     ──► public/posts/first/index.html  (+ reload script)
//! /style.css        ──► public/style.css
//! /video.mp4 Range  ──► 206 partial body
//! /notes.xyz        ──► 415
//! ```

use super::{mime, reload::inject_reload_script};
use crate::{
    log,
    logger::log_indented,
    utils::path::extension,
};
use std::{
    borrow::Cow,
    fs::{self, File},
    io::{self, Cursor, Read, Seek, SeekFrom},
    path::{Component, Path, PathBuf},
};

/// Headers that keep the browser from caching anything during development.
const NO_CACHE_HEADERS: &[(&str, &str)] = &[
    ("Cache-Control", "private, no-cache, no-store, must-revalidate"),
    ("Expires", "-1"),
    ("Pragma", "no-cache"),
];

// ============================================================================
// Request / Reply
// ============================================================================

/// The parts of an HTTP request the handler looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestInfo<'a> {
    /// Raw request target, including any query string.
    pub url: &'a str,
    /// `Range` header value.
    pub range: Option<&'a str>,
    /// `Host` header value, used to point the reload socket back here.
    pub host: Option<&'a str>,
}

/// Response body, resolved lazily for file ranges.
#[derive(Debug, PartialEq, Eq)]
pub enum Body {
    Empty,
    Bytes(Vec<u8>),
    /// `len` bytes of `path` starting at `start`.
    File { path: PathBuf, start: u64, len: u64 },
}

impl Body {
    /// Open the body as a reader together with its length.
    pub fn into_reader(self) -> io::Result<(Box<dyn Read + Send>, usize)> {
        match self {
            Self::Empty => Ok((Box::new(io::empty()), 0)),
            Self::Bytes(bytes) => {
                let len = bytes.len();
                Ok((Box::new(Cursor::new(bytes)), len))
            }
            Self::File { path, start, len } => {
                let mut file = File::open(path)?;
                file.seek(SeekFrom::Start(start))?;
                Ok((Box::new(file.take(len)), len as usize))
            }
        }
    }
}

/// A fully decided response.
#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Body,
}

impl Reply {
    fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Body::Empty,
        }
    }

    fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// First value of header `name`, compared case-insensitively.
    #[cfg(test)]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

// ============================================================================
// Handler
// ============================================================================

/// Decide the reply for `request` against the files under `root`.
pub fn handle(root: &Path, request: &RequestInfo) -> Reply {
    let (path, query) = match request.url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (request.url, None),
    };
    let decoded = urlencoding::decode(path).unwrap_or(Cow::Borrowed(path));

    if escapes_root(&decoded) {
        return Reply::status(404);
    }

    let mut file_path = root.join(decoded.trim_start_matches('/'));
    let mut ext = extension(&*decoded);

    if ext.is_empty() {
        if !decoded.ends_with('/') {
            let location = match query {
                Some(query) => format!("{path}/?{query}"),
                None => format!("{path}/"),
            };
            return Reply::status(302).header("Location", location);
        }
        file_path.push("index.html");
        ext = "html".to_owned();
    }

    let Some(content_type) = mime::content_type(&ext) else {
        log!("serve"; "Unknown Media Type for url: {}", request.url);
        log_indented(&format!("  filePath: {}", file_path.display()));
        log_indented(&format!("       ext: {ext}"));
        log_indented("Please add the appropriate mime type to serve/mime.rs");
        return Reply::status(415);
    };

    let Ok(metadata) = fs::metadata(&file_path) else {
        return Reply::status(404);
    };

    if let Some(range) = request.range {
        return serve_range(file_path, content_type, range, metadata.len());
    }

    match fs::read(&file_path) {
        Ok(content) => {
            let content = match request.host {
                Some(host) if ext == "html" => {
                    inject_reload_script(&String::from_utf8_lossy(&content), host).into_bytes()
                }
                _ => content,
            };
            ok(content_type).body(Body::Bytes(content))
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Reply::status(404),
        Err(err) => {
            log!("serve"; "Failed to read {}: {err}", file_path.display());
            Reply::status(500).body(Body::Bytes(format!("{:?}", err.kind()).into_bytes()))
        }
    }
}

/// 200 with content type and no-cache headers.
fn ok(content_type: &str) -> Reply {
    NO_CACHE_HEADERS
        .iter()
        .fold(Reply::status(200), |reply, &(name, value)| reply.header(name, value))
        .header("Content-Type", content_type)
}

fn serve_range(path: PathBuf, content_type: &str, range: &str, size: u64) -> Reply {
    let Some((start, end)) = parse_range(range, size) else {
        return Reply::status(416).header("Content-Range", format!("bytes */{size}"));
    };

    let len = end - start + 1;
    let mut reply = ok(content_type)
        .header("Content-Range", format!("bytes {start}-{end}/{size}"))
        .header("Content-Length", len.to_string())
        .header("Accept-Ranges", "bytes")
        .body(Body::File { path, start, len });
    reply.status = 206;
    reply
}

/// Parse a `bytes=start-end` header against a file of `size` bytes.
///
/// A missing or unparsable bound defaults to the start or end of the file.
/// Returns `None` when the range cannot be satisfied.
fn parse_range(header: &str, size: u64) -> Option<(u64, u64)> {
    let bounds = header.trim().strip_prefix("bytes=").unwrap_or(header);
    let (start, end) = bounds.split_once('-').unwrap_or((bounds, ""));

    let last = size.checked_sub(1)?;
    let start = leading_number(start).unwrap_or(0);
    let end = leading_number(end).unwrap_or(last);

    (start <= end && end < size).then_some((start, end))
}

/// The run of digits a bound starts with; `"1,5"` reads as 1.
fn leading_number(bound: &str) -> Option<u64> {
    let bound = bound.trim_start();
    let digits = bound.find(|c: char| !c.is_ascii_digit()).unwrap_or(bound.len());
    bound[..digits].parse().ok()
}

/// Any `..` segment is refused rather than resolved.
fn escapes_root(path: &str) -> bool {
    Path::new(path)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
}
