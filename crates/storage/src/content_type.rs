//! Content types for uploaded objects, derived from the key's extension.

use std::path::Path;

/// Sent for anything without a recognised extension.
pub const FALLBACK: &str = "text/plain";

/// Guess the `Content-Type` for an object key.
///
/// Static site hosting serves objects with whatever type they were uploaded
/// with, so a wrong guess here means a browser downloads the page instead of
/// rendering it.
#[must_use]
pub fn from_key(key: &str) -> &'static str {
    Path::new(key)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| match ext.to_lowercase().as_str() {
            "html" | "htm" => "text/html",
            "css" => "text/css",
            "js" | "mjs" => "text/javascript",
            "json" | "map" => "application/json",
            "webmanifest" => "application/manifest+json",
            "xml" => "application/xml",
            "rss" => "application/rss+xml",
            "atom" => "application/atom+xml",
            "txt" => "text/plain",
            "md" => "text/markdown",
            "csv" => "text/csv",
            "yaml" | "yml" => "application/yaml",
            "svg" => "image/svg+xml",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "avif" => "image/avif",
            "ico" => "image/vnd.microsoft.icon",
            "pdf" => "application/pdf",
            "woff" => "font/woff",
            "woff2" => "font/woff2",
            "ttf" => "font/ttf",
            "otf" => "font/otf",
            "eot" => "application/vnd.ms-fontobject",
            "wasm" => "application/wasm",
            "mp4" => "video/mp4",
            "webm" => "video/webm",
            "mp3" => "audio/mpeg",
            "wav" => "audio/wav",
            "ogg" => "audio/ogg",
            "zip" => "application/zip",
            "gz" => "application/gzip",
            _ => FALLBACK,
        })
        .unwrap_or(FALLBACK)
}
