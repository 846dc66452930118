//! Transparent gzip compression and the policy deciding when to apply it
//!
//! The decision is made once from the declared MIME type at encryption time
//! and stored in the container. Decryption follows the stored flag only.

use crate::error::{Error, Result};
use flate2::read::{GzDecoder, GzEncoder};
use flate2::Compression;
use std::io::Read;

/// MIME types that are already compressed archives or documents
const PRECOMPRESSED_TYPES: &[&str] = &[
    "application/zip",
    "application/x-zip-compressed",
    "application/gzip",
    "application/x-gzip",
    "application/vnd.rar",
    "application/x-rar-compressed",
    "application/x-7z-compressed",
    "application/vnd.android.package-archive",
    "application/pdf",
];

/// Media families that are almost always stored compressed
const MEDIA_PREFIXES: &[&str] = &["image/", "video/", "audio/"];

/// Text-based image formats that still compress well
const TEXT_IMAGE_TYPES: &[&str] = &["image/svg+xml"];

/// Decide whether content of `mime_type` should be compressed
///
/// Unknown and empty types default to compression. Case and parameters
/// (`; charset=utf-8`) are ignored.
pub fn should_compress(mime_type: &str) -> bool {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if essence.is_empty() {
        return true;
    }

    if PRECOMPRESSED_TYPES.contains(&essence.as_str()) {
        return false;
    }

    if TEXT_IMAGE_TYPES.contains(&essence.as_str()) {
        return true;
    }

    !MEDIA_PREFIXES.iter().any(|prefix| essence.starts_with(prefix))
}

/// Gzip-compress `data`
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(data, Compression::default());
    let mut out = Vec::with_capacity(data.len() / 2 + 32);
    encoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Decompress a gzip stream
///
/// A stream that is not valid gzip or is truncated is a `Decompression`
/// error.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::Decompression(e.to_string()))?;

    Ok(out)
}
