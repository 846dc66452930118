//! File-level encrypt/decrypt operations
//!
//! These are the entry points collaborators use: raw bytes and strings in,
//! bytes or an error out. Each call is self-contained; password, options and
//! the progress sink are passed in and nothing outlives the call.

use crate::chunk::{compress, decompress, should_compress, ChunkOptions};
use crate::container::{self, ContainerView, Metadata};
use crate::crypto::{KeyMaterial, DEFAULT_KDF_ITERATIONS};
use crate::error::Result;
use crate::progress::Progress;
use crate::stego;
use tracing::debug;

/// Tunables for one encrypt or decrypt call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultOptions {
    /// PBKDF2 iteration count. Not stored in the container, so decryption
    /// must use the same value encryption did.
    pub kdf_iterations: u32,
    /// Chunk scheduling
    pub chunks: ChunkOptions,
}

impl Default for VaultOptions {
    fn default() -> Self {
        VaultOptions {
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
            chunks: ChunkOptions::default(),
        }
    }
}

/// A decrypted file with its original attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedFile {
    pub name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

/// Structural summary of a container, readable without the password
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    /// Whether the input was wrapped in a carrier image
    pub wrapped: bool,
    /// Bytes preceding the payload in a wrapped file
    pub carrier_len: usize,
    pub material: KeyMaterial,
    /// Sealed metadata length, tag included
    pub metadata_len: usize,
    /// Sealed chunk body length
    pub body_len: usize,
    pub chunk_count: usize,
}

/// Encrypt a file into a container, optionally hidden in `carrier`
///
/// Compression is decided from `mime_type` once and recorded in the
/// container. Empty content is never compressed so that it produces a
/// metadata-only container.
pub fn encrypt_file<P: Progress>(
    content: &[u8],
    name: &str,
    mime_type: &str,
    password: &str,
    options: &VaultOptions,
    carrier: Option<&[u8]>,
    progress: &mut P,
) -> Result<Vec<u8>> {
    let compressed = !content.is_empty() && should_compress(mime_type);
    let metadata = Metadata::new(name, mime_type, compressed);

    let packed;
    let body = if compressed {
        packed = compress(content)?;
        debug!(from = content.len(), to = packed.len(), "Compressed content");
        packed.as_slice()
    } else {
        content
    };

    let sealed = container::seal(
        body,
        &metadata,
        password.as_bytes(),
        options.kdf_iterations,
        &options.chunks,
        progress,
    )?;

    match carrier {
        Some(carrier) => wrap_in_image(&sealed, carrier),
        None => Ok(sealed),
    }
}

/// Decrypt a container, plain or wrapped in a carrier image
///
/// Decompression follows the flag stored in the container and nothing else.
///
/// The format carries no total length or end marker. A container cut
/// exactly on a sealed chunk boundary still authenticates and yields the
/// leading chunks only; uncompressed content then comes back short with no
/// error. Compressed content usually fails in decompression instead.
pub fn decrypt_file<P: Progress>(
    container: &[u8],
    password: &str,
    options: &VaultOptions,
    progress: &mut P,
) -> Result<DecryptedFile> {
    let payload = unwrap_from_image(container)?;

    let opened = container::open(
        payload,
        password.as_bytes(),
        options.kdf_iterations,
        &options.chunks,
        progress,
    )?;

    let content = if opened.metadata.compressed {
        let content = decompress(&opened.body)?;
        debug!(from = opened.body.len(), to = content.len(), "Decompressed content");
        content
    } else {
        opened.body
    };

    Ok(DecryptedFile {
        name: opened.metadata.name,
        mime_type: opened.metadata.mime_type,
        content,
    })
}

/// Append an encrypted container to a carrier image
pub fn wrap_in_image(payload: &[u8], carrier: &[u8]) -> Result<Vec<u8>> {
    stego::wrap(payload, carrier)
}

/// Extract the container from a wrapped file; plain containers pass through
pub fn unwrap_from_image(blob: &[u8]) -> Result<&[u8]> {
    stego::unwrap(blob)
}

/// Describe a container's structure without decrypting it
pub fn inspect(blob: &[u8]) -> Result<ContainerInfo> {
    let payload = unwrap_from_image(blob)?;
    let view = ContainerView::parse(payload)?;

    Ok(ContainerInfo {
        wrapped: stego::is_wrapped(blob),
        carrier_len: blob.len().saturating_sub(payload.len() + stego::FOOTER_SIZE),
        material: view.material,
        metadata_len: view.metadata.len(),
        body_len: view.body.len(),
        chunk_count: view.chunk_count(),
    })
}
