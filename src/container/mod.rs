//! Container codec
//!
//! Assembles and parses the self-describing encrypted container: header,
//! sealed metadata (unit 0) and the sealed chunk sequence (units 1..=N).
//! Every call draws a fresh salt and base nonce, so no (key, nonce) pair is
//! ever reused across containers.

mod format;
mod metadata;

pub use format::{assemble, ContainerView, HEADER_SIZE};
pub use metadata::Metadata;

use crate::chunk::{open_chunks, seal_chunks, ChunkOptions};
use crate::crypto::{derive_iv, KeyMaterial, METADATA_INDEX};
use crate::error::Result;
use crate::progress::Progress;
use tracing::debug;

/// Contents recovered from a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedContainer {
    /// Decrypted metadata record
    pub metadata: Metadata,
    /// Decrypted body, still compressed when `metadata.compressed` is set
    pub body: Vec<u8>,
}

/// Encrypt `body` and `metadata` into a new container
pub fn seal<P: Progress>(
    body: &[u8],
    metadata: &Metadata,
    password: &[u8],
    iterations: u32,
    options: &ChunkOptions,
    progress: &mut P,
) -> Result<Vec<u8>> {
    let material = KeyMaterial::generate();
    seal_with(&material, body, metadata, password, iterations, options, progress)
}

/// Encrypt under caller-supplied key material
///
/// Reusing `material` for two different containers reuses nonces under the
/// same key; only [`seal`] is safe for general use.
pub(crate) fn seal_with<P: Progress>(
    material: &KeyMaterial,
    body: &[u8],
    metadata: &Metadata,
    password: &[u8],
    iterations: u32,
    options: &ChunkOptions,
    progress: &mut P,
) -> Result<Vec<u8>> {
    debug!(iterations, "Deriving container key");
    let cipher = material.cipher(password, iterations)?;

    let metadata_iv = derive_iv(&material.base_nonce, METADATA_INDEX)?;
    let sealed_metadata = cipher.seal(&metadata_iv, &metadata.to_bytes()?)?;
    debug!(len = sealed_metadata.len(), "Sealed metadata");

    let sealed_body = seal_chunks(&cipher, &material.base_nonce, body, options, progress)?;

    assemble(material, &sealed_metadata, &sealed_body)
}

/// Decrypt a serialized container
///
/// Structural problems surface as `CorruptContainer`; any tag mismatch, in
/// the metadata or any chunk, as `Authentication`.
pub fn open<P: Progress>(
    bytes: &[u8],
    password: &[u8],
    iterations: u32,
    options: &ChunkOptions,
    progress: &mut P,
) -> Result<OpenedContainer> {
    let view = ContainerView::parse(bytes)?;
    debug!(
        metadata_len = view.metadata.len(),
        body_len = view.body.len(),
        "Parsed container header"
    );

    let cipher = view.material.cipher(password, iterations)?;

    let metadata_iv = derive_iv(&view.material.base_nonce, METADATA_INDEX)?;
    let metadata = Metadata::from_bytes(&cipher.open(&metadata_iv, view.metadata)?)?;
    debug!(compressed = metadata.compressed, "Opened metadata");

    let body = open_chunks(&cipher, &view.material.base_nonce, view.body, options, progress)?;

    Ok(OpenedContainer { metadata, body })
}
