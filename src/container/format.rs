//! Binary container layout
//!
//! ```text
//! [16B salt][12B base nonce][4B metaLen LE][metaLen B: sealed metadata]
//! [chunk_size + 16 B: sealed chunk] x N   (the last block may be shorter)
//! ```
//!
//! Nothing in the layout is versioned; the KDF iteration count and chunk
//! size are fixed by convention.

use crate::chunk::{Chunker, CHUNK_SIZE};
use crate::crypto::{KeyMaterial, NONCE_SIZE, SALT_SIZE, TAG_SIZE};
use crate::error::{Error, Result};

/// Size of the fixed header: salt, base nonce and metadata length
pub const HEADER_SIZE: usize = SALT_SIZE + NONCE_SIZE + 4;

/// Borrowed, structurally validated view of a serialized container
#[derive(Debug, Clone, Copy)]
pub struct ContainerView<'a> {
    /// Salt and base nonce from the header
    pub material: KeyMaterial,
    /// Sealed metadata block (ciphertext‖tag)
    pub metadata: &'a [u8],
    /// Concatenated sealed data chunks
    pub body: &'a [u8],
}

impl<'a> ContainerView<'a> {
    /// Split a container into its parts
    ///
    /// Every declared length is checked against the bytes actually present
    /// before slicing.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::CorruptContainer(format!(
                "Header truncated: {} bytes, need {}",
                bytes.len(),
                HEADER_SIZE
            )));
        }

        let (salt_bytes, rest) = bytes.split_at(SALT_SIZE);
        let (nonce_bytes, rest) = rest.split_at(NONCE_SIZE);
        let (len_bytes, rest) = rest.split_at(4);

        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(salt_bytes);
        let mut base_nonce = [0u8; NONCE_SIZE];
        base_nonce.copy_from_slice(nonce_bytes);
        let mut len_le = [0u8; 4];
        len_le.copy_from_slice(len_bytes);

        let metadata_len = u32::from_le_bytes(len_le) as usize;
        if metadata_len < TAG_SIZE {
            return Err(Error::CorruptContainer(format!(
                "Metadata length {} is shorter than an authentication tag",
                metadata_len
            )));
        }
        if metadata_len > rest.len() {
            return Err(Error::CorruptContainer(format!(
                "Metadata length {} exceeds remaining {} bytes",
                metadata_len,
                rest.len()
            )));
        }

        let (metadata, body) = rest.split_at(metadata_len);

        Ok(ContainerView {
            material: KeyMaterial::from_parts(salt, base_nonce),
            metadata,
            body,
        })
    }

    /// Number of sealed data chunks in the body
    pub fn chunk_count(&self) -> usize {
        Chunker::chunk_count(self.body.len(), CHUNK_SIZE + TAG_SIZE)
    }
}

/// Serialize a container from its sealed parts
pub fn assemble(material: &KeyMaterial, sealed_metadata: &[u8], body: &[u8]) -> Result<Vec<u8>> {
    let metadata_len = u32::try_from(sealed_metadata.len()).map_err(|_| {
        Error::InvalidInput(format!(
            "Metadata block of {} bytes does not fit the length field",
            sealed_metadata.len()
        ))
    })?;

    let mut out = Vec::with_capacity(HEADER_SIZE + sealed_metadata.len() + body.len());
    out.extend_from_slice(&material.salt);
    out.extend_from_slice(&material.base_nonce);
    out.extend_from_slice(&metadata_len.to_le_bytes());
    out.extend_from_slice(sealed_metadata);
    out.extend_from_slice(body);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material() -> KeyMaterial {
        KeyMaterial::from_parts([1u8; SALT_SIZE], [2u8; NONCE_SIZE])
    }

    #[test]
    fn test_assemble_layout() {
        let meta = [3u8; 40];
        let body = [4u8; 7];
        let bytes = assemble(&material(), &meta, &body).unwrap();

        assert_eq!(bytes.len(), HEADER_SIZE + 40 + 7);
        assert_eq!(&bytes[..16], &[1u8; 16]);
        assert_eq!(&bytes[16..28], &[2u8; 12]);
        assert_eq!(&bytes[28..32], &40u32.to_le_bytes());
        assert_eq!(&bytes[32..72], &meta);
        assert_eq!(&bytes[72..], &body);
    }

    #[test]
    fn test_parse_assembled() {
        let bytes = assemble(&material(), &[3u8; 40], &[4u8; 7]).unwrap();
        let view = ContainerView::parse(&bytes).unwrap();
        assert_eq!(view.material, material());
        assert_eq!(view.metadata, &[3u8; 40]);
        assert_eq!(view.body, &[4u8; 7]);
        assert_eq!(view.chunk_count(), 1);
    }

    #[test]
    fn test_metadata_only() {
        let bytes = assemble(&material(), &[3u8; TAG_SIZE], &[]).unwrap();
        let view = ContainerView::parse(&bytes).unwrap();
        assert!(view.body.is_empty());
        assert_eq!(view.chunk_count(), 0);
    }

    #[test]
    fn test_truncated_header() {
        for len in [0, 1, HEADER_SIZE - 1] {
            let buf = vec![0u8; len];
            let result = ContainerView::parse(&buf);
            assert!(matches!(result, Err(Error::CorruptContainer(_))));
        }
    }

    #[test]
    fn test_metadata_length_overflow() {
        let mut bytes = assemble(&material(), &[3u8; 40], &[]).unwrap();
        bytes[28..32].copy_from_slice(&41u32.to_le_bytes());
        assert!(matches!(
            ContainerView::parse(&bytes),
            Err(Error::CorruptContainer(_))
        ));

        bytes[28..32].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            ContainerView::parse(&bytes),
            Err(Error::CorruptContainer(_))
        ));
    }

    #[test]
    fn test_metadata_shorter_than_tag() {
        let bytes = assemble(&material(), &[3u8; TAG_SIZE - 1], &[]).unwrap();
        assert!(matches!(
            ContainerView::parse(&bytes),
            Err(Error::CorruptContainer(_))
        ));
    }

    #[test]
    fn test_chunk_count_boundaries() {
        let block = CHUNK_SIZE + TAG_SIZE;
        let body = vec![0u8; block * 2 + 1];
        let view = ContainerView {
            material: material(),
            metadata: &[],
            body: &body,
        };
        assert_eq!(view.chunk_count(), 3);

        let view = ContainerView { body: &body[..block * 2], ..view };
        assert_eq!(view.chunk_count(), 2);
    }
}
