//! Carrier-image camouflage
//!
//! A container is appended to an ordinary image, followed by a 12-byte
//! footer: the payload length (u32 LE) and the ASCII marker `CRYPTEXV`.
//! Image viewers stop at the image's own end marker and ignore the tail.
//!
//! ```text
//! [carrier bytes][payload][4B payload len LE]["CRYPTEXV"]
//! ```

use crate::error::{Error, Result};
use tracing::debug;

/// Marker closing every wrapped file
pub const MAGIC: [u8; 8] = *b"CRYPTEXV";

/// Size of the trailing footer
pub const FOOTER_SIZE: usize = 4 + MAGIC.len();

/// Append `payload` to `carrier` with a locating footer
pub fn wrap(payload: &[u8], carrier: &[u8]) -> Result<Vec<u8>> {
    let payload_len =
        u32::try_from(payload.len()).map_err(|_| Error::PayloadTooLarge(payload.len()))?;

    let mut out = Vec::with_capacity(carrier.len() + payload.len() + FOOTER_SIZE);
    out.extend_from_slice(carrier);
    out.extend_from_slice(payload);
    out.extend_from_slice(&payload_len.to_le_bytes());
    out.extend_from_slice(&MAGIC);

    debug!(
        carrier = carrier.len(),
        payload = payload.len(),
        "Wrapped payload in carrier"
    );
    Ok(out)
}

/// Whether `blob` ends with the wrapping marker
pub fn is_wrapped(blob: &[u8]) -> bool {
    blob.len() >= FOOTER_SIZE && blob.ends_with(&MAGIC)
}

/// Recover the payload from a wrapped blob
///
/// Blobs that do not end with the marker are returned unchanged, so plain
/// containers pass straight through.
pub fn unwrap(blob: &[u8]) -> Result<&[u8]> {
    if blob.len() < FOOTER_SIZE {
        return Err(Error::CorruptContainer(
            "too small to be a wrapped container".to_string(),
        ));
    }

    let (rest, marker) = blob.split_at(blob.len() - MAGIC.len());
    if marker != MAGIC {
        return Ok(blob);
    }

    let (rest, len_bytes) = rest.split_at(rest.len() - 4);
    let mut len_le = [0u8; 4];
    len_le.copy_from_slice(len_bytes);
    let payload_len = u32::from_le_bytes(len_le) as usize;

    let payload_start = rest.len().checked_sub(payload_len).ok_or_else(|| {
        Error::CorruptContainer("invalid or corrupted wrapping".to_string())
    })?;

    debug!(
        carrier = payload_start,
        payload = payload_len,
        "Extracted payload from carrier"
    );
    Ok(&rest[payload_start..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[test]
    fn test_wrap_layout() {
        let wrapped = wrap(b"payload", PNG_SIGNATURE).unwrap();
        assert!(wrapped.starts_with(PNG_SIGNATURE));
        assert_eq!(wrapped.len(), PNG_SIGNATURE.len() + 7 + FOOTER_SIZE);
        assert_eq!(&wrapped[wrapped.len() - 12..wrapped.len() - 8], &7u32.to_le_bytes());
        assert!(wrapped.ends_with(b"CRYPTEXV"));
    }

    #[test]
    fn test_roundtrip() {
        let payload: Vec<u8> = (0..=255u8).collect();
        let wrapped = wrap(&payload, PNG_SIGNATURE).unwrap();
        assert_eq!(unwrap(&wrapped).unwrap(), payload.as_slice());
    }

    #[test]
    fn test_roundtrip_empty_parts() {
        let cases: [(&[u8], &[u8]); 4] = [
            (b"", b""),
            (b"", PNG_SIGNATURE),
            (b"data", b""),
            (b"data", PNG_SIGNATURE),
        ];
        for (payload, carrier) in cases {
            let wrapped = wrap(payload, carrier).unwrap();
            assert!(is_wrapped(&wrapped));
            assert_eq!(unwrap(&wrapped).unwrap(), payload);
        }
    }

    #[test]
    fn test_passthrough_without_marker() {
        let blob = vec![0x42u8; 64];
        let out = unwrap(&blob).unwrap();
        assert_eq!(out, blob.as_slice());
        assert!(!is_wrapped(&blob));
    }

    #[test]
    fn test_too_small() {
        for len in 0..FOOTER_SIZE {
            let buf = vec![0u8; len];
            let result = unwrap(&buf);
            assert!(matches!(result, Err(Error::CorruptContainer(_))));
        }
    }

    #[test]
    fn test_declared_length_too_large() {
        let mut blob = vec![0u8; 10];
        blob.extend_from_slice(&11u32.to_le_bytes());
        blob.extend_from_slice(&MAGIC);
        assert!(matches!(unwrap(&blob), Err(Error::CorruptContainer(_))));

        let mut exact = vec![0u8; 10];
        exact.extend_from_slice(&10u32.to_le_bytes());
        exact.extend_from_slice(&MAGIC);
        assert_eq!(unwrap(&exact).unwrap(), &[0u8; 10]);
    }

    #[test]
    fn test_marker_only_is_empty_payload() {
        let mut blob = 0u32.to_le_bytes().to_vec();
        blob.extend_from_slice(&MAGIC);
        assert!(unwrap(&blob).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn wrap_then_unwrap_recovers_payload(
            payload in proptest::collection::vec(any::<u8>(), 0..=2048),
            carrier in proptest::collection::vec(any::<u8>(), 0..=2048),
        ) {
            let wrapped = wrap(&payload, &carrier).unwrap();
            prop_assert!(wrapped.starts_with(&carrier));
            prop_assert!(is_wrapped(&wrapped));
            prop_assert_eq!(unwrap(&wrapped).unwrap(), payload.as_slice());
        }

        #[test]
        fn unmarked_blobs_pass_through(
            blob in proptest::collection::vec(any::<u8>(), FOOTER_SIZE..=2048),
        ) {
            prop_assume!(!blob.ends_with(&MAGIC));
            prop_assert_eq!(unwrap(&blob).unwrap(), blob.as_slice());
        }
    }
}
