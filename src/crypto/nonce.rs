//! Per-unit nonce derivation
//!
//! The 12-byte base nonce is a big-endian 96-bit counter. Unit `i` is
//! encrypted under `base + i`. Index 0 belongs to the metadata block, data
//! chunks use 1..=N.

use crate::crypto::NONCE_SIZE;
use crate::error::{Error, Result};

/// Index reserved for the encrypted metadata block
pub const METADATA_INDEX: u64 = 0;

/// Derive the nonce for unit `index`
///
/// Adds `index` to `base` with carry running from the last byte towards
/// the first. A carry out of the first byte would wrap the counter and
/// reuse an earlier nonce, so it is reported as `NonceExhausted`.
pub fn derive_iv(base: &[u8; NONCE_SIZE], index: u64) -> Result<[u8; NONCE_SIZE]> {
    let mut iv = *base;
    let addend = index.to_be_bytes();
    let mut carry = 0u16;

    for pos in (0..NONCE_SIZE).rev() {
        // addend is 8 bytes wide, aligned to the low end of the 12-byte counter
        let add = if pos >= NONCE_SIZE - addend.len() {
            addend[pos - (NONCE_SIZE - addend.len())] as u16
        } else {
            0
        };
        let sum = iv[pos] as u16 + add + carry;
        iv[pos] = (sum & 0xff) as u8;
        carry = sum >> 8;
    }

    if carry != 0 {
        return Err(Error::NonceExhausted { index });
    }

    Ok(iv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_index_zero_is_base() {
        let base = [0x11u8; NONCE_SIZE];
        assert_eq!(derive_iv(&base, METADATA_INDEX).unwrap(), base);
    }

    #[test]
    fn test_simple_increment() {
        let base = [0u8; NONCE_SIZE];
        let iv = derive_iv(&base, 1).unwrap();
        let mut expected = [0u8; NONCE_SIZE];
        expected[11] = 1;
        assert_eq!(iv, expected);
    }

    #[test]
    fn test_carry_propagates_left() {
        let mut base = [0u8; NONCE_SIZE];
        base[10] = 0x01;
        base[11] = 0xff;
        let iv = derive_iv(&base, 1).unwrap();
        assert_eq!(iv[10], 0x02);
        assert_eq!(iv[11], 0x00);
    }

    #[test]
    fn test_carry_crosses_addend_width() {
        // Low 64 bits all 0xff: adding 1 must carry into byte 3
        let mut base = [0u8; NONCE_SIZE];
        for b in base.iter_mut().skip(4) {
            *b = 0xff;
        }
        let iv = derive_iv(&base, 1).unwrap();
        assert_eq!(iv, [0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_large_index() {
        let base = [0u8; NONCE_SIZE];
        let iv = derive_iv(&base, 0x0102_0304_0506_0708).unwrap();
        assert_eq!(iv, [0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_exhaustion_rejected() {
        let base = [0xffu8; NONCE_SIZE];
        assert_eq!(derive_iv(&base, 0).unwrap(), base);
        assert!(matches!(
            derive_iv(&base, 1),
            Err(Error::NonceExhausted { index: 1 })
        ));
    }

    #[test]
    fn test_distinct_over_range() {
        let base = [0xab, 0xcd, 0xef, 0x01, 0x23, 0x45, 0x67, 0x89, 0xff, 0xff, 0xfe, 0x00];
        let mut seen = HashSet::new();
        for i in 0..100_000u64 {
            assert!(seen.insert(derive_iv(&base, i).unwrap()), "collision at {}", i);
        }
    }
}
