//! PBKDF2-HMAC-SHA256 password key derivation
//!
//! The iteration count is not recorded in the container, so it is part of
//! the format contract: both sides must agree on it out of band.

use crate::crypto::{KEY_SIZE, SALT_SIZE};
use crate::error::{Error, Result};
use ring::pbkdf2;
use std::num::NonZeroU32;
use zeroize::Zeroizing;

/// Iteration count used for new containers
pub const DEFAULT_KDF_ITERATIONS: u32 = 600_000;

/// Iteration count used by early releases of the format
pub const LEGACY_KDF_ITERATIONS: u32 = 100_000;

/// A 256-bit key derived from a password, wiped on drop
pub struct DerivedKey {
    key: Zeroizing<[u8; KEY_SIZE]>,
}

impl DerivedKey {
    /// Get the raw key bytes
    pub fn key(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// Derive a key from a password and salt
///
/// # Arguments
/// * `password` - Raw password bytes (UTF-8 of the user's text)
/// * `salt` - 16 random bytes, fresh for every container
/// * `iterations` - PBKDF2 round count, must be non-zero
pub fn derive_key(password: &[u8], salt: &[u8; SALT_SIZE], iterations: u32) -> Result<DerivedKey> {
    let rounds = NonZeroU32::new(iterations)
        .ok_or_else(|| Error::Provider("PBKDF2 iteration count must be non-zero".to_string()))?;

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2::derive(pbkdf2::PBKDF2_HMAC_SHA256, rounds, salt, password, key.as_mut());

    Ok(DerivedKey { key })
}
