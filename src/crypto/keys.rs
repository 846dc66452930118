//! Per-container key material
//!
//! Each container carries its own random salt and base nonce in the clear.
//! The password-derived key never leaves the call that derived it.

use crate::crypto::{derive_key, ChunkCipher, NONCE_SIZE, SALT_SIZE};
use crate::error::Result;
use rand::RngCore;

/// Public key parameters stored at the head of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMaterial {
    /// Salt for PBKDF2
    pub salt: [u8; SALT_SIZE],
    /// Base of the per-unit nonce counter
    pub base_nonce: [u8; NONCE_SIZE],
}

impl KeyMaterial {
    /// Draw a fresh salt and base nonce for a new container
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();

        let mut salt = [0u8; SALT_SIZE];
        rng.fill_bytes(&mut salt);

        let mut base_nonce = [0u8; NONCE_SIZE];
        rng.fill_bytes(&mut base_nonce);

        KeyMaterial { salt, base_nonce }
    }

    /// Rebuild from values parsed out of an existing container
    pub fn from_parts(salt: [u8; SALT_SIZE], base_nonce: [u8; NONCE_SIZE]) -> Self {
        KeyMaterial { salt, base_nonce }
    }

    /// Derive the container key from `password` and bind it to a cipher
    ///
    /// The raw key is zeroized as soon as the cipher has been built.
    pub fn cipher(&self, password: &[u8], iterations: u32) -> Result<ChunkCipher> {
        let derived = derive_key(password, &self.salt, iterations)?;
        ChunkCipher::new(derived.key())
    }
}
