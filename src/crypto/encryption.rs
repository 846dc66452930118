//! AES-256-GCM Encryption Implementation
//!
//! Every unit of a container (metadata block or data chunk) is sealed with
//! AES-256-GCM under the container key and a counter-derived nonce. The
//! output is the ciphertext with the 16-byte tag appended; no AAD is used.

use crate::crypto::{KEY_SIZE, NONCE_SIZE, TAG_SIZE};
use crate::error::{Error, Result};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};

/// AEAD cipher bound to one container key
///
/// Safe to share across threads; chunk workers borrow a single instance.
pub struct ChunkCipher {
    key: LessSafeKey,
}

impl ChunkCipher {
    /// Create a cipher from raw key bytes
    pub fn new(key: &[u8; KEY_SIZE]) -> Result<Self> {
        let unbound_key = UnboundKey::new(&AES_256_GCM, key)
            .map_err(|_| Error::Provider("Failed to create AES-256-GCM key".to_string()))?;

        Ok(ChunkCipher {
            key: LessSafeKey::new(unbound_key),
        })
    }

    /// Encrypt `plaintext` under `iv`, returning ciphertext‖tag
    pub fn seal(&self, iv: &[u8; NONCE_SIZE], plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = Nonce::assume_unique_for_key(*iv);

        let mut in_out = Vec::with_capacity(plaintext.len() + TAG_SIZE);
        in_out.extend_from_slice(plaintext);

        self.key
            .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| Error::Provider("Encryption failed".to_string()))?;

        Ok(in_out)
    }

    /// Decrypt ciphertext‖tag produced by [`seal`](Self::seal)
    ///
    /// Nothing is returned unless the tag verifies.
    pub fn open(&self, iv: &[u8; NONCE_SIZE], sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < TAG_SIZE {
            return Err(Error::CorruptContainer(format!(
                "Encrypted block of {} bytes is shorter than its tag",
                sealed.len()
            )));
        }

        let nonce = Nonce::assume_unique_for_key(*iv);

        let mut in_out = sealed.to_vec();
        let plaintext_len = self
            .key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| Error::Authentication)?
            .len();
        in_out.truncate(plaintext_len);

        Ok(in_out)
    }
}

/// Encrypt a single buffer (convenience function)
pub fn encrypt(key: &[u8; KEY_SIZE], iv: &[u8; NONCE_SIZE], plaintext: &[u8]) -> Result<Vec<u8>> {
    ChunkCipher::new(key)?.seal(iv, plaintext)
}

/// Decrypt a single buffer (convenience function)
pub fn decrypt(key: &[u8; KEY_SIZE], iv: &[u8; NONCE_SIZE], sealed: &[u8]) -> Result<Vec<u8>> {
    ChunkCipher::new(key)?.open(iv, sealed)
}
