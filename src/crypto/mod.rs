//! Cryptography module for cryptex
//!
//! Provides AES-256-GCM chunk encryption with PBKDF2-HMAC-SHA256 key
//! derivation and counter-derived per-chunk nonces.

mod encryption;
mod kdf;
mod keys;
mod nonce;

pub use encryption::{decrypt, encrypt, ChunkCipher};
pub use kdf::{derive_key, DerivedKey, DEFAULT_KDF_ITERATIONS, LEGACY_KDF_ITERATIONS};
pub use keys::KeyMaterial;
pub use nonce::{derive_iv, METADATA_INDEX};

/// Size of AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;

/// Size of GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Size of salt for key derivation
pub const SALT_SIZE: usize = 16;
