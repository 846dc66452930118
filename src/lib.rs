//! cryptex - Password-based file encryption
//!
//! This library turns file content into a self-describing encrypted
//! container (AES-256-GCM over 1 MiB chunks, PBKDF2-HMAC-SHA256 keys,
//! counter-derived nonces, optional gzip) and can hide that container at
//! the tail of a carrier image.

pub mod chunk;
pub mod config;
pub mod container;
pub mod crypto;
pub mod error;
pub mod progress;
pub mod stego;
pub mod vault;

pub use config::Config;
pub use error::{Error, Result};
pub use vault::{
    decrypt_file, encrypt_file, inspect, unwrap_from_image, wrap_in_image, ContainerInfo,
    DecryptedFile, VaultOptions,
};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::progress::Progress;
    pub use crate::vault::{DecryptedFile, VaultOptions};
}
