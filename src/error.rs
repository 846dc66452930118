//! Error types for cryptex

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for cryptex
#[derive(Error, Debug)]
pub enum Error {
    // Crypto errors
    #[error("Cryptographic provider error: {0}")]
    Provider(String),

    /// Any AEAD tag mismatch. Wrong password and tampering are deliberately
    /// indistinguishable.
    #[error("Authentication failed: wrong password or corrupted file")]
    Authentication,

    #[error("Nonce space exhausted at index {index}")]
    NonceExhausted { index: u64 },

    // Container errors
    #[error("Corrupt container: {0}")]
    CorruptContainer(String),

    #[error("Decompression failed: {0}")]
    Decompression(String),

    #[error("Payload too large to wrap: {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Whether re-prompting for the password is a sensible reaction
    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::Authentication)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
