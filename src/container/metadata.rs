//! Encrypted metadata record
//!
//! Stored as compact JSON `{"name":…,"type":…,"c":…}` in unit 0 of the
//! container.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Original file attributes carried inside the container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Original file name
    pub name: String,
    /// Original MIME type
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Whether the chunk body holds gzip-compressed content
    #[serde(rename = "c")]
    pub compressed: bool,
}

impl Metadata {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, compressed: bool) -> Self {
        Metadata {
            name: name.into(),
            mime_type: mime_type.into(),
            compressed,
        }
    }

    /// Serialize to the compact JSON stored in the container
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse decrypted metadata
    ///
    /// The bytes already passed AEAD verification, so a parse failure means
    /// the container was produced by something else. It is reported like a
    /// tag failure to keep a single failure signal for the caller.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|_| Error::Authentication)
    }
}
