//! Caller identities
//!
//! An [`Identity`] is an opaque 32-byte token. Two identities are equal only
//! when every byte matches. Nothing here authenticates the caller: every
//! operation in the crate takes the caller as an explicit argument.

use crate::error::{LabError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Identity([u8; 32]);

impl Identity {
    /// The all-zero identity.
    pub const ZERO: Identity = Identity([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Identity(bytes)
    }

    /// Derive an identity from a human label (SHA-256 of the label).
    /// Useful for scripts and tests.
    pub fn from_label(label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(label.as_bytes());
        Identity(hasher.finalize().into())
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| LabError::InvalidIdentity(format!("Invalid hex identity: {}", e)))?;
        if bytes.len() != 32 {
            return Err(LabError::InvalidIdentity(format!(
                "Identity must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| LabError::InvalidIdentity("Failed to convert bytes into identity".to_string()))?;
        Ok(Identity(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Identity({}..{})", &hex[..8], &hex[56..])
    }
}

impl FromStr for Identity {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self> {
        Identity::from_hex(s)
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Identity::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Resolve a CLI argument into an identity: 64 hex characters are parsed
/// directly, anything else is treated as a label.
pub fn resolve(arg: &str) -> Identity {
    let trimmed = arg.trim();
    if trimmed.len() == 64 {
        if let Ok(id) = Identity::from_hex(trimmed) {
            return id;
        }
    }
    Identity::from_label(trimmed)
}
