use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

/// Length of the external hex representation.
pub const HEX_LEN: usize = 24;

/// Store-native document identifier: 4 bytes of creation time followed by
/// 8 random bytes. Crosses the HTTP boundary as a 24-character hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId([u8; 12]);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid id '{0}': expected a 24-character hex string")]
pub struct InvalidDocumentId(pub String);

impl DocumentId {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 12];
        let seconds = Utc::now().timestamp() as u32;
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..].copy_from_slice(&Uuid::new_v4().as_bytes()[..8]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn parse_hex(value: &str) -> Result<Self, InvalidDocumentId> {
        if value.len() != HEX_LEN {
            return Err(InvalidDocumentId(value.to_string()));
        }
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(value, &mut bytes).map_err(|_| InvalidDocumentId(value.to_string()))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<&[u8]> for DocumentId {
    type Error = InvalidDocumentId;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; 12] = value
            .try_into()
            .map_err(|_| InvalidDocumentId(hex::encode(value)))?;
        Ok(Self(bytes))
    }
}

impl FromStr for DocumentId {
    type Err = InvalidDocumentId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.to_hex())
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse_hex(&raw).map_err(serde::de::Error::custom)
    }
}
