//! Record data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Identifier of a currency pair. Stable for the pair's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairId(String);

impl PairId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PairId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for PairId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PairId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Durable identifier of an uploaded image.
///
/// Descriptions use its string form as their `image_key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for ImageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ImageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub id: PairId,
    /// Free-text label, e.g. "BTC/USD"
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl CurrencyPair {
    pub fn new(name: String) -> Self {
        Self {
            id: PairId::new(),
            name,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: ImageId,
    /// Lookup key only; the pair may no longer exist
    pub pair_id: PairId,
    pub bytes: Vec<u8>,
    /// SHA-256 of `bytes`, lowercase hex
    pub digest: String,
    pub created_at: DateTime<Utc>,
}

impl ImageRecord {
    pub fn new(pair_id: PairId, bytes: Vec<u8>) -> Self {
        let digest = digest_bytes(&bytes);

        Self {
            id: ImageId::new(),
            pair_id,
            bytes,
            digest,
            created_at: Utc::now(),
        }
    }

    /// Whether the payload still matches the digest taken at write time.
    pub fn is_intact(&self) -> bool {
        digest_bytes(&self.bytes) == self.digest
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDescription {
    pub id: String,
    pub pair_id: PairId,
    pub image_key: String,
    pub text: String,
    pub updated_at: DateTime<Utc>,
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn digest_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
