//! SHA-256 object digests and their storage keys.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::str::FromStr;

/// Length of a digest rendered as hex.
pub const DIGEST_HEX_LEN: usize = 64;

/// SHA-256 digest identifying a stored object.
///
/// A `Digest` can only be built from 32 raw bytes, from a hasher, or from a
/// string that passed [`Digest::parse`], so every value maps to exactly one
/// storage key. Rendering is always lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Create a digest from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Compute the digest of an in-memory buffer.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Self::hasher();
        hasher.update(data);
        hasher.finalize()
    }

    /// Create an incremental hasher.
    pub fn hasher() -> DigestHasher {
        DigestHasher(Sha256::new())
    }

    /// Check whether `s` has the shape of a hex digest (`^[0-9a-fA-F]{64}$`).
    pub fn is_well_formed(s: &str) -> bool {
        s.len() == DIGEST_HEX_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Parse a 64 character hex digest. Upper and lower case are accepted.
    pub fn parse(s: &str) -> crate::Result<Self> {
        if s.len() != DIGEST_HEX_LEN {
            return Err(crate::Error::InvalidDigest(format!(
                "expected {DIGEST_HEX_LEN} hex chars, got {}",
                s.len()
            )));
        }
        if !Self::is_well_formed(s) {
            return Err(crate::Error::InvalidDigest(
                "contains non-hex characters".to_string(),
            ));
        }

        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| crate::Error::InvalidDigest(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Encode as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Shard directory name: the first byte as two hex chars.
    pub fn shard(&self) -> String {
        hex::encode(&self.0[..1])
    }

    /// Storage key relative to the data root: `<shard>/<hex>`.
    pub fn object_key(&self) -> String {
        let hex = self.to_hex();
        format!("{}/{}", &hex[..2], hex)
    }
}

impl FromStr for Digest {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Incremental SHA-256 hasher producing a [`Digest`].
pub struct DigestHasher(Sha256);

impl DigestHasher {
    /// Feed more bytes into the hasher.
    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    /// Finalize and return the digest.
    pub fn finalize(self) -> Digest {
        Digest(self.0.finalize().into())
    }
}

impl Default for DigestHasher {
    fn default() -> Self {
        Digest::hasher()
    }
}
