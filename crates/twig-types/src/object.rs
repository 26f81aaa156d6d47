use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Content address of a blob, tree, or commit.
///
/// An `ObjectId` is a 32-byte BLAKE3 digest. Two objects with the same id
/// have the same bytes, which is what lets the store deduplicate snapshots
/// that share files or whole subdirectories.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId([u8; 32]);

impl ObjectId {
    /// Plain BLAKE3 of `data` with no domain tag. Handy for test fixtures;
    /// stored objects are addressed through `twig_crypto::ContentHasher`.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Wrap a pre-computed digest.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full 64-character lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 hex characters, for log lines and debug output.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; 32]> for ObjectId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_is_deterministic() {
        assert_eq!(ObjectId::from_bytes(b"readme"), ObjectId::from_bytes(b"readme"));
        assert_ne!(ObjectId::from_bytes(b"readme"), ObjectId::from_bytes(b"license"));
    }

    #[test]
    fn hex_roundtrip() {
        let id = ObjectId::from_bytes(b"test");
        let parsed: ObjectId = id.to_hex().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let err = ObjectId::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 32,
                actual: 2
            }
        );
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert!(matches!(
            ObjectId::from_hex("not hex at all"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn short_and_full_display() {
        let id = ObjectId::from_bytes(b"test");
        assert_eq!(id.short_hex().len(), 8);
        assert_eq!(format!("{id}").len(), 64);
        assert!(format!("{id:?}").starts_with("ObjectId("));
    }

    #[test]
    fn serde_roundtrip() {
        let id = ObjectId::from_bytes(b"serde test");
        let json = serde_json::to_string(&id).unwrap();
        let parsed: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
