//! Content fingerprints for plan snapshots.
//!
//! Values are hashed through their JSON form, streamed straight into blake3.
//! Only ordered collections (Vec/BTreeMap) may appear in hashed values, or the
//! fingerprint stops being reproducible.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }

    /// First 8 bytes as hex; enough to tell plans apart in log lines.
    pub fn short(&self) -> String {
        self.to_hex()[..16].to_string()
    }
}

impl From<blake3::Hash> for Hash256 {
    fn from(h: blake3::Hash) -> Self {
        Hash256(*h.as_bytes())
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

pub fn hash_bytes(bytes: &[u8]) -> Hash256 {
    blake3::hash(bytes).into()
}

/// Hash the JSON encoding of `value` without materializing it.
pub fn hash_serde<T: Serialize>(value: &T) -> Result<Hash256> {
    let mut hasher = blake3::Hasher::new();
    serde_json::to_writer(&mut hasher, value).map_err(|e| Error::Hash(e.to_string()))?;
    Ok(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn streaming_matches_buffered() {
        let value: BTreeMap<&str, u32> = [("b", 2), ("a", 1)].into();
        let buffered = hash_bytes(&serde_json::to_vec(&value).unwrap());
        assert_eq!(hash_serde(&value).unwrap(), buffered);
    }

    #[test]
    fn hex_forms() {
        let h = hash_bytes(b"plan");
        assert_eq!(h.to_hex().len(), 64);
        assert!(h.to_hex().starts_with(&h.short()));
        assert_eq!(h.to_string(), h.to_hex());
    }
}
