//! Content hashing for change detection.
//!
//! Atoms are immutable, so the weave's ordered id sequence determines the
//! whole visible content. Hashing that sequence gives a cheap fingerprint
//! that is identical on every replica holding the same atom set - the
//! observable the host's change-notification timer compares.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use skein_weave::CausalTree;
use std::fmt;

/// A 32-byte fingerprint of a replica's canonical order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Fingerprint the weave's linear order.
pub fn content_hash<V: Clone + PartialEq>(tree: &CausalTree<V>) -> ContentHash {
    let mut hasher = Sha256::new();
    for id in tree.traverse() {
        hasher.update(id.site.to_le_bytes());
        hasher.update(id.index.to_le_bytes());
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    ContentHash(bytes)
}
