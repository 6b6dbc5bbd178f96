//! Site, clock, and atom identity.
//!
//! Every atom is identified by the site that produced it and its position
//! in that site's yarn. A handful of values in each space are reserved for
//! sentinels; no ordinary atom may carry them, and they keep their exact
//! values across versions as part of the serialized contract.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a replica. Site ids are handed out densely and
/// monotonically by the allocator, which bounds weft comparisons by the
/// number of known sites.
pub type SiteId = u16;

/// Per-site Lamport timestamp.
pub type Clock = i64;

/// 0-based position within a single site's yarn.
pub type YarnIndex = i32;

/// Reserved for framework-level atoms (`Start`/`End` boundaries).
pub const CONTROL_SITE: SiteId = 0;

/// Sentinel "no site". No yarn may ever exist for it.
pub const NULL_SITE: SiteId = SiteId::MAX;

/// Sentinel "no clock".
pub const NULL_CLOCK: Clock = 0;

/// Timestamp reserved for the synthetic `Start` boundary atom.
pub const START_CLOCK: Clock = 1;

/// Timestamp reserved for the synthetic `End` boundary atom.
pub const END_CLOCK: Clock = 2;

/// Sentinel "no index". `max(NULL_INDEX, i) == i` for every real index,
/// so index merging folds with a plain max and no absence special-case.
pub const NULL_INDEX: YarnIndex = -1;

/// The universal "no atom" sentinel.
pub const NULL_ATOM_ID: AtomId = AtomId {
    site: NULL_SITE,
    index: NULL_INDEX,
};

/// Identity of an atom: producing site plus position in that site's yarn.
///
/// Equality is structural. The derived order is by `(site, index)` and
/// carries no causal meaning whatsoever; it exists only to give
/// collections of atoms a deterministic ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AtomId {
    pub site: SiteId,
    pub index: YarnIndex,
}

impl AtomId {
    pub fn new(site: SiteId, index: YarnIndex) -> Self {
        AtomId { site, index }
    }

    /// Whether this is the `NULL_ATOM_ID` sentinel.
    pub fn is_null(&self) -> bool {
        *self == NULL_ATOM_ID
    }
}

impl fmt::Display for AtomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "x:x")
        } else {
            write!(f, "{}:{}", self.site, self.index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sentinels() {
        assert!(NULL_ATOM_ID.is_null());
        assert!(!AtomId::new(NULL_SITE, 0).is_null());
        assert!(!AtomId::new(1, NULL_INDEX).is_null());
        assert_eq!(NULL_INDEX.max(42), 42);
        assert_eq!(NULL_INDEX.max(0), 0);
    }

    #[test]
    fn test_collection_order() {
        let a = AtomId::new(1, 5);
        let b = AtomId::new(1, 6);
        let c = AtomId::new(2, 0);

        assert!(a < b);
        assert!(b < c);
        assert!(a < c);
    }

    #[test]
    fn test_display() {
        assert_eq!(AtomId::new(3, 7).to_string(), "3:7");
        assert_eq!(NULL_ATOM_ID.to_string(), "x:x");
    }

    #[test]
    fn test_serde_roundtrip() {
        let id = AtomId::new(2, 11);
        let json = serde_json::to_string(&id).unwrap();
        let back: AtomId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
