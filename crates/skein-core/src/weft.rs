//! The weft: a per-site high-water-mark map over yarn indexes.
//!
//! A weft summarizes "everything this replica has seen" as the highest
//! contiguous yarn index known per site. Because yarns are gap-free, a
//! single index per site captures the whole causal frontier; sites absent
//! from the mapping are implicitly at `NULL_INDEX`.
//!
//! All operations are bounded by the number of distinct sites, never by
//! the number of atoms.

use crate::ids::{AtomId, SiteId, YarnIndex, NULL_INDEX, NULL_SITE};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// A causal frontier: site id to highest seen yarn index.
///
/// Updates are pointwise max, which makes merging frontiers commutative,
/// associative, and idempotent. A weft never holds an entry for
/// `NULL_SITE`. Two wefts are equal iff their mappings are equal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weft {
    mapping: BTreeMap<SiteId, YarnIndex>,
}

impl Weft {
    /// Create an empty weft: every site at `NULL_INDEX`.
    pub fn new() -> Self {
        Weft {
            mapping: BTreeMap::new(),
        }
    }

    /// Build a weft from `(site, index)` pairs.
    pub fn from_entries(entries: impl IntoIterator<Item = (SiteId, YarnIndex)>) -> Self {
        let mut weft = Weft::new();
        for (site, index) in entries {
            weft.update_site(site, index);
        }
        weft
    }

    /// Highest seen index for a site; `NULL_INDEX` if the site is unknown.
    pub fn get(&self, site: SiteId) -> YarnIndex {
        self.mapping.get(&site).copied().unwrap_or(NULL_INDEX)
    }

    /// Raise the entry for `site` to at least `index`. Never lowers an
    /// existing entry. No-op for `NULL_SITE`.
    pub fn update_site(&mut self, site: SiteId, index: YarnIndex) {
        if site == NULL_SITE {
            return;
        }
        let entry = self.mapping.entry(site).or_insert(NULL_INDEX);
        *entry = (*entry).max(index);
    }

    /// Absorb a single atom id. No-op for `NULL_ATOM_ID`.
    pub fn update_atom(&mut self, atom: AtomId) {
        if atom.is_null() {
            return;
        }
        self.update_site(atom.site, atom.index);
    }

    /// Pointwise-max fold of another weft into this one.
    pub fn update_weft(&mut self, other: &Weft) {
        for (&site, &index) in &other.mapping {
            self.update_site(site, index);
        }
    }

    /// Merged copy, leaving both inputs untouched.
    pub fn merged_with(&self, other: &Weft) -> Weft {
        let mut result = self.clone();
        result.update_weft(other);
        result
    }

    /// Whether this frontier causally covers `atom`.
    ///
    /// `NULL_ATOM_ID` is included by convention, so causal blocks rooted
    /// at the sentinel need no special-casing.
    pub fn included(&self, atom: AtomId) -> bool {
        if atom.is_null() {
            return true;
        }
        atom.index <= self.get(atom.site)
    }

    /// Strict `<` over frontiers, the original lexicographic rule: extend
    /// both mappings to dense vectors up to the larger known site id
    /// (absent entries at `NULL_INDEX`), then compare lexicographically.
    ///
    /// Precondition: both wefts draw from the same densely-allocated
    /// site-id universe. Structurally divergent universes are a caller
    /// contract violation and are not defended against here.
    pub fn precedes(&self, other: &Weft) -> bool {
        let max_site = self
            .mapping
            .keys()
            .chain(other.mapping.keys())
            .copied()
            .max();
        let Some(max_site) = max_site else {
            return false;
        };
        for site in 0..=max_site {
            let lhs = self.get(site);
            let rhs = other.get(site);
            if lhs != rhs {
                return lhs < rhs;
            }
        }
        false
    }

    /// Number of sites with a real entry.
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Iterate over `(site, index)` entries in site order.
    pub fn iter(&self) -> impl Iterator<Item = (SiteId, YarnIndex)> + '_ {
        self.mapping.iter().map(|(&site, &index)| (site, index))
    }

    /// Sites with a real entry, in order.
    pub fn sites(&self) -> impl Iterator<Item = SiteId> + '_ {
        self.mapping.keys().copied()
    }
}

impl PartialOrd for Weft {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            Some(Ordering::Equal)
        } else if self.precedes(other) {
            Some(Ordering::Less)
        } else if other.precedes(self) {
            Some(Ordering::Greater)
        } else {
            None
        }
    }
}

impl fmt::Display for Weft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (site, index)) in self.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", site, index)?;
        }
        write!(f, "]")
    }
}
