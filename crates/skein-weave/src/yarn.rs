//! Per-site append-only atom logs.
//!
//! Each yarn is a contiguous growable sequence indexed by `YarnIndex`,
//! the arena the weave is an index over. Yarns are the ground truth of
//! "what each site has produced": atoms are immutable once appended and
//! never removed (a delete is a new tombstone atom, not an erasure).

use crate::error::{Result, TreeError};
use serde::{Deserialize, Serialize};
use skein_core::{Atom, AtomId, SiteId, Weft, YarnIndex};
use std::collections::BTreeMap;

/// All yarns a replica has synchronized with, keyed by site.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YarnStore<V> {
    yarns: BTreeMap<SiteId, Vec<Atom<V>>>,
}

impl<V> YarnStore<V> {
    pub fn new() -> Self {
        YarnStore {
            yarns: BTreeMap::new(),
        }
    }

    /// The index the next atom appended for `site` must carry.
    pub fn next_index(&self, site: SiteId) -> YarnIndex {
        self.yarns.get(&site).map_or(0, |y| y.len() as YarnIndex)
    }

    /// Append an atom to its site's yarn, creating the yarn lazily.
    ///
    /// Fails with `GapInYarn` unless the atom's index is exactly one past
    /// the site's current tail; gap-free sequencing is what makes the
    /// weft's high-water marks meaningful.
    pub fn append(&mut self, atom: Atom<V>) -> Result<()> {
        let expected = self.next_index(atom.id.site);
        if atom.id.index != expected {
            return Err(TreeError::GapInYarn {
                site: atom.id.site,
                expected,
                found: atom.id.index,
            });
        }
        self.yarns.entry(atom.id.site).or_default().push(atom);
        Ok(())
    }

    pub fn get(&self, id: AtomId) -> Option<&Atom<V>> {
        let index = usize::try_from(id.index).ok()?;
        self.yarns.get(&id.site)?.get(index)
    }

    /// Like [`get`](Self::get), but distinguishes the failure modes.
    pub fn atom(&self, id: AtomId) -> Result<&Atom<V>> {
        let yarn = self
            .yarns
            .get(&id.site)
            .ok_or(TreeError::UnknownSite(id.site))?;
        usize::try_from(id.index)
            .ok()
            .and_then(|index| yarn.get(index))
            .ok_or(TreeError::AtomNotFound(id))
    }

    pub fn yarn(&self, site: SiteId) -> Option<&[Atom<V>]> {
        self.yarns.get(&site).map(|y| y.as_slice())
    }

    /// Atoms of one site's yarn in index order; empty for unknown sites.
    pub fn iter_site(&self, site: SiteId) -> impl Iterator<Item = &Atom<V>> {
        self.yarns.get(&site).into_iter().flatten()
    }

    /// Known sites in ascending order.
    pub fn sites(&self) -> impl Iterator<Item = SiteId> + '_ {
        self.yarns.keys().copied()
    }

    pub fn yarn_len(&self, site: SiteId) -> usize {
        self.yarns.get(&site).map_or(0, |y| y.len())
    }

    pub fn total_atoms(&self) -> usize {
        self.yarns.values().map(|y| y.len()).sum()
    }

    /// The weft of every yarn's tail.
    pub fn frontier(&self) -> Weft {
        let mut weft = Weft::new();
        for (&site, yarn) in &self.yarns {
            if !yarn.is_empty() {
                weft.update_site(site, (yarn.len() - 1) as YarnIndex);
            }
        }
        weft
    }
}

impl<V> Default for YarnStore<V> {
    fn default() -> Self {
        Self::new()
    }
}
