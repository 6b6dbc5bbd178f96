//! The weave engine: one canonical total order over all known atoms.
//!
//! The weave is a derived, rebuildable index over `(site, index)` pairs -
//! it can always be reconstructed from the yarns, and it never stores
//! atom values. The order is the depth-first traversal of the causal
//! tree with a deterministic sibling rule, followed by a non-causal tail
//! segment for unparented atoms. The traversal is id-only: it depends on
//! nothing but the atom set itself, never on arrival order or any
//! replica-local state, which is what makes independently computed
//! weaves bit-identical across replicas.
//!
//! Sibling rule: priority atoms (`Delete`, `ValuePriority`) come before
//! plain siblings, so targeted operations are not re-parented relative
//! to content when a merge interleaves concurrent edits; siblings of
//! equal priority order by `(site, index)`.
//!
//! Tail rule: `End` atoms precede `Commit` atoms, each group ordered by
//! `(site, index)`.
//!
//! Atoms whose cause has not arrived yet are buffered - never discarded,
//! never force-ordered - keyed by the missing cause and resolved by a
//! work-list pass when it shows up.

use crate::error::{Result, TreeError};
use crate::yarn::YarnStore;
use skein_core::{AtomId, AtomMetadata, AtomType, SiteId, YarnIndex, NULL_ATOM_ID};
use std::collections::HashMap;

/// Outcome of feeding one atom to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Integration {
    /// The atom is in the weave. `resolved` lists previously buffered
    /// atoms spliced as a consequence; `rejected` lists buffered atoms
    /// that turned out malformed once their cause became known.
    Spliced {
        resolved: Vec<AtomId>,
        rejected: Vec<(AtomId, TreeError)>,
    },
    /// The atom's cause is unknown; it is parked until the cause arrives.
    Buffered { missing: AtomId },
}

/// The canonical total order over all woven atoms.
#[derive(Clone, Debug, Default)]
pub struct Weave {
    /// Metadata of every woven atom.
    atoms: HashMap<AtomId, AtomMetadata>,
    /// Cause id to child ids, each list kept in sibling-rule order. The
    /// virtual root is `NULL_ATOM_ID`.
    children: HashMap<AtomId, Vec<AtomId>>,
    /// Non-causal tail segment, kept in tail-rule order.
    tail: Vec<AtomId>,
    /// Missing cause id to the atoms blocked on it.
    pending: HashMap<AtomId, Vec<AtomMetadata>>,
}

fn sibling_key(meta: &AtomMetadata) -> (bool, SiteId, YarnIndex) {
    (!meta.kind.priority(), meta.id.site, meta.id.index)
}

fn tail_key(meta: &AtomMetadata) -> (u8, SiteId, YarnIndex) {
    let rank = if meta.kind == AtomType::End { 0 } else { 1 };
    (rank, meta.id.site, meta.id.index)
}

impl Weave {
    pub fn new() -> Self {
        Weave::default()
    }

    /// Rebuild a weave from scratch. Returns the weave together with any
    /// atoms rejected during construction; atoms whose causes are absent
    /// from the store remain in the pending buffer.
    pub fn from_yarns<V>(yarns: &YarnStore<V>) -> (Self, Vec<(AtomId, TreeError)>) {
        let mut weave = Weave::new();
        let mut rejected = Vec::new();
        for site in yarns.sites() {
            for atom in yarns.iter_site(site) {
                match weave.integrate(atom.metadata()) {
                    Ok(Integration::Spliced { rejected: r, .. }) => rejected.extend(r),
                    Ok(Integration::Buffered { .. }) => {}
                    Err(err) => rejected.push((atom.id, err)),
                }
            }
        }
        (weave, rejected)
    }

    /// Whether integrating `meta` would succeed. Checks everything
    /// [`integrate`](Self::integrate) checks, without mutating.
    pub fn admissible(&self, meta: &AtomMetadata) -> Result<()> {
        if self.atoms.contains_key(&meta.id) {
            return Err(TreeError::MalformedAtom {
                id: meta.id,
                reason: "already woven".into(),
            });
        }
        if self.pending.values().flatten().any(|p| p.id == meta.id) {
            return Err(TreeError::MalformedAtom {
                id: meta.id,
                reason: "already buffered".into(),
            });
        }
        if meta.kind.unparented() {
            return Ok(());
        }
        if meta.cause == meta.id {
            return Err(TreeError::MalformedAtom {
                id: meta.id,
                reason: "atom cannot cause itself".into(),
            });
        }
        if let Some(cause) = self.atoms.get(&meta.cause) {
            if cause.kind.childless() || cause.kind.unparented() {
                return Err(TreeError::MalformedAtom {
                    id: meta.id,
                    reason: format!("cause {} cannot bear children", meta.cause),
                });
            }
        }
        Ok(())
    }

    /// Splice an atom into the position the full depth-first rule would
    /// assign, or buffer it if its cause is unknown.
    pub fn integrate(&mut self, meta: AtomMetadata) -> Result<Integration> {
        self.admissible(&meta)?;

        if meta.kind.unparented() {
            self.splice_tail(meta);
        } else if meta.cause.is_null() || self.atoms.contains_key(&meta.cause) {
            self.splice(meta);
        } else {
            self.pending.entry(meta.cause).or_default().push(meta);
            return Ok(Integration::Buffered {
                missing: meta.cause,
            });
        }

        let (resolved, rejected) = self.resolve_pending(meta.id);
        Ok(Integration::Spliced { resolved, rejected })
    }

    fn splice(&mut self, meta: AtomMetadata) {
        self.atoms.insert(meta.id, meta);
        let key = sibling_key(&meta);
        let atoms = &self.atoms;
        let siblings = self.children.entry(meta.cause).or_default();
        let pos = siblings
            .iter()
            .position(|sib| sibling_key(&atoms[sib]) > key)
            .unwrap_or(siblings.len());
        siblings.insert(pos, meta.id);
    }

    fn splice_tail(&mut self, meta: AtomMetadata) {
        self.atoms.insert(meta.id, meta);
        let key = tail_key(&meta);
        let atoms = &self.atoms;
        let pos = self
            .tail
            .iter()
            .position(|id| tail_key(&atoms[id]) > key)
            .unwrap_or(self.tail.len());
        self.tail.insert(pos, meta.id);
    }

    /// Work-list pass: splice everything that was blocked on `root`, then
    /// everything blocked on those, and so on. Atoms blocked on a cause
    /// that turns out unable to bear children are rejected, not woven.
    fn resolve_pending(&mut self, root: AtomId) -> (Vec<AtomId>, Vec<(AtomId, TreeError)>) {
        let mut work = vec![root];
        let mut resolved = Vec::new();
        let mut rejected = Vec::new();

        while let Some(id) = work.pop() {
            let Some(blocked) = self.pending.remove(&id) else {
                continue;
            };
            let kind = self.atoms[&id].kind;
            for child in blocked {
                if kind.childless() || kind.unparented() {
                    rejected.push((
                        child.id,
                        TreeError::MalformedAtom {
                            id: child.id,
                            reason: format!("cause {} cannot bear children", id),
                        },
                    ));
                } else {
                    self.splice(child);
                    resolved.push(child.id);
                    work.push(child.id);
                }
            }
        }
        (resolved, rejected)
    }

    /// Metadata of a woven atom. Buffered atoms are not visible here.
    pub fn metadata(&self, id: AtomId) -> Option<&AtomMetadata> {
        self.atoms.get(&id)
    }

    pub fn contains(&self, id: AtomId) -> bool {
        self.atoms.contains_key(&id)
    }

    /// Number of woven atoms, tail included.
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Atoms still waiting for a cause to arrive.
    pub fn pending_len(&self) -> usize {
        self.pending.values().map(|v| v.len()).sum()
    }

    /// The canonical order as a lazy, restartable iterator: depth-first
    /// causal segment, then the tail segment.
    pub fn iter(&self) -> WeaveIter<'_> {
        let mut stack = Vec::new();
        if let Some(roots) = self.children.get(&NULL_ATOM_ID) {
            stack.extend(roots.iter().rev().copied());
        }
        WeaveIter {
            weave: self,
            stack,
            tail_pos: 0,
        }
    }

    /// The canonical order collected into a vector.
    pub fn order(&self) -> Vec<AtomId> {
        self.iter().collect()
    }
}

/// Depth-first traversal over a [`Weave`].
pub struct WeaveIter<'a> {
    weave: &'a Weave,
    stack: Vec<AtomId>,
    tail_pos: usize,
}

impl<'a> Iterator for WeaveIter<'a> {
    type Item = AtomId;

    fn next(&mut self) -> Option<AtomId> {
        if let Some(id) = self.stack.pop() {
            // Childless atoms terminate recursion outright.
            let descend = self
                .weave
                .atoms
                .get(&id)
                .is_some_and(|m| !m.kind.childless());
            if descend {
                if let Some(children) = self.weave.children.get(&id) {
                    self.stack.extend(children.iter().rev().copied());
                }
            }
            return Some(id);
        }
        if self.tail_pos < self.weave.tail.len() {
            let id = self.weave.tail[self.tail_pos];
            self.tail_pos += 1;
            return Some(id);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skein_core::{Clock, NULL_ATOM_ID};

    fn meta(site: SiteId, index: YarnIndex, cause: AtomId, kind: AtomType) -> AtomMetadata {
        let timestamp: Clock = 3 + (site as Clock) * 100 + index as Clock;
        AtomMetadata {
            id: AtomId::new(site, index),
            cause,
            reference: NULL_ATOM_ID,
            kind,
            timestamp,
        }
    }

    #[test]
    fn test_roots_order_by_site_then_index() {
        let mut weave = Weave::new();
        weave
            .integrate(meta(2, 0, NULL_ATOM_ID, AtomType::Value))
            .unwrap();
        weave
            .integrate(meta(1, 0, NULL_ATOM_ID, AtomType::Value))
            .unwrap();

        assert_eq!(
            weave.order(),
            vec![AtomId::new(1, 0), AtomId::new(2, 0)]
        );
    }

    #[test]
    fn test_priority_sibling_comes_first() {
        let root = AtomId::new(1, 0);
        for arrival in [[1usize, 2], [2, 1]] {
            let mut weave = Weave::new();
            weave
                .integrate(meta(1, 0, NULL_ATOM_ID, AtomType::Value))
                .unwrap();
            for step in arrival {
                match step {
                    1 => weave.integrate(meta(1, 1, root, AtomType::Value)).unwrap(),
                    _ => weave.integrate(meta(2, 0, root, AtomType::Delete)).unwrap(),
                };
            }
            // The tombstone outranks the plain sibling in either arrival order.
            assert_eq!(
                weave.order(),
                vec![root, AtomId::new(2, 0), AtomId::new(1, 1)]
            );
        }
    }

    #[test]
    fn test_buffering_out_of_order_delivery() {
        let mut weave = Weave::new();

        // (1,1) depends on (1,0) and arrives first.
        let outcome = weave
            .integrate(meta(1, 1, AtomId::new(1, 0), AtomType::Value))
            .unwrap();
        assert_eq!(
            outcome,
            Integration::Buffered {
                missing: AtomId::new(1, 0)
            }
        );
        assert_eq!(weave.pending_len(), 1);
        assert!(!weave.contains(AtomId::new(1, 1)));

        // Once the cause arrives, both weave in cause-before-effect order.
        let outcome = weave
            .integrate(meta(1, 0, NULL_ATOM_ID, AtomType::Value))
            .unwrap();
        assert_eq!(
            outcome,
            Integration::Spliced {
                resolved: vec![AtomId::new(1, 1)],
                rejected: vec![],
            }
        );
        assert_eq!(weave.pending_len(), 0);
        assert_eq!(
            weave.order(),
            vec![AtomId::new(1, 0), AtomId::new(1, 1)]
        );
    }

    #[test]
    fn test_buffered_chain_resolves_transitively() {
        let mut weave = Weave::new();
        weave
            .integrate(meta(1, 2, AtomId::new(1, 1), AtomType::Value))
            .unwrap();
        weave
            .integrate(meta(1, 1, AtomId::new(1, 0), AtomType::Value))
            .unwrap();
        assert_eq!(weave.pending_len(), 2);

        weave
            .integrate(meta(1, 0, NULL_ATOM_ID, AtomType::Value))
            .unwrap();
        assert_eq!(weave.pending_len(), 0);
        assert_eq!(
            weave.order(),
            vec![AtomId::new(1, 0), AtomId::new(1, 1), AtomId::new(1, 2)]
        );
    }

    #[test]
    fn test_childless_cause_rejected() {
        let mut weave = Weave::new();
        weave
            .integrate(meta(1, 0, NULL_ATOM_ID, AtomType::Value))
            .unwrap();
        weave
            .integrate(meta(2, 0, AtomId::new(1, 0), AtomType::Delete))
            .unwrap();

        // Nothing may attach below a tombstone.
        let err = weave
            .integrate(meta(1, 1, AtomId::new(2, 0), AtomType::Value))
            .unwrap_err();
        assert!(matches!(err, TreeError::MalformedAtom { .. }));
    }

    #[test]
    fn test_buffered_child_of_childless_cause_rejected_on_arrival() {
        let mut weave = Weave::new();
        weave
            .integrate(meta(1, 0, NULL_ATOM_ID, AtomType::Value))
            .unwrap();

        // A child blocked on (2,0), which turns out to be a tombstone.
        weave
            .integrate(meta(1, 1, AtomId::new(2, 0), AtomType::Value))
            .unwrap();
        let outcome = weave
            .integrate(meta(2, 0, AtomId::new(1, 0), AtomType::Delete))
            .unwrap();

        match outcome {
            Integration::Spliced { resolved, rejected } => {
                assert!(resolved.is_empty());
                assert_eq!(rejected.len(), 1);
                assert_eq!(rejected[0].0, AtomId::new(1, 1));
            }
            other => panic!("expected splice, got {:?}", other),
        }
        assert!(!weave.contains(AtomId::new(1, 1)));
    }

    #[test]
    fn test_tail_segment_order() {
        let mut weave = Weave::new();
        weave
            .integrate(meta(1, 0, NULL_ATOM_ID, AtomType::Value))
            .unwrap();
        weave
            .integrate(meta(2, 0, NULL_ATOM_ID, AtomType::Commit))
            .unwrap();
        weave
            .integrate(meta(1, 1, NULL_ATOM_ID, AtomType::Commit))
            .unwrap();
        let mut end = meta(0, 0, NULL_ATOM_ID, AtomType::End);
        end.timestamp = skein_core::END_CLOCK;
        weave.integrate(end).unwrap();

        // Causal segment, then ends, then commits by (site, index).
        assert_eq!(
            weave.order(),
            vec![
                AtomId::new(1, 0),
                AtomId::new(0, 0),
                AtomId::new(1, 1),
                AtomId::new(2, 0),
            ]
        );
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut weave = Weave::new();
        let m = meta(1, 0, NULL_ATOM_ID, AtomType::Value);
        weave.integrate(m).unwrap();
        assert!(weave.integrate(m).is_err());
    }

    #[test]
    fn test_incremental_matches_rebuild() {
        use skein_core::Atom;

        let mut yarns: YarnStore<char> = YarnStore::new();
        let mut weave = Weave::new();
        let atoms = vec![
            meta(1, 0, NULL_ATOM_ID, AtomType::Value),
            meta(1, 1, AtomId::new(1, 0), AtomType::Value),
            meta(2, 0, AtomId::new(1, 0), AtomType::ValuePriority),
            meta(2, 1, AtomId::new(1, 1), AtomType::Delete),
            meta(1, 2, NULL_ATOM_ID, AtomType::Commit),
        ];
        for m in &atoms {
            yarns
                .append(Atom::new(m.id, m.cause, m.reference, m.kind, m.timestamp, '?'))
                .unwrap();
            weave.integrate(*m).unwrap();
        }

        let (rebuilt, rejected) = Weave::from_yarns(&yarns);
        assert!(rejected.is_empty());
        assert_eq!(rebuilt.order(), weave.order());
    }
}
