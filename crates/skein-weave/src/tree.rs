//! The replica: yarns, weft, and weave kept consistent as one unit.
//!
//! A `CausalTree` owns the three structures and applies every atom to all
//! of them atomically: an atom is validated first, and only then appended
//! to its yarn, folded into the weft, and fed to the weave. A reader can
//! never observe one structure ahead of the others. The tree provides no
//! internal locking; callers mixing local edits and remote integrations
//! serialize access themselves.

use crate::error::{Result, TreeError};
use crate::weave::{Integration, Weave, WeaveIter};
use crate::yarn::YarnStore;
use skein_core::{
    Atom, AtomId, AtomMetadata, AtomType, Clock, SiteId, Weft, CONTROL_SITE, END_CLOCK,
    NULL_ATOM_ID, NULL_SITE, START_CLOCK,
};

/// Outcome summary of one [`CausalTree::integrate`] call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntegrationReport {
    /// Atoms absorbed into the local yarns and weft by this call.
    pub applied: usize,
    /// Atoms rejected, with the reason. A rejection stops further atoms
    /// of the same yarn (gap-free sequencing) but never aborts
    /// integration of other, independent yarns.
    pub rejected: Vec<(AtomId, TreeError)>,
    /// Atoms still waiting for an unknown cause after this call, across
    /// the whole replica.
    pub pending: usize,
}

impl IntegrationReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// One replica of the shared tree.
#[derive(Clone, Debug)]
pub struct CausalTree<V> {
    site: SiteId,
    lamport: Clock,
    yarns: YarnStore<V>,
    weft: Weft,
    weave: Weave,
}

impl<V: Clone + PartialEq> CausalTree<V> {
    /// Create an empty replica owned by `site`.
    pub fn new(site: SiteId) -> Result<Self> {
        if site == NULL_SITE || site == CONTROL_SITE {
            return Err(TreeError::ReservedSite(site));
        }
        Ok(CausalTree {
            site,
            lamport: END_CLOCK,
            yarns: YarnStore::new(),
            weft: Weft::new(),
            weave: Weave::new(),
        })
    }

    /// Create a replica seeded with the `Start`/`End` boundary atoms on
    /// the control site. Every replica seeded this way shares the same
    /// boundary atoms, so mutual integration treats them as already seen.
    pub fn with_boundaries(site: SiteId) -> Result<Self>
    where
        V: Default,
    {
        let mut tree = Self::new(site)?;
        tree.admit(Atom::new(
            Self::start_id(),
            NULL_ATOM_ID,
            NULL_ATOM_ID,
            AtomType::Start,
            START_CLOCK,
            V::default(),
        ))?;
        tree.admit(Atom::new(
            Self::end_id(),
            Self::start_id(),
            NULL_ATOM_ID,
            AtomType::End,
            END_CLOCK,
            V::default(),
        ))?;
        Ok(tree)
    }

    /// Id of the `Start` boundary atom in a seeded replica.
    pub fn start_id() -> AtomId {
        AtomId::new(CONTROL_SITE, 0)
    }

    /// Id of the `End` boundary atom in a seeded replica.
    pub fn end_id() -> AtomId {
        AtomId::new(CONTROL_SITE, 1)
    }

    /// Reassemble a replica from its serialized parts, revalidating every
    /// atom and rebuilding the weave (the weave is never persisted).
    pub fn from_parts(
        site: SiteId,
        lamport: Clock,
        yarns: YarnStore<V>,
        weft: Weft,
    ) -> Result<Self> {
        if site == NULL_SITE || site == CONTROL_SITE {
            return Err(TreeError::ReservedSite(site));
        }
        let mut max_seen = END_CLOCK;
        for s in yarns.sites() {
            if s == NULL_SITE {
                return Err(TreeError::ReservedSite(s));
            }
            for (i, atom) in yarns.iter_site(s).enumerate() {
                if atom.id.site != s || atom.id.index as usize != i {
                    return Err(TreeError::MalformedAtom {
                        id: atom.id,
                        reason: "yarn position does not match atom id".into(),
                    });
                }
                validate_atom(atom)?;
                max_seen = max_seen.max(atom.timestamp);
            }
        }
        if weft != yarns.frontier() {
            return Err(TreeError::MalformedAtom {
                id: NULL_ATOM_ID,
                reason: "weft disagrees with the yarn frontier".into(),
            });
        }
        let (weave, rejected) = Weave::from_yarns(&yarns);
        if let Some((_, err)) = rejected.into_iter().next() {
            return Err(err);
        }
        Ok(CausalTree {
            site,
            lamport: lamport.max(max_seen),
            yarns,
            weft,
            weave,
        })
    }

    pub fn site(&self) -> SiteId {
        self.site
    }

    pub fn lamport(&self) -> Clock {
        self.lamport
    }

    pub fn weft(&self) -> &Weft {
        &self.weft
    }

    pub fn weave(&self) -> &Weave {
        &self.weave
    }

    pub fn yarns(&self) -> &YarnStore<V> {
        &self.yarns
    }

    /// Read-only projection of any absorbed atom, buffered ones included.
    pub fn metadata(&self, id: AtomId) -> Option<AtomMetadata> {
        self.yarns.get(id).map(|a| a.metadata())
    }

    pub fn value(&self, id: AtomId) -> Option<&V> {
        self.yarns.get(id).map(|a| &a.value)
    }

    /// The weave's linear order as a lazy, restartable sequence.
    pub fn traverse(&self) -> WeaveIter<'_> {
        self.weave.iter()
    }

    /// Whether two replicas have converged: same frontier, same order.
    pub fn converged_with(&self, other: &CausalTree<V>) -> bool {
        self.weft == other.weft && self.weave.order() == other.weave.order()
    }

    /// Append a new content atom caused by `cause`. Pass `NULL_ATOM_ID`
    /// to insert at the root.
    pub fn insert(&mut self, cause: AtomId, value: V) -> Result<AtomId> {
        self.append_local(cause, NULL_ATOM_ID, AtomType::Value, value)
    }

    /// Like [`insert`](Self::insert), but the atom outranks plain
    /// siblings on merge.
    pub fn insert_priority(&mut self, cause: AtomId, value: V) -> Result<AtomId> {
        self.append_local(cause, NULL_ATOM_ID, AtomType::ValuePriority, value)
    }

    /// Tombstone a value atom. The target stays in its yarn; the
    /// tombstone is a new atom caused by (and referencing) the target.
    pub fn delete(&mut self, target: AtomId) -> Result<AtomId>
    where
        V: Default,
    {
        let meta = self
            .weave
            .metadata(target)
            .copied()
            .ok_or(TreeError::AtomNotFound(target))?;
        if !meta.kind.is_value() {
            return Err(TreeError::MalformedAtom {
                id: target,
                reason: "only value atoms can be deleted".into(),
            });
        }
        self.append_local(target, target, AtomType::Delete, V::default())
    }

    /// Record that this site has seen `reference` without taking a causal
    /// position: the commit atom lands in the weave's tail.
    pub fn commit(&mut self, reference: AtomId) -> Result<AtomId>
    where
        V: Default,
    {
        if reference.is_null() || !self.weft.included(reference) {
            return Err(TreeError::AtomNotFound(reference));
        }
        self.append_local(NULL_ATOM_ID, reference, AtomType::Commit, V::default())
    }

    fn append_local(
        &mut self,
        cause: AtomId,
        reference: AtomId,
        kind: AtomType,
        value: V,
    ) -> Result<AtomId> {
        if !kind.unparented() && !cause.is_null() {
            let meta = self
                .weave
                .metadata(cause)
                .copied()
                .ok_or(TreeError::AtomNotFound(cause))?;
            if meta.kind.childless() || meta.kind.unparented() {
                return Err(TreeError::MalformedAtom {
                    id: cause,
                    reason: "cannot bear children".into(),
                });
            }
        }
        let id = AtomId::new(self.site, self.yarns.next_index(self.site));
        self.lamport += 1;
        let atom = Atom::new(id, cause, reference, kind, self.lamport, value);
        self.admit(atom)?;
        Ok(id)
    }

    /// Absorb atoms (and their yarns) from another replica.
    ///
    /// For each remote site, every index above the local frontier is
    /// fetched, validated, and applied as a unit; atoms whose causes have
    /// not arrived yet are buffered by the weave. Idempotent, commutative,
    /// and associative over repeated partial integrations.
    pub fn integrate(&mut self, remote: &CausalTree<V>) -> IntegrationReport {
        let mut report = IntegrationReport::default();

        for (site, remote_tail) in remote.weft.iter() {
            let mut clean = true;
            for index in (self.weft.get(site) + 1)..=remote_tail {
                let id = AtomId::new(site, index);
                let atom = match remote.yarns.get(id) {
                    Some(atom) => atom,
                    None => {
                        report.rejected.push((
                            id,
                            TreeError::MalformedAtom {
                                id,
                                reason: "advertised by weft but missing from yarn".into(),
                            },
                        ));
                        clean = false;
                        break;
                    }
                };
                match self.admit(atom.clone()) {
                    Ok(outcome) => {
                        report.applied += 1;
                        if let Integration::Spliced { rejected, .. } = outcome {
                            report.rejected.extend(rejected);
                        }
                    }
                    Err(err) => {
                        report.rejected.push((id, err));
                        clean = false;
                        break;
                    }
                }
            }
            if clean {
                self.weft.update_site(site, remote_tail);
            }
        }

        if remote.lamport > self.lamport {
            self.lamport = remote.lamport;
        }
        report.pending = self.weave.pending_len();
        report
    }

    /// Validate, then apply one atom to yarn, weft, and weave as a unit.
    fn admit(&mut self, atom: Atom<V>) -> Result<Integration> {
        validate_atom(&atom)?;
        let meta = atom.metadata();
        self.weave.admissible(&meta)?;

        let expected = self.yarns.next_index(meta.id.site);
        if meta.id.index != expected {
            return Err(TreeError::GapInYarn {
                site: meta.id.site,
                expected,
                found: meta.id.index,
            });
        }

        // Checks are done; nothing below can fail.
        let outcome = self.weave.integrate(meta)?;
        self.yarns.append(atom)?;
        self.weft.update_atom(meta.id);
        if meta.timestamp > self.lamport {
            self.lamport = meta.timestamp;
        }
        Ok(outcome)
    }
}

/// Reserved-value and shape discipline for a single atom.
fn validate_atom<V>(atom: &Atom<V>) -> Result<()> {
    let id = atom.id;
    let malformed = |reason: &str| {
        Err(TreeError::MalformedAtom {
            id,
            reason: reason.into(),
        })
    };

    if id.site == NULL_SITE {
        return malformed("identity uses the null site");
    }
    if id.index < 0 {
        return malformed("identity uses a negative index");
    }
    match atom.kind {
        AtomType::Start => {
            if id.site != CONTROL_SITE {
                return malformed("start boundary outside the control site");
            }
            if atom.timestamp != START_CLOCK {
                return malformed("start boundary with a non-start clock");
            }
        }
        AtomType::End => {
            if id.site != CONTROL_SITE {
                return malformed("end boundary outside the control site");
            }
            if atom.timestamp != END_CLOCK {
                return malformed("end boundary with a non-end clock");
            }
        }
        _ => {
            if id.site == CONTROL_SITE {
                return malformed("control site is reserved for boundary atoms");
            }
            if atom.timestamp <= END_CLOCK {
                return malformed("timestamp in the reserved range");
            }
        }
    }
    if atom.cause == id {
        return malformed("atom cannot cause itself");
    }
    if atom.cause.site == NULL_SITE && !atom.cause.is_null() {
        return malformed("cause uses the null site");
    }
    if atom.reference.site == NULL_SITE && !atom.reference.is_null() {
        return malformed("reference uses the null site");
    }
    if atom.kind == AtomType::Delete && atom.cause.is_null() {
        return malformed("tombstone without a target");
    }
    Ok(())
}
