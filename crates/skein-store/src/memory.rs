//! In-memory instance registry: the boundary a persistence or sync layer
//! talks to.
//!
//! The registry owns open replicas keyed by opaque instance ids, exposes
//! the merge entry point, and detects content changes by comparing
//! content hashes. It does not own a timer: the host drives
//! [`TreeStore::poll_changed`] at whatever cadence it likes and gets back
//! the instances whose content moved since the previous poll.

use crate::error::{Result, StoreError};
use crate::hash::{content_hash, ContentHash};
use skein_core::SiteId;
use skein_weave::{CausalTree, IntegrationReport};
use std::collections::HashMap;
use tracing::debug;
use ulid::Ulid;

/// Opaque identifier binding an open replica to its host-side identity.
pub type InstanceId = Ulid;

/// Registry of open replicas.
#[derive(Debug)]
pub struct TreeStore<V> {
    instances: HashMap<InstanceId, CausalTree<V>>,
    hashes: HashMap<InstanceId, ContentHash>,
}

impl<V: Clone + PartialEq> TreeStore<V> {
    pub fn new() -> Self {
        TreeStore {
            instances: HashMap::new(),
            hashes: HashMap::new(),
        }
    }

    /// Create a fresh replica for `site` and open it.
    pub fn create(&mut self, site: SiteId) -> Result<InstanceId> {
        let tree = CausalTree::new(site)?;
        Ok(self.open(tree))
    }

    /// Bind an existing replica (e.g. a restored snapshot) to a new id.
    pub fn open(&mut self, tree: CausalTree<V>) -> InstanceId {
        let id = Ulid::new();
        self.hashes.insert(id, content_hash(&tree));
        self.instances.insert(id, tree);
        debug!(instance = %id, "opened tree instance");
        id
    }

    /// Unbind a replica from its id, returning it if it was open.
    pub fn close(&mut self, id: InstanceId) -> Option<CausalTree<V>> {
        self.hashes.remove(&id);
        let tree = self.instances.remove(&id);
        if tree.is_some() {
            debug!(instance = %id, "closed tree instance");
        }
        tree
    }

    pub fn get(&self, id: InstanceId) -> Option<&CausalTree<V>> {
        self.instances.get(&id)
    }

    /// Mutable access for local edits; the next poll picks up the change.
    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut CausalTree<V>> {
        self.instances.get_mut(&id)
    }

    /// Open instance ids, in no particular order.
    pub fn instances(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.instances.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Merge a decoded remote replica into an open instance.
    pub fn merge(&mut self, id: InstanceId, incoming: &CausalTree<V>) -> Result<IntegrationReport> {
        let tree = self
            .instances
            .get_mut(&id)
            .ok_or(StoreError::UnknownInstance(id))?;
        let report = tree.integrate(incoming);
        debug!(
            instance = %id,
            applied = report.applied,
            rejected = report.rejected.len(),
            pending = report.pending,
            "merged remote tree"
        );
        Ok(report)
    }

    /// Recompute content hashes and report the instances whose content
    /// moved since the last poll, in id order.
    pub fn poll_changed(&mut self) -> Vec<InstanceId> {
        let mut changed = Vec::new();
        for (&id, tree) in &self.instances {
            let hash = content_hash(tree);
            if self.hashes.get(&id) != Some(&hash) {
                self.hashes.insert(id, hash);
                changed.push(id);
            }
        }
        changed.sort();
        if !changed.is_empty() {
            debug!(count = changed.len(), "instances changed");
        }
        changed
    }
}

impl<V: Clone + PartialEq> Default for TreeStore<V> {
    fn default() -> Self {
        Self::new()
    }
}
