//! Serializable snapshots of a replica.
//!
//! A snapshot carries the replica's identity, its yarns, and its weft -
//! the durable state. The weave is never persisted: it is a cache over
//! the yarns and is rebuilt on restore, with every atom revalidated on
//! the way in.

use crate::error::{Result, StoreError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use skein_core::{Clock, SiteId, Weft};
use skein_weave::{CausalTree, YarnStore};

/// The durable projection of a [`CausalTree`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeSnapshot<V> {
    pub site: SiteId,
    pub lamport: Clock,
    pub yarns: YarnStore<V>,
    pub weft: Weft,
}

impl<V: Clone + PartialEq> TreeSnapshot<V> {
    /// Capture a replica's durable state.
    pub fn of(tree: &CausalTree<V>) -> Self {
        TreeSnapshot {
            site: tree.site(),
            lamport: tree.lamport(),
            yarns: tree.yarns().clone(),
            weft: tree.weft().clone(),
        }
    }

    /// Reassemble a replica, rebuilding the weave and revalidating every
    /// atom, yarn position, and the weft against the yarn frontier.
    pub fn restore(self) -> Result<CausalTree<V>> {
        CausalTree::from_parts(self.site, self.lamport, self.yarns, self.weft)
            .map_err(|err| StoreError::Corrupt(err.to_string()))
    }
}

impl<V: Serialize> TreeSnapshot<V> {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<V: DeserializeOwned> TreeSnapshot<V> {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
