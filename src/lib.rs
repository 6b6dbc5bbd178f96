//! # skein
//!
//! A causal tree CRDT: multiple sites edit a shared ordered structure
//! concurrently and merge into a bit-identical result without
//! coordination.
//!
//! This umbrella crate re-exports the workspace layers:
//!
//! - [`skein_core`] - atom identity, ordering primitives, the weft
//! - [`skein_weave`] - yarn storage, the weave engine, the merge protocol
//! - [`skein_store`] - snapshots, the instance registry, change detection

pub use skein_core::{
    Atom, AtomId, AtomMetadata, AtomType, Clock, SiteId, Weft, YarnIndex, CONTROL_SITE,
    END_CLOCK, NULL_ATOM_ID, NULL_CLOCK, NULL_INDEX, NULL_SITE, START_CLOCK,
};
pub use skein_store::{content_hash, ContentHash, InstanceId, StoreError, TreeSnapshot, TreeStore};
pub use skein_weave::{CausalTree, Integration, IntegrationReport, TreeError, Weave, YarnStore};
