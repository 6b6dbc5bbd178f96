//! # skein-store
//!
//! The storage boundary for skein causal trees: serializable snapshots
//! keyed by opaque instance ids, the merge entry point a sync layer
//! calls, and content-hash change detection for host-side notification.
//!
//! Nothing here influences ordering or merge semantics - those live
//! entirely in `skein-weave`; this crate only moves durable state in and
//! out and tells the host when something moved.

pub mod error;
pub mod hash;
pub mod memory;
pub mod snapshot;

pub use error::StoreError;
pub use hash::{content_hash, ContentHash};
pub use memory::{InstanceId, TreeStore};
pub use snapshot::TreeSnapshot;
