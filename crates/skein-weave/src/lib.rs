//! # skein-weave
//!
//! Yarn storage, weave construction, and the merge protocol for the
//! skein causal tree.
//!
//! A replica ([`CausalTree`]) keeps three structures consistent: the
//! per-site append-only yarns (ground truth), the weft (causal frontier),
//! and the weave (the canonical total order, a rebuildable index over the
//! yarns). Any two replicas that have absorbed the same atom set compute
//! bit-identical weaves, regardless of arrival order.
//!
//! ## Example
//!
//! ```
//! use skein_core::NULL_ATOM_ID;
//! use skein_weave::CausalTree;
//!
//! let mut a: CausalTree<char> = CausalTree::new(1).unwrap();
//! let mut b: CausalTree<char> = CausalTree::new(2).unwrap();
//!
//! let root = a.insert(NULL_ATOM_ID, 'h').unwrap();
//! a.insert(root, 'i').unwrap();
//!
//! b.integrate(&a);
//! b.insert(root, '!').unwrap();
//! a.integrate(&b);
//!
//! assert!(a.converged_with(&b));
//! let order: Vec<_> = a.traverse().collect();
//! assert_eq!(order.len(), 3);
//! ```

pub mod error;
pub mod tree;
pub mod weave;
pub mod yarn;

pub use error::{Result, TreeError};
pub use tree::{CausalTree, IntegrationReport};
pub use weave::{Integration, Weave, WeaveIter};
pub use yarn::YarnStore;
