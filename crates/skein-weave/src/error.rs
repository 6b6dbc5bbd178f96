//! Error types for the tree layer.
//!
//! An unknown cause is deliberately not an error: it parks the atom in
//! the weave's pending buffer until the cause arrives.

use skein_core::{AtomId, SiteId, YarnIndex};
use thiserror::Error;

/// Errors that can occur while mutating or merging a tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The atom carries a reserved sentinel as real identity, or is
    /// structurally impossible (self-caused, tombstone without a target,
    /// child of an atom that cannot bear children).
    #[error("malformed atom {id}: {reason}")]
    MalformedAtom { id: AtomId, reason: String },

    /// An appended atom's index does not immediately follow the site's
    /// current tail. Never silently reordered.
    #[error("gap in yarn for site {site}: expected index {expected}, found {found}")]
    GapInYarn {
        site: SiteId,
        expected: YarnIndex,
        found: YarnIndex,
    },

    #[error("atom not found: {0}")]
    AtomNotFound(AtomId),

    #[error("unknown site: {0}")]
    UnknownSite(SiteId),

    #[error("site {0} is reserved")]
    ReservedSite(SiteId),
}

pub type Result<T> = std::result::Result<T, TreeError>;
