//! Atom kinds and the atom record.
//!
//! The kind carries a small bundle of classification predicates that the
//! weave engine consults when placing atoms. Each predicate is a pure
//! function of the kind - the behavior set is closed and fixed, so this
//! is a plain tagged enum rather than anything dynamic.

use crate::ids::{AtomId, Clock};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of atom kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtomType {
    /// User-visible content.
    Value,
    /// User-visible content that sorts before plain siblings on merge.
    ValuePriority,
    /// Unordered marker: only "this site produced an atom" matters, not
    /// where it sits causally. Appended to the weave's tail.
    Commit,
    /// Synthetic boundary opening the causal segment.
    Start,
    /// Synthetic boundary closing the causal segment; begins the
    /// trailing non-causal segment.
    End,
    /// Tombstone for a prior atom. Never erases anything.
    Delete,
}

impl AtomType {
    /// User-visible content atom.
    pub fn is_value(self) -> bool {
        matches!(self, AtomType::Value | AtomType::ValuePriority)
    }

    /// Excluded from the causal depth-first tree; placed in the weave's
    /// tail segment instead. Still physically present in its yarn.
    pub fn unparented(self) -> bool {
        matches!(self, AtomType::Commit | AtomType::End)
    }

    /// Cannot be any other atom's cause.
    pub fn childless(self) -> bool {
        matches!(self, AtomType::End | AtomType::Delete)
    }

    /// Visited before non-priority siblings, so targeted operations keep
    /// their target when a merge interleaves concurrent edits.
    pub fn priority(self) -> bool {
        matches!(self, AtomType::Delete | AtomType::ValuePriority)
    }
}

impl fmt::Display for AtomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AtomType::Value => "Value",
            AtomType::ValuePriority => "Value Priority",
            AtomType::Commit => "Commit",
            AtomType::Start => "Start",
            AtomType::End => "End",
            AtomType::Delete => "Delete",
        };
        write!(f, "{}", name)
    }
}

/// An immutable unit of edit history.
///
/// `cause` is the causal parent; `reference` is an auxiliary pointer some
/// kinds use independently of causality (a delete's victim, the remote
/// atom a commit acknowledges).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Atom<V> {
    pub id: AtomId,
    pub cause: AtomId,
    pub reference: AtomId,
    pub kind: AtomType,
    pub timestamp: Clock,
    pub value: V,
}

impl<V> Atom<V> {
    pub fn new(
        id: AtomId,
        cause: AtomId,
        reference: AtomId,
        kind: AtomType,
        timestamp: Clock,
        value: V,
    ) -> Self {
        Atom {
            id,
            cause,
            reference,
            kind,
            timestamp,
            value,
        }
    }

    /// Value-free projection for consumers that must not know yarn
    /// internals: the UI boundary and the weave's own index.
    pub fn metadata(&self) -> AtomMetadata {
        AtomMetadata {
            id: self.id,
            cause: self.cause,
            reference: self.reference,
            kind: self.kind,
            timestamp: self.timestamp,
        }
    }
}

/// Read-only projection of an atom.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomMetadata {
    pub id: AtomId,
    pub cause: AtomId,
    pub reference: AtomId,
    pub kind: AtomType,
    pub timestamp: Clock,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{AtomId, NULL_ATOM_ID};

    #[test]
    fn test_predicates() {
        use AtomType::*;

        for kind in [Value, ValuePriority, Commit, Start, End, Delete] {
            assert_eq!(kind.is_value(), matches!(kind, Value | ValuePriority));
            assert_eq!(kind.unparented(), matches!(kind, Commit | End));
            assert_eq!(kind.childless(), matches!(kind, End | Delete));
            assert_eq!(kind.priority(), matches!(kind, Delete | ValuePriority));
        }
    }

    #[test]
    fn test_metadata_projection() {
        let atom = Atom::new(
            AtomId::new(1, 0),
            NULL_ATOM_ID,
            NULL_ATOM_ID,
            AtomType::Value,
            3,
            'a',
        );
        let meta = atom.metadata();

        assert_eq!(meta.id, atom.id);
        assert_eq!(meta.cause, atom.cause);
        assert_eq!(meta.reference, atom.reference);
        assert_eq!(meta.kind, atom.kind);
        assert_eq!(meta.timestamp, atom.timestamp);
    }

    #[test]
    fn test_atom_serde_roundtrip() {
        let atom = Atom::new(
            AtomId::new(2, 4),
            AtomId::new(1, 0),
            NULL_ATOM_ID,
            AtomType::ValuePriority,
            9,
            'z',
        );
        let json = serde_json::to_string(&atom).unwrap();
        let back: Atom<char> = serde_json::from_str(&json).unwrap();
        assert_eq!(atom, back);
    }
}
