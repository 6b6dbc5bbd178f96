//! # skein-core
//!
//! Identity and ordering primitives for the skein causal tree.
//!
//! This crate holds the types every other layer depends on: site
//! identifiers and logical clocks, atom identity, the closed set of atom
//! kinds with their classification predicates, and the [`Weft`] - the
//! per-site high-water-mark map used for causal-inclusion tests and sync
//! negotiation. It contains no storage and no traversal logic; those live
//! in `skein-weave`.

pub mod atom;
pub mod ids;
pub mod weft;

pub use atom::{Atom, AtomMetadata, AtomType};
pub use ids::{
    AtomId, Clock, SiteId, YarnIndex, CONTROL_SITE, END_CLOCK, NULL_ATOM_ID, NULL_CLOCK,
    NULL_INDEX, NULL_SITE, START_CLOCK,
};
pub use weft::Weft;
