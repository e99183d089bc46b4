//! Rigid-body superposition of two molecules over an atom correspondence.

pub mod aligner;
pub mod mapping;
