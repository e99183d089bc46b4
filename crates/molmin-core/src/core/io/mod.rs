//! Reading and writing molecules.
//!
//! [`traits::MolecularFile`] is the common interface; [`structure::StructureFile`]
//! implements it for a TOML description of atoms and bonds.

pub mod structure;
pub mod traits;
