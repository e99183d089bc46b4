//! # Core Models Module
//!
//! The minimal molecule model the force-field and alignment layers consume.
//!
//! Chemical perception (atom typing, charges, ring detection) and file formats are
//! handled elsewhere; a [`molecule::Molecule`] here is simply typed atoms with
//! positions, bonds between them and a stable identity.
//!
//! - [`atom`] - Atom name, force field type, partial charge and position
//! - [`molecule`] - Atom storage, bond topology and ordered iteration
//! - [`conformer`] - Alternative coordinate sets for a molecule
//! - [`topology`] - Bond connectivity
//! - [`ids`] - Identifier types for atoms and molecules

pub mod atom;
pub mod conformer;
pub mod ids;
pub mod molecule;
pub mod topology;
