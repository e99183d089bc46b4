//! # Force Field Module
//!
//! Energy and gradient evaluation for molecules under a pluggable force field model.
//!
//! ## Overview
//!
//! A [`forcefield::ForceField`] shadows the atoms of every attached molecule and owns
//! a set of independent [`calculation::Calculation`] terms built for them. What terms
//! exist and how they are parameterized is decided by a [`model::ForceFieldModel`];
//! the crate ships one, [`dreiding::DreidingLite`], registered by name in the
//! [`registry::ForceFieldRegistry`].
//!
//! ## Key Components
//!
//! - [`forcefield`] - Shadow atoms, term storage, setup and evaluation
//! - [`calculation`] - Bond, angle, torsion, inversion, van der Waals and Coulomb terms
//! - [`model`] - The contract concrete force fields implement
//! - [`params`] - TOML parameter sets and their sources
//! - [`registry`] - Name to force field factory lookup
//! - [`term`] - Energy split by term kind
//!
//! ## Usage
//!
//! ```ignore
//! use molmin::core::forcefield::registry::ForceFieldRegistry;
//!
//! let mut ff = ForceFieldRegistry::with_builtins().create("dreiding-lite").unwrap();
//! ff.add_molecule(&molecule);
//! ff.setup()?;
//! let energy = ff.energy();
//! let gradient = ff.gradient();
//! ```

pub mod atom;
pub mod calculation;
pub mod dreiding;
#[allow(clippy::module_inception)]
pub mod forcefield;
pub mod model;
pub mod params;
pub(crate) mod potentials;
pub mod registry;
pub mod term;
