//! # Core Module
//!
//! Fundamental building blocks: molecules, geometry, force fields and alignment.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, bonds, molecules and conformers
//! - **Geometry** ([`geometry`]) - Internal coordinates and their gradients, coordinate
//!   matrices and 3×3 singular value decomposition
//! - **Energy Calculations** ([`forcefield`]) - Calculation terms, parameter sets,
//!   force field models and the name-based registry
//! - **Superposition** ([`alignment`]) - Atom mappings and least-squares rigid alignment
//! - **File I/O** ([`io`]) - Reading and writing molecule descriptions
//!
//! ## Scientific Foundation
//!
//! - **Molecular mechanics** with harmonic bond and angle terms, cosine torsions,
//!   Wilson-angle inversions, Lennard-Jones 12-6 and Coulomb interactions
//! - **Kabsch superposition** via the SVD of the covariance of centered coordinates

pub mod alignment;
pub mod forcefield;
pub mod geometry;
pub mod io;
pub mod models;
