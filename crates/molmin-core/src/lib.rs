//! # molmin Core Library
//!
//! Molecular-mechanics energy evaluation, geometry optimization and rigid
//! superposition of small molecules.
//!
//! ## Architectural Philosophy
//!
//! The library keeps the same three-layer split throughout:
//!
//! - **[`core`]: The Foundation.** Molecule data models, geometry primitives
//!   (`CoordinateMatrix`, SVD, internal coordinates), the force field with its
//!   calculation terms and parameter sets, and the Kabsch `MoleculeAligner`.
//!
//! - **[`engine`]: The Logic Core.** The stateful geometry optimizer, its
//!   configuration and progress reporting, and background optimization on the
//!   rayon thread pool.
//!
//! - **[`workflows`]: The Public API.** Complete procedures (minimize, evaluate,
//!   align) that tie `engine` and `core` together behind a single call.

pub mod core;
pub mod engine;
pub mod workflows;
