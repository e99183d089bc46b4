//! # Workflows Module
//!
//! High-level entry points that combine the core layers into complete runs.
//!
//! ## Overview
//!
//! Each workflow takes a molecule and a configuration, reports progress, and
//! returns a result summary suitable for display.
//!
//! - **Minimization Workflow** ([`minimize`]) - Geometry optimization with an
//!   energy breakdown of the final structure, plus single-point evaluation.
//! - **Alignment Workflow** ([`align`]) - Least-squares superposition of one
//!   molecule onto another over a selected set of atom pairs.

pub mod align;
pub mod minimize;
