//! # Engine Module
//!
//! Geometry optimization on top of the force field layer.
//!
//! ## Overview
//!
//! The engine drives a [`ForceField`](crate::core::forcefield::forcefield::ForceField)
//! towards a local energy minimum. An optimizer owns the force field, steps the
//! force field's private coordinates downhill and writes the result back into
//! the molecule when a run ends.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Force field choice, tolerances and step limits
//! - **Optimizer** ([`optimizer`]) - Steepest descent with backtracking, synchronous or cancellable
//! - **Background Tasks** ([`task`]) - Optimization on the rayon pool behind a cancellable handle
//! - **State Tracking** ([`state`]) - Optimizer lifecycle and run reports
//! - **Progress Monitoring** ([`progress`]) - Per-step progress callbacks
//! - **Error Handling** ([`error`]) - Engine-specific error types and error propagation

pub mod config;
pub mod error;
pub mod optimizer;
pub mod progress;
pub mod state;
pub mod task;
