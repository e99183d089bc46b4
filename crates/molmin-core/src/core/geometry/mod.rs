//! Geometric primitives: point measures and their gradients, coordinate matrices and
//! a small SVD wrapper used for superposition.

pub mod coordinates;
pub mod measures;
pub mod svd;
