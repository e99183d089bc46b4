/// Lifecycle of a [`MoleculeGeometryOptimizer`](super::optimizer::MoleculeGeometryOptimizer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizerState {
    /// No force field is attached, or the last setup failed.
    #[default]
    Uninitialized,
    /// Set up and able to step.
    Ready,
    /// The last optimization met the gradient tolerance.
    Converged,
}

/// Outcome of a completed optimization run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizationReport {
    /// Final energy in kcal/mol.
    pub energy: f64,
    pub iterations: usize,
    pub converged: bool,
    /// Final RMS gradient in kcal/(mol·Å).
    pub rms_gradient: f64,
}
