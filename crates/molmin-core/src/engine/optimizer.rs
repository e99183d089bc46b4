use super::config::OptimizerConfig;
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use super::state::{OptimizationReport, OptimizerState};
use crate::core::forcefield::forcefield::ForceField;
use crate::core::forcefield::registry::ForceFieldRegistry;
use crate::core::models::molecule::Molecule;
use nalgebra::Point3;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, instrument, trace, warn};

const STEP_GROWTH: f64 = 1.2;
const STEP_SHRINK: f64 = 0.5;
const MAX_BACKTRACKS: usize = 40;

/// Steepest-descent geometry optimizer for a single molecule.
///
/// The optimizer works on the force field's own copy of the coordinates and
/// writes them back to the molecule once a run ends. A cancelled run never
/// writes.
///
/// Each step moves every atom against its gradient, scaled so that the atom
/// with the largest gradient moves by the current step length. A trial is
/// accepted only if it lowers the energy; otherwise the step length is halved
/// and the trial repeated. Accepted steps grow the step length for the next
/// iteration, up to [`OptimizerConfig::max_displacement`].
#[derive(Debug)]
pub struct MoleculeGeometryOptimizer<'m> {
    molecule: Option<&'m mut Molecule>,
    registry: ForceFieldRegistry,
    force_field_name: String,
    force_field: Option<ForceField>,
    config: OptimizerConfig,
    state: OptimizerState,
    energy: Option<f64>,
    step_length: f64,
    error_string: String,
}

impl Default for MoleculeGeometryOptimizer<'_> {
    fn default() -> Self {
        Self::with_config_inner(None, OptimizerConfig::default())
    }
}

impl<'m> MoleculeGeometryOptimizer<'m> {
    pub fn new(molecule: &'m mut Molecule) -> Self {
        Self::with_config(molecule, OptimizerConfig::default())
    }

    pub fn with_config(molecule: &'m mut Molecule, config: OptimizerConfig) -> Self {
        Self::with_config_inner(Some(molecule), config)
    }

    fn with_config_inner(molecule: Option<&'m mut Molecule>, config: OptimizerConfig) -> Self {
        Self {
            molecule,
            registry: ForceFieldRegistry::with_builtins(),
            force_field_name: config.force_field.clone(),
            force_field: None,
            step_length: config.initial_step,
            config,
            state: OptimizerState::Uninitialized,
            energy: None,
            error_string: String::new(),
        }
    }

    // --- Configuration ---

    pub fn set_molecule(&mut self, molecule: &'m mut Molecule) {
        self.molecule = Some(molecule);
        self.invalidate();
    }

    pub fn molecule(&self) -> Option<&Molecule> {
        self.molecule.as_deref()
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: OptimizerConfig) {
        self.force_field_name = config.force_field.clone();
        if self
            .force_field
            .as_ref()
            .is_some_and(|ff| ff.name() != self.force_field_name)
        {
            self.force_field = None;
        }
        self.config = config;
        self.invalidate();
    }

    /// Replaces the registry used to resolve force field names.
    pub fn set_registry(&mut self, registry: ForceFieldRegistry) {
        self.registry = registry;
    }

    pub fn registry(&self) -> &ForceFieldRegistry {
        &self.registry
    }

    /// Selects a force field by registry name.
    ///
    /// Returns `false` and leaves the current choice untouched if the name is
    /// not registered.
    pub fn set_force_field(&mut self, name: &str) -> bool {
        if !self.registry.contains(name) {
            self.error_string = format!("Unknown force field: '{name}'");
            return false;
        }
        self.force_field_name = name.to_string();
        self.config.force_field = name.to_string();
        self.force_field = None;
        self.invalidate();
        true
    }

    /// Uses a caller-built force field. Any molecule already attached to it is
    /// detached during setup.
    pub fn set_force_field_instance(&mut self, force_field: ForceField) {
        self.force_field_name = force_field.name().to_string();
        self.config.force_field = self.force_field_name.clone();
        self.force_field = Some(force_field);
        self.invalidate();
    }

    pub fn force_field(&self) -> Option<&ForceField> {
        self.force_field.as_ref()
    }

    pub fn state(&self) -> OptimizerState {
        self.state
    }

    /// Current energy in kcal/mol, `None` before a successful setup.
    pub fn energy(&self) -> Option<f64> {
        self.energy
    }

    pub fn error_string(&self) -> &str {
        &self.error_string
    }

    fn invalidate(&mut self) {
        self.state = OptimizerState::Uninitialized;
        self.energy = None;
        self.step_length = self.config.initial_step;
    }

    // --- Setup ---

    /// Attaches the molecule to the force field and parameterizes it.
    ///
    /// On failure the optimizer stays [`OptimizerState::Uninitialized`] and
    /// [`MoleculeGeometryOptimizer::error_string`] holds the message.
    #[instrument(skip_all, name = "optimizer_setup")]
    pub fn setup(&mut self) -> Result<(), EngineError> {
        let result = self.try_setup();
        match &result {
            Ok(()) => self.error_string.clear(),
            Err(e) => {
                warn!("Optimizer setup failed: {}", e);
                self.invalidate();
                self.error_string = e.to_string();
            }
        }
        result
    }

    fn try_setup(&mut self) -> Result<(), EngineError> {
        self.invalidate();
        let molecule = self.molecule.as_deref().ok_or(EngineError::NoMolecule)?;

        let mut force_field = match self.force_field.take() {
            Some(mut ff) => {
                ff.clear();
                ff
            }
            None => self
                .registry
                .create(&self.force_field_name)
                .ok_or_else(|| EngineError::UnknownForceField(self.force_field_name.clone()))?,
        };

        if let Some(path) = &self.config.parameter_file {
            force_field.set_parameter_file(path.clone());
        } else if let Some(name) = &self.config.parameter_set {
            force_field.set_parameter_set(name);
        }

        force_field.add_molecule(molecule);
        let setup = force_field.setup();
        self.force_field = Some(force_field);
        setup?;

        let Some(force_field) = self.force_field.as_ref() else {
            return Err(EngineError::NotReady);
        };
        let energy = force_field.energy();
        debug!(
            "Force field '{}' ready: {} atoms, {} active terms, E = {:.4} kcal/mol",
            force_field.name(),
            force_field.size(),
            force_field.active_calculation_count(),
            energy
        );
        self.energy = Some(energy);
        self.state = OptimizerState::Ready;
        Ok(())
    }

    // --- Optimization ---

    /// Performs one steepest-descent step on the force field coordinates.
    ///
    /// Returns `false` when no trial step lowered the energy; the coordinates
    /// are then left where they were.
    pub fn step(&mut self) -> Result<bool, EngineError> {
        if self.state == OptimizerState::Uninitialized {
            return Err(EngineError::NotReady);
        }
        let force_field = self.force_field.as_mut().ok_or(EngineError::NotReady)?;

        let start = force_field.positions();
        let energy = force_field.energy();
        let gradient = force_field.gradient();
        let largest = gradient.iter().map(|g| g.norm()).fold(0.0, f64::max);
        if largest <= f64::EPSILON {
            return Ok(false);
        }

        let mut step = self.step_length.min(self.config.max_displacement);
        for _ in 0..MAX_BACKTRACKS {
            let scale = step / largest;
            let trial: Vec<Point3<f64>> = start
                .iter()
                .zip(&gradient)
                .map(|(p, g)| p - g * scale)
                .collect();
            force_field.set_positions(&trial);
            let trial_energy = force_field.energy();
            if trial_energy < energy {
                trace!(
                    "Accepted step of {:.3e} Å: {:.6} -> {:.6} kcal/mol",
                    step, energy, trial_energy
                );
                self.energy = Some(trial_energy);
                self.step_length = (step * STEP_GROWTH).min(self.config.max_displacement);
                return Ok(true);
            }
            step *= STEP_SHRINK;
        }

        force_field.set_positions(&start);
        self.step_length = self.config.initial_step;
        Ok(false)
    }

    /// Whether the RMS gradient is below the configured tolerance.
    pub fn converged(&self) -> bool {
        self.state != OptimizerState::Uninitialized
            && self
                .force_field
                .as_ref()
                .is_some_and(|ff| ff.root_mean_square_gradient() < self.config.tolerance)
    }

    pub fn optimize(&mut self) -> Result<OptimizationReport, EngineError> {
        self.run(None, &ProgressReporter::new())
    }

    pub fn optimize_with_progress(
        &mut self,
        reporter: &ProgressReporter,
    ) -> Result<OptimizationReport, EngineError> {
        self.run(None, reporter)
    }

    /// Like [`MoleculeGeometryOptimizer::optimize`], checking `cancel` before
    /// every step. A cancelled run leaves the molecule untouched.
    pub fn optimize_with_cancel(
        &mut self,
        cancel: &AtomicBool,
    ) -> Result<OptimizationReport, EngineError> {
        self.run(Some(cancel), &ProgressReporter::new())
    }

    #[instrument(skip_all, name = "geometry_optimization")]
    fn run(
        &mut self,
        cancel: Option<&AtomicBool>,
        reporter: &ProgressReporter,
    ) -> Result<OptimizationReport, EngineError> {
        if self.state == OptimizerState::Uninitialized {
            self.setup()?;
        }

        let max_iterations = self.config.max_iterations;
        reporter.report(Progress::TaskStart {
            total_steps: max_iterations as u64,
        });

        let mut iterations = 0;
        let mut converged = self.converged();
        while !converged && iterations < max_iterations {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                reporter.report(Progress::TaskFinish);
                info!("Optimization cancelled after {} iterations", iterations);
                return Err(EngineError::Cancelled);
            }

            let moved = self.step()?;
            iterations += 1;
            converged = self.converged();
            reporter.report(Progress::Step {
                iteration: iterations,
                energy: self.energy.unwrap_or_default(),
                rms_gradient: self.rms_gradient(),
            });
            if !moved {
                debug!("No downhill step found at iteration {}", iterations);
                break;
            }
        }
        reporter.report(Progress::TaskFinish);

        self.state = if converged {
            OptimizerState::Converged
        } else {
            OptimizerState::Ready
        };
        self.write_coordinates()?;

        let report = OptimizationReport {
            energy: self.energy.unwrap_or_default(),
            iterations,
            converged,
            rms_gradient: self.rms_gradient(),
        };
        if converged {
            info!(
                "Converged in {} iterations: E = {:.4} kcal/mol, RMS gradient = {:.4}",
                report.iterations, report.energy, report.rms_gradient
            );
        } else {
            warn!(
                "Stopped after {} iterations without converging: E = {:.4} kcal/mol, RMS gradient = {:.4}",
                report.iterations, report.energy, report.rms_gradient
            );
        }
        Ok(report)
    }

    fn rms_gradient(&self) -> f64 {
        self.force_field
            .as_ref()
            .map_or(0.0, |ff| ff.root_mean_square_gradient())
    }

    /// Copies the force field coordinates back into the molecule.
    pub fn write_coordinates(&mut self) -> Result<(), EngineError> {
        if self.state == OptimizerState::Uninitialized {
            return Err(EngineError::NotReady);
        }
        let force_field = self.force_field.as_ref().ok_or(EngineError::NotReady)?;
        let molecule = self
            .molecule
            .as_deref_mut()
            .ok_or(EngineError::NoMolecule)?;
        force_field.write_coordinates(molecule);
        Ok(())
    }

    /// Optimizes `molecule` in place with the default configuration.
    pub fn optimize_coordinates(molecule: &mut Molecule) -> Result<OptimizationReport, EngineError> {
        Self::optimize_coordinates_with(molecule, OptimizerConfig::default())
    }

    pub fn optimize_coordinates_with(
        molecule: &mut Molecule,
        config: OptimizerConfig,
    ) -> Result<OptimizationReport, EngineError> {
        MoleculeGeometryOptimizer::with_config(molecule, config).optimize()
    }
}
