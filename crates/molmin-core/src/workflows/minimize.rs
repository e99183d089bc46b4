use crate::core::forcefield::forcefield::ForceField;
use crate::core::forcefield::registry::ForceFieldRegistry;
use crate::core::forcefield::term::EnergyBreakdown;
use crate::core::models::molecule::Molecule;
use crate::engine::config::OptimizerConfig;
use crate::engine::error::EngineError;
use crate::engine::optimizer::MoleculeGeometryOptimizer;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::OptimizationReport;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq)]
pub struct MinimizationResult {
    pub initial_energy: f64,
    pub final_energy: f64,
    /// Per-term energies at the final geometry.
    pub breakdown: EnergyBreakdown,
    pub report: OptimizationReport,
}

/// Energy and gradient summary of a molecule at its current geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyEvaluation {
    pub energy: f64,
    pub breakdown: EnergyBreakdown,
    pub rms_gradient: f64,
    pub largest_gradient: f64,
    pub active_terms: usize,
}

#[instrument(skip_all, name = "minimization_workflow")]
pub fn run(
    molecule: &mut Molecule,
    config: &OptimizerConfig,
    reporter: &ProgressReporter,
) -> Result<MinimizationResult, EngineError> {
    run_with_registry(molecule, config, ForceFieldRegistry::with_builtins(), reporter)
}

pub fn run_with_registry(
    molecule: &mut Molecule,
    config: &OptimizerConfig,
    registry: ForceFieldRegistry,
    reporter: &ProgressReporter,
) -> Result<MinimizationResult, EngineError> {
    reporter.report(Progress::PhaseStart { name: "Setup" });
    info!(
        "Minimizing '{}' ({} atoms) with force field '{}'.",
        molecule.name(),
        molecule.size(),
        config.force_field
    );

    let mut optimizer = MoleculeGeometryOptimizer::with_config(molecule, config.clone());
    optimizer.set_registry(registry);
    optimizer.setup()?;
    let initial_energy = optimizer.energy().ok_or(EngineError::NotReady)?;
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Minimization",
    });
    let report = optimizer.optimize_with_progress(reporter)?;
    reporter.report(Progress::PhaseFinish);

    let breakdown = optimizer
        .force_field()
        .map(ForceField::energy_breakdown)
        .ok_or(EngineError::NotReady)?;

    info!(
        "Energy {:.4} -> {:.4} kcal/mol in {} iterations.",
        initial_energy, report.energy, report.iterations
    );
    Ok(MinimizationResult {
        initial_energy,
        final_energy: report.energy,
        breakdown,
        report,
    })
}

/// Evaluates `molecule` without moving it.
#[instrument(skip_all, name = "energy_evaluation")]
pub fn evaluate(
    molecule: &Molecule,
    config: &OptimizerConfig,
) -> Result<EnergyEvaluation, EngineError> {
    evaluate_with_registry(molecule, config, &ForceFieldRegistry::with_builtins())
}

pub fn evaluate_with_registry(
    molecule: &Molecule,
    config: &OptimizerConfig,
    registry: &ForceFieldRegistry,
) -> Result<EnergyEvaluation, EngineError> {
    let mut force_field = registry
        .create(&config.force_field)
        .ok_or_else(|| EngineError::UnknownForceField(config.force_field.clone()))?;
    if let Some(path) = &config.parameter_file {
        force_field.set_parameter_file(path.clone());
    } else if let Some(name) = &config.parameter_set {
        force_field.set_parameter_set(name);
    }
    force_field.add_molecule(molecule);
    force_field.setup()?;

    let breakdown = force_field.energy_breakdown();
    Ok(EnergyEvaluation {
        energy: breakdown.total(),
        breakdown,
        rms_gradient: force_field.root_mean_square_gradient(),
        largest_gradient: force_field.largest_gradient(),
        active_terms: force_field.active_calculation_count(),
    })
}
