use super::config::OptimizerConfig;
use super::error::EngineError;
use super::optimizer::MoleculeGeometryOptimizer;
use super::state::OptimizationReport;
use crate::core::forcefield::registry::ForceFieldRegistry;
use crate::core::models::molecule::Molecule;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument};

type Outcome = Result<OptimizationReport, EngineError>;

/// Handle to an optimization running on the rayon thread pool.
///
/// The worker optimizes a private copy of the molecule and writes the result
/// back under the lock only if the run completes without cancellation.
#[derive(Debug)]
pub struct OptimizationHandle {
    cancel: Arc<AtomicBool>,
    receiver: Receiver<Outcome>,
    outcome: Option<Outcome>,
}

impl OptimizationHandle {
    /// Requests cancellation. The worker stops before its next step.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Polls the worker without blocking.
    pub fn is_finished(&mut self) -> bool {
        if self.outcome.is_some() {
            return true;
        }
        match self.receiver.try_recv() {
            Ok(outcome) => {
                self.outcome = Some(outcome);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.outcome = Some(Err(EngineError::WorkerLost));
                true
            }
        }
    }

    /// Blocks until the worker finishes.
    pub fn wait(mut self) -> Outcome {
        if let Some(outcome) = self.outcome.take() {
            return outcome;
        }
        self.receiver.recv().unwrap_or(Err(EngineError::WorkerLost))
    }
}

/// Starts optimizing `molecule` in the background with the built-in force fields.
pub fn optimize_coordinates_async(
    molecule: Arc<Mutex<Molecule>>,
    config: OptimizerConfig,
) -> OptimizationHandle {
    optimize_coordinates_async_with(molecule, config, ForceFieldRegistry::with_builtins())
}

pub fn optimize_coordinates_async_with(
    molecule: Arc<Mutex<Molecule>>,
    config: OptimizerConfig,
    registry: ForceFieldRegistry,
) -> OptimizationHandle {
    let cancel = Arc::new(AtomicBool::new(false));
    let (sender, receiver) = mpsc::channel();

    let flag = Arc::clone(&cancel);
    rayon::spawn(move || {
        let outcome = run_detached(&molecule, config, registry, &flag);
        // The handle may already be gone; the outcome is then discarded.
        let _ = sender.send(outcome);
    });

    OptimizationHandle {
        cancel,
        receiver,
        outcome: None,
    }
}

fn run_detached(
    shared: &Mutex<Molecule>,
    config: OptimizerConfig,
    registry: ForceFieldRegistry,
    cancel: &AtomicBool,
) -> Outcome {
    let mut working = shared
        .lock()
        .map_err(|_| EngineError::LockPoisoned)?
        .clone();

    let report = {
        let mut optimizer = MoleculeGeometryOptimizer::with_config(&mut working, config);
        optimizer.set_registry(registry);
        optimizer.optimize_with_cancel(cancel)?
    };

    let mut target = shared.lock().map_err(|_| EngineError::LockPoisoned)?;
    if cancel.load(Ordering::Relaxed) {
        debug!("Discarding optimized coordinates of '{}'", working.name());
        return Err(EngineError::Cancelled);
    }
    target.copy_positions_from(&working);
    Ok(report)
}

/// Optimizes independent molecules in parallel, one result per molecule.
#[instrument(skip_all, name = "batch_optimization", fields(molecules = molecules.len()))]
pub fn optimize_batch(molecules: &mut [Molecule], config: &OptimizerConfig) -> Vec<Outcome> {
    molecules
        .par_iter_mut()
        .map(|molecule| {
            MoleculeGeometryOptimizer::optimize_coordinates_with(molecule, config.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use nalgebra::Point3;

    fn stretched_hydrogen(length: f64) -> Molecule {
        let mut molecule = Molecule::new("H2");
        let a = molecule.add_atom(Atom::new("H1", "H_", Point3::origin()));
        let b = molecule.add_atom(Atom::new("H2", "H_", Point3::new(length, 0.0, 0.0)));
        molecule.add_bond(a, b).unwrap();
        molecule
    }

    #[test]
    fn async_optimization_writes_result_back() {
        let shared = Arc::new(Mutex::new(stretched_hydrogen(1.2)));
        let handle = optimize_coordinates_async(Arc::clone(&shared), OptimizerConfig::default());
        let report = handle.wait().unwrap();
        assert!(report.converged);

        let molecule = shared.lock().unwrap();
        let p = molecule.positions();
        assert!((p[1] - p[0]).norm() < 1.2);
    }

    #[test]
    fn cancelled_async_optimization_leaves_molecule_untouched() {
        let shared = Arc::new(Mutex::new(stretched_hydrogen(1.2)));
        let before = shared.lock().unwrap().positions();

        let handle = {
            let _guard = shared.lock().unwrap();
            let handle =
                optimize_coordinates_async(Arc::clone(&shared), OptimizerConfig::default());
            handle.cancel();
            handle
        };

        assert!(handle.is_cancelled());
        assert!(matches!(handle.wait(), Err(EngineError::Cancelled)));
        assert_eq!(shared.lock().unwrap().positions(), before);
    }

    #[test]
    fn is_finished_caches_the_outcome() {
        let shared = Arc::new(Mutex::new(stretched_hydrogen(0.9)));
        let mut handle = optimize_coordinates_async(shared, OptimizerConfig::default());
        while !handle.is_finished() {
            std::thread::yield_now();
        }
        assert!(handle.is_finished());
        assert!(handle.wait().is_ok());
    }

    #[test]
    fn unknown_force_field_is_reported_through_the_handle() {
        let shared = Arc::new(Mutex::new(stretched_hydrogen(1.0)));
        let config = OptimizerConfig {
            force_field: "no-such-field".to_string(),
            ..OptimizerConfig::default()
        };
        let handle = optimize_coordinates_async(shared, config);
        assert!(matches!(
            handle.wait(),
            Err(EngineError::UnknownForceField(name)) if name == "no-such-field"
        ));
    }

    #[test]
    fn batch_optimization_handles_each_molecule() {
        let mut molecules = vec![stretched_hydrogen(1.2), stretched_hydrogen(0.5)];
        let results = optimize_batch(&mut molecules, &OptimizerConfig::default());
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.as_ref().is_ok_and(|report| report.converged)));
        for molecule in &molecules {
            let p = molecule.positions();
            let length = (p[1] - p[0]).norm();
            assert!((length - 0.65).abs() < 0.05);
        }
    }
}
