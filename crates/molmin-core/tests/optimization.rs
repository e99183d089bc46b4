use molmin::core::forcefield::calculation::CalculationKind;
use molmin::core::forcefield::dreiding::DreidingLite;
use molmin::core::forcefield::forcefield::ForceField;
use molmin::core::forcefield::registry::ForceFieldRegistry;
use molmin::core::geometry::measures;
use molmin::core::models::atom::Atom;
use molmin::core::models::molecule::Molecule;
use molmin::engine::config::{OptimizerConfig, OptimizerConfigBuilder};
use molmin::engine::error::EngineError;
use molmin::engine::optimizer::MoleculeGeometryOptimizer;
use molmin::engine::state::OptimizerState;
use molmin::engine::task::optimize_coordinates_async_with;
use nalgebra::Point3;
use std::sync::{Arc, Mutex};

const BONDS_ONLY: &str = "bonds-only";
// Two C_3 bond radii of 0.77 Å less the 0.01 Å bond delta.
const C3_C3_LENGTH: f64 = 1.53;

fn bonds_only_registry() -> ForceFieldRegistry {
    let mut registry = ForceFieldRegistry::with_builtins();
    registry.register(BONDS_ONLY, || {
        ForceField::new(DreidingLite::with_terms([CalculationKind::BondStretch]))
    });
    registry
}

fn propane_chain() -> Molecule {
    let mut molecule = Molecule::new("propane backbone");
    let a = molecule.add_atom(Atom::new("C1", "C_3", Point3::new(0.0, 0.0, 0.0)));
    let b = molecule.add_atom(Atom::new("C2", "C_3", Point3::new(1.9, 0.0, 0.0)));
    let c = molecule.add_atom(Atom::new("C3", "C_3", Point3::new(2.3, 1.2, 0.3)));
    molecule.add_bond(a, b).unwrap();
    molecule.add_bond(b, c).unwrap();
    molecule
}

fn distorted_butane() -> Molecule {
    let mut molecule = Molecule::new("butane");
    let positions = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.7, 0.2, 0.0),
        Point3::new(2.1, 1.6, 0.4),
        Point3::new(3.5, 1.9, -0.2),
    ];
    let ids: Vec<_> = positions
        .iter()
        .enumerate()
        .map(|(i, p)| molecule.add_atom(Atom::new(&format!("C{}", i + 1), "C_3", *p)))
        .collect();
    for pair in ids.windows(2) {
        molecule.add_bond(pair[0], pair[1]).unwrap();
    }
    molecule
}

#[test]
fn bond_stretch_only_chain_relaxes_to_equilibrium_lengths() {
    let mut molecule = propane_chain();
    let config = OptimizerConfigBuilder::new()
        .force_field(BONDS_ONLY)
        .tolerance(1e-4)
        .build()
        .unwrap();

    let report = {
        let mut optimizer = MoleculeGeometryOptimizer::with_config(&mut molecule, config);
        optimizer.set_registry(bonds_only_registry());
        optimizer.optimize().unwrap()
    };

    assert!(report.converged);
    let p = molecule.positions();
    assert!((measures::distance(&p[0], &p[1]) - C3_C3_LENGTH).abs() < 1e-3);
    assert!((measures::distance(&p[1], &p[2]) - C3_C3_LENGTH).abs() < 1e-3);
}

#[test]
fn energy_never_increases_between_steps() {
    let mut molecule = distorted_butane();
    let mut optimizer = MoleculeGeometryOptimizer::new(&mut molecule);
    optimizer.setup().unwrap();

    let mut previous = optimizer.energy().unwrap();
    for _ in 0..200 {
        if !optimizer.step().unwrap() {
            break;
        }
        let current = optimizer.energy().unwrap();
        assert!(current < previous, "{current} is not below {previous}");
        previous = current;
    }
}

#[test]
fn full_optimization_reduces_energy_and_gradient() {
    let mut molecule = distorted_butane();
    let before = molmin::workflows::minimize::evaluate(&molecule, &OptimizerConfig::default())
        .unwrap();

    let report = MoleculeGeometryOptimizer::optimize_coordinates(&mut molecule).unwrap();
    let after =
        molmin::workflows::minimize::evaluate(&molecule, &OptimizerConfig::default()).unwrap();

    assert!(report.energy < before.energy);
    assert!((after.energy - report.energy).abs() < 1e-6);
    assert!(after.rms_gradient < before.rms_gradient);
}

#[test]
fn converged_state_is_reported_after_optimization() {
    let mut molecule = propane_chain();
    let config = OptimizerConfig {
        force_field: BONDS_ONLY.to_string(),
        ..OptimizerConfig::default()
    };
    let mut optimizer = MoleculeGeometryOptimizer::with_config(&mut molecule, config);
    optimizer.set_registry(bonds_only_registry());
    optimizer.optimize().unwrap();
    assert_eq!(optimizer.state(), OptimizerState::Converged);
    assert!(optimizer.converged());
}

#[test]
fn async_optimization_uses_custom_registry() {
    let shared = Arc::new(Mutex::new(propane_chain()));
    let config = OptimizerConfig {
        force_field: BONDS_ONLY.to_string(),
        tolerance: 1e-4,
        ..OptimizerConfig::default()
    };
    let handle = optimize_coordinates_async_with(Arc::clone(&shared), config, bonds_only_registry());
    assert!(handle.wait().unwrap().converged);

    let molecule = shared.lock().unwrap();
    let p = molecule.positions();
    assert!((measures::distance(&p[0], &p[1]) - C3_C3_LENGTH).abs() < 1e-3);
}

#[test]
fn async_cancel_before_start_keeps_original_coordinates() {
    let shared = Arc::new(Mutex::new(distorted_butane()));
    let before = shared.lock().unwrap().positions();

    let handle = {
        let _guard = shared.lock().unwrap();
        let handle = optimize_coordinates_async_with(
            Arc::clone(&shared),
            OptimizerConfig::default(),
            ForceFieldRegistry::with_builtins(),
        );
        handle.cancel();
        handle
    };

    assert!(matches!(handle.wait(), Err(EngineError::Cancelled)));
    assert_eq!(shared.lock().unwrap().positions(), before);
}
