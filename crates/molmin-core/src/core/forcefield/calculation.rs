use super::atom::{FfAtomId, ForceFieldAtom};
use super::potentials;
use crate::core::geometry::measures;
use nalgebra::{Point3, Vector3};
use phf::{Map, phf_map};
use slotmap::{SlotMap, new_key_type};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

new_key_type! {
    pub struct CalculationId;
}

/// Step in Angstroms used for central-difference gradients.
pub const NUMERICAL_STEP: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CalculationKind {
    /// `[k, r0]`: `½ k (r − r0)²`.
    BondStretch,
    /// `[k, θ0]`: `½ k (θ − θ0)²`, with `θ0` stored in degrees.
    AngleBend,
    /// `[V, n, φ0]`: `½ V [1 − cos(n (φ − φ0))]`, with `φ0` stored in degrees.
    Torsion,
    /// `[k, ψ0]`: `½ k (ψ − ψ0)²` on the Wilson angle, with `ψ0` stored in degrees.
    /// The second atom is the center.
    Inversion,
    /// `[r_min, D0]`: Lennard-Jones 12-6.
    VanDerWaals,
    /// `[q_i, q_j, ε]`: Coulomb.
    Electrostatic,
}

static KIND_NAMES: Map<&'static str, CalculationKind> = phf_map! {
    "bond-stretch" => CalculationKind::BondStretch,
    "bond" => CalculationKind::BondStretch,
    "angle-bend" => CalculationKind::AngleBend,
    "angle" => CalculationKind::AngleBend,
    "torsion" => CalculationKind::Torsion,
    "dihedral" => CalculationKind::Torsion,
    "inversion" => CalculationKind::Inversion,
    "van-der-waals" => CalculationKind::VanDerWaals,
    "vdw" => CalculationKind::VanDerWaals,
    "electrostatic" => CalculationKind::Electrostatic,
    "coulomb" => CalculationKind::Electrostatic,
};

impl CalculationKind {
    pub const ALL: [CalculationKind; 6] = [
        Self::BondStretch,
        Self::AngleBend,
        Self::Torsion,
        Self::Inversion,
        Self::VanDerWaals,
        Self::Electrostatic,
    ];

    pub fn atom_count(self) -> usize {
        match self {
            Self::BondStretch | Self::VanDerWaals | Self::Electrostatic => 2,
            Self::AngleBend => 3,
            Self::Torsion | Self::Inversion => 4,
        }
    }

    pub fn parameter_count(self) -> usize {
        match self {
            Self::BondStretch | Self::AngleBend | Self::Inversion | Self::VanDerWaals => 2,
            Self::Torsion | Self::Electrostatic => 3,
        }
    }

    pub fn is_bonded(self) -> bool {
        !matches!(self, Self::VanDerWaals | Self::Electrostatic)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::BondStretch => "bond-stretch",
            Self::AngleBend => "angle-bend",
            Self::Torsion => "torsion",
            Self::Inversion => "inversion",
            Self::VanDerWaals => "van-der-waals",
            Self::Electrostatic => "electrostatic",
        }
    }
}

impl fmt::Display for CalculationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown calculation kind: '{0}'")]
pub struct ParseCalculationKindError(pub String);

impl FromStr for CalculationKind {
    type Err = ParseCalculationKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KIND_NAMES
            .get(s.to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| ParseCalculationKindError(s.to_string()))
    }
}

/// One energy term over 2 to 4 shadow atoms.
///
/// A calculation is created unparameterized. It must be set up (parameters assigned
/// and the flag raised by the owning force field) before it can be evaluated;
/// evaluating a term that is not set up panics.
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    kind: CalculationKind,
    atoms: Vec<FfAtomId>,
    parameters: Vec<f64>,
    setup: bool,
}

impl Calculation {
    /// # Panics
    ///
    /// Panics if `atoms.len()` does not match `kind.atom_count()`.
    pub fn new(kind: CalculationKind, atoms: Vec<FfAtomId>) -> Self {
        assert_eq!(
            atoms.len(),
            kind.atom_count(),
            "{kind} calculation needs {} atoms",
            kind.atom_count()
        );
        Self {
            kind,
            atoms,
            parameters: vec![0.0; kind.parameter_count()],
            setup: false,
        }
    }

    pub fn kind(&self) -> CalculationKind {
        self.kind
    }

    pub fn atoms(&self) -> &[FfAtomId] {
        &self.atoms
    }

    pub fn contains(&self, atom: FfAtomId) -> bool {
        self.atoms.contains(&atom)
    }

    pub fn parameters(&self) -> &[f64] {
        &self.parameters
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn parameter(&self, index: usize) -> f64 {
        assert!(
            index < self.parameters.len(),
            "parameter index {index} out of range for {} calculation",
            self.kind
        );
        self.parameters[index]
    }

    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn set_parameter(&mut self, index: usize, value: f64) {
        assert!(
            index < self.parameters.len(),
            "parameter index {index} out of range for {} calculation",
            self.kind
        );
        self.parameters[index] = value;
    }

    /// # Panics
    ///
    /// Panics if `parameters.len()` does not match `kind.parameter_count()`.
    pub fn set_parameters(&mut self, parameters: &[f64]) {
        assert_eq!(
            parameters.len(),
            self.parameters.len(),
            "{} calculation takes {} parameters",
            self.kind,
            self.parameters.len()
        );
        self.parameters.copy_from_slice(parameters);
    }

    pub fn is_setup(&self) -> bool {
        self.setup
    }

    pub fn set_setup(&mut self, setup: bool) {
        self.setup = setup;
    }

    pub fn energy(&self, atoms: &SlotMap<FfAtomId, ForceFieldAtom>) -> f64 {
        self.assert_setup();
        self.energy_at(&self.positions(atoms))
    }

    /// Analytical gradient, one vector per referenced atom in [`Self::atoms`] order.
    pub fn gradient(&self, atoms: &SlotMap<FfAtomId, ForceFieldAtom>) -> Vec<Vector3<f64>> {
        self.assert_setup();
        self.analytical_gradient_at(&self.positions(atoms))
    }

    /// Central-difference gradient with step [`NUMERICAL_STEP`].
    pub fn numerical_gradient(
        &self,
        atoms: &SlotMap<FfAtomId, ForceFieldAtom>,
    ) -> Vec<Vector3<f64>> {
        self.assert_setup();
        self.numerical_gradient_at(&self.positions(atoms))
    }

    fn assert_setup(&self) {
        assert!(self.setup, "{} calculation evaluated before setup", self.kind);
    }

    fn positions(&self, atoms: &SlotMap<FfAtomId, ForceFieldAtom>) -> Vec<Point3<f64>> {
        self.atoms.iter().map(|&id| atoms[id].position).collect()
    }

    fn energy_at(&self, p: &[Point3<f64>]) -> f64 {
        let k = &self.parameters;
        match self.kind {
            CalculationKind::BondStretch => {
                potentials::harmonic(measures::distance(&p[0], &p[1]), k[1], k[0])
            }
            CalculationKind::AngleBend => {
                let theta = measures::bond_angle_radians(&p[0], &p[1], &p[2]);
                potentials::harmonic(theta, k[1].to_radians(), k[0])
            }
            CalculationKind::Torsion => {
                let phi = measures::torsion_angle_radians(&p[0], &p[1], &p[2], &p[3]);
                potentials::cosine_torsion(phi, k[0], k[1], k[2].to_radians())
            }
            CalculationKind::Inversion => {
                let psi = measures::wilson_angle_radians(&p[0], &p[1], &p[2], &p[3]);
                potentials::harmonic(psi, k[1].to_radians(), k[0])
            }
            CalculationKind::VanDerWaals => {
                potentials::lennard_jones_12_6(measures::distance(&p[0], &p[1]), k[0], k[1])
            }
            CalculationKind::Electrostatic => {
                potentials::coulomb(measures::distance(&p[0], &p[1]), k[0], k[1], k[2])
            }
        }
    }

    fn analytical_gradient_at(&self, p: &[Point3<f64>]) -> Vec<Vector3<f64>> {
        let k = &self.parameters;
        match self.kind {
            CalculationKind::BondStretch => {
                let r = measures::distance(&p[0], &p[1]);
                let de = potentials::harmonic_derivative(r, k[1], k[0]);
                scale(&measures::distance_gradient(&p[0], &p[1]), de)
            }
            CalculationKind::AngleBend => {
                let theta = measures::bond_angle_radians(&p[0], &p[1], &p[2]);
                let de = potentials::harmonic_derivative(theta, k[1].to_radians(), k[0]);
                scale(&measures::bond_angle_gradient_radians(&p[0], &p[1], &p[2]), de)
            }
            CalculationKind::Torsion => {
                let phi = measures::torsion_angle_radians(&p[0], &p[1], &p[2], &p[3]);
                let de = potentials::cosine_torsion_derivative(phi, k[0], k[1], k[2].to_radians());
                scale(
                    &measures::torsion_angle_gradient_radians(&p[0], &p[1], &p[2], &p[3]),
                    de,
                )
            }
            CalculationKind::Inversion => {
                let psi = measures::wilson_angle_radians(&p[0], &p[1], &p[2], &p[3]);
                let de = potentials::harmonic_derivative(psi, k[1].to_radians(), k[0]);
                scale(
                    &measures::wilson_angle_gradient_radians(&p[0], &p[1], &p[2], &p[3]),
                    de,
                )
            }
            CalculationKind::VanDerWaals => {
                let r = measures::distance(&p[0], &p[1]);
                let de = potentials::lennard_jones_12_6_derivative(r, k[0], k[1]);
                scale(&measures::distance_gradient(&p[0], &p[1]), de)
            }
            CalculationKind::Electrostatic => {
                let r = measures::distance(&p[0], &p[1]);
                let de = potentials::coulomb_derivative(r, k[0], k[1], k[2]);
                scale(&measures::distance_gradient(&p[0], &p[1]), de)
            }
        }
    }

    fn numerical_gradient_at(&self, p: &[Point3<f64>]) -> Vec<Vector3<f64>> {
        let mut work = p.to_vec();
        let mut gradient = vec![Vector3::zeros(); p.len()];
        for i in 0..work.len() {
            for axis in 0..3 {
                let original = work[i][axis];
                work[i][axis] = original + NUMERICAL_STEP;
                let plus = self.energy_at(&work);
                work[i][axis] = original - NUMERICAL_STEP;
                let minus = self.energy_at(&work);
                work[i][axis] = original;
                gradient[i][axis] = (plus - minus) / (2.0 * NUMERICAL_STEP);
            }
        }
        gradient
    }
}

fn scale(gradient: &[Vector3<f64>], factor: f64) -> Vec<Vector3<f64>> {
    gradient.iter().map(|g| g * factor).collect()
}
