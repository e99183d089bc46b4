use super::atom::{FfAtomId, ForceFieldAtom};
use super::calculation::Calculation;
use super::forcefield::ForceFieldError;
use super::params::{ParameterSet, ParameterSource};
use crate::core::models::ids::AtomId;
use crate::core::models::molecule::Molecule;
use std::collections::HashMap;
use std::fmt;

/// Defines which terms a force field builds for a molecule and how they are
/// parameterized.
///
/// A [`ForceField`](super::forcefield::ForceField) owns the atoms and the terms; the
/// model only describes them and must be stateless.
pub trait ForceFieldModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Whether terms built by this model provide analytical gradients. When false the
    /// force field differentiates numerically.
    fn has_analytical_gradient(&self) -> bool {
        true
    }

    /// Named parameter sets shipped with the model. The first entry is the default.
    fn parameter_sets(&self) -> Vec<(String, ParameterSource)>;

    /// Builds the (unparameterized) terms for one molecule's own topology.
    ///
    /// `atom_map` maps every atom of `molecule` to its shadow atom.
    fn build_calculations(
        &self,
        molecule: &Molecule,
        atom_map: &HashMap<AtomId, FfAtomId>,
    ) -> Vec<Calculation>;

    /// Builds the terms between two atoms of different molecules.
    fn build_pair_calculations(&self, _first: FfAtomId, _second: FfAtomId) -> Vec<Calculation> {
        Vec::new()
    }

    /// Returns the parameter vector for `calculation`.
    ///
    /// `Ok(None)` means the term does not apply under this parameter set; it stays
    /// unparameterized and is skipped during evaluation. `atoms` are the
    /// calculation's atoms in order.
    fn parameterize(
        &self,
        calculation: &Calculation,
        atoms: &[&ForceFieldAtom],
        parameters: &ParameterSet,
    ) -> Result<Option<Vec<f64>>, ForceFieldError>;
}
