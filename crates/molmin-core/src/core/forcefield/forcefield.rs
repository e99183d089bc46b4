use super::atom::{FfAtomId, ForceFieldAtom};
use super::calculation::{Calculation, CalculationId, CalculationKind};
use super::model::ForceFieldModel;
use super::params::{ParamLoadError, ParameterSet, ParameterSource};
use super::term::EnergyBreakdown;
use crate::core::geometry::measures;
use crate::core::models::ids::{AtomId, MoleculeId};
use crate::core::models::molecule::Molecule;
use nalgebra::{Point3, Vector3};
use slotmap::{SecondaryMap, SlotMap};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace, warn};

#[derive(Debug, Error)]
pub enum ForceFieldError {
    #[error("Unknown parameter set: '{0}'")]
    UnknownParameterSet(String),
    #[error("Failed to load parameters: {0}")]
    ParameterLoad(#[from] ParamLoadError),
    #[error("Missing {kind} parameters for atom type(s) '{types}'")]
    MissingParameter {
        kind: CalculationKind,
        types: String,
    },
    #[error("No molecules are attached to the force field")]
    NoMolecules,
    #[error("No parameter set or parameter file is selected")]
    NoParameterSet,
}

/// Capabilities of a force field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForceFieldFlags {
    pub analytical_gradient: bool,
}

/// Energy and gradient evaluation for one or more molecules.
///
/// The force field keeps a shadow copy of every attached atom and the terms built for
/// them. Terms are evaluated on the shadow positions only; the molecules are touched
/// again only through [`ForceField::write_coordinates`].
///
/// Evaluation requires a successful [`ForceField::setup`]. Terms the model declares not
/// applicable under the active parameter set stay in the force field unparameterized
/// and are skipped, so a later setup with another set may enable them again.
#[derive(Debug)]
pub struct ForceField {
    model: Box<dyn ForceFieldModel>,
    atoms: SlotMap<FfAtomId, ForceFieldAtom>,
    atom_index: HashMap<(MoleculeId, AtomId), FfAtomId>,
    calculations: SlotMap<CalculationId, Calculation>,
    molecules: Vec<MoleculeId>,
    parameter_sets: BTreeMap<String, ParameterSource>,
    parameter_set: Option<String>,
    parameter_file: Option<PathBuf>,
    setup: bool,
    error_string: String,
}

impl ForceField {
    /// Creates an empty force field. The model's first parameter set becomes active.
    pub fn new(model: impl ForceFieldModel + 'static) -> Self {
        let sets = model.parameter_sets();
        let parameter_set = sets.first().map(|(name, _)| name.clone());
        Self {
            model: Box::new(model),
            atoms: SlotMap::with_key(),
            atom_index: HashMap::new(),
            calculations: SlotMap::with_key(),
            molecules: Vec::new(),
            parameter_sets: sets.into_iter().collect(),
            parameter_set,
            parameter_file: None,
            setup: false,
            error_string: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.model.name()
    }

    pub fn model(&self) -> &dyn ForceFieldModel {
        self.model.as_ref()
    }

    pub fn flags(&self) -> ForceFieldFlags {
        ForceFieldFlags {
            analytical_gradient: self.model.has_analytical_gradient(),
        }
    }

    pub fn is_setup(&self) -> bool {
        self.setup
    }

    /// The message of the last failed operation, empty after a success.
    pub fn error_string(&self) -> &str {
        &self.error_string
    }

    // --- Molecules ---

    /// Attaches `molecule`: creates shadow atoms and builds its terms, plus the
    /// non-bonded terms against every atom already present.
    ///
    /// Returns `false` if the molecule is already attached.
    pub fn add_molecule(&mut self, molecule: &Molecule) -> bool {
        let molecule_id = molecule.id();
        if self.molecules.contains(&molecule_id) {
            return false;
        }

        let existing: Vec<FfAtomId> = self.atoms.keys().collect();
        let mut atom_map = HashMap::with_capacity(molecule.size());
        for (atom_id, atom) in molecule.atoms() {
            let ff_id = self
                .atoms
                .insert(ForceFieldAtom::from_atom(molecule_id, atom_id, atom));
            self.atom_index.insert((molecule_id, atom_id), ff_id);
            atom_map.insert(atom_id, ff_id);
        }

        let mut built = self.model.build_calculations(molecule, &atom_map);
        for &other in &existing {
            for &new in atom_map.values() {
                built.extend(self.model.build_pair_calculations(other, new));
            }
        }

        debug!(
            molecule = %molecule_id,
            atoms = atom_map.len(),
            calculations = built.len(),
            "Attached molecule to force field '{}'",
            self.name()
        );

        for calculation in built {
            self.calculations.insert(calculation);
        }
        self.molecules.push(molecule_id);
        self.setup = false;
        true
    }

    /// Detaches `molecule`, removing its shadow atoms and every term that references
    /// any of them. Returns `false` if the molecule was not attached.
    pub fn remove_molecule(&mut self, molecule: &Molecule) -> bool {
        let molecule_id = molecule.id();
        let Some(position) = self.molecules.iter().position(|&id| id == molecule_id) else {
            return false;
        };
        self.molecules.remove(position);

        let removed: Vec<FfAtomId> = self
            .atoms
            .iter()
            .filter(|(_, atom)| atom.molecule_id == molecule_id)
            .map(|(id, _)| id)
            .collect();

        self.calculations
            .retain(|_, calculation| !removed.iter().any(|&id| calculation.contains(id)));
        for id in &removed {
            self.atoms.remove(*id);
        }
        self.atom_index.retain(|(mol, _), _| *mol != molecule_id);

        if self.molecules.is_empty() {
            self.setup = false;
        }
        debug!(molecule = %molecule_id, atoms = removed.len(), "Detached molecule");
        true
    }

    pub fn molecules(&self) -> &[MoleculeId] {
        &self.molecules
    }

    pub fn contains_molecule(&self, molecule: &Molecule) -> bool {
        self.molecules.contains(&molecule.id())
    }

    /// Removes every molecule, atom and term. Parameter set selection is kept.
    pub fn clear(&mut self) {
        self.atoms.clear();
        self.atom_index.clear();
        self.calculations.clear();
        self.molecules.clear();
        self.setup = false;
    }

    // --- Setup ---

    /// Loads the active parameters and assigns them to every term.
    ///
    /// On failure no term is modified, the force field is left not set up and
    /// [`ForceField::error_string`] holds the message.
    pub fn setup(&mut self) -> Result<(), ForceFieldError> {
        match self.try_setup() {
            Ok(()) => {
                self.setup = true;
                self.error_string.clear();
                Ok(())
            }
            Err(e) => {
                warn!("Force field '{}' setup failed: {}", self.name(), e);
                self.setup = false;
                self.error_string = e.to_string();
                Err(e)
            }
        }
    }

    fn try_setup(&mut self) -> Result<(), ForceFieldError> {
        if self.molecules.is_empty() {
            return Err(ForceFieldError::NoMolecules);
        }
        let parameters = self.load_parameters()?;

        let mut assignments = Vec::with_capacity(self.calculations.len());
        for (id, calculation) in &self.calculations {
            let atoms: Vec<&ForceFieldAtom> = calculation
                .atoms()
                .iter()
                .map(|&atom_id| &self.atoms[atom_id])
                .collect();
            let values = self.model.parameterize(calculation, &atoms, &parameters)?;
            assignments.push((id, values));
        }

        let mut inactive = 0usize;
        for (id, values) in assignments {
            let calculation = &mut self.calculations[id];
            match values {
                Some(values) => {
                    calculation.set_parameters(&values);
                    calculation.set_setup(true);
                }
                None => {
                    calculation.set_setup(false);
                    inactive += 1;
                }
            }
        }

        debug!(
            active = self.calculations.len() - inactive,
            inactive, "Force field '{}' set up", self.name()
        );
        Ok(())
    }

    fn load_parameters(&self) -> Result<ParameterSet, ForceFieldError> {
        if let Some(path) = &self.parameter_file {
            return Ok(ParameterSet::load(path)?);
        }
        let name = self
            .parameter_set
            .as_ref()
            .ok_or(ForceFieldError::NoParameterSet)?;
        let source = self
            .parameter_sets
            .get(name)
            .ok_or_else(|| ForceFieldError::UnknownParameterSet(name.clone()))?;
        Ok(source.load()?)
    }

    // --- Parameter sets ---

    pub fn add_parameter_set(&mut self, name: &str, source: ParameterSource) {
        self.parameter_sets.insert(name.to_string(), source);
    }

    pub fn remove_parameter_set(&mut self, name: &str) -> Option<ParameterSource> {
        self.parameter_sets.remove(name)
    }

    /// Selects the named parameter set. The name is resolved at the next setup.
    pub fn set_parameter_set(&mut self, name: &str) {
        self.parameter_set = Some(name.to_string());
        self.parameter_file = None;
        self.setup = false;
    }

    pub fn parameter_set(&self) -> Option<&str> {
        self.parameter_set.as_deref()
    }

    pub fn parameter_sets(&self) -> impl Iterator<Item = &str> {
        self.parameter_sets.keys().map(String::as_str)
    }

    /// Selects an ad-hoc parameter file, taking precedence over the named set.
    pub fn set_parameter_file(&mut self, path: impl Into<PathBuf>) {
        self.parameter_file = Some(path.into());
        self.setup = false;
    }

    pub fn parameter_file(&self) -> Option<&Path> {
        self.parameter_file.as_deref()
    }

    // --- Atoms and terms ---

    /// Number of shadow atoms.
    pub fn size(&self) -> usize {
        self.atoms.len()
    }

    pub fn atoms(&self) -> impl Iterator<Item = (FfAtomId, &ForceFieldAtom)> {
        self.atoms.iter()
    }

    pub fn atom_ids(&self) -> Vec<FfAtomId> {
        self.atoms.keys().collect()
    }

    pub fn atom(&self, id: FfAtomId) -> Option<&ForceFieldAtom> {
        self.atoms.get(id)
    }

    /// The shadow of `atom_id` of `molecule`, if attached.
    pub fn atom_for(&self, molecule: &Molecule, atom_id: AtomId) -> Option<FfAtomId> {
        self.atom_index.get(&(molecule.id(), atom_id)).copied()
    }

    pub fn calculations(&self) -> impl Iterator<Item = (CalculationId, &Calculation)> {
        self.calculations.iter()
    }

    pub fn calculation(&self, id: CalculationId) -> Option<&Calculation> {
        self.calculations.get(id)
    }

    pub fn calculation_count(&self) -> usize {
        self.calculations.len()
    }

    /// Number of terms that take part in evaluation.
    pub fn active_calculation_count(&self) -> usize {
        self.active_calculations().count()
    }

    fn active_calculations(&self) -> impl Iterator<Item = &Calculation> {
        self.calculations.values().filter(|c| c.is_setup())
    }

    // --- Evaluation ---

    fn assert_setup(&self) {
        assert!(
            self.setup,
            "force field '{}' evaluated before setup",
            self.name()
        );
    }

    /// Total energy in kcal/mol.
    ///
    /// # Panics
    ///
    /// Panics if the force field is not set up.
    pub fn energy(&self) -> f64 {
        self.assert_setup();
        self.active_calculations()
            .map(|c| c.energy(&self.atoms))
            .sum()
    }

    pub fn energy_breakdown(&self) -> EnergyBreakdown {
        self.assert_setup();
        let mut breakdown = EnergyBreakdown::default();
        for calculation in self.active_calculations() {
            breakdown.add_energy(calculation.kind(), calculation.energy(&self.atoms));
        }
        breakdown
    }

    /// Energy gradient in kcal/(mol·Å), one vector per shadow atom in
    /// [`ForceField::atom_ids`] order.
    ///
    /// Falls back to [`ForceField::numerical_gradient`] when the model has no
    /// analytical gradients.
    pub fn gradient(&self) -> Vec<Vector3<f64>> {
        self.assert_setup();
        if !self.model.has_analytical_gradient() {
            return self.numerical_gradient();
        }
        self.accumulate(|c| c.gradient(&self.atoms))
    }

    pub fn numerical_gradient(&self) -> Vec<Vector3<f64>> {
        self.assert_setup();
        self.accumulate(|c| c.numerical_gradient(&self.atoms))
    }

    fn accumulate<F>(&self, term_gradient: F) -> Vec<Vector3<f64>>
    where
        F: Fn(&Calculation) -> Vec<Vector3<f64>>,
    {
        let mut slots: SecondaryMap<FfAtomId, Vector3<f64>> = SecondaryMap::new();
        for id in self.atoms.keys() {
            slots.insert(id, Vector3::zeros());
        }
        for calculation in self.active_calculations() {
            for (&atom_id, g) in calculation.atoms().iter().zip(term_gradient(calculation)) {
                slots[atom_id] += g;
            }
        }
        trace!(atoms = slots.len(), "Accumulated gradient");
        self.atoms.keys().map(|id| slots[id]).collect()
    }

    /// Norm of the largest per-atom gradient.
    pub fn largest_gradient(&self) -> f64 {
        self.gradient()
            .iter()
            .map(|g| g.norm())
            .fold(0.0, f64::max)
    }

    /// `sqrt(Σ|g|² / 3N)` over all shadow atoms; zero without atoms.
    pub fn root_mean_square_gradient(&self) -> f64 {
        let gradient = self.gradient();
        if gradient.is_empty() {
            return 0.0;
        }
        let sum: f64 = gradient.iter().map(|g| g.norm_squared()).sum();
        (sum / (3 * gradient.len()) as f64).sqrt()
    }

    // --- Coordinates ---

    /// Copies every attached atom's position from `molecule` into the shadow atoms.
    pub fn read_coordinates(&mut self, molecule: &Molecule) {
        for (atom_id, atom) in molecule.atoms() {
            if let Some(&ff_id) = self.atom_index.get(&(molecule.id(), atom_id)) {
                self.atoms[ff_id].position = atom.position;
            }
        }
    }

    pub fn read_atom_coordinates(&mut self, molecule: &Molecule, atom_id: AtomId) -> bool {
        let (Some(&ff_id), Some(position)) = (
            self.atom_index.get(&(molecule.id(), atom_id)),
            molecule.position(atom_id),
        ) else {
            return false;
        };
        self.atoms[ff_id].position = position;
        true
    }

    /// Copies shadow positions back into `molecule`.
    pub fn write_coordinates(&self, molecule: &mut Molecule) {
        let molecule_id = molecule.id();
        for atom in self.atoms.values().filter(|a| a.molecule_id == molecule_id) {
            molecule.set_position(atom.atom_id, atom.position);
        }
    }

    pub fn write_atom_coordinates(&self, molecule: &mut Molecule, atom_id: AtomId) -> bool {
        match self.atom_index.get(&(molecule.id(), atom_id)) {
            Some(&ff_id) => molecule
                .set_position(atom_id, self.atoms[ff_id].position)
                .is_some(),
            None => false,
        }
    }

    /// Shadow positions in [`ForceField::atom_ids`] order.
    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.atoms.values().map(|a| a.position).collect()
    }

    /// # Panics
    ///
    /// Panics if `positions.len()` differs from [`ForceField::size`].
    pub fn set_positions(&mut self, positions: &[Point3<f64>]) {
        assert_eq!(
            positions.len(),
            self.atoms.len(),
            "set_positions needs one position per atom"
        );
        for (atom, position) in self.atoms.values_mut().zip(positions) {
            atom.position = *position;
        }
    }

    // --- Geometry over shadow atoms ---

    fn point(&self, id: FfAtomId) -> &Point3<f64> {
        &self.atoms[id].position
    }

    pub fn distance(&self, a: FfAtomId, b: FfAtomId) -> f64 {
        measures::distance(self.point(a), self.point(b))
    }

    /// Bond angle `a-b-c` in degrees.
    pub fn bond_angle(&self, a: FfAtomId, b: FfAtomId, c: FfAtomId) -> f64 {
        measures::bond_angle(self.point(a), self.point(b), self.point(c))
    }

    pub fn bond_angle_radians(&self, a: FfAtomId, b: FfAtomId, c: FfAtomId) -> f64 {
        measures::bond_angle_radians(self.point(a), self.point(b), self.point(c))
    }

    /// Dihedral `a-b-c-d` in degrees.
    pub fn torsion_angle(&self, a: FfAtomId, b: FfAtomId, c: FfAtomId, d: FfAtomId) -> f64 {
        measures::torsion_angle(self.point(a), self.point(b), self.point(c), self.point(d))
    }

    pub fn torsion_angle_radians(&self, a: FfAtomId, b: FfAtomId, c: FfAtomId, d: FfAtomId) -> f64 {
        measures::torsion_angle_radians(self.point(a), self.point(b), self.point(c), self.point(d))
    }

    /// Out-of-plane angle of `b→d` against the plane `a-b-c`, in degrees.
    pub fn wilson_angle(&self, a: FfAtomId, b: FfAtomId, c: FfAtomId, d: FfAtomId) -> f64 {
        measures::wilson_angle(self.point(a), self.point(b), self.point(c), self.point(d))
    }

    pub fn wilson_angle_radians(&self, a: FfAtomId, b: FfAtomId, c: FfAtomId, d: FfAtomId) -> f64 {
        measures::wilson_angle_radians(self.point(a), self.point(b), self.point(c), self.point(d))
    }
}
