use super::ids::{AtomId, MoleculeId};
use super::molecule::Molecule;
use nalgebra::Point3;
use slotmap::SecondaryMap;

/// An alternative set of coordinates for the atoms of one molecule.
#[derive(Debug, Clone)]
pub struct Conformer {
    molecule_id: MoleculeId,
    positions: SecondaryMap<AtomId, Point3<f64>>,
}

impl Conformer {
    /// Snapshots the current positions of every atom in `molecule`.
    pub fn from_molecule(molecule: &Molecule) -> Self {
        let mut positions = SecondaryMap::new();
        for (id, atom) in molecule.atoms() {
            positions.insert(id, atom.position);
        }
        Self {
            molecule_id: molecule.id(),
            positions,
        }
    }

    pub fn molecule_id(&self) -> MoleculeId {
        self.molecule_id
    }

    pub fn position(&self, atom_id: AtomId) -> Option<Point3<f64>> {
        self.positions.get(atom_id).copied()
    }

    pub fn set_position(&mut self, atom_id: AtomId, position: Point3<f64>) {
        self.positions.insert(atom_id, position);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
