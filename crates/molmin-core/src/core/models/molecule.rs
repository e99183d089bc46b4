use super::atom::Atom;
use super::ids::{AtomId, MoleculeId};
use super::topology::Bond;
use nalgebra::Point3;
use slotmap::{SecondaryMap, SlotMap};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoleculeError {
    #[error("Atom {0:?} does not belong to this molecule")]
    AtomNotFound(AtomId),
    #[error("Cannot bond atom {0:?} to itself")]
    SelfBond(AtomId),
    #[error("Atoms {0:?} and {1:?} are already bonded")]
    DuplicateBond(AtomId, AtomId),
}

/// A molecule: atoms with positions and typing, plus bond topology.
///
/// Atoms live in a slot map so that [`AtomId`]s stay valid across removals of other
/// atoms. A separate order vector keeps iteration deterministic in insertion order,
/// which is the order every coordinate-based view of the molecule uses.
///
/// A clone is a new molecule: it keeps the atom ids but receives a fresh
/// [`MoleculeId`], so it can be attached to a force field next to its original.
#[derive(Debug)]
pub struct Molecule {
    id: MoleculeId,
    name: String,
    atoms: SlotMap<AtomId, Atom>,
    order: Vec<AtomId>,
    bonds: Vec<Bond>,
    bond_adjacency: SecondaryMap<AtomId, Vec<AtomId>>,
}

impl Clone for Molecule {
    fn clone(&self) -> Self {
        Self {
            id: MoleculeId::next(),
            name: self.name.clone(),
            atoms: self.atoms.clone(),
            order: self.order.clone(),
            bonds: self.bonds.clone(),
            bond_adjacency: self.bond_adjacency.clone(),
        }
    }
}

impl Default for Molecule {
    fn default() -> Self {
        Self::new("")
    }
}

impl Molecule {
    pub fn new(name: &str) -> Self {
        Self {
            id: MoleculeId::next(),
            name: name.to_string(),
            atoms: SlotMap::with_key(),
            order: Vec::new(),
            bonds: Vec::new(),
            bond_adjacency: SecondaryMap::new(),
        }
    }

    pub fn id(&self) -> MoleculeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Number of atoms in the molecule.
    pub fn size(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn add_atom(&mut self, atom: Atom) -> AtomId {
        let atom_id = self.atoms.insert(atom);
        self.order.push(atom_id);
        self.bond_adjacency.insert(atom_id, Vec::new());
        atom_id
    }

    /// Removes an atom together with every bond it takes part in.
    pub fn remove_atom(&mut self, atom_id: AtomId) -> Option<Atom> {
        let atom = self.atoms.remove(atom_id)?;
        self.order.retain(|&id| id != atom_id);
        self.bonds.retain(|bond| !bond.contains(atom_id));

        let neighbors = self.bond_adjacency.remove(atom_id).unwrap_or_default();
        for neighbor_id in neighbors {
            if let Some(adjacency) = self.bond_adjacency.get_mut(neighbor_id) {
                adjacency.retain(|&id| id != atom_id);
            }
        }

        Some(atom)
    }

    pub fn contains(&self, atom_id: AtomId) -> bool {
        self.atoms.contains_key(atom_id)
    }

    pub fn atom(&self, atom_id: AtomId) -> Option<&Atom> {
        self.atoms.get(atom_id)
    }

    pub fn atom_mut(&mut self, atom_id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(atom_id)
    }

    /// Iterates atoms in insertion order.
    pub fn atoms(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.order.iter().map(move |&id| (id, &self.atoms[id]))
    }

    pub fn atom_ids(&self) -> &[AtomId] {
        &self.order
    }

    /// Returns the id of the atom at `index` in insertion order.
    pub fn atom_at(&self, index: usize) -> Option<AtomId> {
        self.order.get(index).copied()
    }

    pub fn index_of(&self, atom_id: AtomId) -> Option<usize> {
        self.order.iter().position(|&id| id == atom_id)
    }

    /// Finds the first atom with the given name.
    pub fn find_atom_by_name(&self, name: &str) -> Option<AtomId> {
        self.atoms()
            .find(|(_, atom)| atom.name == name)
            .map(|(id, _)| id)
    }

    pub fn position(&self, atom_id: AtomId) -> Option<Point3<f64>> {
        self.atoms.get(atom_id).map(|atom| atom.position)
    }

    pub fn set_position(&mut self, atom_id: AtomId, position: Point3<f64>) -> Option<()> {
        self.atoms.get_mut(atom_id)?.position = position;
        Some(())
    }

    /// Positions of every atom in insertion order.
    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.atoms().map(|(_, atom)| atom.position).collect()
    }

    /// Copies positions from `other` for every atom id both molecules share.
    pub fn copy_positions_from(&mut self, other: &Molecule) {
        for (id, atom) in self.atoms.iter_mut() {
            if let Some(source) = other.atoms.get(id) {
                atom.position = source.position;
            }
        }
    }

    pub fn add_bond(&mut self, atom1_id: AtomId, atom2_id: AtomId) -> Result<(), MoleculeError> {
        for id in [atom1_id, atom2_id] {
            if !self.atoms.contains_key(id) {
                return Err(MoleculeError::AtomNotFound(id));
            }
        }
        if atom1_id == atom2_id {
            return Err(MoleculeError::SelfBond(atom1_id));
        }
        if self.bond_adjacency[atom1_id].contains(&atom2_id) {
            return Err(MoleculeError::DuplicateBond(atom1_id, atom2_id));
        }

        self.bonds.push(Bond::new(atom1_id, atom2_id));
        self.bond_adjacency[atom1_id].push(atom2_id);
        self.bond_adjacency[atom2_id].push(atom1_id);
        Ok(())
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn bonded_neighbors(&self, atom_id: AtomId) -> Option<&[AtomId]> {
        self.bond_adjacency.get(atom_id).map(|v| v.as_slice())
    }

    pub fn is_bonded(&self, atom1_id: AtomId, atom2_id: AtomId) -> bool {
        self.bonded_neighbors(atom1_id)
            .is_some_and(|neighbors| neighbors.contains(&atom2_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn propane() -> (Molecule, Vec<AtomId>) {
        let mut molecule = Molecule::new("propane");
        let ids: Vec<_> = (0..3)
            .map(|i| {
                molecule.add_atom(Atom::new(
                    &format!("C{}", i + 1),
                    "C_3",
                    Point3::new(1.5 * i as f64, 0.0, 0.0),
                ))
            })
            .collect();
        molecule.add_bond(ids[0], ids[1]).unwrap();
        molecule.add_bond(ids[1], ids[2]).unwrap();
        (molecule, ids)
    }

    #[test]
    fn atoms_iterate_in_insertion_order() {
        let (molecule, ids) = propane();
        let iterated: Vec<_> = molecule.atoms().map(|(id, _)| id).collect();
        assert_eq!(iterated, ids);
        assert_eq!(molecule.size(), 3);
        assert_eq!(molecule.atom_at(1), Some(ids[1]));
        assert_eq!(molecule.index_of(ids[2]), Some(2));
    }

    #[test]
    fn add_bond_updates_adjacency() {
        let (molecule, ids) = propane();
        assert_eq!(molecule.bonds().len(), 2);
        assert_eq!(molecule.bonded_neighbors(ids[1]).unwrap().len(), 2);
        assert!(molecule.is_bonded(ids[0], ids[1]));
        assert!(!molecule.is_bonded(ids[0], ids[2]));
    }

    #[test]
    fn add_bond_rejects_invalid_bonds() {
        let (mut molecule, ids) = propane();
        assert_eq!(
            molecule.add_bond(ids[0], ids[0]),
            Err(MoleculeError::SelfBond(ids[0]))
        );
        assert_eq!(
            molecule.add_bond(ids[1], ids[0]),
            Err(MoleculeError::DuplicateBond(ids[1], ids[0]))
        );

        let removed = ids[2];
        molecule.remove_atom(removed);
        assert_eq!(
            molecule.add_bond(ids[0], removed),
            Err(MoleculeError::AtomNotFound(removed))
        );
    }

    #[test]
    fn remove_atom_cleans_bonds_and_order() {
        let (mut molecule, ids) = propane();
        let atom = molecule.remove_atom(ids[1]).unwrap();
        assert_eq!(atom.name, "C2");
        assert_eq!(molecule.size(), 2);
        assert!(molecule.bonds().is_empty());
        assert!(molecule.bonded_neighbors(ids[0]).unwrap().is_empty());
        assert!(!molecule.contains(ids[1]));
        assert_eq!(molecule.atom_ids(), &[ids[0], ids[2]]);
    }

    #[test]
    fn clone_gets_fresh_identity_but_keeps_atom_ids() {
        let (molecule, ids) = propane();
        let mut copy = molecule.clone();
        assert_ne!(copy.id(), molecule.id());
        assert_eq!(copy.atom_ids(), molecule.atom_ids());
        assert_eq!(copy.bonds(), molecule.bonds());

        copy.set_position(ids[0], Point3::new(0.0, 0.0, 7.0));
        let mut original = molecule;
        original.copy_positions_from(&copy);
        assert_eq!(original.position(ids[0]), Some(Point3::new(0.0, 0.0, 7.0)));
    }

    #[test]
    fn distinct_molecules_have_distinct_ids() {
        assert_ne!(Molecule::new("a").id(), Molecule::new("b").id());
    }

    #[test]
    fn find_atom_by_name_returns_first_match() {
        let (molecule, ids) = propane();
        assert_eq!(molecule.find_atom_by_name("C2"), Some(ids[1]));
        assert_eq!(molecule.find_atom_by_name("N"), None);
    }
}
