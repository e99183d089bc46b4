use crate::core::models::atom::Atom;
use crate::core::models::ids::{AtomId, MoleculeId};
use nalgebra::Point3;
use slotmap::new_key_type;

new_key_type! {
    pub struct FfAtomId;
}

/// A force field's private copy of a molecule atom.
///
/// The position may drift from the molecule's during optimization and is only
/// copied back on an explicit write.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceFieldAtom {
    pub molecule_id: MoleculeId,
    pub atom_id: AtomId,
    pub atom_type: String,
    pub partial_charge: f64,
    pub position: Point3<f64>,
}

impl ForceFieldAtom {
    pub fn from_atom(molecule_id: MoleculeId, atom_id: AtomId, atom: &Atom) -> Self {
        Self {
            molecule_id,
            atom_id,
            atom_type: atom.atom_type.clone(),
            partial_charge: atom.partial_charge,
            position: atom.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::molecule::Molecule;

    #[test]
    fn from_atom_copies_typing_and_position() {
        let mut molecule = Molecule::new("ion");
        let id = molecule.add_atom(
            Atom::new("NA", "Na", Point3::new(1.0, 2.0, 3.0)).with_charge(1.0),
        );
        let atom = molecule.atom(id).unwrap();

        let shadow = ForceFieldAtom::from_atom(molecule.id(), id, atom);
        assert_eq!(shadow.molecule_id, molecule.id());
        assert_eq!(shadow.atom_id, id);
        assert_eq!(shadow.atom_type, "Na");
        assert_eq!(shadow.partial_charge, 1.0);
        assert_eq!(shadow.position, Point3::new(1.0, 2.0, 3.0));
    }
}
