use super::aligner::AlignmentError;
use crate::core::models::ids::AtomId;
use crate::core::models::molecule::Molecule;

/// An ordered atom-to-atom correspondence between a source and a target molecule.
#[derive(Debug, Clone)]
pub struct AtomMapping<'a> {
    source: &'a Molecule,
    target: &'a Molecule,
    pairs: Vec<(AtomId, AtomId)>,
}

impl<'a> AtomMapping<'a> {
    /// An empty mapping.
    pub fn new(source: &'a Molecule, target: &'a Molecule) -> Self {
        Self {
            source,
            target,
            pairs: Vec::new(),
        }
    }

    /// Pairs atoms by position in atom order, up to the smaller atom count.
    pub fn by_index(source: &'a Molecule, target: &'a Molecule) -> Self {
        let pairs = source
            .atom_ids()
            .iter()
            .copied()
            .zip(target.atom_ids().iter().copied())
            .collect();
        Self {
            source,
            target,
            pairs,
        }
    }

    /// Pairs the atoms named `name` in order of appearance, up to the smaller count.
    ///
    /// With `"CA"` this maps the alpha carbons of two protein chains.
    pub fn by_atom_name(source: &'a Molecule, target: &'a Molecule, name: &str) -> Self {
        let named = |molecule: &'a Molecule| {
            molecule
                .atoms()
                .filter(|(_, atom)| atom.name == name)
                .map(|(id, _)| id)
                .collect::<Vec<_>>()
        };
        let pairs = named(source).into_iter().zip(named(target)).collect();
        Self {
            source,
            target,
            pairs,
        }
    }

    /// Appends a pair given the atoms' positions in the source and target atom order.
    ///
    /// Positions are resolved against their own molecule, so a pair can never refer to
    /// an atom of the other molecule.
    pub fn add(&mut self, source_index: usize, target_index: usize) -> Result<(), AlignmentError> {
        let source_atom = resolve(self.source, source_index, "source")?;
        let target_atom = resolve(self.target, target_index, "target")?;
        if self.pairs.iter().any(|(s, _)| *s == source_atom) {
            return Err(AlignmentError::DuplicateMapping {
                index: source_index,
                side: "source",
            });
        }
        if self.pairs.iter().any(|(_, t)| *t == target_atom) {
            return Err(AlignmentError::DuplicateMapping {
                index: target_index,
                side: "target",
            });
        }
        self.pairs.push((source_atom, target_atom));
        Ok(())
    }

    pub fn source(&self) -> &'a Molecule {
        self.source
    }

    pub fn target(&self) -> &'a Molecule {
        self.target
    }

    pub fn pairs(&self) -> &[(AtomId, AtomId)] {
        &self.pairs
    }

    pub fn source_atoms(&self) -> Vec<AtomId> {
        self.pairs.iter().map(|(s, _)| *s).collect()
    }

    pub fn target_atoms(&self) -> Vec<AtomId> {
        self.pairs.iter().map(|(_, t)| *t).collect()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

fn resolve(molecule: &Molecule, index: usize, side: &'static str) -> Result<AtomId, AlignmentError> {
    molecule
        .atom_ids()
        .get(index)
        .copied()
        .ok_or(AlignmentError::AtomIndexOutOfRange {
            index,
            side,
            size: molecule.size(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use nalgebra::Point3;

    fn chain(names: &[&str]) -> Molecule {
        let mut molecule = Molecule::new("chain");
        for (i, name) in names.iter().enumerate() {
            molecule.add_atom(Atom::new(name, "C_3", Point3::new(i as f64, 0.0, 0.0)));
        }
        molecule
    }

    #[test]
    fn by_index_pairs_up_to_smaller_size() {
        let source = chain(&["N", "CA", "C"]);
        let target = chain(&["N", "CA"]);
        let mapping = AtomMapping::by_index(&source, &target);
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.pairs()[1], (source.atom_ids()[1], target.atom_ids()[1]));
    }

    #[test]
    fn by_atom_name_pairs_matching_atoms_in_order() {
        let source = chain(&["N", "CA", "C", "N", "CA", "C"]);
        let target = chain(&["CA", "O", "CA", "CA"]);
        let mapping = AtomMapping::by_atom_name(&source, &target, "CA");
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.source_atoms(), vec![source.atom_ids()[1], source.atom_ids()[4]]);
        assert_eq!(mapping.target_atoms(), vec![target.atom_ids()[0], target.atom_ids()[2]]);
    }

    #[test]
    fn add_rejects_out_of_range_and_duplicate_atoms() {
        let source = chain(&["A", "B"]);
        let target = chain(&["A", "B"]);
        let mut mapping = AtomMapping::new(&source, &target);
        assert!(mapping.is_empty());

        mapping.add(0, 0).unwrap();
        assert_eq!(
            mapping.add(0, 1),
            Err(AlignmentError::DuplicateMapping { index: 0, side: "source" })
        );
        assert_eq!(
            mapping.add(1, 0),
            Err(AlignmentError::DuplicateMapping { index: 0, side: "target" })
        );
        assert_eq!(
            mapping.add(1, 2),
            Err(AlignmentError::AtomIndexOutOfRange { index: 2, side: "target", size: 2 })
        );

        mapping.add(1, 1).unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.pairs()[1], (source.atom_ids()[1], target.atom_ids()[1]));
    }

    #[test]
    fn add_resolves_each_index_against_its_own_molecule() {
        // Independently built molecules hand out equal atom ids.
        let source = chain(&["A", "B", "C"]);
        let target = chain(&["X"]);
        assert_eq!(source.atom_ids()[0], target.atom_ids()[0]);

        let mut mapping = AtomMapping::new(&source, &target);
        assert!(matches!(
            mapping.add(0, 2),
            Err(AlignmentError::AtomIndexOutOfRange { side: "target", .. })
        ));
        mapping.add(2, 0).unwrap();
        assert_eq!(mapping.source_atoms(), vec![source.atom_ids()[2]]);
        assert_eq!(mapping.target_atoms(), vec![target.atom_ids()[0]]);
        assert!(source.contains(mapping.source_atoms()[0]));
        assert_eq!(source.atom(mapping.source_atoms()[0]).unwrap().name, "C");
    }
}
