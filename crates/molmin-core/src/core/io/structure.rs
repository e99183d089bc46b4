use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::Atom;
use crate::core::models::molecule::{Molecule, MoleculeError};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StructureError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Bond {index} references atom {atom}, but the structure has {count} atoms")]
    BondOutOfRange {
        index: usize,
        atom: usize,
        count: usize,
    },
    #[error("Invalid bond {index}: {source}")]
    InvalidBond {
        index: usize,
        #[source]
        source: MoleculeError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct AtomRecord {
    name: String,
    #[serde(rename = "type")]
    atom_type: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    charge: f64,
    position: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StructureDocument {
    name: String,
    /// Pairs of zero-based atom indices.
    #[serde(default)]
    bonds: Vec<[usize; 2]>,
    #[serde(default)]
    atoms: Vec<AtomRecord>,
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

/// TOML description of a molecule: a name, an ordered atom list and bonds
/// given as pairs of atom indices.
///
/// ```toml
/// name = "water"
/// bonds = [[0, 1], [0, 2]]
///
/// [[atoms]]
/// name = "O"
/// type = "O_3"
/// charge = -0.82
/// position = [0.0, 0.0, 0.0]
/// ```
pub struct StructureFile;

impl StructureFile {
    pub fn from_toml_str(content: &str) -> Result<Molecule, StructureError> {
        let document: StructureDocument = toml::from_str(content)?;

        let mut molecule = Molecule::new(&document.name);
        let ids: Vec<_> = document
            .atoms
            .into_iter()
            .map(|record| {
                let [x, y, z] = record.position;
                molecule.add_atom(
                    Atom::new(&record.name, &record.atom_type, Point3::new(x, y, z))
                        .with_charge(record.charge),
                )
            })
            .collect();

        for (index, [a, b]) in document.bonds.into_iter().enumerate() {
            let lookup = |atom: usize| {
                ids.get(atom).copied().ok_or(StructureError::BondOutOfRange {
                    index,
                    atom,
                    count: ids.len(),
                })
            };
            molecule
                .add_bond(lookup(a)?, lookup(b)?)
                .map_err(|source| StructureError::InvalidBond { index, source })?;
        }
        Ok(molecule)
    }

    pub fn to_toml_string(molecule: &Molecule) -> Result<String, StructureError> {
        let atoms = molecule
            .atoms()
            .map(|(_, atom)| AtomRecord {
                name: atom.name.clone(),
                atom_type: atom.atom_type.clone(),
                charge: atom.partial_charge,
                position: [atom.position.x, atom.position.y, atom.position.z],
            })
            .collect();
        let bonds = molecule
            .bonds()
            .iter()
            .filter_map(|bond| {
                Some([
                    molecule.index_of(bond.atom1_id)?,
                    molecule.index_of(bond.atom2_id)?,
                ])
            })
            .collect();
        let document = StructureDocument {
            name: molecule.name().to_string(),
            bonds,
            atoms,
        };
        Ok(toml::to_string(&document)?)
    }
}

impl MolecularFile for StructureFile {
    type Error = StructureError;

    fn read_from(reader: &mut impl BufRead) -> Result<Molecule, Self::Error> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Self::from_toml_str(&content)
    }

    fn write_to(molecule: &Molecule, writer: &mut impl Write) -> Result<(), Self::Error> {
        writer.write_all(Self::to_toml_string(molecule)?.as_bytes())?;
        Ok(())
    }
}
