use crate::core::alignment::aligner::MoleculeAligner;
use crate::core::alignment::mapping::AtomMapping;
use crate::core::models::molecule::Molecule;
use crate::engine::error::EngineError;
use nalgebra::{Matrix3, Vector3};
use std::fmt;
use tracing::{info, instrument};

/// Which atoms are paired between the source and target molecules.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AtomSelection {
    /// Every atom, paired by position in the atom order.
    #[default]
    All,
    /// Atoms sharing the given name, paired in order of appearance.
    Named(String),
}

impl fmt::Display for AtomSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all atoms"),
            Self::Named(name) => write!(f, "atoms named '{name}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentResult {
    pub pairs: usize,
    pub rmsd_before: f64,
    pub rmsd_after: f64,
    pub rotation: Matrix3<f64>,
    /// Translation of the source centroid onto the target centroid.
    pub displacement: Vector3<f64>,
}

/// Superimposes `source` onto `target` and moves every source atom.
#[instrument(skip_all, name = "alignment_workflow")]
pub fn run(
    source: &mut Molecule,
    target: &Molecule,
    selection: &AtomSelection,
) -> Result<AlignmentResult, EngineError> {
    let (transform, pairs, rmsd_before, displacement) = {
        let snapshot: &Molecule = source;
        let mapping = match selection {
            AtomSelection::All => AtomMapping::by_index(snapshot, target),
            AtomSelection::Named(name) => AtomMapping::by_atom_name(snapshot, target, name),
        };
        let aligner = MoleculeAligner::new(mapping);
        let rmsd_before = aligner
            .deviation()
            .ok_or_else(|| EngineError::EmptySelection(selection.to_string()))?;
        (
            aligner.transform()?,
            aligner.mapping().len(),
            rmsd_before,
            aligner.displacement_vector(),
        )
    };

    transform.apply_to(source);

    let mapping = match selection {
        AtomSelection::All => AtomMapping::by_index(source, target),
        AtomSelection::Named(name) => AtomMapping::by_atom_name(source, target, name),
    };
    let rmsd_after = MoleculeAligner::new(mapping)
        .deviation()
        .ok_or_else(|| EngineError::EmptySelection(selection.to_string()))?;

    info!(
        "Aligned {} pairs ({}): RMSD {:.4} -> {:.4} Å.",
        pairs, selection, rmsd_before, rmsd_after
    );
    Ok(AlignmentResult {
        pairs,
        rmsd_before,
        rmsd_after,
        rotation: transform.rotation,
        displacement,
    })
}
