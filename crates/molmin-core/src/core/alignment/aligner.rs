use super::mapping::AtomMapping;
use crate::core::geometry::coordinates::CoordinateMatrix;
use crate::core::geometry::measures;
use crate::core::geometry::svd::SingularValueDecomposition;
use crate::core::models::conformer::Conformer;
use crate::core::models::ids::{AtomId, MoleculeId};
use crate::core::models::molecule::Molecule;
use nalgebra::{Matrix3, Point3, Vector3};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlignmentError {
    #[error("Conformer belongs to molecule {found}, expected {expected}")]
    ConformerMismatch {
        expected: MoleculeId,
        found: MoleculeId,
    },
    #[error("Atom index {index} is out of range for the {side} molecule of {size} atoms")]
    AtomIndexOutOfRange {
        index: usize,
        side: &'static str,
        size: usize,
    },
    #[error("Atom {index} of the {side} molecule is already mapped")]
    DuplicateMapping { index: usize, side: &'static str },
    #[error("Singular value decomposition of the covariance matrix failed")]
    Svd,
}

/// A proper rotation about the source centroid followed by a move onto the target
/// centroid: `p ↦ R (p − c_s) + c_t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    pub rotation: Matrix3<f64>,
    pub source_center: Point3<f64>,
    pub target_center: Point3<f64>,
}

impl RigidTransform {
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            source_center: Point3::origin(),
            target_center: Point3::origin(),
        }
    }

    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        self.target_center + self.rotation * (point - self.source_center)
    }

    /// Translation part when the transform is written as `p ↦ R p + t`.
    pub fn translation(&self) -> Vector3<f64> {
        self.target_center.coords - self.rotation * self.source_center.coords
    }

    /// Moves every atom of `molecule`.
    pub fn apply_to(&self, molecule: &mut Molecule) {
        for id in molecule.atom_ids().to_vec() {
            if let Some(atom) = molecule.atom_mut(id) {
                atom.position = self.apply(&atom.position);
            }
        }
    }
}

/// Least-squares rigid superposition of a source molecule onto a target (Kabsch).
///
/// Coordinates come from the mapped atoms of each molecule, or from a conformer of
/// that molecule when one is set.
#[derive(Debug, Clone)]
pub struct MoleculeAligner<'a> {
    mapping: AtomMapping<'a>,
    source_conformer: Option<&'a Conformer>,
    target_conformer: Option<&'a Conformer>,
}

impl<'a> MoleculeAligner<'a> {
    pub fn new(mapping: AtomMapping<'a>) -> Self {
        Self {
            mapping,
            source_conformer: None,
            target_conformer: None,
        }
    }

    /// Aligns atoms pairwise by index.
    pub fn from_molecules(source: &'a Molecule, target: &'a Molecule) -> Self {
        Self::new(AtomMapping::by_index(source, target))
    }

    /// Aligns only atoms with the given name, e.g. `"CA"` for protein backbones.
    pub fn by_atom_name(source: &'a Molecule, target: &'a Molecule, name: &str) -> Self {
        Self::new(AtomMapping::by_atom_name(source, target, name))
    }

    pub fn mapping(&self) -> &AtomMapping<'a> {
        &self.mapping
    }

    pub fn set_source_conformer(&mut self, conformer: &'a Conformer) -> Result<(), AlignmentError> {
        check_conformer(self.mapping.source(), conformer)?;
        self.source_conformer = Some(conformer);
        Ok(())
    }

    pub fn set_target_conformer(&mut self, conformer: &'a Conformer) -> Result<(), AlignmentError> {
        check_conformer(self.mapping.target(), conformer)?;
        self.target_conformer = Some(conformer);
        Ok(())
    }

    pub fn source_coordinates(&self) -> CoordinateMatrix {
        coordinates(
            self.mapping.source(),
            self.source_conformer,
            &self.mapping.source_atoms(),
        )
    }

    pub fn target_coordinates(&self) -> CoordinateMatrix {
        coordinates(
            self.mapping.target(),
            self.target_conformer,
            &self.mapping.target_atoms(),
        )
    }

    /// RMSD between the mapped atoms under the current coordinates, before any
    /// superposition. `None` for an empty mapping.
    pub fn deviation(&self) -> Option<f64> {
        measures::rmsd(
            &self.source_coordinates().positions(),
            &self.target_coordinates().positions(),
        )
    }

    /// Target centroid minus source centroid.
    pub fn displacement_vector(&self) -> Vector3<f64> {
        self.target_coordinates().center() - self.source_coordinates().center()
    }

    /// The proper rotation that best superimposes the centered source onto the
    /// centered target. Identity for an empty mapping.
    pub fn rotation_matrix(&self) -> Result<Matrix3<f64>, AlignmentError> {
        Ok(self.transform()?.rotation)
    }

    pub fn transform(&self) -> Result<RigidTransform, AlignmentError> {
        if self.mapping.is_empty() {
            return Ok(RigidTransform::identity());
        }

        let mut source = self.source_coordinates();
        let mut target = self.target_coordinates();
        let source_center = source.center();
        let target_center = target.center();
        source.move_by(&-source_center.coords);
        target.move_by(&-target_center.coords);

        let covariance = target.multiply(&source);
        let svd = SingularValueDecomposition::decompose(&covariance).ok_or(AlignmentError::Svd)?;

        // Sign from the bases rather than det(C) so rank-deficient inputs stay proper.
        let d = (svd.u.determinant() * svd.v_t.determinant()).signum();
        let correction = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, d));
        let rotation = svd.u * correction * svd.v_t;

        trace!(
            pairs = self.mapping.len(),
            singular_values = ?svd.singular_values.as_slice(),
            "Computed superposition"
        );

        Ok(RigidTransform {
            rotation,
            source_center,
            target_center,
        })
    }

    /// Applies the superposition to every atom of `molecule`.
    ///
    /// The source molecule itself is borrowed by the aligner; to move it, take
    /// [`MoleculeAligner::transform`] first and apply it once the aligner is dropped.
    pub fn align(&self, molecule: &mut Molecule) -> Result<RigidTransform, AlignmentError> {
        let transform = self.transform()?;
        transform.apply_to(molecule);
        Ok(transform)
    }
}

fn check_conformer(molecule: &Molecule, conformer: &Conformer) -> Result<(), AlignmentError> {
    if conformer.molecule_id() != molecule.id() {
        return Err(AlignmentError::ConformerMismatch {
            expected: molecule.id(),
            found: conformer.molecule_id(),
        });
    }
    Ok(())
}

fn coordinates(
    molecule: &Molecule,
    conformer: Option<&Conformer>,
    atoms: &[AtomId],
) -> CoordinateMatrix {
    let points: Vec<_> = atoms
        .iter()
        .filter_map(|&id| {
            conformer
                .and_then(|c| c.position(id))
                .or_else(|| molecule.position(id))
        })
        .collect();
    CoordinateMatrix::from_points(&points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use nalgebra::{Rotation3, Unit};

    const TOLERANCE: f64 = 1e-6;

    fn molecule_from(points: &[Point3<f64>]) -> Molecule {
        let mut molecule = Molecule::new("points");
        for (i, p) in points.iter().enumerate() {
            molecule.add_atom(Atom::new(&format!("A{i}"), "C_3", *p));
        }
        molecule
    }

    fn tetrahedron() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.5, 0.0, 0.0),
            Point3::new(0.2, 1.4, 0.0),
            Point3::new(0.3, 0.4, 1.2),
            Point3::new(-0.7, 0.5, -0.9),
        ]
    }

    #[test]
    fn two_point_rotation_and_translation_is_recovered() {
        let target = molecule_from(&[Point3::origin(), Point3::new(1.0, 0.0, 0.0)]);
        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), 90f64.to_radians());
        let moved: Vec<_> = target
            .positions()
            .iter()
            .map(|p| rotation * p + Vector3::new(5.0, 0.0, 0.0))
            .collect();
        let mut source = molecule_from(&moved);

        let transform = MoleculeAligner::from_molecules(&source, &target)
            .transform()
            .unwrap();
        transform.apply_to(&mut source);

        let aligner = MoleculeAligner::from_molecules(&source, &target);
        assert!(aligner.deviation().unwrap() < TOLERANCE);
        assert!((transform.rotation.determinant() - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn rotation_is_inverse_of_applied_rotation() {
        let points = tetrahedron();
        let target = molecule_from(&points);
        let axis = Unit::new_normalize(Vector3::new(1.0, -2.0, 0.5));
        let applied = Rotation3::from_axis_angle(&axis, 1.1);
        let moved: Vec<_> = points
            .iter()
            .map(|p| applied * p + Vector3::new(-3.0, 2.0, 7.0))
            .collect();
        let source = molecule_from(&moved);

        let aligner = MoleculeAligner::from_molecules(&source, &target);
        assert!(aligner.deviation().unwrap() > 1.0);

        let rotation = aligner.rotation_matrix().unwrap();
        assert!((rotation - applied.inverse().into_inner()).norm() < TOLERANCE);

        let mut aligned = source.clone();
        aligner.align(&mut aligned).unwrap();
        for (a, b) in aligned.positions().iter().zip(&points) {
            assert!((a - b).norm() < TOLERANCE);
        }
    }

    #[test]
    fn displacement_vector_is_difference_of_centroids() {
        let source = molecule_from(&[Point3::origin(), Point3::new(2.0, 0.0, 0.0)]);
        let target = molecule_from(&[Point3::new(0.0, 3.0, 0.0), Point3::new(2.0, 3.0, 0.0)]);
        let aligner = MoleculeAligner::from_molecules(&source, &target);
        assert!((aligner.displacement_vector() - Vector3::new(0.0, 3.0, 0.0)).norm() < 1e-12);
        assert!((aligner.deviation().unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_mapping_has_no_deviation_and_identity_rotation() {
        let source = molecule_from(&[]);
        let target = molecule_from(&tetrahedron());
        let aligner = MoleculeAligner::from_molecules(&source, &target);
        assert_eq!(aligner.deviation(), None);
        assert_eq!(aligner.rotation_matrix().unwrap(), Matrix3::identity());
        assert_eq!(aligner.displacement_vector(), Vector3::zeros());
    }

    #[test]
    fn mirrored_input_still_yields_proper_rotation() {
        let points = tetrahedron();
        let target = molecule_from(&points);
        let mirrored: Vec<_> = points.iter().map(|p| Point3::new(-p.x, p.y, p.z)).collect();
        let source = molecule_from(&mirrored);
        let rotation = MoleculeAligner::from_molecules(&source, &target)
            .rotation_matrix()
            .unwrap();
        assert!((rotation.determinant() - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn conformer_overrides_molecule_coordinates() {
        let points = tetrahedron();
        let source = molecule_from(&points);
        let target = molecule_from(&points);

        let mut conformer = Conformer::from_molecule(&source);
        for &id in source.atom_ids() {
            let p = source.position(id).unwrap();
            conformer.set_position(id, p + Vector3::new(1.0, 0.0, 0.0));
        }

        let mut aligner = MoleculeAligner::from_molecules(&source, &target);
        assert!(aligner.deviation().unwrap() < 1e-12);
        aligner.set_source_conformer(&conformer).unwrap();
        assert!((aligner.deviation().unwrap() - 1.0).abs() < 1e-12);
        assert!((aligner.displacement_vector() - Vector3::new(-1.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn conformer_of_another_molecule_is_rejected() {
        let source = molecule_from(&tetrahedron());
        let target = molecule_from(&tetrahedron());
        let foreign = Conformer::from_molecule(&target);

        let mut aligner = MoleculeAligner::from_molecules(&source, &target);
        assert!(matches!(
            aligner.set_source_conformer(&foreign),
            Err(AlignmentError::ConformerMismatch { .. })
        ));
        assert!(aligner.set_target_conformer(&foreign).is_ok());
    }

    #[test]
    fn conformer_of_a_clone_is_rejected() {
        let target = molecule_from(&tetrahedron());
        let source = target.clone();
        let from_target = Conformer::from_molecule(&target);

        let mut aligner = MoleculeAligner::from_molecules(&source, &target);
        assert!(matches!(
            aligner.set_source_conformer(&from_target),
            Err(AlignmentError::ConformerMismatch { .. })
        ));
    }

    #[test]
    fn by_atom_name_aligns_only_named_subset() {
        let mut source = Molecule::new("source");
        let mut target = Molecule::new("target");
        for (i, p) in tetrahedron().iter().enumerate() {
            let name = if i % 2 == 0 { "CA" } else { "CB" };
            source.add_atom(Atom::new(name, "C_3", *p + Vector3::new(2.0, 0.0, 0.0)));
            let offset = if name == "CA" { Vector3::zeros() } else { Vector3::new(0.0, 9.0, 0.0) };
            target.add_atom(Atom::new(name, "C_3", *p + offset));
        }
        let aligner = MoleculeAligner::by_atom_name(&source, &target, "CA");
        assert_eq!(aligner.mapping().len(), 3);
        assert!((aligner.deviation().unwrap() - 2.0).abs() < 1e-12);
        assert!((aligner.displacement_vector() - Vector3::new(-2.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn rigid_transform_translation_matches_apply() {
        let transform = RigidTransform {
            rotation: Rotation3::from_axis_angle(&Vector3::x_axis(), 0.3).into_inner(),
            source_center: Point3::new(1.0, 2.0, 3.0),
            target_center: Point3::new(-1.0, 0.0, 4.0),
        };
        let p = Point3::new(0.5, -0.5, 2.0);
        let expected = transform.rotation * p.coords + transform.translation();
        assert!((transform.apply(&p).coords - expected).norm() < 1e-12);
    }
}
