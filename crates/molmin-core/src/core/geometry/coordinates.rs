use super::measures;
use crate::core::models::conformer::Conformer;
use crate::core::models::ids::AtomId;
use crate::core::models::molecule::Molecule;
use nalgebra::{DMatrix, Matrix3, MatrixXx3, Point3, Vector3};
use std::ops::{Add, Sub};

/// An ordered list of 3D points stored as an `N×3` matrix.
///
/// Rows are points and columns are the `x`, `y` and `z` axes. The column count is
/// fixed by the storage type, so the row count is always the number of points.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateMatrix {
    matrix: MatrixXx3<f64>,
}

impl Default for CoordinateMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinateMatrix {
    /// Creates an empty coordinate matrix.
    pub fn new() -> Self {
        Self::with_size(0)
    }

    /// Creates a coordinate matrix holding `size` points at the origin.
    pub fn with_size(size: usize) -> Self {
        Self {
            matrix: MatrixXx3::zeros(size),
        }
    }

    /// Creates a coordinate matrix from a list of points.
    pub fn from_points(points: &[Point3<f64>]) -> Self {
        let mut coordinates = Self::with_size(points.len());
        for (i, point) in points.iter().enumerate() {
            coordinates.set_position(i, point);
        }
        coordinates
    }

    /// Creates a coordinate matrix from the atoms of `molecule`, in atom order.
    pub fn from_molecule(molecule: &Molecule) -> Self {
        Self::from_points(&molecule.positions())
    }

    /// Creates a coordinate matrix from the positions stored in `conformer`.
    ///
    /// Atoms the conformer has no position for keep the molecule's position.
    pub fn from_conformer(molecule: &Molecule, conformer: &Conformer) -> Self {
        let points: Vec<_> = molecule
            .atoms()
            .map(|(id, atom)| conformer.position(id).unwrap_or(atom.position))
            .collect();
        Self::from_points(&points)
    }

    /// Creates a coordinate matrix from an explicit list of atoms of `molecule`.
    ///
    /// # Panics
    ///
    /// Panics if any id does not belong to `molecule`.
    pub fn from_atoms(molecule: &Molecule, atoms: &[AtomId]) -> Self {
        let points: Vec<_> = atoms
            .iter()
            .map(|&id| {
                molecule
                    .position(id)
                    .unwrap_or_else(|| panic!("atom {id:?} does not belong to the molecule"))
            })
            .collect();
        Self::from_points(&points)
    }

    pub fn size(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Resizes the matrix, padding with points at the origin or truncating.
    pub fn set_size(&mut self, size: usize) {
        let matrix = std::mem::replace(&mut self.matrix, MatrixXx3::zeros(0));
        self.matrix = matrix.resize_vertically(size, 0.0);
    }

    /// Returns a copy of the underlying `N×3` matrix.
    pub fn to_matrix(&self) -> MatrixXx3<f64> {
        self.matrix.clone()
    }

    pub fn position(&self, index: usize) -> Point3<f64> {
        self.check_index(index);
        Point3::new(
            self.matrix[(index, 0)],
            self.matrix[(index, 1)],
            self.matrix[(index, 2)],
        )
    }

    pub fn set_position(&mut self, index: usize, position: &Point3<f64>) {
        self.check_index(index);
        for axis in 0..3 {
            self.matrix[(index, axis)] = position[axis];
        }
    }

    pub fn value(&self, row: usize, column: usize) -> f64 {
        self.matrix[(row, column)]
    }

    pub fn set_value(&mut self, row: usize, column: usize, value: f64) {
        self.matrix[(row, column)] = value;
    }

    pub fn positions(&self) -> Vec<Point3<f64>> {
        (0..self.size()).map(|i| self.position(i)).collect()
    }

    pub fn append(&mut self, position: &Point3<f64>) {
        self.insert(self.size(), position);
    }

    /// Inserts `position` at `index`, shifting later points down by one.
    ///
    /// Inserting past the end grows the matrix so that `index` becomes the last
    /// row; any gap is filled with points at the origin.
    pub fn insert(&mut self, index: usize, position: &Point3<f64>) {
        if index >= self.size() {
            self.set_size(index + 1);
        } else {
            let matrix = std::mem::replace(&mut self.matrix, MatrixXx3::zeros(0));
            self.matrix = matrix.insert_row(index, 0.0);
        }
        self.set_position(index, position);
    }

    /// Removes the point at `index`, shifting later points up by one.
    pub fn remove(&mut self, index: usize) {
        self.check_index(index);
        let matrix = std::mem::replace(&mut self.matrix, MatrixXx3::zeros(0));
        self.matrix = matrix.remove_row(index);
    }

    /// Distance in Angstroms between the points at `i` and `j`.
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        measures::distance(&self.position(i), &self.position(j))
    }

    /// Angle in degrees between the points at `i`, `j` and `k`.
    pub fn bond_angle(&self, i: usize, j: usize, k: usize) -> f64 {
        measures::bond_angle(&self.position(i), &self.position(j), &self.position(k))
    }

    /// Torsion angle in degrees between the points at `i`, `j`, `k` and `l`.
    pub fn torsion_angle(&self, i: usize, j: usize, k: usize, l: usize) -> f64 {
        measures::torsion_angle(
            &self.position(i),
            &self.position(j),
            &self.position(k),
            &self.position(l),
        )
    }

    /// Wilson angle in degrees between the points at `i`, `j`, `k` and `l`.
    pub fn wilson_angle(&self, i: usize, j: usize, k: usize, l: usize) -> f64 {
        measures::wilson_angle(
            &self.position(i),
            &self.position(j),
            &self.position(k),
            &self.position(l),
        )
    }

    /// Arithmetic mean of all points (the centroid). The origin when empty.
    pub fn center(&self) -> Point3<f64> {
        if self.is_empty() {
            return Point3::origin();
        }
        let sum: Vector3<f64> = (0..self.size()).map(|i| self.position(i).coords).sum();
        Point3::from(sum / self.size() as f64)
    }

    /// Weighted mean of all points.
    ///
    /// Returns the origin when the matrix is empty or the weights sum to zero.
    ///
    /// # Panics
    ///
    /// Panics if `weights.len()` differs from `size()`.
    pub fn weighted_center(&self, weights: &[f64]) -> Point3<f64> {
        assert_eq!(
            weights.len(),
            self.size(),
            "weighted_center needs one weight per point"
        );

        let total_weight: f64 = weights.iter().sum();
        if self.is_empty() || total_weight == 0.0 {
            return Point3::origin();
        }

        let sum: Vector3<f64> = weights
            .iter()
            .enumerate()
            .map(|(i, w)| self.position(i).coords * *w)
            .sum();
        Point3::from(sum / total_weight)
    }

    /// Translates every point by `vector`.
    pub fn move_by(&mut self, vector: &Vector3<f64>) {
        for mut row in self.matrix.row_iter_mut() {
            row[0] += vector.x;
            row[1] += vector.y;
            row[2] += vector.z;
        }
    }

    /// Symmetric matrix of pairwise distances with a zero diagonal.
    pub fn distance_matrix(&self) -> DMatrix<f64> {
        let n = self.size();
        let mut distances = DMatrix::zeros(n, n);
        for i in 0..n {
            for j in (i + 1)..n {
                let d = self.distance(i, j);
                distances[(i, j)] = d;
                distances[(j, i)] = d;
            }
        }
        distances
    }

    /// Pointwise sum, truncated to the shorter of the two matrices.
    pub fn add(&self, other: &CoordinateMatrix) -> CoordinateMatrix {
        self.combine(other, |a, b| a + b.coords)
    }

    /// Pointwise difference, truncated to the shorter of the two matrices.
    pub fn subtract(&self, other: &CoordinateMatrix) -> CoordinateMatrix {
        self.combine(other, |a, b| a - b.coords)
    }

    /// Returns the 3×3 product `selfᵀ · other`.
    ///
    /// Both operands must already be centered for the result to be a covariance
    /// matrix; no centering happens here.
    ///
    /// # Panics
    ///
    /// Panics if the matrices hold a different number of points.
    pub fn multiply(&self, other: &CoordinateMatrix) -> Matrix3<f64> {
        assert_eq!(
            self.size(),
            other.size(),
            "multiply needs matrices of equal size"
        );
        self.matrix.tr_mul(&other.matrix)
    }

    fn combine<F>(&self, other: &CoordinateMatrix, op: F) -> CoordinateMatrix
    where
        F: Fn(Point3<f64>, Point3<f64>) -> Point3<f64>,
    {
        let size = self.size().min(other.size());
        let mut result = CoordinateMatrix::with_size(size);
        for i in 0..size {
            result.set_position(i, &op(self.position(i), other.position(i)));
        }
        result
    }

    fn check_index(&self, index: usize) {
        assert!(
            index < self.size(),
            "point index {index} out of range for coordinate matrix of size {}",
            self.size()
        );
    }
}

impl Add for &CoordinateMatrix {
    type Output = CoordinateMatrix;

    fn add(self, rhs: Self) -> Self::Output {
        CoordinateMatrix::add(self, rhs)
    }
}

impl Sub for &CoordinateMatrix {
    type Output = CoordinateMatrix;

    fn sub(self, rhs: Self) -> Self::Output {
        self.subtract(rhs)
    }
}

impl From<&[Point3<f64>]> for CoordinateMatrix {
    fn from(points: &[Point3<f64>]) -> Self {
        Self::from_points(points)
    }
}
