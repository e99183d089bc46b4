use nalgebra::{Matrix3, Vector3};

/// Singular value decomposition `M = U · diag(Σ) · Vᵀ` of a 3×3 matrix.
///
/// Singular values are sorted in descending order.
#[derive(Debug, Clone, PartialEq)]
pub struct SingularValueDecomposition {
    pub u: Matrix3<f64>,
    pub singular_values: Vector3<f64>,
    pub v_t: Matrix3<f64>,
}

impl SingularValueDecomposition {
    /// Decomposes `matrix`. Returns `None` if either singular basis could not be computed.
    pub fn decompose(matrix: &Matrix3<f64>) -> Option<Self> {
        let svd = matrix.svd(true, true);
        Some(Self {
            u: svd.u?,
            singular_values: svd.singular_values,
            v_t: svd.v_t?,
        })
    }

    pub fn v(&self) -> Matrix3<f64> {
        self.v_t.transpose()
    }

    /// Rebuilds `U · diag(Σ) · Vᵀ`.
    pub fn recompose(&self) -> Matrix3<f64> {
        self.u * Matrix3::from_diagonal(&self.singular_values) * self.v_t
    }
}
