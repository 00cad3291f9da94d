use std::ops::{Index, IndexMut};

use super::Vector3D;

/// A 3x3 square matrix type, stored in row-major order.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Matrix3([[f64; 3]; 3]);

impl Matrix3 {
    /// Create a new `Matrix3` with the given `data`, where `data[i]` is the
    /// i-th row of the matrix.
    pub fn new(data: [[f64; 3]; 3]) -> Matrix3 {
        Matrix3(data)
    }

    /// Create a new `Matrix3` with all components set to 0
    pub fn zero() -> Matrix3 {
        Matrix3([[0.0; 3]; 3])
    }

    /// Create the 3x3 identity matrix
    pub fn one() -> Matrix3 {
        Matrix3([
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ])
    }

    /// Compute the determinant of this matrix
    pub fn determinant(&self) -> f64 {
        let m = &self.0;
        m[0][0] * (m[1][1] * m[2][2] - m[2][1] * m[1][2])
      - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
      + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Compute the inverse of this matrix
    ///
    /// # Panics
    ///
    /// If the matrix is not invertible
    pub fn inverse(&self) -> Matrix3 {
        let determinant = self.determinant();
        assert!(determinant.abs() > f64::EPSILON, "this matrix is not invertible");

        let m = &self.0;
        let inverse_det = 1.0 / determinant;
        let mut res = Matrix3::zero();
        res[0][0] = (m[1][1] * m[2][2] - m[2][1] * m[1][2]) * inverse_det;
        res[0][1] = (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inverse_det;
        res[0][2] = (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inverse_det;
        res[1][0] = (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inverse_det;
        res[1][1] = (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inverse_det;
        res[1][2] = (m[1][0] * m[0][2] - m[0][0] * m[1][2]) * inverse_det;
        res[2][0] = (m[1][0] * m[2][1] - m[2][0] * m[1][1]) * inverse_det;
        res[2][1] = (m[2][0] * m[0][1] - m[0][0] * m[2][1]) * inverse_det;
        res[2][2] = (m[0][0] * m[1][1] - m[1][0] * m[0][1]) * inverse_det;
        return res;
    }

    /// Get the transposed matrix
    pub fn transposed(&self) -> Matrix3 {
        let m = &self.0;
        Matrix3([
            [m[0][0], m[1][0], m[2][0]],
            [m[0][1], m[1][1], m[2][1]],
            [m[0][2], m[1][2], m[2][2]],
        ])
    }
}

impl From<[[f64; 3]; 3]> for Matrix3 {
    fn from(data: [[f64; 3]; 3]) -> Matrix3 {
        Matrix3(data)
    }
}

impl From<Matrix3> for [[f64; 3]; 3] {
    fn from(matrix: Matrix3) -> [[f64; 3]; 3] {
        matrix.0
    }
}

impl Index<usize> for Matrix3 {
    type Output = [f64; 3];
    #[inline]
    fn index(&self, index: usize) -> &[f64; 3] {
        &self.0[index]
    }
}

impl IndexMut<usize> for Matrix3 {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut [f64; 3] {
        &mut self.0[index]
    }
}

// matrix-vector product
impl_arithmetic!(
    Matrix3, Vector3D, Mul, mul, Vector3D, self, vector,
    Vector3D::new(
        self[0][0] * vector[0] + self[0][1] * vector[1] + self[0][2] * vector[2],
        self[1][0] * vector[0] + self[1][1] * vector[1] + self[1][2] * vector[2],
        self[2][0] * vector[0] + self[2][1] * vector[1] + self[2][2] * vector[2],
    )
);

// matrix-matrix product
impl_arithmetic!(
    Matrix3, Matrix3, Mul, mul, Matrix3, self, other,
    {
        let mut res = Matrix3::zero();
        for i in 0..3 {
            for j in 0..3 {
                res[i][j] = self[i][0] * other[0][j] + self[i][1] * other[1][j] + self[i][2] * other[2][j];
            }
        }
        res
    }
);
