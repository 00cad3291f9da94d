//! The `UnitCell` type represents the periodic box around a system, or the
//! absence of such a box for open systems.
use crate::{Error, Matrix3, Vector3D};

/// Kind of periodic boundary conditions applied by a [`UnitCell`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellShape {
    /// No periodic boundary conditions
    Infinite,
    /// Cuboid cell, with all cell vectors along the cartesian axes
    Orthorhombic,
    /// Any parallelepiped cell
    Triclinic,
}

/// `UnitCell` stores the three cell vectors of a periodic system, as the rows
/// of a 3x3 matrix. A matrix full of zeros describes an infinite cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitCell {
    /// cell vectors, one per row
    matrix: Matrix3,
    /// transpose of `matrix`, used to go from fractional to cartesian
    to_cartesian: Matrix3,
    /// inverse of `to_cartesian`, used to go from cartesian to fractional
    to_fractional: Matrix3,
    shape: CellShape,
}

impl TryFrom<Matrix3> for UnitCell {
    type Error = Error;

    /// Create a cell from a matrix containing the cell vectors as rows. The
    /// zero matrix gives an infinite cell, any other matrix must have a
    /// positive determinant.
    fn try_from(matrix: Matrix3) -> Result<UnitCell, Error> {
        let is_zero = |value: f64| value.abs() < 1e-12;
        if (0..3).all(|i| (0..3).all(|j| is_zero(matrix[i][j]))) {
            return Ok(UnitCell::infinite());
        }

        let determinant = matrix.determinant();
        if determinant <= 1e-6 {
            return Err(Error::InvalidParameter(format!(
                "the unit cell matrix must have a positive determinant, got {}", determinant
            )));
        }

        let is_small = |value: f64| value.abs() < 1e-6;
        let off_diagonal = [matrix[0][1], matrix[0][2], matrix[1][0], matrix[1][2], matrix[2][0], matrix[2][1]];
        let shape = if off_diagonal.iter().all(|&v| is_small(v)) {
            CellShape::Orthorhombic
        } else {
            CellShape::Triclinic
        };

        let to_cartesian = matrix.transposed();
        Ok(UnitCell {
            matrix: matrix,
            to_cartesian: to_cartesian,
            to_fractional: to_cartesian.inverse(),
            shape: shape,
        })
    }
}

impl UnitCell {
    /// Create an infinite unit cell, without periodic boundary conditions
    pub fn infinite() -> UnitCell {
        UnitCell {
            matrix: Matrix3::zero(),
            to_cartesian: Matrix3::zero(),
            to_fractional: Matrix3::zero(),
            shape: CellShape::Infinite,
        }
    }

    /// Create an orthorhombic unit cell with side lengths `a, b, c`.
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> UnitCell {
        assert!(a > 0.0 && b > 0.0 && c > 0.0, "cell lengths must be positive");
        let matrix = Matrix3::new([
            [a, 0.0, 0.0],
            [0.0, b, 0.0],
            [0.0, 0.0, c],
        ]);

        UnitCell {
            matrix: matrix,
            to_cartesian: matrix,
            to_fractional: Matrix3::new([
                [1.0 / a, 0.0, 0.0],
                [0.0, 1.0 / b, 0.0],
                [0.0, 0.0, 1.0 / c],
            ]),
            shape: CellShape::Orthorhombic,
        }
    }

    /// Create a cubic unit cell with side length `length`.
    pub fn cubic(length: f64) -> UnitCell {
        UnitCell::orthorhombic(length, length, length)
    }

    /// Create a triclinic unit cell from the side lengths `a, b, c` and the
    /// angles `alpha, beta, gamma` (in degrees). The first cell vector is
    /// aligned with x, and the second one is in the xy plane.
    pub fn triclinic(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> UnitCell {
        assert!(a > 0.0 && b > 0.0 && c > 0.0, "cell lengths must be positive");
        let cos_alpha = alpha.to_radians().cos();
        let cos_beta = beta.to_radians().cos();
        let (sin_gamma, cos_gamma) = gamma.to_radians().sin_cos();

        let c_x = c * cos_beta;
        let c_y = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let c_z = f64::sqrt(c * c - c_x * c_x - c_y * c_y);

        let matrix = Matrix3::new([
            [a, 0.0, 0.0],
            [b * cos_gamma, b * sin_gamma, 0.0],
            [c_x, c_y, c_z],
        ]);

        match UnitCell::try_from(matrix) {
            Ok(cell) => cell,
            Err(e) => panic!("invalid triclinic cell parameters: {}", e),
        }
    }

    /// Get the shape of this cell
    pub fn shape(&self) -> CellShape {
        self.shape
    }

    /// Is this cell infinite, *i.e.* without periodic boundary conditions?
    pub fn is_infinite(&self) -> bool {
        self.shape == CellShape::Infinite
    }

    /// Get the cell matrix, with the cell vectors as rows
    pub fn matrix(&self) -> Matrix3 {
        self.matrix
    }

    /// Get the volume of this cell, 0 for infinite cells
    pub fn volume(&self) -> f64 {
        match self.shape {
            CellShape::Infinite => 0.0,
            CellShape::Orthorhombic => self.matrix[0][0] * self.matrix[1][1] * self.matrix[2][2],
            CellShape::Triclinic => self.matrix.determinant(),
        }
    }

    /// Get the distances between opposite faces of the cell. This is the
    /// largest sphere diameter that fits inside the cell along each cell
    /// vector. Infinite cells have infinite distances.
    pub fn distances_between_faces(&self) -> Vector3D {
        if self.is_infinite() {
            return Vector3D::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        }

        let a = Vector3D::from(self.matrix[0]);
        let b = Vector3D::from(self.matrix[1]);
        let c = Vector3D::from(self.matrix[2]);

        let volume = self.volume();
        Vector3D::new(
            volume / (b ^ c).norm(),
            volume / (c ^ a).norm(),
            volume / (a ^ b).norm(),
        )
    }

    /// Get the fractional coordinates of `vector` in this cell
    pub fn fractional(&self, vector: Vector3D) -> Vector3D {
        self.to_fractional * vector
    }

    /// Get the cartesian coordinates corresponding to the `fractional`
    /// coordinates in this cell
    pub fn cartesian(&self, fractional: Vector3D) -> Vector3D {
        self.to_cartesian * fractional
    }

    /// Wrap `vector` inside the cell, such that its fractional coordinates are
    /// all in `[0, 1)`.
    pub fn wrap_vector(&self, vector: &mut Vector3D) {
        match self.shape {
            CellShape::Infinite => {},
            CellShape::Orthorhombic => {
                for i in 0..3 {
                    let length = self.matrix[i][i];
                    vector[i] -= f64::floor(vector[i] / length) * length;
                }
            }
            CellShape::Triclinic => {
                let mut fractional = self.fractional(*vector);
                for x in fractional.iter_mut() {
                    *x -= x.floor();
                }
                *vector = self.cartesian(fractional);
            }
        }
    }

    /// Replace `vector` with its minimum image in this cell, such that its
    /// fractional coordinates are all in `[-0.5, 0.5]`.
    pub fn vector_image(&self, vector: &mut Vector3D) {
        match self.shape {
            CellShape::Infinite => {},
            CellShape::Orthorhombic => {
                for i in 0..3 {
                    let length = self.matrix[i][i];
                    vector[i] -= f64::round(vector[i] / length) * length;
                }
            }
            CellShape::Triclinic => {
                let mut fractional = self.fractional(*vector);
                for x in fractional.iter_mut() {
                    *x -= x.round();
                }
                *vector = self.cartesian(fractional);
            }
        }
    }

    /// Distance between the points `u` and `v`, accounting for periodic
    /// boundary conditions.
    pub fn distance(&self, u: Vector3D, v: Vector3D) -> f64 {
        let mut vector = v - u;
        self.vector_image(&mut vector);
        return vector.norm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_relative_eq, assert_ulps_eq};

    #[test]
    #[should_panic(expected = "cell lengths must be positive")]
    fn negative_lengths() {
        let _ = UnitCell::orthorhombic(3.0, 0.0, -5.0);
    }

    #[test]
    fn from_matrix() {
        let cell = UnitCell::try_from(Matrix3::zero()).unwrap();
        assert_eq!(cell.shape(), CellShape::Infinite);
        assert_eq!(cell.volume(), 0.0);

        let cell = UnitCell::try_from(Matrix3::new([
            [3.0, 0.0, 0.0],
            [0.0, 4.0, 0.0],
            [0.0, 0.0, 5.0],
        ])).unwrap();
        assert_eq!(cell.shape(), CellShape::Orthorhombic);
        assert_eq!(cell.volume(), 60.0);

        let cell = UnitCell::try_from(Matrix3::new([
            [0.0, 1.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 0.0],
        ])).unwrap();
        assert_eq!(cell.shape(), CellShape::Triclinic);
        assert_eq!(cell.volume(), 2.0);

        let singular = Matrix3::new([
            [1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
        ]);
        let error = UnitCell::try_from(singular).unwrap_err();
        assert!(matches!(error, Error::InvalidParameter(_)));
    }

    #[test]
    fn triclinic() {
        let cell = UnitCell::triclinic(3.0, 4.0, 5.0, 80.0, 90.0, 110.0);
        assert_eq!(cell.shape(), CellShape::Triclinic);
        assert_eq!(cell.matrix()[0], [3.0, 0.0, 0.0]);
        assert_eq!(cell.matrix()[1][2], 0.0);
        assert_relative_eq!(cell.volume(), 55.410529, epsilon = 1e-6);

        let cell = UnitCell::triclinic(3.0, 4.0, 5.0, 90.0, 90.0, 90.0);
        assert_eq!(cell.shape(), CellShape::Orthorhombic);
    }

    #[test]
    fn distances_between_faces() {
        let cell = UnitCell::orthorhombic(3.0, 4.0, 5.0);
        assert_eq!(cell.distances_between_faces(), Vector3D::new(3.0, 4.0, 5.0));

        let cell = UnitCell::triclinic(3.0, 4.0, 5.0, 90.0, 80.0, 100.0);
        assert_relative_eq!(
            cell.distances_between_faces(),
            Vector3D::new(2.908132319388713, 3.9373265973230853, 4.921658246653857),
            epsilon = 1e-12
        );

        let distances = UnitCell::infinite().distances_between_faces();
        assert!(distances.iter().all(|d| d.is_infinite()));
    }

    #[test]
    fn fractional_cartesian() {
        let cell = UnitCell::cubic(5.0);
        assert_eq!(cell.fractional(Vector3D::new(0.0, 10.0, 4.0)), Vector3D::new(0.0, 2.0, 0.8));
        assert_eq!(cell.cartesian(Vector3D::new(0.0, 2.0, 0.8)), Vector3D::new(0.0, 10.0, 4.0));

        let cell = UnitCell::triclinic(5.0, 6.0, 3.6, 90.0, 53.0, 77.0);
        for vector in [Vector3D::new(0.0, 10.0, 4.0), Vector3D::new(-5.0, 12.0, 4.9)] {
            assert_ulps_eq!(cell.cartesian(cell.fractional(vector)), vector, epsilon = 1e-14);
        }
    }

    #[test]
    fn periodic_images() {
        let cell = UnitCell::cubic(10.0);
        let mut vector = Vector3D::new(9.0, 18.0, -6.0);
        cell.wrap_vector(&mut vector);
        assert_eq!(vector, Vector3D::new(9.0, 8.0, 4.0));

        let mut vector = Vector3D::new(9.0, 18.0, -6.0);
        cell.vector_image(&mut vector);
        assert_eq!(vector, Vector3D::new(-1.0, -2.0, 4.0));

        let cell = UnitCell::infinite();
        let mut vector = Vector3D::new(9.0, 18.0, -6.0);
        cell.wrap_vector(&mut vector);
        cell.vector_image(&mut vector);
        assert_eq!(vector, Vector3D::new(9.0, 18.0, -6.0));
    }

    #[test]
    fn distance() {
        let cell = UnitCell::orthorhombic(3.0, 4.0, 5.0);
        let u = Vector3D::zero();
        let v = Vector3D::new(1.0, 2.0, 6.0);
        assert_eq!(cell.distance(u, v), f64::sqrt(6.0));

        assert_eq!(UnitCell::infinite().distance(u, v), v.norm());
    }
}
