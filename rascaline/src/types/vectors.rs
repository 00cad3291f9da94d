use std::ops::{Deref, DerefMut, Neg};

use approx::{AbsDiffEq, RelativeEq, UlpsEq};

/// A 3-dimensional vector type
///
/// `Vector3D` is `repr(transparent)` over `[f64; 3]`, so slices of positions
/// coming from C (`const double*` with 3 values per atom) can be reinterpreted
/// as `&[Vector3D]`.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Vector3D([f64; 3]);

impl Vector3D {
    /// Create a new `Vector3D` with components `x`, `y`, `z`
    pub fn new(x: f64, y: f64, z: f64) -> Vector3D {
        Vector3D([x, y, z])
    }

    /// Create a new `Vector3D` with all components set to 0
    pub fn zero() -> Vector3D {
        Vector3D([0.0; 3])
    }

    /// Squared euclidean norm of the vector
    #[inline]
    pub fn norm2(&self) -> f64 {
        self * self
    }

    /// Euclidean norm of the vector
    #[inline]
    pub fn norm(&self) -> f64 {
        f64::sqrt(self.norm2())
    }

    /// Get a normalized version of this vector, with the same direction and
    /// unit norm.
    pub fn normalized(&self) -> Vector3D {
        self / self.norm()
    }
}

impl From<[f64; 3]> for Vector3D {
    fn from(array: [f64; 3]) -> Vector3D {
        Vector3D(array)
    }
}

impl From<Vector3D> for [f64; 3] {
    fn from(vector: Vector3D) -> [f64; 3] {
        vector.0
    }
}

impl Deref for Vector3D {
    type Target = [f64; 3];
    #[inline]
    fn deref(&self) -> &[f64; 3] {
        &self.0
    }
}

impl DerefMut for Vector3D {
    #[inline]
    fn deref_mut(&mut self) -> &mut [f64; 3] {
        &mut self.0
    }
}

impl_arithmetic!(
    Vector3D, Vector3D, Add, add, Vector3D, self, other,
    Vector3D::new(self[0] + other[0], self[1] + other[1], self[2] + other[2])
);

impl_arithmetic!(
    Vector3D, Vector3D, Sub, sub, Vector3D, self, other,
    Vector3D::new(self[0] - other[0], self[1] - other[1], self[2] - other[2])
);

// dot product
impl_arithmetic!(
    Vector3D, Vector3D, Mul, mul, f64, self, other,
    self[0] * other[0] + self[1] * other[1] + self[2] * other[2]
);

// cross product
impl_arithmetic!(
    Vector3D, Vector3D, BitXor, bitxor, Vector3D, self, other,
    Vector3D::new(
        self[1] * other[2] - self[2] * other[1],
        self[2] * other[0] - self[0] * other[2],
        self[0] * other[1] - self[1] * other[0],
    )
);

impl_arithmetic!(
    Vector3D, f64, Mul, mul, Vector3D, self, other,
    Vector3D::new(self[0] * other, self[1] * other, self[2] * other)
);

impl_arithmetic!(
    Vector3D, f64, Div, div, Vector3D, self, other,
    Vector3D::new(self[0] / other, self[1] / other, self[2] / other)
);

impl_inplace_arithmetic!(
    Vector3D, Vector3D, AddAssign, add_assign, self, other,
    {self[0] += other[0]; self[1] += other[1]; self[2] += other[2];}
);

impl_inplace_arithmetic!(
    Vector3D, Vector3D, SubAssign, sub_assign, self, other,
    {self[0] -= other[0]; self[1] -= other[1]; self[2] -= other[2];}
);

impl Neg for Vector3D {
    type Output = Vector3D;
    #[inline]
    fn neg(self) -> Vector3D {
        Vector3D::new(-self[0], -self[1], -self[2])
    }
}

impl AbsDiffEq for Vector3D {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Vector3D, epsilon: f64) -> bool {
        f64::abs_diff_eq(&self[0], &other[0], epsilon) &&
        f64::abs_diff_eq(&self[1], &other[1], epsilon) &&
        f64::abs_diff_eq(&self[2], &other[2], epsilon)
    }
}

impl RelativeEq for Vector3D {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Vector3D, epsilon: f64, max_relative: f64) -> bool {
        f64::relative_eq(&self[0], &other[0], epsilon, max_relative) &&
        f64::relative_eq(&self[1], &other[1], epsilon, max_relative) &&
        f64::relative_eq(&self[2], &other[2], epsilon, max_relative)
    }
}

impl UlpsEq for Vector3D {
    fn default_max_ulps() -> u32 {
        f64::default_max_ulps()
    }

    fn ulps_eq(&self, other: &Vector3D, epsilon: f64, max_ulps: u32) -> bool {
        f64::ulps_eq(&self[0], &other[0], epsilon, max_ulps) &&
        f64::ulps_eq(&self[1], &other[1], epsilon, max_ulps) &&
        f64::ulps_eq(&self[2], &other[2], epsilon, max_ulps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_ulps_eq;

    #[test]
    fn arithmetic() {
        let a = Vector3D::new(2.0, 3.5, 4.75);
        let b = Vector3D::new(6.25, -8.5, 7.25);

        assert_eq!(a + b, Vector3D::new(8.25, -5.0, 12.0));
        assert_eq!(a - b, Vector3D::new(-4.25, 12.0, -2.5));
        assert_eq!(&a - &b, Vector3D::new(-4.25, 12.0, -2.5));
        assert_eq!(a * 2.0, Vector3D::new(4.0, 7.0, 9.5));
        assert_eq!(a / 2.0, Vector3D::new(1.0, 1.75, 2.375));
        assert_eq!(-a, Vector3D::new(-2.0, -3.5, -4.75));

        let mut c = a;
        c += b;
        assert_eq!(c, a + b);
        c -= b;
        assert_eq!(c, a);
    }

    #[test]
    fn products() {
        let a = Vector3D::new(2.0, 3.5, 4.75);
        let b = Vector3D::new(6.25, -8.5, 7.25);
        assert_eq!(a * b, 17.1875);

        let x = Vector3D::new(1.0, 0.0, 0.0);
        let y = Vector3D::new(0.0, 1.0, 0.0);
        assert_eq!(x ^ y, Vector3D::new(0.0, 0.0, 1.0));
        assert_eq!(y ^ x, Vector3D::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn norm() {
        let a = Vector3D::new(3.0, 4.0, 0.0);
        assert_eq!(a.norm2(), 25.0);
        assert_eq!(a.norm(), 5.0);
        assert_ulps_eq!(a.normalized(), Vector3D::new(0.6, 0.8, 0.0));
    }
}
