//! This module provides 3D vectors and matrix to be used in all other modules.

/// Implement `$Lhs $op $Rhs` for all combinations of by value and by reference
/// operands.
macro_rules! impl_arithmetic {
    ($Lhs:ty, $Rhs:ty, $Op:ident, $op:ident, $Output:ty, $sel:ident, $other:ident, $res:expr) => (
        impl std::ops::$Op<$Rhs> for $Lhs {
            type Output = $Output;
            #[inline] fn $op($sel, $other: $Rhs) -> $Output {
                $res
            }
        }

        impl<'a> std::ops::$Op<$Rhs> for &'a $Lhs {
            type Output = $Output;
            #[inline] fn $op($sel, $other: $Rhs) -> $Output {
                $res
            }
        }

        impl<'a> std::ops::$Op<&'a $Rhs> for $Lhs {
            type Output = $Output;
            #[inline] fn $op($sel, $other: &'a $Rhs) -> $Output {
                $res
            }
        }

        impl<'a, 'b> std::ops::$Op<&'a $Rhs> for &'b $Lhs {
            type Output = $Output;
            #[inline] fn $op($sel, $other: &'a $Rhs) -> $Output {
                $res
            }
        }
    );
}

/// Implement `$Lhs $op= $Rhs` for by value and by reference right-hand side.
macro_rules! impl_inplace_arithmetic {
    ($Lhs:ty, $Rhs:ty, $Op:ident, $op:ident, $sel:ident, $other:ident, $res:expr) => (
        impl std::ops::$Op<$Rhs> for $Lhs {
            #[inline] fn $op(&mut $sel, $other: $Rhs) {
                $res
            }
        }

        impl<'a> std::ops::$Op<&'a $Rhs> for $Lhs {
            #[inline] fn $op(&mut $sel, $other: &'a $Rhs) {
                $res
            }
        }
    )
}

mod vectors;
pub use self::vectors::Vector3D;

mod matrix;
pub use self::matrix::Matrix3;
