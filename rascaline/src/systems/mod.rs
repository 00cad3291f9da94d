use crate::{Error, Vector3D};

mod cell;
pub use self::cell::{UnitCell, CellShape};

mod neighbors;
pub use self::neighbors::NeighborsList;

mod simple_system;
pub use self::simple_system::SimpleSystem;

#[cfg(test)]
pub(crate) mod test_utils;

/// Pair of atoms coming from a neighbor list.
// WARNING: any change to this definition MUST be reflected in rascal_pair_t as
// well
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pair {
    /// index of the first atom in the pair
    pub first: usize,
    /// index of the second atom in the pair
    pub second: usize,
    /// vector from the first atom to the second atom, wrapped inside the unit
    /// cell using periodic boundary conditions
    pub vector: Vector3D,
}

impl Pair {
    /// Distance between the two atoms in this pair
    #[inline]
    pub fn distance(&self) -> f64 {
        self.vector.norm()
    }
}

/// A `System` deals with the storage of atoms and related information, as
/// well as the computation of neighbor lists.
///
/// Implementations only need to be valid for the duration of a calculation,
/// and the data they return can be borrowed from the implementation itself.
pub trait System: Send + Sync {
    /// Get the number of atoms in this system
    fn size(&self) -> Result<usize, Error>;

    /// Get the species for all atoms in this system. The returned value must
    /// be a slice of length `self.size()`, where each different atomic type is
    /// identified with a different integer value. These values are usually
    /// the atomic number, but don't have to be.
    fn species(&self) -> Result<&[i32], Error>;

    /// Get the positions for all atoms in this system. The returned value
    /// must be a slice of length `self.size()` containing the cartesian
    /// coordinates of all atoms in the system.
    fn positions(&self) -> Result<&[Vector3D], Error>;

    /// Get the unit cell for this system
    fn cell(&self) -> Result<UnitCell, Error>;

    /// Compute the neighbor list according to the given cutoff, and store it
    /// for later access with `pairs` or `pairs_containing`.
    fn compute_neighbors(&mut self, cutoff: f64) -> Result<(), Error>;

    /// Get the list of pairs in this system. This list of pair should only
    /// contain each pair once (and not twice as `i-j` and `j-i`), should not
    /// contain self pairs (`i-i`); and should only contains pairs where the
    /// distance between atoms is actually below the cutoff passed in the last
    /// call to `compute_neighbors`. This function is only valid to call after
    /// a call to `compute_neighbors`.
    fn pairs(&self) -> Result<&[Pair], Error>;

    /// Get the list of pairs in this system which include the atom at the
    /// given index. The same restrictions on the list of pairs as
    /// `System::pairs` applies, with the additional condition that the pair
    /// `i-j` should be included both in the return of `pairs_containing(i)`
    /// and `pairs_containing(j)`.
    fn pairs_containing(&self, atom: usize) -> Result<&[Pair], Error>;
}
