use std::os::raw::c_void;

use rascaline::types::{Vector3D, Matrix3};
use rascaline::systems::{Pair, UnitCell};
use rascaline::{Error, System};

use crate::rascal_status_t;

/// Pair of atoms coming from a neighbor list
// WARNING: any change to this definition MUST be reflected in
// rascaline::systems::Pair as well
#[repr(C)]
#[derive(Debug, Clone, Copy)]
#[allow(non_camel_case_types)]
pub struct rascal_pair_t {
    /// index of the first atom in the pair
    pub first: usize,
    /// index of the second atom in the pair
    pub second: usize,
    /// vector from the first atom to the second atom, wrapped inside the unit
    /// cell as required by periodic boundary conditions.
    pub vector: [f64; 3],
}

/// A `rascal_system_t` deals with the storage of atoms and related information,
/// as well as the computation of neighbor lists.
///
/// This struct contains a manual implementation of a virtual table, allowing to
/// implement the rust `System` trait in C and other languages. Speaking in Rust
/// terms, `user_data` contains a pointer (analog to `Box<Self>`) to the struct
/// implementing the `System` trait; and then there is one function pointers
/// (`Option<unsafe extern fn(XXX)>`) for each function in the `System` trait.
///
/// All functions should return `RASCAL_SUCCESS` on success, and any other
/// status on error. A missing function or a failed call makes the calculation
/// fail with `RASCAL_SYSTEM_ERROR`.

// Function pointers have type `Option<unsafe extern fn(XXX)>`, where `Option`
// ensure that the `impl System for rascal_system_t` is forced to deal with the
// function pointer potentially being NULL. `unsafe` is required since these
// function come from another language and are not checked by the Rust compiler.
// Finally `extern` defaults to `extern "C"`, setting the ABI of the function to
// the default C ABI on the current system.
#[repr(C)]
#[allow(non_camel_case_types)]
pub struct rascal_system_t {
    /// User-provided data should be stored here, it will be passed as the
    /// first parameter to all function pointers below.
    pub user_data: *mut c_void,
    /// This function should set `*size` to the number of atoms in this system
    pub size: Option<unsafe extern fn(user_data: *const c_void, size: *mut usize) -> rascal_status_t>,
    /// This function should set `*species` to a pointer to the first element of
    /// a contiguous array containing the atomic species of each atom in the
    /// system. Different atomic species should be identified with a different
    /// value. These values are usually the atomic number, but don't have to be.
    /// The array should contain `rascal_system_t::size()` elements.
    pub species: Option<unsafe extern fn(user_data: *const c_void, species: *mut *const i32) -> rascal_status_t>,
    /// This function should set `*positions` to a pointer to the first element
    /// of a contiguous array containing the atomic cartesian coordinates.
    /// `positions[0], positions[1], positions[2]` must contain the x, y, z
    /// cartesian coordinates of the first atom, and so on.
    pub positions: Option<unsafe extern fn(user_data: *const c_void, positions: *mut *const f64) -> rascal_status_t>,
    /// This function should write the unit cell matrix in `cell`, which have
    /// space for 9 values. The cell should be written in row major order, i.e.
    /// `ax ay az bx by bz cx cy cz`, where a/b/c are the unit cell vectors. An
    /// all-zero matrix means there are no periodic boundary conditions.
    pub cell: Option<unsafe extern fn(user_data: *const c_void, cell: *mut f64) -> rascal_status_t>,
    /// This function should compute the neighbor list with the given cutoff,
    /// and store it for later access using `pairs` or `pairs_containing`.
    pub compute_neighbors: Option<unsafe extern fn(user_data: *mut c_void, cutoff: f64) -> rascal_status_t>,
    /// This function should set `*pairs` to a pointer to the first element of a
    /// contiguous array containing all pairs in this system; and `*count` to
    /// the size of the array/the number of pairs.
    ///
    /// This list of pair should only contain each pair once (and not twice as
    /// `i-j` and `j-i`), should not contain self pairs (`i-i`); and should only
    /// contains pairs where the distance between atoms is actually bellow the
    /// cutoff passed in the last call to `compute_neighbors`. This function is
    /// only valid to call after a call to `compute_neighbors`.
    pub pairs: Option<unsafe extern fn(user_data: *const c_void, pairs: *mut *const rascal_pair_t, count: *mut usize) -> rascal_status_t>,
    /// This function should set `*pairs` to a pointer to the first element of a
    /// contiguous array containing all pairs in this system containing the atom
    /// with index `center`; and `*count` to the size of the array/the number of
    /// pairs.
    ///
    /// The same restrictions on the list of pairs as `rascal_system_t::pairs`
    /// applies, with the additional condition that the pair `i-j` should be
    /// included both in the return of `pairs_containing(i)` and
    /// `pairs_containing(j)`.
    pub pairs_containing: Option<unsafe extern fn(user_data: *const c_void, center: usize, pairs: *mut *const rascal_pair_t, count: *mut usize) -> rascal_status_t>,
}

// The foreign implementation is required to support calls from multiple
// threads, the same way the `System` trait requires `Send + Sync`.
unsafe impl Send for rascal_system_t {}
unsafe impl Sync for rascal_system_t {}

fn missing_function(name: &str) -> Error {
    Error::System(format!("rascal_system_t.{} function is NULL", name))
}

fn check_status(status: rascal_status_t, name: &str) -> Result<(), Error> {
    if status.is_success() {
        Ok(())
    } else {
        Err(Error::System(format!(
            "call to rascal_system_t.{} failed with status {}", name, status as i32
        )))
    }
}

/// Build a slice from a pointer and length given by a foreign system,
/// checking for NULL pointers
unsafe fn foreign_slice<'a, T>(ptr: *const T, count: usize, name: &str) -> Result<&'a [T], Error> {
    if count == 0 {
        return Ok(&[]);
    }

    if ptr.is_null() {
        return Err(Error::System(format!(
            "rascal_system_t.{} returned a NULL pointer with non zero size", name
        )));
    }

    return Ok(std::slice::from_raw_parts(ptr, count));
}

impl System for rascal_system_t {
    fn size(&self) -> Result<usize, Error> {
        let function = self.size.ok_or_else(|| missing_function("size"))?;

        let mut value = 0;
        let status = unsafe {
            function(self.user_data, &mut value)
        };
        check_status(status, "size")?;

        return Ok(value);
    }

    fn species(&self) -> Result<&[i32], Error> {
        let function = self.species.ok_or_else(|| missing_function("species"))?;

        let mut ptr = std::ptr::null();
        let status = unsafe {
            function(self.user_data, &mut ptr)
        };
        check_status(status, "species")?;

        let size = self.size()?;
        unsafe {
            return foreign_slice(ptr, size, "species");
        }
    }

    fn positions(&self) -> Result<&[Vector3D], Error> {
        let function = self.positions.ok_or_else(|| missing_function("positions"))?;

        let mut ptr = std::ptr::null();
        let status = unsafe {
            function(self.user_data, &mut ptr)
        };
        check_status(status, "positions")?;

        let size = self.size()?;
        unsafe {
            // SAFETY: Vector3D is a transparent wrapper around [f64; 3]
            return foreign_slice(ptr.cast::<Vector3D>(), size, "positions");
        }
    }

    fn cell(&self) -> Result<UnitCell, Error> {
        let function = self.cell.ok_or_else(|| missing_function("cell"))?;

        let mut value = [[0.0; 3]; 3];
        let status = unsafe {
            function(self.user_data, value.as_mut_ptr().cast())
        };
        check_status(status, "cell")?;

        return UnitCell::try_from(Matrix3::from(value));
    }

    fn compute_neighbors(&mut self, cutoff: f64) -> Result<(), Error> {
        let function = self.compute_neighbors.ok_or_else(|| missing_function("compute_neighbors"))?;

        let status = unsafe {
            function(self.user_data, cutoff)
        };
        check_status(status, "compute_neighbors")
    }

    fn pairs(&self) -> Result<&[Pair], Error> {
        let function = self.pairs.ok_or_else(|| missing_function("pairs"))?;

        let mut ptr = std::ptr::null();
        let mut count = 0;
        let status = unsafe {
            function(self.user_data, &mut ptr, &mut count)
        };
        check_status(status, "pairs")?;

        unsafe {
            // SAFETY: Pair and rascal_pair_t have the same layout
            return foreign_slice(ptr.cast::<Pair>(), count, "pairs");
        }
    }

    fn pairs_containing(&self, center: usize) -> Result<&[Pair], Error> {
        let function = self.pairs_containing.ok_or_else(|| missing_function("pairs_containing"))?;

        let mut ptr = std::ptr::null();
        let mut count = 0;
        let status = unsafe {
            function(self.user_data, center, &mut ptr, &mut count)
        };
        check_status(status, "pairs_containing")?;

        unsafe {
            // SAFETY: Pair and rascal_pair_t have the same layout
            return foreign_slice(ptr.cast::<Pair>(), count, "pairs_containing");
        }
    }
}
