use std::ops::{Deref, DerefMut};
use std::os::raw::c_char;
use std::ffi::{CStr, CString};

use rascaline::{Descriptor, Error, IndexesKind};

use crate::{catch_unwind, rascal_status_t};

/// Opaque type representing a `Descriptor`.
#[allow(non_camel_case_types)]
pub struct rascal_descriptor_t(Descriptor);

impl Deref for rascal_descriptor_t {
    type Target = Descriptor;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for rascal_descriptor_t {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Create a new empty descriptor.
///
/// All memory allocated by this function can be released using
/// `rascal_descriptor_free`.
///
/// @returns A pointer to the newly allocated descriptor, or a `NULL` pointer in
///          case of error. In case of error, you can use `rascal_last_error()`
///          to get the error message.
#[no_mangle]
pub unsafe extern fn rascal_descriptor() -> *mut rascal_descriptor_t {
    let mut raw = std::ptr::null_mut();
    let unwind_wrapper = std::panic::AssertUnwindSafe(&mut raw);
    let status = catch_unwind(move || {
        let unwind_wrapper = unwind_wrapper;
        let boxed = Box::new(rascal_descriptor_t(Descriptor::new()));
        *unwind_wrapper.0 = Box::into_raw(boxed);
        Ok(())
    });

    if !status.is_success() {
        return std::ptr::null_mut();
    }

    return raw;
}

/// Free the memory associated with a `descriptor` previously created with
/// `rascal_descriptor`.
///
/// If `descriptor` is `NULL`, this function does nothing.
///
/// @param descriptor pointer to an existing descriptor, or `NULL`
///
/// @returns The status code of this operation. If the status is not
///          `RASCAL_SUCCESS`, you can use `rascal_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn rascal_descriptor_free(descriptor: *mut rascal_descriptor_t) -> rascal_status_t {
    catch_unwind(|| {
        if !descriptor.is_null() {
            let boxed = Box::from_raw(descriptor);
            std::mem::drop(boxed);
        }
        Ok(())
    })
}

/// Get the values stored inside this descriptor after a call to
/// `rascal_calculator_compute`.
///
/// This function sets `*data` to a **read only** pointer containing the address
/// of first element of the 2D array containing the values, `*environments` to
/// the size of the first axis of this array and `*features` to the size of the
/// second axis of the array. The array is stored using a row-major layout.
///
/// Calling this function on a descriptor that was never used in a calculation
/// returns `RASCAL_INVALID_PARAMETER_ERROR`.
///
/// @param descriptor pointer to an existing descriptor
/// @param data pointer to a pointer to a double, will be set to the address of
///             the first element in the values array
/// @param environments pointer to a single integer, will be set to the first
///                     dimension of the values array
/// @param features pointer to a single integer, will be set to the second
///                 dimension of the values array
///
/// @returns The status code of this operation. If the status is not
///          `RASCAL_SUCCESS`, you can use `rascal_last_error()` to get the full
///          error message.
#[no_mangle]
pub unsafe extern fn rascal_descriptor_values(
    descriptor: *const rascal_descriptor_t,
    data: *mut *const f64,
    environments: *mut usize,
    features: *mut usize,
) -> rascal_status_t {
    catch_unwind(|| {
        check_pointers!(descriptor, data, environments, features);

        let values = (*descriptor).values()?;
        if values.is_empty() {
            *data = std::ptr::null();
        } else {
            *data = values.as_ptr();
        }

        let shape = values.shape();
        *environments = shape[0];
        *features = shape[1];

        Ok(())
    })
}

/// Get the gradients stored inside this descriptor after a call to
/// `rascal_calculator_compute`, if any.
///
/// This function sets `*data` to to a **read only** pointer containing the
/// address of the first element of the 2D array containing the gradients,
/// `*gradients` to the size of the first axis of this array and `*features`
/// to the size of the second axis of the array. The array is stored using a
/// row-major layout.
///
/// If this descriptor does not contain gradient data, `*data` is set to `NULL`,
/// while `*gradients` and `*features` are set to 0.
///
/// @param descriptor pointer to an existing descriptor
/// @param data pointer to a pointer to a double, will be set to the address of
///             the first element in the gradients array
/// @param gradients pointer to a single integer, will be set to the first
///                  dimension of the gradients array
/// @param features pointer to a single integer, will be set to the second
///                 dimension of the gradients array
///
/// @returns The status code of this operation. If the status is not
///          `RASCAL_SUCCESS`, you can use `rascal_last_error()` to get the full
///          error message.
#[no_mangle]
pub unsafe extern fn rascal_descriptor_gradients(
    descriptor: *const rascal_descriptor_t,
    data: *mut *const f64,
    gradients: *mut usize,
    features: *mut usize,
) -> rascal_status_t {
    catch_unwind(|| {
        check_pointers!(descriptor, data, gradients, features);

        match (*descriptor).gradients() {
            Some(array) => {
                if array.is_empty() {
                    *data = std::ptr::null();
                } else {
                    *data = array.as_ptr();
                }
                let shape = array.shape();
                *gradients = shape[0];
                *features = shape[1];
            }
            None => {
                *data = std::ptr::null();
                *gradients = 0;
                *features = 0;
            }
        }

        Ok(())
    })
}

/// The different kinds of indexes that can exist on a `rascal_descriptor_t`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum rascal_indexes {
    /// The feature index, describing the features of the representation
    RASCAL_INDEXES_FEATURES = 0,
    /// The environment index, describing the rows of the values
    RASCAL_INDEXES_ENVIRONMENTS = 1,
    /// The gradient index, describing the rows of the gradients
    RASCAL_INDEXES_GRADIENTS = 2,
}

impl From<rascal_indexes> for IndexesKind {
    fn from(indexes: rascal_indexes) -> IndexesKind {
        match indexes {
            rascal_indexes::RASCAL_INDEXES_FEATURES => IndexesKind::Features,
            rascal_indexes::RASCAL_INDEXES_ENVIRONMENTS => IndexesKind::Environments,
            rascal_indexes::RASCAL_INDEXES_GRADIENTS => IndexesKind::Gradients,
        }
    }
}

/// Get the values associated with one of the `indexes` in the given
/// `descriptor`.
///
/// This function sets `*data` to to a **read only** pointer containing the
/// address of the first element of the 2D array containing the index values,
/// `*count` to the number of indexes (first dimension of the array) and `*size`
/// to the size of each index (second dimension of the array). The array is
/// stored using a row-major layout.
///
/// If this `descriptor` does not contain gradient data, and `indexes` is
/// `RASCAL_INDEXES_GRADIENTS`, `*data` is set to `NULL`, while `*count` and
/// `*size` are set to 0.
///
/// @param descriptor pointer to an existing descriptor
/// @param indexes type of indexes requested
/// @param data pointer to a pointer to an integer, will be set to the address
///             of the first element in the index array
/// @param count pointer to a single integer, will be set to the number of
///              index values
/// @param size pointer to a single integer, will be set to the size of each
///              index value
///
/// @returns The status code of this operation. If the status is not
///          `RASCAL_SUCCESS`, you can use `rascal_last_error()` to get the full
///          error message.
#[no_mangle]
pub unsafe extern fn rascal_descriptor_indexes(
    descriptor: *const rascal_descriptor_t,
    indexes: rascal_indexes,
    data: *mut *const i32,
    count: *mut usize,
    size: *mut usize,
) -> rascal_status_t {
    catch_unwind(|| {
        check_pointers!(descriptor, data, count, size);

        match (*descriptor).indexes(indexes.into()) {
            Some(indexes) => {
                *size = indexes.size();
                *count = indexes.count();

                let values = indexes.as_slice();
                if values.is_empty() {
                    *data = std::ptr::null();
                } else {
                    // SAFETY: IndexValue is a transparent wrapper around i32
                    *data = values.as_ptr().cast();
                }
            }
            None => {
                *data = std::ptr::null();
                *count = 0;
                *size = 0;
            }
        }

        Ok(())
    })
}

/// Get the names associated with one of the `indexes` in the given
/// `descriptor`.
///
/// The `size` value should correspond to the value set by
/// `rascal_descriptor_indexes` in the `size` parameter. If `size` is larger
/// than the number of names, the remaining entries are set to `NULL`. If this
/// `descriptor` does not contain gradient data, and `indexes` is
/// `RASCAL_INDEXES_GRADIENTS`, each pointer in `*names` is set to `NULL`.
///
/// @param descriptor pointer to an existing descriptor
/// @param indexes type of indexes requested
/// @param names pointer to the first element of an array of `const char*`
///              that will be filled with **read only** pointers to the index
///              names
/// @param size size of the `names` array, i.e. number of elements inside
///             the array
///
/// @returns The status code of this operation. If the status is not
///          `RASCAL_SUCCESS`, you can use `rascal_last_error()` to get the full
///          error message. If `size` is too small for all the names, this
///          returns `RASCAL_INVALID_PARAMETER_ERROR`.
#[no_mangle]
pub unsafe extern fn rascal_descriptor_indexes_names(
    descriptor: *const rascal_descriptor_t,
    indexes: rascal_indexes,
    names: *mut *const c_char,
    size: usize,
) -> rascal_status_t {
    catch_unwind(|| {
        check_pointers!(descriptor, names);

        let c_names: &[CString] = match (*descriptor).indexes(indexes.into()) {
            Some(indexes) => indexes.c_names(),
            None => &[],
        };

        if c_names.len() > size {
            return Err(Error::InvalidParameter(format!(
                "names array is too small: got space for {} names, need {}",
                size, c_names.len()
            )));
        }

        for i in 0..size {
            let name = c_names.get(i).map_or(std::ptr::null(), |name| name.as_ptr());
            names.add(i).write(name);
        }

        Ok(())
    })
}

/// Collect an array of C strings into a vector of `&str`
unsafe fn c_variables<'a>(variables: *const *const c_char, count: usize) -> Result<Vec<&'a str>, Error> {
    if count == 0 {
        return Ok(Vec::new());
    }
    check_pointers!(variables);

    let mut rust_variables = Vec::with_capacity(count);
    for &variable in std::slice::from_raw_parts(variables, count) {
        check_pointers!(variable);
        rust_variables.push(CStr::from_ptr(variable).to_str()?);
    }

    return Ok(rust_variables);
}

/// Move the given `variables` from the features to the environments of this
/// `descriptor`. Each environment is split in one environment per distinct
/// value taken by these variables, and the missing values are filled with
/// zeros.
///
/// @param descriptor pointer to an existing descriptor
/// @param variables array of NULL-terminated strings containing the names of
///                  the variables to move
/// @param count number of entries in the `variables` array
///
/// @returns The status code of this operation. If the status is not
///          `RASCAL_SUCCESS`, you can use `rascal_last_error()` to get the full
///          error message.
#[no_mangle]
pub unsafe extern fn rascal_descriptor_densify(
    descriptor: *mut rascal_descriptor_t,
    variables: *const *const c_char,
    count: usize,
) -> rascal_status_t {
    catch_unwind(|| {
        check_pointers!(descriptor);
        let variables = c_variables(variables, count)?;
        (*descriptor).densify(&variables)
    })
}

/// Move the given `variables` from the environments to the features of this
/// `descriptor`. Environments which differ only by the values of these
/// variables are merged into a single row, and the missing values are filled
/// with zeros.
///
/// @param descriptor pointer to an existing descriptor
/// @param variables array of NULL-terminated strings containing the names of
///                  the variables to move
/// @param count number of entries in the `variables` array
///
/// @returns The status code of this operation. If the status is not
///          `RASCAL_SUCCESS`, you can use `rascal_last_error()` to get the full
///          error message.
#[no_mangle]
pub unsafe extern fn rascal_descriptor_densify_to_features(
    descriptor: *mut rascal_descriptor_t,
    variables: *const *const c_char,
    count: usize,
) -> rascal_status_t {
    catch_unwind(|| {
        check_pointers!(descriptor);
        let variables = c_variables(variables, count)?;
        (*descriptor).densify_to_features(&variables)
    })
}
