use std::ffi::CString;
use std::collections::{BTreeSet, HashMap};

use crate::{Error, System};

/// A single value inside a set of indexes. Values are stored as 32-bit
/// integers, which can represent structure/atom indexes, atomic species or
/// feature components.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexValue(i32);

impl std::fmt::Debug for IndexValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for IndexValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for IndexValue {
    fn from(value: i32) -> IndexValue {
        IndexValue(value)
    }
}

impl From<usize> for IndexValue {
    fn from(value: usize) -> IndexValue {
        assert!(value <= i32::MAX as usize, "index value {} is too large", value);
        IndexValue(value as i32)
    }
}

impl IndexValue {
    /// Get this value as an `usize`, for values used as indexes in arrays
    pub fn usize(self) -> usize {
        debug_assert!(self.0 >= 0, "negative index value used as usize");
        self.0 as usize
    }

    /// Get this value as an `i32`
    pub fn i32(self) -> i32 {
        self.0
    }
}

/// Builder for `Indexes`, accumulating rows one at a time.
pub struct IndexesBuilder {
    /// Names of the variables
    names: Vec<String>,
    /// Values of the indexes, as a linearized 2D array in row-major order
    values: Vec<IndexValue>,
    /// Position of all rows added so far
    positions: HashMap<Vec<IndexValue>, usize>,
}

impl IndexesBuilder {
    /// Create a new empty `IndexesBuilder` with the given variable `names`.
    ///
    /// # Panics
    ///
    /// If any of the names is not a valid identifier, or if the same name is
    /// used more than once.
    pub fn new(names: Vec<&str>) -> IndexesBuilder {
        for name in &names {
            if !is_valid_ident(name) {
                panic!("all indexes names must be valid identifiers, '{}' is not", name);
            }
        }

        if names.iter().collect::<BTreeSet<_>>().len() != names.len() {
            panic!("invalid indexes: the same name is used multiple times");
        }

        IndexesBuilder {
            names: names.into_iter().map(|s| s.into()).collect(),
            values: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Get the number of variables in a single row
    pub fn size(&self) -> usize {
        self.names.len()
    }

    /// Get the number of rows added so far
    pub fn count(&self) -> usize {
        self.positions.len()
    }

    /// Add a single row with the given `values` to these indexes. The number
    /// of values must match the number of variables, and the row must not
    /// already be present.
    pub fn add(&mut self, values: &[IndexValue]) -> Result<(), Error> {
        if values.len() != self.size() {
            return Err(Error::InvalidParameter(format!(
                "wrong size for added index: got {}, but expected {}", values.len(), self.size()
            )));
        }

        if let Some(existing) = self.positions.get(values) {
            return Err(Error::InvalidParameter(format!(
                "can not have the same index value multiple time: [{}] is already present at position {}",
                display_values(values), existing
            )));
        }

        self.positions.insert(values.to_vec(), self.positions.len());
        self.values.extend_from_slice(values);
        return Ok(());
    }

    /// Finish building and get the corresponding `Indexes`
    pub fn finish(self) -> Indexes {
        let names = self.names.into_iter()
            .map(|name| CString::new(name).expect("names are valid identifiers"))
            .collect();

        return Indexes {
            names: names,
            values: self.values,
            positions: self.positions,
        };
    }
}

fn display_values(values: &[IndexValue]) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
}

fn is_valid_ident(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {},
        _ => return false,
    }

    return chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
}

/// A set of named variables (the columns) and the unique rows of values taken
/// by these variables. Row order is meaningful, and the position of a row can
/// be found in constant time.
#[derive(Clone, PartialEq)]
pub struct Indexes {
    /// Names of the variables, stored as C strings for easier integration
    /// with the C API
    names: Vec<CString>,
    /// Values of the indexes, as a linearized 2D array in row-major order
    values: Vec<IndexValue>,
    /// Position of all the rows
    positions: HashMap<Vec<IndexValue>, usize>,
}

impl std::fmt::Debug for Indexes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Indexes{{")?;
        writeln!(f, "    {}", self.names().join(", "))?;

        let widths = self.names().iter().map(|s| s.len()).collect::<Vec<_>>();
        for values in self {
            write!(f, "    ")?;
            for (value, width) in values.iter().zip(&widths) {
                write!(f, "{:^width$}  ", value.i32(), width=width)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "}}")?;
        Ok(())
    }
}

impl Indexes {
    /// Create indexes without any variable and without any row
    pub fn empty() -> Indexes {
        IndexesBuilder::new(Vec::new()).finish()
    }

    /// Get the number of variables in a single row
    pub fn size(&self) -> usize {
        self.names.len()
    }

    /// Names of the variables
    pub fn names(&self) -> Vec<&str> {
        self.names.iter().map(|s| s.to_str().expect("names are valid identifiers")).collect()
    }

    /// Names of the variables as C-compatible (null terminated) strings
    pub fn c_names(&self) -> &[CString] {
        &self.names
    }

    /// Number of rows in these indexes
    pub fn count(&self) -> usize {
        self.positions.len()
    }

    /// All the values in these indexes, as a row-major array of shape
    /// `count() x size()`
    pub fn as_slice(&self) -> &[IndexValue] {
        &self.values
    }

    /// Iterate over the rows in these indexes
    pub fn iter(&self) -> Iter<'_> {
        return Iter {
            size: self.size(),
            remaining: self.count(),
            values: &self.values,
        };
    }

    /// Check whether the given row is part of these indexes
    pub fn contains(&self, value: &[IndexValue]) -> bool {
        self.position(value).is_some()
    }

    /// Get the position of the given row in these indexes, or `None`
    pub fn position(&self, value: &[IndexValue]) -> Option<usize> {
        if value.len() != self.size() {
            return None;
        }

        self.positions.get(value).copied()
    }
}

/// Iterator over the rows of `Indexes`
pub struct Iter<'a> {
    size: usize,
    remaining: usize,
    values: &'a [IndexValue],
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a [IndexValue];
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let (value, rest) = self.values.split_at(self.size);
        self.values = rest;
        self.remaining -= 1;
        return Some(value);
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a> ExactSizeIterator for Iter<'a> {}

impl<'a> IntoIterator for &'a Indexes {
    type IntoIter = Iter<'a>;
    type Item = &'a [IndexValue];
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl std::ops::Index<usize> for Indexes {
    type Output = [IndexValue];
    fn index(&self, i: usize) -> &[IndexValue] {
        assert!(i < self.count(), "row {} is out of bounds for indexes with {} rows", i, self.count());
        let start = i * self.size();
        let stop = (i + 1) * self.size();
        &self.values[start..stop]
    }
}

/// Strategy to build the default set of environments for a calculation, and
/// the corresponding gradient rows.
///
/// The names of the gradient indexes always start with the names of the
/// environments, followed by the variables specific to gradients.
pub trait EnvironmentIndexes {
    /// Names of the variables in the environments produced by this strategy
    fn names(&self) -> Vec<&str>;

    /// Get the full set of environments for the given systems
    fn indexes(&self, systems: &mut [&mut dyn System]) -> Result<Indexes, Error>;

    /// Get the gradient rows associated with the given set of `environments`,
    /// or `None` if this strategy does not support gradients.
    #[allow(unused_variables)]
    fn gradients_for(&self, systems: &mut [&mut dyn System], environments: &Indexes) -> Result<Option<Indexes>, Error> {
        Ok(None)
    }

    /// Get both the full set of environments and the associated gradients
    fn with_gradients(&self, systems: &mut [&mut dyn System]) -> Result<(Indexes, Option<Indexes>), Error> {
        let environments = self.indexes(systems)?;
        let gradients = self.gradients_for(systems, &environments)?;
        return Ok((environments, gradients));
    }
}
