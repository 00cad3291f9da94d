use std::collections::{BTreeMap, HashSet};
use std::convert::TryFrom;

use once_cell::sync::Lazy;

use crate::descriptor::{Descriptor, Indexes, IndexesBuilder};
use crate::{SimpleSystem, System, Error};

use crate::calculators::CalculatorBase;

/// Rules to select indexes (either environments or features) on which the
/// user wants to run a calculation
#[derive(Clone, Copy, Debug)]
pub enum SelectedIndexes<'a> {
    /// Default, use all possible indexes
    All,
    /// Select a subset of the default indexes by row position. The rows will
    /// appear in the descriptor in the same order as in this list.
    Rows(&'a [usize]),
    /// Select a subset of the default indexes by value. The names of the
    /// variables in these indexes must match the default ones, and all values
    /// must be part of the default indexes.
    Values(&'a Indexes),
}

impl<'a> SelectedIndexes<'a> {
    /// Apply this selection to the `default` set of indexes
    fn select(&self, kind: &str, default: Indexes) -> Result<Indexes, Error> {
        match *self {
            SelectedIndexes::All => Ok(default),
            SelectedIndexes::Rows(rows) => {
                let mut seen = HashSet::new();
                let mut builder = IndexesBuilder::new(default.names());
                for &row in rows {
                    if row >= default.count() {
                        return Err(Error::InvalidParameter(format!(
                            "selected {} row {} is out of bounds: there are only {} {}",
                            kind, row, default.count(), kind
                        )));
                    }

                    if !seen.insert(row) {
                        return Err(Error::InvalidParameter(format!(
                            "selected {} row {} is present multiple times", kind, row
                        )));
                    }

                    builder.add(&default[row])?;
                }
                Ok(builder.finish())
            }
            SelectedIndexes::Values(selection) => {
                if selection.names() != default.names() {
                    return Err(Error::InvalidParameter(format!(
                        "invalid names for selected {}: expected [{}], got [{}]",
                        kind, default.names().join(", "), selection.names().join(", ")
                    )));
                }

                for value in selection {
                    if !default.contains(value) {
                        return Err(Error::InvalidParameter(format!(
                            "selected {} [{}] is not part of the default {} for this calculator",
                            kind,
                            value.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "),
                            kind
                        )));
                    }
                }
                Ok(selection.clone())
            }
        }
    }
}

/// Parameters specific to a single call to `compute`
#[derive(Debug, Clone, Copy)]
pub struct CalculationOptions<'a> {
    /// Copy the data from systems into native `SimpleSystem`. This can be
    /// faster than having to cross the FFI boundary too often.
    pub use_native_system: bool,
    /// Selection of environments on which to run the computation
    pub selected_samples: SelectedIndexes<'a>,
    /// Selection of features to compute for the environments
    pub selected_features: SelectedIndexes<'a>,
}

impl<'a> Default for CalculationOptions<'a> {
    fn default() -> CalculationOptions<'a> {
        CalculationOptions {
            use_native_system: false,
            selected_samples: SelectedIndexes::All,
            selected_features: SelectedIndexes::All,
        }
    }
}

/// The `Calculator` is the main entry point to compute descriptors: it wraps
/// one of the registered implementations, created from its name and JSON
/// parameters.
pub struct Calculator {
    implementation: Box<dyn CalculatorBase>,
    parameters: String,
}

impl std::fmt::Debug for Calculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Calculator")
            .field("name", &self.implementation.name())
            .field("parameters", &self.parameters)
            .finish()
    }
}

impl Calculator {
    /// Create a new calculator with the given `name` and `parameters`.
    ///
    /// The list of available calculators and the corresponding parameters are
    /// in the main documentation. The `parameters` should be formatted as JSON.
    ///
    /// # Errors
    ///
    /// This function returns an error if there is no registered calculator with
    /// the given `name`, or if the parameters are invalid for this calculator.
    pub fn new(name: &str, parameters: String) -> Result<Calculator, Error> {
        let creator = match REGISTERED_CALCULATORS.get(name) {
            Some(creator) => creator,
            None => {
                return Err(Error::InvalidParameter(
                    format!("unknown calculator with name '{}'", name)
                ));
            }
        };

        let implementation = creator(&parameters)?;
        implementation.validate()?;

        return Ok(Calculator {
            implementation: implementation,
            parameters: parameters,
        })
    }

    /// Get the name of this calculator
    pub fn name(&self) -> String {
        self.implementation.name()
    }

    /// Get the parameters used to create this calculator in a string, formatted
    /// as JSON.
    pub fn parameters(&self) -> &str {
        &self.parameters
    }

    /// Compute the descriptor for all the given `systems` and store it in
    /// `descriptor`, using the given `options` to select a subset of the
    /// environments and features.
    #[time_graph::instrument(name = "Calculator::compute")]
    pub fn compute(
        &mut self,
        systems: &mut [&mut dyn System],
        descriptor: &mut Descriptor,
        options: CalculationOptions,
    ) -> Result<(), Error> {
        if options.use_native_system {
            let mut native_systems = Vec::with_capacity(systems.len());
            for system in systems.iter() {
                native_systems.push(SimpleSystem::try_from(&**system as &dyn System)?);
            }

            let mut references = native_systems.iter_mut()
                .map(|system| system as &mut dyn System)
                .collect::<Vec<_>>();

            return self.compute_impl(&mut references, descriptor, options);
        }

        return self.compute_impl(systems, descriptor, options);
    }

    fn compute_impl(
        &mut self,
        systems: &mut [&mut dyn System],
        descriptor: &mut Descriptor,
        options: CalculationOptions,
    ) -> Result<(), Error> {
        descriptor.computed = false;

        let environments_builder = self.implementation.environments();
        let environments = environments_builder.indexes(systems)?;
        let environments = options.selected_samples.select("environments", environments)?;

        let features = self.implementation.features();
        let features = options.selected_features.select("features", features)?;

        log::debug!(
            "computing {} with {} environments and {} features on {} systems",
            self.name(), environments.count(), features.count(), systems.len()
        );

        if self.implementation.compute_gradients() {
            let gradients = environments_builder.gradients_for(systems, &environments)?;
            let gradients = gradients.ok_or_else(|| Error::Internal(format!(
                "{} requires gradients, but its environments do not support them", self.name()
            )))?;
            descriptor.prepare_gradients(environments, features, gradients)?;
        } else {
            descriptor.prepare(environments, features);
        }

        self.implementation.compute(systems, descriptor)?;
        descriptor.computed = true;

        return Ok(());
    }
}

// Registration of calculator implementations
use crate::calculators::{DummyCalculator, SortedDistances};
type CalculatorCreator = fn(&str) -> Result<Box<dyn CalculatorBase>, Error>;

macro_rules! add_calculator {
    ($map :expr, $name :literal, $type :ty) => (
        $map.insert($name, (|json| {
            let value = serde_json::from_str::<$type>(json)?;
            Ok(Box::new(value))
        }) as CalculatorCreator);
    );
}

static REGISTERED_CALCULATORS: Lazy<BTreeMap<&'static str, CalculatorCreator>> = Lazy::new(|| {
    let mut map = BTreeMap::new();
    add_calculator!(map, "dummy_calculator", DummyCalculator);
    add_calculator!(map, "sorted_distances", SortedDistances);
    return map;
});
