use crate::descriptor::{Descriptor, Indexes, EnvironmentIndexes};
use crate::{Error, System};

/// The actual implementation of a descriptor, wrapped by `Calculator`.
///
/// `std::panic::RefUnwindSafe` is a required super-trait to enable passing
/// calculators across the C API.
pub trait CalculatorBase: std::panic::RefUnwindSafe {
    /// Get the name of this Calculator
    fn name(&self) -> String;

    /// Get the default set of features for this Calculator
    fn features(&self) -> Indexes;

    /// Get the strategy used to build the default set of environments for this
    /// Calculator, and the associated gradients
    fn environments(&self) -> Box<dyn EnvironmentIndexes>;

    /// Does this calculator compute gradients?
    fn compute_gradients(&self) -> bool;

    /// Check the parameters of this calculator after deserialization. This
    /// should return `Error::InvalidParameter` for values with the right type
    /// but an invalid meaning, such as a negative cutoff.
    fn validate(&self) -> Result<(), Error>;

    /// Core implementation of the descriptor.
    ///
    /// This function should compute the descriptor only for environments in
    /// `descriptor.environments()` and only for features in
    /// `descriptor.features()`. These can be the full default sets, or a
    /// subset selected by the user. The descriptor arrays are already
    /// allocated and filled with zeros.
    fn compute(&mut self, systems: &mut [&mut dyn System], descriptor: &mut Descriptor) -> Result<(), Error>;
}

/// Check that a cutoff given by the user is positive and finite
fn check_cutoff(cutoff: f64) -> Result<(), Error> {
    if !(cutoff > 0.0 && cutoff.is_finite()) {
        return Err(Error::InvalidParameter(format!(
            "cutoff must be a positive number, got {}", cutoff
        )));
    }
    Ok(())
}

mod sorted_distances;
pub use self::sorted_distances::SortedDistances;

mod dummy_calculator;
pub use self::dummy_calculator::DummyCalculator;
