use ndarray::{Array2, ArrayView2};

use crate::Error;
use super::Indexes;

/// The different kinds of indexes in a `Descriptor`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexesKind {
    /// Indexes associated with the columns of the values and gradients
    Features,
    /// Indexes associated with the rows of the values
    Environments,
    /// Indexes associated with the rows of the gradients
    Gradients,
}

/// A `Descriptor` stores the result of a calculation: values for each
/// environment and feature, optional gradients of these values with respect
/// to atomic positions, and the indexes describing the rows and columns of
/// these arrays.
#[derive(Debug, Clone)]
pub struct Descriptor {
    /// An array of environments.count() by features.count() values
    pub(crate) values: Array2<f64>,
    pub(crate) environments: Indexes,
    pub(crate) features: Indexes,
    /// Gradients of the descriptor with respect to atomic positions, as an
    /// array of gradients_indexes.count() by features.count() values
    pub(crate) gradients: Option<Array2<f64>>,
    pub(crate) gradients_indexes: Option<Indexes>,
    /// Did a calculation fill this descriptor?
    pub(crate) computed: bool,
}

impl Default for Descriptor {
    fn default() -> Descriptor {
        Descriptor::new()
    }
}

impl Descriptor {
    /// Create a new empty descriptor, to be filled by a `Calculator`
    pub fn new() -> Descriptor {
        return Descriptor {
            values: Array2::zeros((0, 0)),
            environments: Indexes::empty(),
            features: Indexes::empty(),
            gradients: None,
            gradients_indexes: None,
            computed: false,
        }
    }

    /// Get the values stored in this descriptor, as an array of shape
    /// `(environments.count(), features.count())`.
    ///
    /// This is an error if this descriptor was never used in a calculation.
    pub fn values(&self) -> Result<ArrayView2<'_, f64>, Error> {
        if !self.computed {
            return Err(Error::InvalidParameter(
                "this descriptor does not contain values yet, it must be used in a calculation first".into()
            ));
        }
        return Ok(self.values.view());
    }

    /// Get the gradients stored in this descriptor, as an array of shape
    /// `(gradients_indexes.count(), features.count())`, if any.
    pub fn gradients(&self) -> Option<ArrayView2<'_, f64>> {
        self.gradients.as_ref().map(|gradients| gradients.view())
    }

    /// Get the indexes describing the environments, i.e. the rows of the
    /// values array
    pub fn environments(&self) -> &Indexes {
        &self.environments
    }

    /// Get the indexes describing the features, i.e. the columns of the
    /// values and gradients arrays
    pub fn features(&self) -> &Indexes {
        &self.features
    }

    /// Get the indexes describing the rows of the gradients array, if any
    pub fn gradients_indexes(&self) -> Option<&Indexes> {
        self.gradients_indexes.as_ref()
    }

    /// Get the indexes of the given `kind`. This returns `None` when asking
    /// for gradients in a descriptor without gradients.
    pub fn indexes(&self, kind: IndexesKind) -> Option<&Indexes> {
        match kind {
            IndexesKind::Features => Some(&self.features),
            IndexesKind::Environments => Some(&self.environments),
            IndexesKind::Gradients => self.gradients_indexes.as_ref(),
        }
    }

    /// Prepare this descriptor for a calculation without gradients: set the
    /// indexes and allocate a zero-filled values array of the right shape.
    pub(crate) fn prepare(&mut self, environments: Indexes, features: Indexes) {
        self.environments = environments;
        self.features = features;

        let shape = (self.environments.count(), self.features.count());
        resize_and_reset(&mut self.values, shape);

        self.gradients = None;
        self.gradients_indexes = None;
        self.computed = false;
    }

    /// Prepare this descriptor for a calculation with gradients. The names
    /// of the `gradients` indexes must start with the names of the
    /// `environments`.
    pub(crate) fn prepare_gradients(
        &mut self,
        environments: Indexes,
        features: Indexes,
        gradients: Indexes,
    ) -> Result<(), Error> {
        let gradients_names = gradients.names();
        let environments_names = environments.names();
        if !gradients_names.starts_with(&environments_names) {
            return Err(Error::Internal(format!(
                "gradients indexes [{}] must start with the environments indexes [{}]",
                gradients_names.join(", "), environments_names.join(", ")
            )));
        }

        let mut array = self.gradients.take().unwrap_or_default();
        self.prepare(environments, features);

        let shape = (gradients.count(), self.features.count());
        resize_and_reset(&mut array, shape);

        self.gradients = Some(array);
        self.gradients_indexes = Some(gradients);
        return Ok(());
    }
}

/// Change the shape of `array` to `shape` and fill it with zeros, re-using the
/// existing allocation if possible.
fn resize_and_reset(array: &mut Array2<f64>, shape: (usize, usize)) {
    if array.dim() == shape {
        array.fill(0.0);
        return;
    }

    let (mut data, _) = std::mem::take(array).into_raw_vec_and_offset();
    data.clear();
    data.resize(shape.0 * shape.1, 0.0);

    *array = Array2::from_shape_vec(shape, data).expect("the data has the right size for this shape");
}
