use std::collections::BTreeSet;

use log::{info, warn};
use ndarray::Axis;
use rayon::prelude::*;

use super::{CalculatorBase, check_cutoff};

use crate::descriptor::{IndexesBuilder, Indexes, IndexValue, EnvironmentIndexes, AtomEnvironment};
use crate::{Descriptor, Error, System};

/// A stupid calculator implementation used to test the API, and API binding to
/// C/Python/etc.
///
/// The calculator has two features: one containing the atom index +
/// `self.delta`, and the other one containing `x + y + z` summed over the
/// central atom and all its neighbors.
#[doc(hidden)]
#[derive(Debug, Clone)]
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct DummyCalculator {
    /// Spherical cutoff to use for atomic environments
    pub cutoff: f64,
    /// Delta added to the atom index in the first feature
    pub delta: isize,
    /// Unused name parameter, to test passing string values
    pub name: String,
    /// Should we also compute gradients of the feature?
    pub gradients: bool,
}

/// Which of the two features of `DummyCalculator` a column contains
#[derive(Debug, Clone, Copy, PartialEq)]
enum DummyFeature {
    IndexDelta,
    XYZ,
}

impl DummyCalculator {
    fn feature_kinds(features: &Indexes) -> Result<Vec<DummyFeature>, Error> {
        features.iter().map(|feature| {
            match (feature[0].i32(), feature[1].i32()) {
                (1, 0) => Ok(DummyFeature::IndexDelta),
                (0, 1) => Ok(DummyFeature::XYZ),
                _ => Err(Error::InvalidParameter(format!(
                    "invalid feature for DummyCalculator: {:?}", feature
                ))),
            }
        }).collect()
    }
}

impl CalculatorBase for DummyCalculator {
    fn name(&self) -> String {
        // abusing the name as description
        format!("dummy test calculator with cutoff: {} - delta: {} - name: {} - gradients: {}",
            self.cutoff, self.delta, self.name, self.gradients
        )
    }

    fn features(&self) -> Indexes {
        let mut features = IndexesBuilder::new(vec!["index_delta", "x_y_z"]);
        features.add(&[IndexValue::from(1), IndexValue::from(0)]).expect("features are unique");
        features.add(&[IndexValue::from(0), IndexValue::from(1)]).expect("features are unique");
        features.finish()
    }

    fn environments(&self) -> Box<dyn EnvironmentIndexes> {
        Box::new(AtomEnvironment::new(self.cutoff))
    }

    fn compute_gradients(&self) -> bool {
        self.gradients
    }

    fn validate(&self) -> Result<(), Error> {
        check_cutoff(self.cutoff)
    }

    #[time_graph::instrument(name = "DummyCalculator::compute")]
    fn compute(&mut self, systems: &mut [&mut dyn System], descriptor: &mut Descriptor) -> Result<(), Error> {
        if self.name.contains("log-test-info:") {
            info!("{}", self.name);
        } else if self.name.contains("log-test-warn:") {
            warn!("{}", self.name);
        }

        let features = DummyCalculator::feature_kinds(&descriptor.features)?;

        let requested_systems = descriptor.environments.iter()
            .map(|environment| environment[0].usize())
            .collect::<BTreeSet<_>>();
        for &i_system in &requested_systems {
            systems[i_system].compute_neighbors(self.cutoff)?;
        }

        let systems = &*systems;
        let environments = &descriptor.environments;
        let delta = self.delta as f64;

        descriptor.values.axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .try_for_each(|(i_environment, mut values)| {
                let environment = &environments[i_environment];
                let system = &*systems[environment[0].usize()];
                let center = environment[1].usize();

                for (i_feature, feature) in features.iter().enumerate() {
                    values[i_feature] = match feature {
                        DummyFeature::IndexDelta => center as f64 + delta,
                        DummyFeature::XYZ => {
                            let positions = system.positions()?;
                            let mut sum = positions[center][0] + positions[center][1] + positions[center][2];
                            for pair in system.pairs_containing(center)? {
                                let neighbor = if pair.first == center { pair.second } else { pair.first };
                                sum += positions[neighbor][0] + positions[neighbor][1] + positions[neighbor][2];
                            }
                            sum
                        }
                    };
                }

                Ok::<(), Error>(())
            })?;

        if let Some(ref mut gradients) = descriptor.gradients {
            gradients.axis_iter_mut(Axis(0))
                .into_par_iter()
                .for_each(|mut gradient| {
                    for (i_feature, feature) in features.iter().enumerate() {
                        gradient[i_feature] = match feature {
                            DummyFeature::IndexDelta => 0.0,
                            DummyFeature::XYZ => 1.0,
                        };
                    }
                });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::{s, aview1};

    use crate::systems::test_utils::test_systems;
    use crate::{Calculator, CalculationOptions, Descriptor, SelectedIndexes, System};

    fn calculator(gradients: bool) -> Calculator {
        let parameters = format!(r#"{{
            "cutoff": 1.0,
            "delta": 9,
            "name": "",
            "gradients": {}
        }}"#, gradients);
        Calculator::new("dummy_calculator", parameters).unwrap()
    }

    #[test]
    fn name() {
        let calculator = Calculator::new("dummy_calculator", r#"{
            "cutoff": 1.4,
            "delta": 9,
            "name": "a long name",
            "gradients": false
        }"#.to_owned()).unwrap();

        assert_eq!(
            calculator.name(),
            "dummy test calculator with cutoff: 1.4 - delta: 9 - name: a long name - gradients: false"
        );
    }

    #[test]
    fn invalid_cutoff() {
        let result = Calculator::new("dummy_calculator", r#"{
            "cutoff": 0.0,
            "delta": 9,
            "name": "",
            "gradients": false
        }"#.to_owned());

        let error = result.err().unwrap();
        assert_eq!(error.to_string(), "invalid parameter: cutoff must be a positive number, got 0");
    }

    #[test]
    fn values() {
        let mut calculator = calculator(false);
        let mut systems = test_systems(&["water"]);
        let mut systems = systems.iter_mut().map(|s| s as &mut dyn System).collect::<Vec<_>>();

        let mut descriptor = Descriptor::new();
        calculator.compute(&mut systems, &mut descriptor, CalculationOptions::default()).unwrap();

        let values = descriptor.values().unwrap();
        assert_eq!(values.shape(), [3, 2]);
        assert_eq!(values.column(0), aview1(&[9.0, 10.0, 11.0]));
        assert_relative_eq!(values[[0, 1]], -1.1779, epsilon = 1e-12);
        assert_relative_eq!(values[[1, 1]], 0.1665, epsilon = 1e-12);
        assert_relative_eq!(values[[2, 1]], -1.3444, epsilon = 1e-12);

        assert!(descriptor.gradients().is_none());
    }

    #[test]
    fn gradients() {
        let mut calculator = calculator(true);
        let mut systems = test_systems(&["water"]);
        let mut systems = systems.iter_mut().map(|s| s as &mut dyn System).collect::<Vec<_>>();

        let mut descriptor = Descriptor::new();
        calculator.compute(&mut systems, &mut descriptor, CalculationOptions::default()).unwrap();

        // 2 pairs (O-H and O-H) * 2 directions * 3 spatial
        let gradients = descriptor.gradients().unwrap();
        assert_eq!(gradients.shape(), [12, 2]);
        for i in 0..gradients.shape()[0] {
            assert_eq!(gradients.slice(s![i, ..]), aview1(&[0.0, 1.0]));
        }
    }

    #[test]
    fn selected_features() {
        let mut calculator = calculator(true);
        let mut systems = test_systems(&["water"]);
        let mut systems = systems.iter_mut().map(|s| s as &mut dyn System).collect::<Vec<_>>();

        let mut descriptor = Descriptor::new();
        let options = CalculationOptions {
            selected_features: SelectedIndexes::Rows(&[1]),
            ..Default::default()
        };
        calculator.compute(&mut systems, &mut descriptor, options).unwrap();

        let values = descriptor.values().unwrap();
        assert_eq!(values.shape(), [3, 1]);
        assert_relative_eq!(values[[0, 0]], -1.1779, epsilon = 1e-12);
        assert_relative_eq!(values[[1, 0]], 0.1665, epsilon = 1e-12);
        assert_relative_eq!(values[[2, 0]], -1.3444, epsilon = 1e-12);

        let gradients = descriptor.gradients().unwrap();
        assert_eq!(gradients.shape(), [12, 1]);
        assert!(gradients.iter().all(|&g| g == 1.0));
    }
}
