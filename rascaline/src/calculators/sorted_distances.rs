use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{CalculatorBase, check_cutoff};

use crate::descriptor::{Descriptor, Indexes, IndexesBuilder, IndexValue};
use crate::descriptor::{EnvironmentIndexes, AtomSpeciesEnvironment};
use crate::{Error, System};

/// Sorted distances vector representation of an atomic environment.
///
/// Each atomic center is represented by a vector of distance to its neighbors
/// within the spherical `cutoff`, sorted from smallest to largest. If there are
/// less neighbors than `max_neighbors`, the remaining entries are filled with
/// `cutoff` instead.
///
/// Separate species for neighbors are represented separately, meaning that the
/// `max_neighbors` parameter only apply to a single species.
#[derive(Debug, Clone)]
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct SortedDistances {
    /// Spherical cutoff to use for atomic environments
    cutoff: f64,
    /// Maximal number of neighbors of a given atomic species a center is
    /// allowed to have. This is also the dimensionality of the features.
    max_neighbors: usize,
}

impl CalculatorBase for SortedDistances {
    fn name(&self) -> String {
        "sorted distances vector".into()
    }

    fn features(&self) -> Indexes {
        let mut features = IndexesBuilder::new(vec!["neighbor"]);
        for i in 0..self.max_neighbors {
            features.add(&[IndexValue::from(i)]).expect("features are unique");
        }
        return features.finish();
    }

    fn environments(&self) -> Box<dyn EnvironmentIndexes> {
        Box::new(AtomSpeciesEnvironment::new(self.cutoff))
    }

    fn compute_gradients(&self) -> bool {
        false
    }

    fn validate(&self) -> Result<(), Error> {
        check_cutoff(self.cutoff)?;

        // features are indexed with i32 values
        if self.max_neighbors > i32::MAX as usize {
            return Err(Error::InvalidParameter(format!(
                "max_neighbors is too large, got {}", self.max_neighbors
            )));
        }

        Ok(())
    }

    #[time_graph::instrument(name = "SortedDistances::compute")]
    fn compute(&mut self, systems: &mut [&mut dyn System], descriptor: &mut Descriptor) -> Result<(), Error> {
        let requested_systems = descriptor.environments.iter()
            .map(|environment| environment[0].usize())
            .collect::<BTreeSet<_>>();

        // distances between each center and neighbors of a given species,
        // for all the systems used in the calculation
        let mut all_distances = BTreeMap::new();
        for i_system in requested_systems {
            let system = &mut *systems[i_system];
            system.compute_neighbors(self.cutoff)?;
            let species = system.species()?;

            let mut distances = HashMap::<(usize, i32), Vec<f64>>::new();
            for pair in system.pairs()? {
                let distance = pair.distance();
                distances.entry((pair.first, species[pair.second])).or_default().push(distance);
                distances.entry((pair.second, species[pair.first])).or_default().push(distance);
            }

            for vector in distances.values_mut() {
                vector.sort_unstable_by(f64::total_cmp);
            }

            all_distances.insert(i_system, distances);
        }

        let empty = Vec::new();
        for (i_environment, environment) in descriptor.environments.iter().enumerate() {
            let structure = environment[0].usize();
            let center = environment[1].usize();
            let beta = environment[3].i32();

            let distances = all_distances.get(&structure)
                .and_then(|distances| distances.get(&(center, beta)))
                .unwrap_or(&empty);

            for (i_feature, feature) in descriptor.features.iter().enumerate() {
                let neighbor = feature[0].usize();
                let value = distances.get(neighbor).copied().unwrap_or(self.cutoff);
                descriptor.values[[i_environment, i_feature]] = value;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::aview1;

    use crate::systems::test_utils::test_systems;
    use crate::descriptor::{IndexesBuilder, IndexValue};
    use crate::{Calculator, CalculationOptions, Descriptor, SelectedIndexes, System};

    fn calculator() -> Calculator {
        Calculator::new("sorted_distances", r#"{
            "cutoff": 1.5,
            "max_neighbors": 3
        }"#.to_owned()).unwrap()
    }

    #[test]
    fn name() {
        assert_eq!(calculator().name(), "sorted distances vector");
    }

    #[test]
    fn invalid_max_neighbors() {
        let parameters = format!(r#"{{"cutoff": 1.5, "max_neighbors": {}}}"#, u64::MAX);
        let error = Calculator::new("sorted_distances", parameters).unwrap_err();
        assert_eq!(
            error.to_string(),
            format!("invalid parameter: max_neighbors is too large, got {}", u64::MAX)
        );

        let parameters = format!(r#"{{"cutoff": 1.5, "max_neighbors": {}}}"#, i32::MAX);
        assert!(Calculator::new("sorted_distances", parameters).is_ok());
    }

    #[test]
    fn values() {
        let mut calculator = calculator();
        let mut systems = test_systems(&["water"]);
        let mut systems = systems.iter_mut().map(|s| s as &mut dyn System).collect::<Vec<_>>();

        let mut descriptor = Descriptor::new();
        calculator.compute(&mut systems, &mut descriptor, CalculationOptions::default()).unwrap();

        assert_eq!(descriptor.environments().names(), ["structure", "center", "alpha", "beta"]);
        assert_eq!(descriptor.features().names(), ["neighbor"]);

        let values = descriptor.values().unwrap();
        assert_eq!(values.shape(), [3, 3]);

        let distance = 0.957897074324794;
        assert_relative_eq!(values.row(0), aview1(&[distance, distance, 1.5]), epsilon = 1e-12);
        assert_relative_eq!(values.row(1), aview1(&[distance, 1.5, 1.5]), epsilon = 1e-12);
        assert_relative_eq!(values.row(2), aview1(&[distance, 1.5, 1.5]), epsilon = 1e-12);

        assert!(descriptor.gradients().is_none());
    }

    #[test]
    fn selection() {
        let mut calculator = calculator();
        let mut systems = test_systems(&["water"]);
        let mut systems = systems.iter_mut().map(|s| s as &mut dyn System).collect::<Vec<_>>();

        let mut samples = IndexesBuilder::new(vec!["structure", "center", "alpha", "beta"]);
        samples.add(&[
            IndexValue::from(0_usize), IndexValue::from(1_usize),
            IndexValue::from(1_i32), IndexValue::from(-42_i32)
        ]).unwrap();
        let samples = samples.finish();

        let mut descriptor = Descriptor::new();
        let options = CalculationOptions {
            selected_samples: SelectedIndexes::Values(&samples),
            selected_features: SelectedIndexes::Rows(&[2, 0]),
            ..Default::default()
        };
        calculator.compute(&mut systems, &mut descriptor, options).unwrap();

        let values = descriptor.values().unwrap();
        assert_eq!(values.shape(), [1, 2]);
        assert_relative_eq!(values.row(0), aview1(&[1.5, 0.957897074324794]), epsilon = 1e-12);
    }

    #[test]
    fn periodic_neighbors() {
        let mut calculator = Calculator::new("sorted_distances", r#"{
            "cutoff": 0.9,
            "max_neighbors": 2
        }"#.to_owned()).unwrap();

        let mut systems = test_systems(&["CsCl"]);
        let mut systems = systems.iter_mut().map(|s| s as &mut dyn System).collect::<Vec<_>>();

        let mut descriptor = Descriptor::new();
        calculator.compute(&mut systems, &mut descriptor, CalculationOptions::default()).unwrap();

        // only the closest image of the Cs-Cl pair is part of the neighbors
        let values = descriptor.values().unwrap();
        assert_eq!(values.shape(), [2, 2]);
        let distance = f64::sqrt(3.0) / 2.0;
        assert_relative_eq!(values.row(0), aview1(&[distance, 0.9]), epsilon = 1e-12);
        assert_relative_eq!(values.row(1), aview1(&[distance, 0.9]), epsilon = 1e-12);
    }
}
