use approx::assert_relative_eq;

use rascaline::systems::{Pair, UnitCell};
use rascaline::descriptor::IndexValue;
use rascaline::{Calculator, CalculationOptions, Descriptor, Error, SelectedIndexes};
use rascaline::{SimpleSystem, System, Vector3D};

fn water() -> SimpleSystem {
    let mut system = SimpleSystem::new(UnitCell::cubic(10.0));
    system.add_atom(8, Vector3D::new(0.0, 0.0, 0.0));
    system.add_atom(1, Vector3D::new(0.0, 0.75545, -0.58895));
    system.add_atom(1, Vector3D::new(0.0, -0.75545, -0.58895));
    return system;
}

fn methane() -> SimpleSystem {
    let mut system = SimpleSystem::new(UnitCell::infinite());
    system.add_atom(6, Vector3D::new(5.0000, 5.0000, 5.0000));
    system.add_atom(1, Vector3D::new(5.5288, 5.1610, 5.9359));
    system.add_atom(1, Vector3D::new(5.2051, 5.8240, 4.3214));
    system.add_atom(1, Vector3D::new(5.3345, 4.0686, 4.5504));
    system.add_atom(1, Vector3D::new(3.9315, 4.9463, 5.1921));
    return system;
}

/// A `System` forwarding to a `SimpleSystem`, and counting how many times the
/// neighbor list is computed
struct CountingSystem {
    inner: SimpleSystem,
    neighbors_calls: usize,
}

impl System for CountingSystem {
    fn size(&self) -> Result<usize, Error> {
        self.inner.size()
    }

    fn species(&self) -> Result<&[i32], Error> {
        self.inner.species()
    }

    fn positions(&self) -> Result<&[Vector3D], Error> {
        self.inner.positions()
    }

    fn cell(&self) -> Result<UnitCell, Error> {
        self.inner.cell()
    }

    fn compute_neighbors(&mut self, cutoff: f64) -> Result<(), Error> {
        self.neighbors_calls += 1;
        self.inner.compute_neighbors(cutoff)
    }

    fn pairs(&self) -> Result<&[Pair], Error> {
        self.inner.pairs()
    }

    fn pairs_containing(&self, atom: usize) -> Result<&[Pair], Error> {
        self.inner.pairs_containing(atom)
    }
}

#[test]
fn two_atoms_open_system() {
    let mut system = SimpleSystem::new(UnitCell::infinite());
    system.add_atom(1, Vector3D::new(0.0, 0.0, 0.0));
    system.add_atom(1, Vector3D::new(1.0, 0.0, 0.0));

    system.compute_neighbors(1.5).unwrap();
    let pairs = system.pairs().unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].first, 0);
    assert_eq!(pairs[0].second, 1);
    assert_eq!(pairs[0].vector, Vector3D::new(1.0, 0.0, 0.0));

    assert_eq!(system.pairs_containing(0).unwrap(), pairs);
    assert_eq!(system.pairs_containing(1).unwrap(), pairs);
}

#[test]
fn custom_system() {
    let mut systems = vec![
        CountingSystem { inner: water(), neighbors_calls: 0 },
        CountingSystem { inner: methane(), neighbors_calls: 0 },
    ];

    let mut calculator = Calculator::new("sorted_distances", r#"{
        "cutoff": 1.5,
        "max_neighbors": 4
    }"#.to_owned()).unwrap();

    let mut descriptor = Descriptor::new();
    {
        let mut references = systems.iter_mut().map(|s| s as &mut dyn System).collect::<Vec<_>>();
        calculator.compute(&mut references, &mut descriptor, CalculationOptions::default()).unwrap();
    }
    assert!(systems.iter().all(|s| s.neighbors_calls > 0));

    let mut native = Descriptor::new();
    let options = CalculationOptions {
        use_native_system: true,
        ..Default::default()
    };
    let calls_before = systems.iter().map(|s| s.neighbors_calls).collect::<Vec<_>>();
    {
        let mut references = systems.iter_mut().map(|s| s as &mut dyn System).collect::<Vec<_>>();
        calculator.compute(&mut references, &mut native, options).unwrap();
    }

    // the copies are used for the neighbor list, not the original systems
    let calls_after = systems.iter().map(|s| s.neighbors_calls).collect::<Vec<_>>();
    assert_eq!(calls_before, calls_after);

    assert_eq!(descriptor.environments(), native.environments());
    assert_eq!(descriptor.values().unwrap(), native.values().unwrap());
}

#[test]
fn compute_and_densify() {
    let mut systems = vec![water(), methane()];
    let mut references = systems.iter_mut().map(|s| s as &mut dyn System).collect::<Vec<_>>();

    let mut calculator = Calculator::new("sorted_distances", r#"{
        "cutoff": 2.0,
        "max_neighbors": 4
    }"#.to_owned()).unwrap();

    let mut descriptor = Descriptor::new();
    calculator.compute(&mut references, &mut descriptor, CalculationOptions::default()).unwrap();
    let reference = descriptor.clone();

    descriptor.densify_to_features(&["beta"]).unwrap();
    assert_eq!(descriptor.environments().names(), ["structure", "center", "alpha"]);
    assert_eq!(descriptor.features().names(), ["beta", "neighbor"]);

    // one environment for each atom
    assert_eq!(descriptor.environments().count(), 8);

    // running it again does nothing
    let densified = descriptor.clone();
    descriptor.densify_to_features(&["beta"]).unwrap();
    assert_eq!(descriptor.values().unwrap(), densified.values().unwrap());

    descriptor.densify(&["beta"]).unwrap();
    assert_eq!(descriptor.environments().names(), ["structure", "center", "alpha", "beta"]);
    assert_eq!(descriptor.features(), reference.features());

    // all original environments are still there, and the new ones are zero
    let values = descriptor.values().unwrap();
    let reference_values = reference.values().unwrap();
    for (i, environment) in descriptor.environments().iter().enumerate() {
        match reference.environments().position(environment) {
            Some(position) => {
                assert_relative_eq!(values.row(i), reference_values.row(position));
            }
            None => {
                assert!(values.row(i).iter().all(|&v| v == 0.0));
            }
        }
    }

    let error = descriptor.densify(&["gamma"]).unwrap_err();
    assert!(matches!(error, Error::InvalidParameter(_)));
}

#[test]
fn never_computed() {
    let descriptor = Descriptor::new();
    assert!(matches!(descriptor.values(), Err(Error::InvalidParameter(_))));
    assert!(descriptor.gradients().is_none());
}

#[test]
fn gradients_through_densify() {
    let mut systems = vec![water()];
    let mut references = systems.iter_mut().map(|s| s as &mut dyn System).collect::<Vec<_>>();

    let mut calculator = Calculator::new("dummy_calculator", r#"{
        "cutoff": 1.0,
        "delta": 0,
        "name": "",
        "gradients": true
    }"#.to_owned()).unwrap();

    let mut descriptor = Descriptor::new();
    calculator.compute(&mut references, &mut descriptor, CalculationOptions::default()).unwrap();

    descriptor.densify_to_features(&["center"]).unwrap();
    assert_eq!(descriptor.environments().count(), 1);
    assert_eq!(descriptor.features().names(), ["center", "index_delta", "x_y_z"]);

    let gradients_indexes = descriptor.gradients_indexes().unwrap();
    assert_eq!(gradients_indexes.names(), ["structure", "neighbor", "spatial"]);

    // neighbor 0 is a neighbor of both H, neighbors 1 and 2 only of O
    assert_eq!(gradients_indexes.count(), 9);
    let row = gradients_indexes.position(&[
        IndexValue::from(0_i32), IndexValue::from(0_i32), IndexValue::from(2_i32)
    ]).unwrap();
    let gradients = descriptor.gradients().unwrap();
    assert_eq!(gradients.row(row).to_vec(), [0.0, 0.0, 0.0, 1.0, 0.0, 1.0]);
}

#[test]
fn compute_replaces_previous_data() {
    let mut systems = vec![water()];
    let mut references = systems.iter_mut().map(|s| s as &mut dyn System).collect::<Vec<_>>();

    let mut dummy = Calculator::new("dummy_calculator", r#"{
        "cutoff": 1.0,
        "delta": 0,
        "name": "",
        "gradients": true
    }"#.to_owned()).unwrap();

    let mut descriptor = Descriptor::new();
    dummy.compute(&mut references, &mut descriptor, CalculationOptions::default()).unwrap();
    assert_eq!(descriptor.features().names(), ["index_delta", "x_y_z"]);
    assert!(descriptor.gradients().is_some());

    let mut sorted_distances = Calculator::new("sorted_distances", r#"{
        "cutoff": 1.5,
        "max_neighbors": 4
    }"#.to_owned()).unwrap();

    let options = CalculationOptions {
        selected_samples: SelectedIndexes::Rows(&[0, 2]),
        ..Default::default()
    };
    sorted_distances.compute(&mut references, &mut descriptor, options).unwrap();

    assert_eq!(descriptor.environments().names(), ["structure", "center", "alpha", "beta"]);
    assert_eq!(descriptor.environments().count(), 2);
    assert_eq!(descriptor.features().names(), ["neighbor"]);
    assert_eq!(descriptor.values().unwrap().shape(), [2, 4]);
    assert!(descriptor.gradients().is_none());
    assert!(descriptor.gradients_indexes().is_none());

    // computing again on all environments gives the same data as a new descriptor
    sorted_distances.compute(&mut references, &mut descriptor, CalculationOptions::default()).unwrap();

    let mut fresh = Descriptor::new();
    sorted_distances.compute(&mut references, &mut fresh, CalculationOptions::default()).unwrap();
    assert_eq!(descriptor.environments(), fresh.environments());
    assert_eq!(descriptor.features(), fresh.features());
    assert_eq!(descriptor.values().unwrap(), fresh.values().unwrap());
    assert_eq!(descriptor.values().unwrap().shape(), [3, 4]);
    assert!(descriptor.gradients().is_none());
}
