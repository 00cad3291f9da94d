use crate::{System, Vector3D, Matrix3};
use super::{UnitCell, SimpleSystem};

pub fn test_systems(names: &[&str]) -> Vec<SimpleSystem> {
    return names.iter().map(|&name| test_system(name)).collect();
}

pub fn test_system(name: &str) -> SimpleSystem {
    match name {
        "methane" => get_methane(),
        "water" => get_water(),
        "CH" => get_ch(),
        "NaCl" => get_nacl(),
        "CsCl" => get_cscl(),
        "ZnS" => get_zns(),
        "ZnSO4" => get_znso4(),
        _ => panic!("unknown test system {}", name)
    }
}

/// Check that the neighbor list of `system` follows the contract of the
/// `System` trait: each pair is stored once with `first < second`, and
/// appears in `pairs_containing` for both atoms.
pub fn check_neighbors_consistency(system: &dyn System) {
    let pairs = system.pairs().unwrap();
    for pair in pairs {
        assert!(pair.first < pair.second, "bad pair order in {:?}", pair);
        let reversed = pairs.iter().filter(|p| p.first == pair.second && p.second == pair.first).count();
        assert_eq!(reversed, 0, "pair {:?} is included twice", pair);

        assert!(system.pairs_containing(pair.first).unwrap().contains(pair));
        assert!(system.pairs_containing(pair.second).unwrap().contains(pair));
    }

    for atom in 0..system.size().unwrap() {
        for pair in system.pairs_containing(atom).unwrap() {
            assert!(pair.first == atom || pair.second == atom);
            assert!(pairs.contains(pair));
        }
    }
}

fn get_methane() -> SimpleSystem {
    let mut system = SimpleSystem::new(UnitCell::cubic(5.0));
    system.add_atom(6, Vector3D::new(5.0000, 5.0000, 5.0000));
    system.add_atom(1, Vector3D::new(5.5288, 5.1610, 5.9359));
    system.add_atom(1, Vector3D::new(5.2051, 5.8240, 4.3214));
    system.add_atom(1, Vector3D::new(5.3345, 4.0686, 4.5504));
    system.add_atom(1, Vector3D::new(3.9315, 4.9463, 5.1921));
    return system;
}

fn get_water() -> SimpleSystem {
    let mut system = SimpleSystem::new(UnitCell::cubic(10.0));
    // species do not have to be atomic number
    system.add_atom(-42, Vector3D::new(0.0, 0.0, 0.0));
    system.add_atom(1, Vector3D::new(0.0, 0.75545, -0.58895));
    system.add_atom(1, Vector3D::new(0.0, -0.75545, -0.58895));
    return system;
}

fn get_ch() -> SimpleSystem {
    let mut system = SimpleSystem::new(UnitCell::infinite());
    system.add_atom(6, Vector3D::new(0.0, 0.0, 0.0));
    system.add_atom(1, Vector3D::new(0.0, 1.2, 0.0));
    return system;
}

fn periodic_system(cell: [[f64; 3]; 3]) -> SimpleSystem {
    let cell = UnitCell::try_from(Matrix3::from(cell)).expect("invalid test cell");
    SimpleSystem::new(cell)
}

/// NaCl in a primitive cell, the closest Na-Cl distance is 1
fn get_nacl() -> SimpleSystem {
    let mut system = periodic_system([[0.0, 1.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 0.0]]);
    system.add_atom(11, Vector3D::new(0.0, 0.0, 0.0));
    system.add_atom(17, Vector3D::new(1.0, 0.0, 0.0));
    return system;
}

/// CsCl in a cubic cell of side 1
fn get_cscl() -> SimpleSystem {
    let mut system = SimpleSystem::new(UnitCell::cubic(1.0));
    system.add_atom(17, Vector3D::new(0.0, 0.0, 0.0));
    system.add_atom(55, Vector3D::new(0.5, 0.5, 0.5));
    return system;
}

/// ZnS (zincblende) in a primitive cell, the closest Zn-S distance is
/// sqrt(3)/2
fn get_zns() -> SimpleSystem {
    let mut system = periodic_system([[0.0, 1.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 0.0]]);
    system.add_atom(16, Vector3D::new(0.0, 0.0, 0.0));
    system.add_atom(30, Vector3D::new(0.5, 0.5, 0.5));
    return system;
}

/// ZnS in the wurtzite structure, with a triclinic cell
fn get_znso4() -> SimpleSystem {
    let u = 3. / 8.;
    let c = f64::sqrt(1. / u);
    let sqrt_3 = f64::sqrt(3.0);
    let mut system = periodic_system([[0.5, -0.5 * sqrt_3, 0.0], [0.5, 0.5 * sqrt_3, 0.0], [0.0, 0.0, c]]);
    system.add_atom(16, Vector3D::new(0.5, 0.5 / sqrt_3, 0.0));
    system.add_atom(30, Vector3D::new(0.5, 0.5 / sqrt_3, u * c));
    system.add_atom(16, Vector3D::new(0.5, -0.5 / sqrt_3, 0.5 * c));
    system.add_atom(30, Vector3D::new(0.5, -0.5 / sqrt_3, (0.5 + u) * c));
    return system;
}
