use std::collections::{BTreeSet, HashSet};

use crate::{Error, System};
use super::{Indexes, IndexesBuilder, EnvironmentIndexes, IndexValue};

/// `StructureEnvironment` is used to represents environments corresponding to
/// full structures, each structure being described by a single features vector.
///
/// It does not contain any chemical species information, for this you should
/// use `StructureSpeciesEnvironment`.
///
/// The environments contains only the `structure` variable; the gradients
/// also contains the `atom` inside the structure with respect to which the
/// gradient is taken and the `spatial` (i.e. x/y/z) index.
pub struct StructureEnvironment;

impl EnvironmentIndexes for StructureEnvironment {
    fn names(&self) -> Vec<&str> {
        vec!["structure"]
    }

    fn indexes(&self, systems: &mut [&mut dyn System]) -> Result<Indexes, Error> {
        let mut indexes = IndexesBuilder::new(self.names());
        for i_system in 0..systems.len() {
            indexes.add(&[IndexValue::from(i_system)])?;
        }
        return Ok(indexes.finish());
    }

    fn gradients_for(&self, systems: &mut [&mut dyn System], environments: &Indexes) -> Result<Option<Indexes>, Error> {
        debug_assert_eq!(environments.names(), self.names());

        let mut gradients = IndexesBuilder::new(vec!["structure", "atom", "spatial"]);
        for environment in environments {
            let i_system = environment[0];
            for atom in 0..systems[i_system.usize()].size()? {
                let atom = IndexValue::from(atom);
                for spatial in 0..3_usize {
                    gradients.add(&[i_system, atom, IndexValue::from(spatial)])?;
                }
            }
        }

        return Ok(Some(gradients.finish()));
    }
}

/// `AtomEnvironment` is used to represents atom-centered environments, where
/// each atom in a structure is described with a feature vector based on other
/// atoms inside a sphere centered on the central atom.
///
/// This type of indexes does not contain any chemical species information, for
/// this you should use `AtomSpeciesEnvironment`.
///
/// The environments contains `structure` and `center` (i.e. central atom
/// index inside the structure); the gradients also contains the `neighbor`
/// inside the spherical cutoff with respect to which the gradient is taken and
/// the `spatial` (i.e x/y/z) index.
pub struct AtomEnvironment {
    cutoff: f64,
}

impl AtomEnvironment {
    /// Create a new `AtomEnvironment` with the given cutoff.
    pub fn new(cutoff: f64) -> AtomEnvironment {
        assert!(cutoff > 0.0 && cutoff.is_finite(), "cutoff must be positive for AtomEnvironment");
        AtomEnvironment { cutoff }
    }
}

impl EnvironmentIndexes for AtomEnvironment {
    fn names(&self) -> Vec<&str> {
        vec!["structure", "center"]
    }

    fn indexes(&self, systems: &mut [&mut dyn System]) -> Result<Indexes, Error> {
        let mut indexes = IndexesBuilder::new(self.names());
        for (i_system, system) in systems.iter().enumerate() {
            for center in 0..system.size()? {
                indexes.add(&[IndexValue::from(i_system), IndexValue::from(center)])?;
            }
        }
        return Ok(indexes.finish());
    }

    fn gradients_for(&self, systems: &mut [&mut dyn System], environments: &Indexes) -> Result<Option<Indexes>, Error> {
        debug_assert_eq!(environments.names(), self.names());

        // a BTreeSet will yield the gradients in the right order
        let mut set = BTreeSet::new();
        let requested_systems = environments.iter().map(|env| env[0]).collect::<BTreeSet<_>>();
        for i_system in requested_systems {
            let system = &mut *systems[i_system.usize()];
            system.compute_neighbors(self.cutoff)?;

            let requested_centers = environments.iter()
                .filter(|env| env[0] == i_system)
                .map(|env| env[1].usize())
                .collect::<HashSet<_>>();

            for pair in system.pairs()? {
                if requested_centers.contains(&pair.first) {
                    set.insert((i_system, pair.first, pair.second));
                }

                if requested_centers.contains(&pair.second) {
                    set.insert((i_system, pair.second, pair.first));
                }
            }
        }

        let mut gradients = IndexesBuilder::new(vec!["structure", "center", "neighbor", "spatial"]);
        for (i_system, center, neighbor) in set {
            let center = IndexValue::from(center);
            let neighbor = IndexValue::from(neighbor);
            for spatial in 0..3_usize {
                gradients.add(&[i_system, center, neighbor, IndexValue::from(spatial)])?;
            }
        }

        return Ok(Some(gradients.finish()));
    }
}
