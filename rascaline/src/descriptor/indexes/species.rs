use std::collections::{BTreeSet, HashSet};

use crate::{Error, System};
use super::{EnvironmentIndexes, Indexes, IndexesBuilder, IndexValue};

/// `StructureSpeciesEnvironment` is used to represents environments
/// corresponding to full structures, where each chemical species is represented
/// separately.
///
/// The environments contains `structure` and `alpha` (i.e. chemical species);
/// the gradients also contains the `atom` inside the structure with respect to
/// which the gradient is taken and the `spatial` (i.e. x/y/z) index.
pub struct StructureSpeciesEnvironment;

impl EnvironmentIndexes for StructureSpeciesEnvironment {
    fn names(&self) -> Vec<&str> {
        vec!["structure", "alpha"]
    }

    fn indexes(&self, systems: &mut [&mut dyn System]) -> Result<Indexes, Error> {
        let mut indexes = IndexesBuilder::new(self.names());
        for (i_system, system) in systems.iter().enumerate() {
            for &species in system.species()?.iter().collect::<BTreeSet<_>>() {
                indexes.add(&[IndexValue::from(i_system), IndexValue::from(species)])?;
            }
        }
        return Ok(indexes.finish());
    }

    fn gradients_for(&self, systems: &mut [&mut dyn System], environments: &Indexes) -> Result<Option<Indexes>, Error> {
        debug_assert_eq!(environments.names(), self.names());

        let mut gradients = IndexesBuilder::new(vec!["structure", "alpha", "atom", "spatial"]);
        for environment in environments {
            let i_system = environment[0];
            let alpha = environment[1];

            let species = systems[i_system.usize()].species()?;
            for (i_atom, &species) in species.iter().enumerate() {
                // only atoms with the same species participate to the gradient
                if species == alpha.i32() {
                    let atom = IndexValue::from(i_atom);
                    for spatial in 0..3_usize {
                        gradients.add(&[i_system, alpha, atom, IndexValue::from(spatial)])?;
                    }
                }
            }
        }

        return Ok(Some(gradients.finish()));
    }
}

/// `AtomSpeciesEnvironment` is used to represents atom-centered environments,
/// where each atom in a structure is described with a feature vector based on
/// other atoms inside a sphere centered on the central atom. These environments
/// include chemical species information.
///
/// The environments contains `structure`, `center` (i.e. central atom index
/// inside the structure), `alpha` (species of the central atom) and `beta`
/// (species of the neighboring atom); the gradients also contains the
/// `neighbor` inside the spherical cutoff with respect to which the gradient is
/// taken and the `spatial` (i.e x/y/z) index.
pub struct AtomSpeciesEnvironment {
    /// spherical cutoff radius used to construct the atom-centered environments
    cutoff: f64,
    /// Is the central atom considered to be its own neighbor?
    self_contribution: bool,
}

impl AtomSpeciesEnvironment {
    /// Create a new `AtomSpeciesEnvironment` with the given `cutoff`, excluding
    /// self contributions.
    pub fn new(cutoff: f64) -> AtomSpeciesEnvironment {
        assert!(cutoff > 0.0 && cutoff.is_finite(), "cutoff must be positive for AtomSpeciesEnvironment");
        AtomSpeciesEnvironment {
            cutoff: cutoff,
            self_contribution: false,
        }
    }

    /// Create a new `AtomSpeciesEnvironment` with the given `cutoff`, including
    /// self contributions.
    pub fn with_self_contribution(cutoff: f64) -> AtomSpeciesEnvironment {
        let mut environments = AtomSpeciesEnvironment::new(cutoff);
        environments.self_contribution = true;
        return environments;
    }
}

impl EnvironmentIndexes for AtomSpeciesEnvironment {
    fn names(&self) -> Vec<&str> {
        vec!["structure", "center", "alpha", "beta"]
    }

    fn indexes(&self, systems: &mut [&mut dyn System]) -> Result<Indexes, Error> {
        // Accumulate indexes in a set first to ensure uniqueness of the indexes
        // even if their are multiple neighbors of the same species around a
        // given center
        let mut set = BTreeSet::new();
        for (i_system, system) in systems.iter_mut().enumerate() {
            system.compute_neighbors(self.cutoff)?;
            let species = system.species()?;
            for pair in system.pairs()? {
                let species_first = species[pair.first];
                let species_second = species[pair.second];

                set.insert((i_system, pair.first, species_first, species_second));
                set.insert((i_system, pair.second, species_second, species_first));
            }

            if self.self_contribution {
                for (center, &species) in species.iter().enumerate() {
                    set.insert((i_system, center, species, species));
                }
            }
        }

        let mut indexes = IndexesBuilder::new(self.names());
        for (s, c, a, b) in set {
            indexes.add(&[
                IndexValue::from(s), IndexValue::from(c), IndexValue::from(a), IndexValue::from(b)
            ])?;
        }
        return Ok(indexes.finish());
    }

    fn gradients_for(&self, systems: &mut [&mut dyn System], environments: &Indexes) -> Result<Option<Indexes>, Error> {
        debug_assert_eq!(environments.names(), self.names());

        let requested_systems = environments.iter().map(|env| env[0]).collect::<BTreeSet<_>>();

        let mut set = BTreeSet::new();
        for i_system in requested_systems {
            let system = &mut *systems[i_system.usize()];
            system.compute_neighbors(self.cutoff)?;
            let species = system.species()?;

            let requested = environments.iter()
                .filter(|env| env[0] == i_system)
                .map(|env| (env[1].usize(), env[2].i32(), env[3].i32()))
                .collect::<HashSet<_>>();

            for pair in system.pairs()? {
                let species_first = species[pair.first];
                let species_second = species[pair.second];

                if requested.contains(&(pair.first, species_first, species_second)) {
                    set.insert((i_system, pair.first, species_first, species_second, pair.second));
                }

                if requested.contains(&(pair.second, species_second, species_first)) {
                    set.insert((i_system, pair.second, species_second, species_first, pair.first));
                }
            }
        }

        let mut gradients = IndexesBuilder::new(vec!["structure", "center", "alpha", "beta", "neighbor", "spatial"]);
        for (i_system, c, a, b, n) in set {
            let center = IndexValue::from(c);
            let alpha = IndexValue::from(a);
            let beta = IndexValue::from(b);
            let neighbor = IndexValue::from(n);
            for spatial in 0..3_usize {
                gradients.add(&[i_system, center, alpha, beta, neighbor, IndexValue::from(spatial)])?;
            }
        }

        return Ok(Some(gradients.finish()));
    }
}
