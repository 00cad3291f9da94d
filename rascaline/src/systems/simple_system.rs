use crate::{Error, Vector3D};

use super::{UnitCell, System, Pair};
use super::neighbors::NeighborsList;

/// A simple implementation of `System` to use when no other is available,
/// or when copying data from another implementation.
#[derive(Clone, Debug)]
pub struct SimpleSystem {
    cell: UnitCell,
    species: Vec<i32>,
    positions: Vec<Vector3D>,
    neighbors: Option<NeighborsList>,
}

impl SimpleSystem {
    /// Create a new empty system with the given unit cell
    pub fn new(cell: UnitCell) -> SimpleSystem {
        SimpleSystem {
            cell: cell,
            species: Vec::new(),
            positions: Vec::new(),
            neighbors: None,
        }
    }

    /// Add an atom with the given species and position to this system
    pub fn add_atom(&mut self, species: i32, position: Vector3D) {
        // the neighbor list is no longer valid
        self.neighbors = None;
        self.species.push(species);
        self.positions.push(position);
    }

    fn neighbors(&self) -> Result<&NeighborsList, Error> {
        self.neighbors.as_ref().ok_or_else(|| Error::InvalidParameter(
            "the neighbor list is not initialized, call compute_neighbors first".into()
        ))
    }
}

impl System for SimpleSystem {
    fn size(&self) -> Result<usize, Error> {
        Ok(self.species.len())
    }

    fn species(&self) -> Result<&[i32], Error> {
        Ok(&self.species)
    }

    fn positions(&self) -> Result<&[Vector3D], Error> {
        Ok(&self.positions)
    }

    fn cell(&self) -> Result<UnitCell, Error> {
        Ok(self.cell)
    }

    #[allow(clippy::float_cmp)]
    fn compute_neighbors(&mut self, cutoff: f64) -> Result<(), Error> {
        if !(cutoff > 0.0 && cutoff.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "cutoff must be a finite positive number, got {}", cutoff
            )));
        }

        // re-use the current neighbor list if possible
        if let Some(ref neighbors) = self.neighbors {
            if neighbors.cutoff == cutoff {
                return Ok(());
            }
        }

        self.neighbors = Some(NeighborsList::new(&self.positions, self.cell, cutoff));
        Ok(())
    }

    fn pairs(&self) -> Result<&[Pair], Error> {
        Ok(&self.neighbors()?.pairs)
    }

    fn pairs_containing(&self, atom: usize) -> Result<&[Pair], Error> {
        let neighbors = self.neighbors()?;
        neighbors.pairs_by_atom.get(atom).map(Vec::as_slice).ok_or_else(|| Error::InvalidParameter(format!(
            "atom index {} is out of bounds in a system with {} atoms", atom, self.species.len()
        )))
    }
}

impl TryFrom<&dyn System> for SimpleSystem {
    type Error = Error;

    fn try_from(system: &dyn System) -> Result<SimpleSystem, Error> {
        let species = system.species()?;
        let positions = system.positions()?;
        let size = system.size()?;
        if species.len() != size || positions.len() != size {
            return Err(Error::System(format!(
                "system size is {}, but got {} species and {} positions",
                size, species.len(), positions.len()
            )));
        }

        let mut new = SimpleSystem::new(system.cell()?);
        new.species.extend_from_slice(species);
        new.positions.extend_from_slice(positions);
        return Ok(new);
    }
}
