use std::collections::HashMap;

use log::warn;
use ndarray::Array3;

use crate::Vector3D;
use super::{UnitCell, Pair};

/// Upper bound on the number of bins in a `CellList`, to keep memory usage
/// bounded for small cutoffs in large boxes
const MAX_NUMBER_OF_CELLS: f64 = 1e5;

/// Atoms closer than this distance (in Å) trigger a warning
const CLOSE_ATOMS_THRESHOLD: f64 = 1e-3;

/// An atom stored in one of the bins of a `CellList`
#[derive(Debug, Clone)]
struct BinnedAtom {
    /// index of the atom in the system
    index: usize,
    /// number of cell vectors to subtract from the atom position to bring it
    /// inside the bin grid
    shift: [i32; 3],
}

/// Candidate pair from the cell list. The vector between the two atoms is
/// `positions[second] - positions[first] + shift * cell`.
#[derive(Debug, Clone)]
struct Candidate {
    first: usize,
    second: usize,
    shift: [i32; 3],
}

/// Bin atoms on a regular grid with bins at least as large as the cutoff, so
/// that all neighbors of an atom are found in the bins around its own.
#[derive(Debug, Clone)]
struct CellList {
    /// number of bins to look at in each direction around a given bin
    n_search: [i32; 3],
    bins: Array3<Vec<BinnedAtom>>,
    unit_cell: UnitCell,
    /// For infinite cells, the bins cover the bounding box of the atoms,
    /// starting at `origin` with `lengths` along each axis
    origin: Vector3D,
    lengths: Vector3D,
}

impl CellList {
    fn new(positions: &[Vector3D], unit_cell: UnitCell, cutoff: f64) -> CellList {
        let mut origin = Vector3D::zero();
        let lengths = if unit_cell.is_infinite() {
            // the bin grid covers the bounding box of all atoms
            let mut min = Vector3D::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
            let mut max = -min;
            for position in positions {
                for i in 0..3 {
                    min[i] = f64::min(min[i], position[i]);
                    max[i] = f64::max(max[i], position[i]);
                }
            }

            if positions.is_empty() {
                min = Vector3D::zero();
                max = Vector3D::zero();
            }

            origin = min;
            let extent = max - min;
            Vector3D::new(
                f64::max(extent[0], cutoff),
                f64::max(extent[1], cutoff),
                f64::max(extent[2], cutoff),
            )
        } else {
            unit_cell.distances_between_faces()
        };

        let mut n_bins = [
            f64::max(f64::trunc(lengths[0] / cutoff), 1.0),
            f64::max(f64::trunc(lengths[1] / cutoff), 1.0),
            f64::max(f64::trunc(lengths[2] / cutoff), 1.0),
        ];

        let n_bins_total = n_bins[0] * n_bins[1] * n_bins[2];
        if n_bins_total > MAX_NUMBER_OF_CELLS {
            // reduce the number of bins, keeping the ratio between directions
            let scaling = f64::cbrt(MAX_NUMBER_OF_CELLS / n_bins_total);
            for n in &mut n_bins {
                *n = f64::max(f64::trunc(*n * scaling), 1.0);
            }
        }

        let mut n_search = [0; 3];
        for i in 0..3 {
            if unit_cell.is_infinite() {
                // bins are larger than the cutoff, and there are no periodic
                // images to look for
                n_search[i] = if n_bins[i] > 1.0 { 1 } else { 0 };
            } else {
                n_search[i] = i32::max(f64::ceil(cutoff * n_bins[i] / lengths[i]) as i32, 1);
            }
        }

        let shape = (n_bins[0] as usize, n_bins[1] as usize, n_bins[2] as usize);
        CellList {
            n_search: n_search,
            bins: Array3::from_elem(shape, Vec::new()),
            unit_cell: unit_cell,
            origin: origin,
            lengths: lengths,
        }
    }

    fn shape(&self) -> [usize; 3] {
        let shape = self.bins.shape();
        [shape[0], shape[1], shape[2]]
    }

    /// Put the atom with the given `index` and `position` in its bin
    fn add_atom(&mut self, index: usize, position: Vector3D) {
        let shape = self.shape();

        if self.unit_cell.is_infinite() {
            let relative = position - self.origin;
            let mut bin = [0; 3];
            for i in 0..3 {
                let fractional = relative[i] / self.lengths[i];
                let value = f64::floor(fractional * shape[i] as f64) as i64;
                bin[i] = i64::clamp(value, 0, shape[i] as i64 - 1) as usize;
            }

            self.bins[bin].push(BinnedAtom { index, shift: [0, 0, 0] });
        } else {
            let fractional = self.unit_cell.fractional(position);
            let bin = [
                f64::floor(fractional[0] * shape[0] as f64) as i32,
                f64::floor(fractional[1] * shape[1] as f64) as i32,
                f64::floor(fractional[2] * shape[2] as f64) as i32,
            ];

            let (shift, bin) = divmod_vec(bin, shape);
            self.bins[bin].push(BinnedAtom { index, shift });
        }
    }

    /// Get all candidate pairs `i-j` with `i < j`, including all the periodic
    /// images of `j` in the neighboring bins. Candidates can be further apart
    /// than the cutoff, and have to be filtered.
    fn candidates(&self) -> Vec<Candidate> {
        let shape = self.shape();
        let mut candidates = Vec::new();

        for ((x, y, z), bin) in self.bins.indexed_iter() {
            for dx in -self.n_search[0]..=self.n_search[0] {
                for dy in -self.n_search[1]..=self.n_search[1] {
                    for dz in -self.n_search[2]..=self.n_search[2] {
                        let neighbor = [x as i32 + dx, y as i32 + dy, z as i32 + dz];

                        let (bin_shift, neighbor) = if self.unit_cell.is_infinite() {
                            if (0..3).any(|i| neighbor[i] < 0 || neighbor[i] >= shape[i] as i32) {
                                continue;
                            }
                            ([0, 0, 0], [neighbor[0] as usize, neighbor[1] as usize, neighbor[2] as usize])
                        } else {
                            divmod_vec(neighbor, shape)
                        };

                        for atom_i in bin {
                            for atom_j in &self.bins[neighbor] {
                                // half neighbor list without self pairs
                                if atom_i.index >= atom_j.index {
                                    continue;
                                }

                                candidates.push(Candidate {
                                    first: atom_i.index,
                                    second: atom_j.index,
                                    shift: [
                                        bin_shift[0] + atom_i.shift[0] - atom_j.shift[0],
                                        bin_shift[1] + atom_i.shift[1] - atom_j.shift[1],
                                        bin_shift[2] + atom_i.shift[2] - atom_j.shift[2],
                                    ],
                                });
                            }
                        }
                    }
                }
            }
        }

        return candidates;
    }
}

/// Euclidean division of `a` by `b`, with a remainder always in `[0, b)`.
fn divmod(a: i32, b: usize) -> (i32, usize) {
    let b = b as i32;
    let quotient = a.div_euclid(b);
    let remainder = a.rem_euclid(b);
    return (quotient, remainder as usize);
}

fn divmod_vec(a: [i32; 3], b: [usize; 3]) -> ([i32; 3], [usize; 3]) {
    let (qx, rx) = divmod(a[0], b[0]);
    let (qy, ry) = divmod(a[1], b[1]);
    let (qz, rz) = divmod(a[2], b[2]);
    return ([qx, qy, qz], [rx, ry, rz]);
}

/// Neighbor list usable with any system, storing a single entry for each pair
/// of atoms closer than the cutoff.
///
/// For periodic systems, only the closest periodic image of each pair is kept,
/// and pairs between an atom and its own images are not included.
#[derive(Clone, Debug)]
pub struct NeighborsList {
    /// cutoff used to create this neighbor list
    pub cutoff: f64,
    /// all pairs in the system, sorted by `(first, second)`
    pub pairs: Vec<Pair>,
    /// pairs containing each atom, with the same ordering as `pairs`
    pub pairs_by_atom: Vec<Vec<Pair>>,
}

impl NeighborsList {
    #[time_graph::instrument(name = "NeighborsList")]
    pub fn new(positions: &[Vector3D], unit_cell: UnitCell, cutoff: f64) -> NeighborsList {
        assert!(cutoff > 0.0 && cutoff.is_finite(), "cutoff must be a finite positive number");

        let mut cell_list = CellList::new(positions, unit_cell, cutoff);
        for (index, &position) in positions.iter().enumerate() {
            cell_list.add_atom(index, position);
        }

        let cutoff2 = cutoff * cutoff;

        let mut pairs: Vec<Pair> = Vec::new();
        // position of each (first, second) pair in `pairs`, and the number of
        // periodic images of this pair inside the cutoff
        let mut seen = HashMap::<(usize, usize), (usize, usize)>::new();

        for candidate in cell_list.candidates() {
            let shift = Vector3D::new(
                candidate.shift[0] as f64,
                candidate.shift[1] as f64,
                candidate.shift[2] as f64,
            );
            let mut vector = positions[candidate.second] - positions[candidate.first];
            if !unit_cell.is_infinite() {
                vector += unit_cell.cartesian(shift);
            }

            let distance2 = vector.norm2();
            if distance2 >= cutoff2 {
                continue;
            }

            let pair = Pair {
                first: candidate.first,
                second: candidate.second,
                vector: vector,
            };

            match seen.get_mut(&(pair.first, pair.second)) {
                Some((position, n_images)) => {
                    *n_images += 1;
                    if distance2 < pairs[*position].vector.norm2() {
                        pairs[*position] = pair;
                    }
                }
                None => {
                    seen.insert((pair.first, pair.second), (pairs.len(), 1));
                    pairs.push(pair);
                }
            }
        }

        for (&(first, second), &(position, n_images)) in &seen {
            if n_images > 1 {
                warn!(
                    "{} periodic images of the pair {}-{} are inside the cutoff, only the closest one is used",
                    n_images, first, second
                );
            }

            let distance = pairs[position].distance();
            if distance < CLOSE_ATOMS_THRESHOLD {
                warn!("atoms {} and {} are very close to one another ({} A)", first, second, distance);
            }
        }

        pairs.sort_unstable_by_key(|pair| (pair.first, pair.second));

        let mut pairs_by_atom = vec![Vec::new(); positions.len()];
        for pair in &pairs {
            pairs_by_atom[pair.first].push(*pair);
            pairs_by_atom[pair.second].push(*pair);
        }

        return NeighborsList {
            cutoff: cutoff,
            pairs: pairs,
            pairs_by_atom: pairs_by_atom,
        };
    }
}
