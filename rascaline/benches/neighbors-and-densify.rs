#![allow(clippy::needless_return)]

use rascaline::systems::UnitCell;
use rascaline::{Calculator, CalculationOptions, Descriptor};
use rascaline::{SimpleSystem, System, Vector3D};

use criterion::{BenchmarkGroup, Criterion, measurement::WallTime, SamplingMode};
use criterion::{black_box, criterion_group, criterion_main};

/// Build a face-centered cubic crystal with `n_cells` unit cells in each
/// direction, alternating between two species
fn fcc_crystal(n_cells: usize) -> SimpleSystem {
    let lattice = 3.6;
    let mut system = SimpleSystem::new(UnitCell::cubic(lattice * n_cells as f64));

    let basis = [
        [0.0, 0.0, 0.0],
        [0.5, 0.5, 0.0],
        [0.5, 0.0, 0.5],
        [0.0, 0.5, 0.5],
    ];

    for i in 0..n_cells {
        for j in 0..n_cells {
            for k in 0..n_cells {
                for (b, offset) in basis.iter().enumerate() {
                    let species = if b % 2 == 0 { 29 } else { 79 };
                    let position = Vector3D::new(
                        lattice * (i as f64 + offset[0]),
                        lattice * (j as f64 + offset[1]),
                        lattice * (k as f64 + offset[2]),
                    );
                    system.add_atom(species, position);
                }
            }
        }
    }

    return system;
}

fn run_neighbors_list(mut group: BenchmarkGroup<WallTime>, n_cells: usize) {
    let mut system = fcc_crystal(n_cells);
    let n_atoms = system.size().unwrap();

    for &cutoff in black_box(&[3.0, 5.0, 7.0]) {
        group.bench_function(&format!("cutoff = {}", cutoff), |b| b.iter_custom(|repeat| {
            let start = std::time::Instant::now();
            for i in 0..repeat {
                // slightly change the cutoff to force the re-computation of
                // the neighbors list
                system.compute_neighbors(cutoff + 1e-9 * i as f64).unwrap();
            }
            start.elapsed() / n_atoms as u32
        }));
    }
}

fn neighbors_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("Neighbors list (per atom)/FCC 4x4x4");
    group.noise_threshold(0.05);
    group.sampling_mode(SamplingMode::Flat);
    run_neighbors_list(group, 4);

    let mut group = c.benchmark_group("Neighbors list (per atom)/FCC 8x8x8");
    group.noise_threshold(0.05);
    group.sampling_mode(SamplingMode::Flat);
    run_neighbors_list(group, 8);
}

fn densify(c: &mut Criterion) {
    let mut group = c.benchmark_group("Densify/sorted distances on FCC 6x6x6");
    group.noise_threshold(0.05);
    group.sampling_mode(SamplingMode::Flat);

    let mut systems = vec![fcc_crystal(6)];
    let mut systems = systems.iter_mut().map(|s| s as &mut dyn System).collect::<Vec<_>>();

    let mut calculator = Calculator::new("sorted_distances", r#"{
        "cutoff": 5.0,
        "max_neighbors": 16
    }"#.to_owned()).unwrap();

    let mut descriptor = Descriptor::new();
    calculator.compute(&mut systems, &mut descriptor, CalculationOptions::default()).unwrap();

    group.bench_function("environments to features", |b| b.iter_batched(
        || descriptor.clone(),
        |mut descriptor| {
            descriptor.densify_to_features(&["alpha", "beta"]).unwrap();
            descriptor
        },
        criterion::BatchSize::LargeInput,
    ));

    let mut dense = descriptor.clone();
    dense.densify_to_features(&["alpha", "beta"]).unwrap();
    group.bench_function("features to environments", |b| b.iter_batched(
        || dense.clone(),
        |mut descriptor| {
            descriptor.densify(&["alpha", "beta"]).unwrap();
            descriptor
        },
        criterion::BatchSize::LargeInput,
    ));
}

criterion_group!(all, neighbors_list, densify);
criterion_main!(all);
