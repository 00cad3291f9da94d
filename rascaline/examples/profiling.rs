use rascaline::systems::UnitCell;
use rascaline::{Calculator, CalculationOptions, Descriptor};
use rascaline::{SimpleSystem, System, Vector3D};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let n_cells = std::env::args().nth(1)
        .map(|arg| arg.parse::<usize>())
        .transpose()?
        .unwrap_or(5);

    // enable collection of profiling data
    time_graph::enable_data_collection(true);
    // clear any existing collected data
    time_graph::clear_collected_data();

    // run the calculation
    let _descriptor = compute_sorted_distances(n_cells)?;

    // get the call graph and display it
    let graph = time_graph::get_full_graph();
    // (this requires the "table" feature for the time_graph crate)
    println!("{}", graph.as_short_table());

    // also available for saving profiling data to the disk & future analysis
    // (this requires the "json" feature for the time_graph crate)
    println!("{}", graph.as_json());

    Ok(())
}

/// Simple cubic crystal with two alternating species
fn crystal(n_cells: usize) -> SimpleSystem {
    let mut system = SimpleSystem::new(UnitCell::cubic(2.0 * n_cells as f64));
    for i in 0..(2 * n_cells) {
        for j in 0..(2 * n_cells) {
            for k in 0..(2 * n_cells) {
                let species = if (i + j + k) % 2 == 0 { 11 } else { 17 };
                system.add_atom(species, Vector3D::new(i as f64, j as f64, k as f64));
            }
        }
    }
    return system;
}

/// Compute sorted distances and make the descriptor dense along the species
fn compute_sorted_distances(n_cells: usize) -> Result<Descriptor, Box<dyn std::error::Error>> {
    let mut systems = vec![crystal(n_cells)];
    let mut systems = systems.iter_mut()
        .map(|s| s as &mut dyn System)
        .collect::<Vec<_>>();

    let parameters = r#"{
        "cutoff": 3.5,
        "max_neighbors": 24
    }"#;

    let descriptor = time_graph::spanned!("Full calculation", {
        let mut calculator = Calculator::new("sorted_distances", parameters.to_owned())?;

        let mut descriptor = Descriptor::new();
        calculator.compute(&mut systems, &mut descriptor, CalculationOptions::default())?;
        descriptor.densify_to_features(&["beta"])?;
        descriptor
    });

    Ok(descriptor)
}
