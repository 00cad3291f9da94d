use std::collections::BTreeSet;

use indexmap::IndexSet;
use ndarray::Array2;

use crate::Error;
use super::{Descriptor, Indexes, IndexesBuilder, IndexValue};

/// Position of the variables moved from one axis to the other, and of the
/// variables staying on the original axis
struct Partition {
    moved: Vec<usize>,
    kept: Vec<usize>,
}

impl Partition {
    /// Find which of the `variables` should be moved out of `from`, checking
    /// them against the variables in `to`.
    fn new(variables: &[&str], from: &Indexes, to: &Indexes) -> Result<Partition, Error> {
        let mut seen = BTreeSet::new();
        for variable in variables {
            if !seen.insert(variable) {
                return Err(Error::InvalidParameter(format!(
                    "the '{}' variable is requested multiple times", variable
                )));
            }
        }

        let from_names = from.names();
        let to_names = to.names();

        let mut moved = Vec::new();
        for &variable in variables {
            let position = from_names.iter().position(|&name| name == variable);
            let already_moved = to_names.contains(&variable);
            match (position, already_moved) {
                (Some(_), true) => {
                    return Err(Error::InvalidParameter(format!(
                        "the '{}' variable is present in both features and environments", variable
                    )));
                }
                (Some(position), false) => moved.push(position),
                (None, true) => {
                    log::debug!("'{}' is already in the destination indexes, skipping it", variable);
                }
                (None, false) => {
                    return Err(Error::InvalidParameter(format!(
                        "can not densify along '{}', this variable is not part of the features or the environments",
                        variable
                    )));
                }
            }
        }

        let kept = (0..from.size()).filter(|i| !moved.contains(i)).collect();
        return Ok(Partition { moved, kept });
    }

    fn is_empty(&self) -> bool {
        self.moved.is_empty()
    }

    fn moved<'a>(&self, names: &[&'a str]) -> Vec<&'a str> {
        self.moved.iter().map(|&i| names[i]).collect()
    }

    fn kept<'a>(&self, names: &[&'a str]) -> Vec<&'a str> {
        self.kept.iter().map(|&i| names[i]).collect()
    }

    fn moved_values(&self, row: &[IndexValue]) -> Vec<IndexValue> {
        self.moved.iter().map(|&i| row[i]).collect()
    }

    fn kept_values(&self, row: &[IndexValue]) -> Vec<IndexValue> {
        self.kept.iter().map(|&i| row[i]).collect()
    }
}

/// Check that all `names` are distinct before giving them to an
/// `IndexesBuilder` for the indexes called `kind`
fn check_unique_names(names: &[&str], kind: &str) -> Result<(), Error> {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(Error::InvalidParameter(format!(
                "can not densify: the '{}' variable would be present multiple times in the {}", name, kind
            )));
        }
    }
    Ok(())
}

fn indexes_from_set(names: Vec<&str>, set: IndexSet<Vec<IndexValue>>) -> Result<Indexes, Error> {
    let mut builder = IndexesBuilder::new(names);
    for row in set {
        builder.add(&row)?;
    }
    return Ok(builder.finish());
}

impl Descriptor {
    /// Make this descriptor dense along the given `variables`, moving them
    /// from the features to the environments.
    ///
    /// Each environment `e` is split into one environment per distinct value
    /// of the moved variables, and the features lose these variables. If a
    /// given environment does not have any value for one of the new
    /// combinations, the corresponding values are set to zero.
    ///
    /// Variables which are already part of the environments are skipped,
    /// making this function idempotent. Using an empty list of variables
    /// does nothing.
    #[time_graph::instrument(name = "Descriptor::densify")]
    pub fn densify(&mut self, variables: &[&str]) -> Result<(), Error> {
        let partition = Partition::new(variables, &self.features, &self.environments)?;
        if partition.is_empty() {
            return Ok(());
        }

        let feature_names = self.features.names();
        let environment_names = self.environments.names();
        let moved_names = partition.moved(&feature_names);

        // block of new environments and column in the new features for each
        // of the old features
        let mut blocks = IndexSet::new();
        let mut new_features = IndexSet::new();
        let mut mapping = Vec::with_capacity(self.features.count());
        for feature in &self.features {
            let (block, _) = blocks.insert_full(partition.moved_values(feature));
            let (column, _) = new_features.insert_full(partition.kept_values(feature));
            mapping.push((block, column));
        }
        let n_blocks = blocks.len();

        log::debug!(
            "densify: moving [{}] to the environments, creating {} blocks of {} environments",
            moved_names.join(", "), n_blocks, self.environments.count()
        );

        let mut new_environments = IndexesBuilder::new(
            environment_names.iter().chain(moved_names.iter()).copied().collect()
        );
        for environment in &self.environments {
            for block in &blocks {
                let row = environment.iter().chain(block.iter()).copied().collect::<Vec<_>>();
                new_environments.add(&row)?;
            }
        }

        let mut values = Array2::zeros((self.environments.count() * n_blocks, new_features.len()));
        for (environment, row) in self.values.outer_iter().enumerate() {
            for (feature, &value) in row.iter().enumerate() {
                let (block, column) = mapping[feature];
                values[[environment * n_blocks + block, column]] = value;
            }
        }

        let mut new_gradients = None;
        if let (Some(gradients), Some(gradients_indexes)) = (&self.gradients, &self.gradients_indexes) {
            let n_prefix = environment_names.len();
            let gradients_names = gradients_indexes.names();
            let names = environment_names.iter()
                .chain(moved_names.iter())
                .chain(gradients_names[n_prefix..].iter())
                .copied()
                .collect::<Vec<_>>();
            check_unique_names(&names, "gradients")?;

            let mut new_gradients_indexes = IndexesBuilder::new(names);
            for row in gradients_indexes {
                let (prefix, suffix) = row.split_at(n_prefix);
                for block in &blocks {
                    let new_row = prefix.iter()
                        .chain(block.iter())
                        .chain(suffix.iter())
                        .copied()
                        .collect::<Vec<_>>();
                    new_gradients_indexes.add(&new_row)?;
                }
            }

            let mut array = Array2::zeros((gradients_indexes.count() * n_blocks, new_features.len()));
            for (gradient_row, row) in gradients.outer_iter().enumerate() {
                for (feature, &value) in row.iter().enumerate() {
                    let (block, column) = mapping[feature];
                    array[[gradient_row * n_blocks + block, column]] = value;
                }
            }

            new_gradients = Some((array, new_gradients_indexes.finish()));
        }

        if let Some((array, indexes)) = new_gradients {
            self.gradients = Some(array);
            self.gradients_indexes = Some(indexes);
        }
        self.environments = new_environments.finish();
        self.features = indexes_from_set(partition.kept(&feature_names), new_features)?;
        self.values = values;

        return Ok(());
    }

    /// Make this descriptor dense along the given `variables`, moving them
    /// from the environments to the features.
    ///
    /// All the environments which only differ by the values of the moved
    /// variables are merged into a single environment, and the features are
    /// duplicated for each distinct value of the moved variables. Missing
    /// entries are set to zero.
    ///
    /// Variables which are already part of the features are skipped. Using an
    /// empty list of variables does nothing.
    #[time_graph::instrument(name = "Descriptor::densify_to_features")]
    pub fn densify_to_features(&mut self, variables: &[&str]) -> Result<(), Error> {
        let partition = Partition::new(variables, &self.environments, &self.features)?;
        if partition.is_empty() {
            return Ok(());
        }

        let feature_names = self.features.names();
        let environment_names = self.environments.names();
        let moved_names = partition.moved(&environment_names);
        let n_features = self.features.count();

        // new environment row and feature block for each of the old
        // environments
        let mut new_environments = IndexSet::new();
        let mut blocks = IndexSet::new();
        let mut mapping = Vec::with_capacity(self.environments.count());
        for environment in &self.environments {
            let (row, _) = new_environments.insert_full(partition.kept_values(environment));
            let (block, _) = blocks.insert_full(partition.moved_values(environment));
            mapping.push((row, block));
        }

        log::debug!(
            "densify: moving [{}] to the features, merging {} environments into {}",
            moved_names.join(", "), self.environments.count(), new_environments.len()
        );

        let mut new_features = IndexesBuilder::new(
            moved_names.iter().chain(feature_names.iter()).copied().collect()
        );
        for block in &blocks {
            for feature in &self.features {
                let row = block.iter().chain(feature.iter()).copied().collect::<Vec<_>>();
                new_features.add(&row)?;
            }
        }

        let mut values = Array2::zeros((new_environments.len(), blocks.len() * n_features));
        for (environment, row) in self.values.outer_iter().enumerate() {
            let (new_row, block) = mapping[environment];
            let start = block * n_features;
            values.row_mut(new_row)
                .slice_mut(ndarray::s![start..start + n_features])
                .assign(&row);
        }

        let mut new_gradients = None;
        if let (Some(gradients), Some(gradients_indexes)) = (&self.gradients, &self.gradients_indexes) {
            let n_prefix = environment_names.len();
            let gradients_names = gradients_indexes.names();
            let new_names = partition.kept(&environment_names).into_iter()
                .chain(gradients_names[n_prefix..].iter().copied())
                .collect::<Vec<_>>();

            let mut new_gradients_rows = IndexSet::new();
            let mut gradients_mapping = Vec::with_capacity(gradients_indexes.count());
            for row in gradients_indexes {
                let (prefix, suffix) = row.split_at(n_prefix);
                let environment = self.environments.position(prefix).ok_or_else(|| Error::Internal(format!(
                    "missing environment [{}] for gradient row",
                    prefix.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
                )))?;

                let new_row = partition.kept_values(prefix).into_iter()
                    .chain(suffix.iter().copied())
                    .collect::<Vec<_>>();
                let (new_row, _) = new_gradients_rows.insert_full(new_row);
                gradients_mapping.push((new_row, mapping[environment].1));
            }

            let mut array = Array2::zeros((new_gradients_rows.len(), blocks.len() * n_features));
            for (gradient_row, row) in gradients.outer_iter().enumerate() {
                let (new_row, block) = gradients_mapping[gradient_row];
                let start = block * n_features;
                array.row_mut(new_row)
                    .slice_mut(ndarray::s![start..start + n_features])
                    .assign(&row);
            }

            new_gradients = Some((array, indexes_from_set(new_names, new_gradients_rows)?));
        }

        if let Some((array, indexes)) = new_gradients {
            self.gradients = Some(array);
            self.gradients_indexes = Some(indexes);
        }
        self.environments = indexes_from_set(partition.kept(&environment_names), new_environments)?;
        self.features = new_features.finish();
        self.values = values;

        return Ok(());
    }
}
