mod indexes;
pub use self::indexes::{Indexes, IndexesBuilder, IndexValue};
pub use self::indexes::EnvironmentIndexes;
pub use self::indexes::{StructureEnvironment, AtomEnvironment};
pub use self::indexes::{StructureSpeciesEnvironment, AtomSpeciesEnvironment};

#[allow(clippy::module_inception)]
mod descriptor;
pub use self::descriptor::{Descriptor, IndexesKind};

mod densify;
