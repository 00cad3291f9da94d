mod index;
pub use self::index::{IndexValue, Indexes, IndexesBuilder, EnvironmentIndexes};

mod environments;
pub use self::environments::{StructureEnvironment, AtomEnvironment};

mod species;
pub use self::species::{StructureSpeciesEnvironment, AtomSpeciesEnvironment};
