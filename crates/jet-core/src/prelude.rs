pub use crate::config::Config;
pub use crate::model::{BalanceTargets, Gain, RefineData};
pub use crate::multilevel::{partition, partition_best_of, PartitionResult};

pub use crate::coarsen;
pub use crate::initial;
pub use crate::io;
pub use crate::multilevel;
pub use crate::refine;

pub use crate::Error;

// Re-exported so downstream crates can call graph accessor methods
// (`node_count`, `neighbors_with_values`, ...) without a second,
// name-colliding `use graph_builder::prelude::*;`.
pub use graph_builder::index::Idx;
pub use graph_builder::{CsrLayout, Graph, UndirectedCsrGraph, UndirectedDegrees, UndirectedNeighbors, UndirectedNeighborsWithValues};
