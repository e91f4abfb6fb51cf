pub use crate::builder::GraphBuilder;

pub use crate::graph::csr::CsrLayout;
pub use crate::graph::csr::Target;
pub use crate::graph::csr::UndirectedCsrGraph;

pub use crate::DeserializeGraphOp;
pub use crate::SerializeGraphOp;

pub use crate::index::Idx;
pub use atomic::Atomic;

pub use crate::input::*;

pub use crate::Graph;
pub use crate::NodeValues;
pub use crate::UndirectedDegrees;
pub use crate::UndirectedNeighbors;
pub use crate::UndirectedNeighborsWithValues;

pub use crate::Error;
