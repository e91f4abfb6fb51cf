//! A building block for the jet graph partitioner.
//!
//! Graph provides a Compressed-Sparse-Row (CSR) representation of undirected,
//! edge- and vertex-weighted graphs, tailored for fast and concurrent access
//! to the graph topology during coarsening and refinement. The library uses
//! [rayon](https://github.com/rayon-rs/rayon) to parallelize all steps during
//! graph creation.
//!
//! # What is a graph?
//!
//! A graph consists of nodes and edges where edges connect exactly two nodes.
//! A node `u` has neighbors, i.e. any node `v` for which an edge `(u, v)` or
//! `(v, u)` exists. The graphs built by this crate are always undirected:
//! there is no distinction between source and target node.
//!
//! # How to build a graph
//!
//! The library provides a builder that can be used to construct a graph from
//! a given list of edges.
//!
//! ```
//! use graph_builder::prelude::*;
//!
//! let graph: UndirectedCsrGraph<usize> = GraphBuilder::new()
//!     .csr_layout(CsrLayout::Sorted)
//!     .edges(vec![(0, 1), (0, 2), (1, 2), (1, 3), (2, 3)])
//!     .build();
//!
//! assert_eq!(graph.node_count(), 4);
//! assert_eq!(graph.edge_count(), 5);
//!
//! assert_eq!(graph.degree(1), 3);
//! assert_eq!(graph.neighbors(1).as_slice(), &[0, 2, 3]);
//! ```
//!
//! Edges can have attached values to represent edge-weighted graphs, and
//! nodes can carry a value to represent vertex weights:
//!
//! ```
//! use graph_builder::prelude::*;
//!
//! let graph: UndirectedCsrGraph<u32, (), i64> = GraphBuilder::new()
//!     .csr_layout(CsrLayout::Sorted)
//!     .edges_with_values(vec![(0, 1, 5), (0, 2, 7), (1, 2, 2), (1, 3, 1), (2, 3, 3)])
//!     .build();
//!
//! assert_eq!(graph.node_count(), 4);
//! assert_eq!(graph.edge_count(), 5);
//!
//! assert_eq!(graph.degree(1), 3);
//! assert_eq!(
//!     graph.neighbors_with_values(1).as_slice(),
//!     &[Target::new(0, 5), Target::new(2, 2), Target::new(3, 1)]
//! );
//! ```
//!
//! It is also possible to create a graph from a METIS-format graph file. In
//! the following example we use the `MetisInput` format.
//!
//! ```no_run
//! use graph_builder::prelude::*;
//!
//! let graph: UndirectedCsrGraph<usize, i64, i64> = GraphBuilder::new()
//!     .file_format(MetisInput::default())
//!     .path("graph.metis")
//!     .build()
//!     .expect("loading failed");
//! ```

pub mod builder;
pub mod graph;
pub mod index;
pub mod input;
pub mod prelude;

pub use crate::builder::GraphBuilder;
pub use crate::graph::csr::CsrLayout;
pub use crate::graph::csr::UndirectedCsrGraph;

use crate::graph::csr::Target;
use crate::index::Idx;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("error while loading graph")]
    IoError {
        #[from]
        source: std::io::Error,
    },
    #[error("incompatible index type")]
    IdxError {
        #[from]
        source: std::num::TryFromIntError,
    },
    #[error("invalid partitioning")]
    InvalidPartitioning,
    #[error("number of node values must be the same as node count")]
    InvalidNodeValues,
    #[error("invalid id size, expected {expected:?} bytes, got {actual:?} bytes")]
    InvalidIdType { expected: String, actual: String },
    #[error("malformed metis header: {detail}")]
    InvalidMetisHeader { detail: String },
    #[error("metis file declared {expected} entries but {actual} were read")]
    MetisCountMismatch { expected: usize, actual: usize },
    #[error("malformed coarse-sequence binary data: {detail}")]
    CoarseDumpFormat { detail: String },
}

impl From<std::convert::Infallible> for Error {
    fn from(_: std::convert::Infallible) -> Self {
        unreachable!()
    }
}

/// A graph is a tuple `(N, E)`, where `N` is a set of nodes and `E` a set of
/// edges. Each edge connects exactly two nodes.
///
/// `Graph` is parameterized over the node index type `Node` which is used to
/// uniquely identify a node. An edge is a tuple of node identifiers.
pub trait Graph<NI: Idx> {
    /// Returns the number of nodes in the graph.
    fn node_count(&self) -> NI;

    /// Returns the number of edges in the graph.
    fn edge_count(&self) -> NI;
}

/// A graph that allows storing a value per node, e.g. a vertex weight.
pub trait NodeValues<NI: Idx, NV> {
    fn node_value(&self, node: NI) -> &NV;
}

pub trait UndirectedDegrees<NI: Idx> {
    /// Returns the number of edges connected to the given node.
    fn degree(&self, node: NI) -> NI;
}

/// Returns the neighbors of a given node.
///
/// The edge `(42, 1337)` is equivalent to the edge `(1337, 42)`.
pub trait UndirectedNeighbors<NI: Idx> {
    type NeighborsIterator<'a>: Iterator<Item = &'a NI>
    where
        Self: 'a;

    /// Returns an iterator of all nodes connected to the given node.
    fn neighbors(&self, node: NI) -> Self::NeighborsIterator<'_>;
}

/// Returns the neighbors of a given node together with the edge value.
///
/// The edge `(42, 1337)` is equivalent to the edge `(1337, 42)`.
pub trait UndirectedNeighborsWithValues<NI: Idx, EV> {
    type NeighborsIterator<'a>: Iterator<Item = &'a Target<NI, EV>>
    where
        Self: 'a,
        EV: 'a;

    /// Returns an iterator of all nodes connected to the given node
    /// including the value of the connecting edge.
    fn neighbors_with_values(&self, node: NI) -> Self::NeighborsIterator<'_>;
}

/// A graph that exposes its CSR topology for writing and reading in a raw
/// byte-oriented binary format, used for dumping and re-importing coarsening
/// sequences.
pub trait SerializeGraphOp<W> {
    fn serialize(&self, write: W) -> Result<(), Error>;
}

pub trait DeserializeGraphOp<R>: Sized {
    fn deserialize(read: R) -> Result<Self, Error>;
}

#[repr(transparent)]
pub struct SharedMut<T>(*mut T);
unsafe impl<T: Send> Send for SharedMut<T> {}
unsafe impl<T: Sync> Sync for SharedMut<T> {}

impl<T> SharedMut<T> {
    pub fn new(ptr: *mut T) -> Self {
        SharedMut(ptr)
    }

    delegate::delegate! {
        to self.0 {
            /// # Safety
            ///
            /// Ensure that `count` does not exceed the capacity of the Vec.
            pub unsafe fn add(&self, count: usize) -> *mut T;
        }
    }
}
