//! Jet: a data-parallel local-search refiner for multilevel k-way graph
//! partitioning.
//!
//! The crate splits along the same lines as the system it refines:
//! [`coarsen`] builds the coarsening sequence, [`initial`] partitions the
//! coarsest graph, and [`refine`] drives the per-level label-propagation
//! and rebalancing passes that improve the partition as it is projected
//! back down to the original graph. [`multilevel::partition`] ties the
//! three together; [`io`] and [`config`] handle everything that crosses a
//! process boundary -- METIS input, the config file format, partition
//! output, and coarse-sequence dumps.
//!
//! ```no_run
//! use jet_core::prelude::*;
//!
//! let (graph, vtx_w) = io::load_metis_graph("graph.metis").expect("loading failed");
//! let config = Config::new(1, 4, 1, 1.03);
//! let result = multilevel::partition(&graph, &vtx_w, &config).expect("partitioning failed");
//! println!("cut = {}", result.cut);
//! ```

pub mod bucket;
pub mod coarsen;
pub mod config;
pub mod conn;
pub mod initial;
pub mod io;
pub mod lp;
pub mod model;
pub mod moves;
pub mod multilevel;
pub mod rebalance;
pub mod refine;

mod error;

pub mod prelude;

pub use error::Error;
