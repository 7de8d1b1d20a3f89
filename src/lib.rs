//! # pathsort
//!
//! Path-guided 1D stochastic gradient descent layout and ordering for
//! bidirected pangenome graphs.
//!
//! Given a graph whose paths cover its node set, the engine assigns
//! every node a position on a line so that distances in the layout
//! approximate distances along the paths, then projects the positions to
//! a total node ordering grouped by weakly connected component.
//!
//! ## Features
//!
//! - **Path-guided SGD**: lock-free multi-threaded coordinate descent
//!   driven by a Zipfian term-pair sampler over three sampling spaces
//! - **Deterministic mode**: a single-threaded engine seeded from a byte
//!   string for byte-identical reruns
//! - **Snapshots**: optional per-iteration captures of the layout and
//!   their projected orderings
//!
//! ## Quick Start
//!
//! ```rust
//! use pathsort::{BidirectedGraph, BiPath, PathIndex, PathSGDParams, path_linear_sgd_order};
//!
//! let mut graph = BidirectedGraph::new();
//! let a = graph.add_node(1, b"ACGT".to_vec());
//! let b = graph.add_node(2, b"GG".to_vec());
//! graph.add_edge(a, b);
//! let mut path = BiPath::new("p".to_string());
//! path.add_step(a);
//! path.add_step(b);
//! graph.paths.push(path);
//!
//! let index = PathIndex::from_graph(&graph);
//! let params = PathSGDParams {
//!     deterministic: true,
//!     ..PathSGDParams::default()
//! };
//! let (order, _snapshots) = path_linear_sgd_order(&graph, &index, &[0], &params).unwrap();
//! assert_eq!(order.len(), 2);
//! ```

mod error;
mod graph;
mod interval;
mod order;
mod sampler;
mod schedule;
mod sgd;
mod xp;
mod zipf;

pub mod gfa_parser;

pub use error::{SortError, SortResult};
pub use graph::{BiEdge, BiNode, BiPath, BidirectedGraph, Handle};
pub use interval::PathIntervalTree;
pub use order::{order_by_layout, weakly_connected_components};
pub use sampler::{SampleSpace, Term, TermSampler};
pub use schedule::path_linear_sgd_schedule;
pub use sgd::{
    deterministic_path_linear_sgd, path_linear_sgd, path_linear_sgd_order, PathSGDParams,
};
pub use xp::PathIndex;
pub use zipf::ZipfianInt;
