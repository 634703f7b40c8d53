//! Maximum-weight matching in general graphs (Edmonds' blossom algorithm).
//!
//! The solver maintains a primal matching and dual variables (one per
//! vertex, one per contracted blossom) and grows alternating trees from
//! every exposed vertex. Odd cycles found during the search are contracted
//! into blossoms; dual adjustments make new edges tight or let inner
//! blossoms expand again. Each stage either augments the matching or
//! proves it optimal, giving `O(V^3)` time overall.
//!
//! With [`BlossomConfig::max_cardinality`] set, only matchings of maximum
//! cardinality are considered, and among those the heaviest is returned.
//!
//! # Representation
//!
//! Vertices are the ids `0..n`; contracted blossoms take ids from `n..2n`.
//! Labels, label edges, best edges, parents and duals are flat vectors over
//! this shared id space, and all traversals of the nested blossom structure
//! use explicit worklists.
//!
//! # References
//!
//! - Edmonds, J. (1965). "Paths, trees, and flowers", *Canadian J. Math* 17, 449-467.
//! - Galil, Z. (1986). "Efficient algorithms for finding maximum matching in
//!   graphs", *ACM Computing Surveys* 18(1), 23-38.
//! - Gabow, H. N. (1973). "Implementation of algorithms for maximum matching
//!   on nonbipartite graphs", Ph.D. thesis, Stanford.

mod config;
mod graph;
mod runner;
mod search;
mod verify;

pub use config::BlossomConfig;
pub use graph::{Edge, WeightedGraph};
pub use runner::{solve_general_matching, BlossomSolver, Matching};
