//! Rectangular assignment problem (Hungarian algorithm).
//!
//! Finds a minimum-cost assignment of the rows of an `R x C` cost matrix to
//! its columns. When `R <= C` every row is assigned; otherwise the matrix is
//! transposed internally and every column is assigned. A zero-length
//! dimension yields an empty assignment.
//!
//! # Tie-breaking
//!
//! Zeros of the reduced matrix are discovered in row-major scan order, so
//! among several optimal assignments the one returned is deterministic for a
//! given input.
//!
//! # References
//!
//! - Kuhn, H. W. (1955). "The Hungarian Method for the assignment problem",
//!   *Naval Research Logistics Quarterly* 2, 83-97.
//! - Munkres, J. (1957). "Algorithms for the Assignment and Transportation
//!   Problems", *J. SIAM* 5(1), 32-38.
//! - Bourgeois & Lassalle (1971), rectangular extension.

mod runner;
mod types;

pub use runner::{solve_assignment, HungarianSolver};
pub use types::{Assignment, CostMatrix};
