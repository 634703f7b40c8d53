//! Cost/weight adaptor between a pairing domain and the matching solvers.
//!
//! A domain scores a set of disjoint pairs as
//!
//! ```text
//! score = sum of cost(u, v) over chosen pairs
//!       + sum of value(x) over eligible unpaired cells
//! ```
//!
//! With no pairs the score is the baseline `B = sum of value(x)`. Choosing
//! the pair `(u, v)` changes the score by `cost(u, v) - value(u) - value(v)`,
//! so minimizing the score is the same as maximizing the total of
//!
//! ```text
//! weight(u, v) = value(u) + value(v) - cost(u, v)
//! ```
//!
//! over a matching, and `score = B - total_weight`. When `cost` is
//! `|value(u) - value(v)|`, the weight is `2 * min(value(u), value(v))`.
//!
//! The blossom route maximizes this weight directly. The Hungarian route
//! splits a bipartite pair graph into rows and columns and minimizes the
//! negated, non-negative part of the weight.

mod builder;
mod pairing;
mod types;

pub use builder::{baseline_score, build_cost_matrix, build_weighted_graph};
pub use pairing::{solve_pairing, solve_pairing_with_cancel, PairingConfig, PairingStrategy};
pub use types::{BipartiteCostMatrix, MatchingResult, PairGraph, PairSource};
