//! Error type shared by all solvers.

use thiserror::Error;

/// Errors reported by the matching solvers and their adaptors.
///
/// Every variant is detected before or while the solver builds its internal
/// state. Once a solve has started on validated input it always completes
/// (or reports [`MatchingError::Cancelled`]).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchingError {
    /// The cost matrix is not rectangular, or its data does not fit the
    /// declared dimensions.
    #[error("shape error: {0}")]
    Shape(String),

    /// An edge joins a node to itself.
    #[error("invalid edge: self-loop on node {node}")]
    SelfLoop { node: usize },

    /// An edge references a node outside the graph.
    #[error("invalid edge: node {node} is out of range for a graph with {node_count} nodes")]
    UnknownNode { node: usize, node_count: usize },

    /// An edge given by node keys names a key outside the node set.
    #[error("invalid edge: edge {edge} references a node outside the node set")]
    UnknownKey { edge: usize },

    /// The same key appears more than once in a keyed node set.
    #[error("duplicate node: key at position {position} was already listed")]
    DuplicateKey { position: usize },

    /// A weight or cost is NaN or infinite.
    #[error("non-finite value: {0}")]
    NonFinite(String),

    /// The pair graph contains an odd cycle, so it cannot be split into
    /// the two partitions of an assignment matrix.
    #[error("pair graph is not bipartite")]
    NotBipartite,

    /// The cancellation flag was raised before the solve completed.
    #[error("solve cancelled")]
    Cancelled,

    /// A grid description could not be parsed.
    #[error("grid format error: {0}")]
    GridFormat(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MatchingError>;
