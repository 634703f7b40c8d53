//! Collaborator boundary and result types of the pairing adaptor.

use std::collections::HashMap;
use std::hash::Hash;

use crate::assignment::CostMatrix;
use crate::blossom::WeightedGraph;

/// A domain that offers cells to be paired.
///
/// The domain scores a configuration as the sum of `cost(u, v)` over the
/// chosen pairs plus `cell_value(x)` over every eligible cell left
/// unpaired. The adaptor turns that minimization into a maximum-weight
/// matching with `weight(u, v) = value(u) + value(v) - cost(u, v)`.
///
/// # Examples
///
/// ```
/// use u_matching::adaptor::PairSource;
///
/// struct Line { values: Vec<f64> }
///
/// impl PairSource for Line {
///     type Node = usize;
///
///     fn cell_value(&self, node: &usize) -> f64 {
///         self.values[*node]
///     }
///
///     fn valid_pairs(&self) -> Vec<(usize, usize, f64)> {
///         (1..self.values.len())
///             .map(|i| (i - 1, i, (self.values[i] - self.values[i - 1]).abs()))
///             .collect()
///     }
///
///     fn eligible_nodes(&self) -> Vec<usize> {
///         (0..self.values.len()).collect()
///     }
/// }
/// ```
pub trait PairSource {
    /// Identifier of a cell.
    type Node: Clone + Eq + Hash;

    /// Penalty paid when `node` stays unpaired.
    fn cell_value(&self, node: &Self::Node) -> f64;

    /// Every pair the domain allows, with its pairing cost.
    fn valid_pairs(&self) -> Vec<(Self::Node, Self::Node, f64)>;

    /// Every cell that contributes to the score when unpaired.
    fn eligible_nodes(&self) -> Vec<Self::Node>;
}

/// The pair graph of a [`PairSource`] over dense node ids.
///
/// Ids follow the order in which nodes first appear in
/// [`PairSource::valid_pairs`].
#[derive(Debug, Clone)]
pub struct PairGraph<K> {
    pub(crate) graph: WeightedGraph,
    pub(crate) nodes: Vec<K>,
    pub(crate) index: HashMap<K, usize>,
}

impl<K: Clone + Eq + Hash> PairGraph<K> {
    /// The weighted graph handed to the blossom solver.
    pub fn graph(&self) -> &WeightedGraph {
        &self.graph
    }

    /// Node keys indexed by id.
    pub fn nodes(&self) -> &[K] {
        &self.nodes
    }

    /// Id of `key`, if it takes part in any pair.
    pub fn id_of(&self, key: &K) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Adaptor weight of the pair `{a, b}`, if it is a valid pair.
    pub fn weight(&self, a: &K, b: &K) -> Option<f64> {
        self.graph.weight_between(self.id_of(a)?, self.id_of(b)?)
    }

    /// Maps id pairs back to keys, ordering each pair and the list by id.
    pub(crate) fn keyed(&self, ids: impl IntoIterator<Item = (usize, usize)>) -> Vec<(K, K)> {
        let mut ids: Vec<(usize, usize)> = ids
            .into_iter()
            .map(|(u, v)| (u.min(v), u.max(v)))
            .collect();
        ids.sort_unstable();
        ids.into_iter()
            .map(|(u, v)| (self.nodes[u].clone(), self.nodes[v].clone()))
            .collect()
    }
}

/// The pair graph split into two sides, as an assignment cost matrix.
///
/// Entry `(r, c)` is `-max(weight, 0)` when `rows[r]` and `cols[c]` form a
/// valid pair and `0` otherwise, so a minimum-cost assignment selects a
/// maximum-weight set of positive pairs.
#[derive(Debug, Clone)]
pub struct BipartiteCostMatrix<K> {
    pub(crate) matrix: CostMatrix,
    pub(crate) rows: Vec<usize>,
    pub(crate) cols: Vec<usize>,
    pub(crate) pairs: PairGraph<K>,
}

impl<K: Clone + Eq + Hash> BipartiteCostMatrix<K> {
    /// The cost matrix handed to the assignment solver.
    pub fn matrix(&self) -> &CostMatrix {
        &self.matrix
    }

    /// Node key of each row.
    pub fn row_keys(&self) -> Vec<K> {
        self.rows.iter().map(|&u| self.pairs.nodes[u].clone()).collect()
    }

    /// Node key of each column.
    pub fn col_keys(&self) -> Vec<K> {
        self.cols.iter().map(|&v| self.pairs.nodes[v].clone()).collect()
    }

    /// Keeps the assigned cells that form a valid pair of positive weight.
    pub(crate) fn read_back(&self, assigned: &[(usize, usize)]) -> Vec<(usize, usize)> {
        assigned
            .iter()
            .map(|&(r, c)| (self.rows[r], self.cols[c]))
            .filter(|&(u, v)| {
                self.pairs
                    .graph
                    .weight_between(u, v)
                    .is_some_and(|w| w > 0.0)
            })
            .collect()
    }
}

/// Pairs selected by a solver, with their total adaptor weight.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchingResult<K> {
    /// Selected pairs.
    pub pairs: Vec<(K, K)>,

    /// Sum of `value(u) + value(v) - cost(u, v)` over the selected pairs.
    pub total_weight: f64,
}

impl<K> MatchingResult<K> {
    /// Domain score of this result: `baseline - total_weight`, where
    /// `baseline` is the score with no pairs at all (see
    /// [`baseline_score`](super::baseline_score)).
    pub fn domain_score(&self, baseline: f64) -> f64 {
        baseline - self.total_weight
    }

    /// Number of selected pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if no pair was selected.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
