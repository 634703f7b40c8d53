//! Blossom solver execution engine.
//!
//! # Algorithm
//!
//! Repeats stages until a stage ends without augmenting:
//!
//! 1. Label every exposed vertex outer and queue it
//! 2. Scan edges out of queued outer vertices; tight edges grow the
//!    alternating forest, close an odd cycle (contract a blossom) or join
//!    two trees (augment and end the stage)
//! 3. With the queue empty, pick the smallest dual adjustment that makes a
//!    new edge tight, lets an inner blossom expand, or drives the outer
//!    vertex duals to zero (which proves optimality)
//! 4. After an augmentation, expand top-level blossoms whose dual is zero

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::debug;

use super::config::BlossomConfig;
use super::graph::WeightedGraph;
use super::search::SearchContext;
use crate::error::{MatchingError, Result};

/// A set of vertex-disjoint edges and its total weight.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Matching {
    /// Matched pairs `(u, v)` with `u < v`, sorted by `u`.
    pub pairs: Vec<(usize, usize)>,

    /// Sum of the weights of the matched edges.
    pub total_weight: f64,

    mate: Vec<Option<usize>>,
}

impl Matching {
    fn empty(node_count: usize) -> Self {
        Self {
            pairs: Vec::new(),
            total_weight: 0.0,
            mate: vec![None; node_count],
        }
    }

    /// Partner of `v`, or `None` if `v` is exposed or out of range.
    pub fn mate(&self, v: usize) -> Option<usize> {
        self.mate.get(v).copied().flatten()
    }

    /// Number of matched pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if no edge is matched.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Maximum-weight general matching solver.
pub struct BlossomSolver;

impl BlossomSolver {
    /// Computes a maximum-weight matching of `graph`.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_matching::blossom::{BlossomConfig, BlossomSolver, WeightedGraph};
    ///
    /// // Path a-b-c-d: the heavy middle edge beats both outer edges.
    /// let g = WeightedGraph::from_edges(4, [(0, 1, 2.0), (1, 2, 10.0), (2, 3, 3.0)]).unwrap();
    /// let m = BlossomSolver::solve(&g, &BlossomConfig::default()).unwrap();
    /// assert_eq!(m.pairs, vec![(1, 2)]);
    ///
    /// let config = BlossomConfig::default().with_max_cardinality(true);
    /// let m = BlossomSolver::solve(&g, &config).unwrap();
    /// assert_eq!(m.pairs, vec![(0, 1), (2, 3)]);
    /// ```
    pub fn solve(graph: &WeightedGraph, config: &BlossomConfig) -> Result<Matching> {
        Self::solve_with_cancel(graph, config, None)
    }

    /// Computes a maximum-weight matching with an optional cancellation flag.
    ///
    /// The flag is checked before each stage. A raised flag yields
    /// [`MatchingError::Cancelled`].
    pub fn solve_with_cancel(
        graph: &WeightedGraph,
        config: &BlossomConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<Matching> {
        config.validate().expect("invalid BlossomConfig");

        let n = graph.node_count();
        if graph.edge_count() == 0 {
            return Ok(Matching::empty(n));
        }

        let mut ctx = SearchContext::new(graph, config.max_cardinality);
        let mut stages = 0usize;
        let mut augmentations = 0usize;
        loop {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    debug!("blossom: cancelled after {stages} stages");
                    return Err(MatchingError::Cancelled);
                }
            }

            stages += 1;
            if !ctx.run_stage() {
                break;
            }
            augmentations += 1;
            ctx.expand_spent_blossoms();
        }

        if config.verify_optimum {
            if let Err(violation) = ctx.verify_optimum(config.verify_tolerance) {
                panic!("blossom: optimality certificate failed: {violation}");
            }
        }

        let pairs = ctx.pairs();
        let mut mate = vec![None; n];
        for &(u, v) in &pairs {
            mate[u] = Some(v);
            mate[v] = Some(u);
        }
        let total_weight = pairs
            .iter()
            .filter_map(|&(u, v)| graph.weight_between(u, v))
            .sum();

        debug!(
            "blossom: {n} nodes, {} edges, {stages} stages, {augmentations} augmentations, weight {total_weight}",
            graph.edge_count()
        );

        Ok(Matching {
            pairs,
            total_weight,
            mate,
        })
    }
}

/// Solves a maximum-weight matching over arbitrary node keys.
///
/// Edges are `(a, b, weight)` triples naming members of `nodes`. Pairs are
/// returned in node order of their first member, each pair ordered by
/// position in `nodes`.
///
/// # Errors
///
/// - [`MatchingError::SelfLoop`] if an edge joins a key to itself
/// - [`MatchingError::DuplicateKey`] if a key appears twice in `nodes`
/// - [`MatchingError::UnknownKey`] if an edge names a key not in `nodes`
/// - [`MatchingError::NonFinite`] if a weight is NaN or infinite
///
/// # Examples
///
/// ```
/// use u_matching::blossom::solve_general_matching;
///
/// let pairs = solve_general_matching(
///     &["a", "b", "c"],
///     &[("a", "b", 3.0), ("b", "c", 5.0), ("a", "c", 1.0)],
///     false,
/// )
/// .unwrap();
/// assert_eq!(pairs, vec![("b", "c")]);
/// ```
pub fn solve_general_matching<K>(
    nodes: &[K],
    edges: &[(K, K, f64)],
    max_cardinality: bool,
) -> Result<Vec<(K, K)>>
where
    K: Eq + Hash + Clone,
{
    let mut index: HashMap<&K, usize> = HashMap::with_capacity(nodes.len());
    for (i, k) in nodes.iter().enumerate() {
        if index.insert(k, i).is_some() {
            return Err(MatchingError::DuplicateKey { position: i });
        }
    }

    let mut graph = WeightedGraph::new(nodes.len());
    for (e, (a, b, w)) in edges.iter().enumerate() {
        let (Some(&u), Some(&v)) = (index.get(a), index.get(b)) else {
            return Err(MatchingError::UnknownKey { edge: e });
        };
        graph.add_edge(u, v, *w)?;
    }

    let config = BlossomConfig::default().with_max_cardinality(max_cardinality);
    let matching = BlossomSolver::solve(&graph, &config)?;
    Ok(matching
        .pairs
        .iter()
        .map(|&(u, v)| (nodes[u].clone(), nodes[v].clone()))
        .collect())
}
