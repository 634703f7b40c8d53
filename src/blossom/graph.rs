//! Weighted undirected graph fed to the blossom solver.

use std::collections::HashMap;

use crate::error::{MatchingError, Result};

/// An undirected edge between two distinct vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    pub u: usize,
    pub v: usize,
    pub weight: f64,
}

impl Edge {
    /// The endpoint opposite to `x`.
    #[inline]
    pub fn other(&self, x: usize) -> usize {
        if x == self.u {
            self.v
        } else {
            self.u
        }
    }
}

/// A graph over the dense vertex ids `0..node_count` with real edge weights.
///
/// Construction validates every edge: self-loops, endpoints outside the
/// vertex range and non-finite weights are rejected. At most one edge is
/// kept per vertex pair; adding a parallel edge keeps the heavier weight.
///
/// # Examples
///
/// ```
/// use u_matching::blossom::WeightedGraph;
///
/// let g = WeightedGraph::from_edges(3, [(0, 1, 3.0), (1, 2, 5.0)]).unwrap();
/// assert_eq!(g.edge_count(), 2);
/// assert_eq!(g.weight_between(2, 1), Some(5.0));
/// assert!(WeightedGraph::from_edges(2, [(1, 1, 1.0)]).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct WeightedGraph {
    node_count: usize,
    edges: Vec<Edge>,
    incident: Vec<Vec<usize>>,
    index: HashMap<(usize, usize), usize>,
}

impl WeightedGraph {
    /// Creates a graph with `node_count` isolated vertices.
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            edges: Vec::new(),
            incident: vec![Vec::new(); node_count],
            index: HashMap::new(),
        }
    }

    /// Creates a graph from `(u, v, weight)` triples.
    pub fn from_edges<I>(node_count: usize, edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let mut graph = Self::new(node_count);
        for (u, v, w) in edges {
            graph.add_edge(u, v, w)?;
        }
        Ok(graph)
    }

    /// Appends an isolated vertex and returns its id.
    pub fn add_node(&mut self) -> usize {
        self.incident.push(Vec::new());
        self.node_count += 1;
        self.node_count - 1
    }

    /// Adds the edge `{u, v}` with the given weight.
    pub fn add_edge(&mut self, u: usize, v: usize, weight: f64) -> Result<()> {
        if u == v {
            return Err(MatchingError::SelfLoop { node: u });
        }
        for node in [u, v] {
            if node >= self.node_count {
                return Err(MatchingError::UnknownNode {
                    node,
                    node_count: self.node_count,
                });
            }
        }
        if !weight.is_finite() {
            return Err(MatchingError::NonFinite(format!(
                "weight {weight} on edge ({u}, {v})"
            )));
        }

        let key = (u.min(v), u.max(v));
        if let Some(&k) = self.index.get(&key) {
            if weight > self.edges[k].weight {
                self.edges[k].weight = weight;
            }
            return Ok(());
        }
        let k = self.edges.len();
        self.edges.push(Edge { u, v, weight });
        self.incident[u].push(k);
        self.incident[v].push(k);
        self.index.insert(key, k);
        Ok(())
    }

    /// Number of vertices.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of distinct edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All edges, in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Edge with index `k`.
    #[inline]
    pub fn edge(&self, k: usize) -> &Edge {
        &self.edges[k]
    }

    /// Indices of the edges incident to `v`.
    #[inline]
    pub fn incident(&self, v: usize) -> &[usize] {
        &self.incident[v]
    }

    /// Index of the edge joining `u` and `v`, if any.
    pub fn edge_between(&self, u: usize, v: usize) -> Option<usize> {
        self.index.get(&(u.min(v), u.max(v))).copied()
    }

    /// Weight of the edge joining `u` and `v`, if any.
    pub fn weight_between(&self, u: usize, v: usize) -> Option<f64> {
        self.edge_between(u, v).map(|k| self.edges[k].weight)
    }

    /// Largest edge weight, or `None` for an edgeless graph.
    pub fn max_weight(&self) -> Option<f64> {
        self.edges.iter().map(|e| e.weight).reduce(f64::max)
    }

    /// Largest absolute edge weight (zero for an edgeless graph).
    pub fn max_abs_weight(&self) -> f64 {
        self.edges.iter().map(|e| e.weight.abs()).fold(0.0, f64::max)
    }
}
