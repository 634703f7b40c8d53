//! Builds solver inputs from a [`PairSource`].

use std::collections::{HashMap, VecDeque};

use log::debug;

use super::types::{BipartiteCostMatrix, PairGraph, PairSource};
use crate::assignment::CostMatrix;
use crate::blossom::WeightedGraph;
use crate::error::{MatchingError, Result};

/// Builds the weighted pair graph with
/// `weight(u, v) = value(u) + value(v) - cost(u, v)`.
///
/// # Errors
///
/// - [`MatchingError::SelfLoop`] if a pair joins a cell to itself
/// - [`MatchingError::NonFinite`] if a value or cost is NaN or infinite
pub fn build_weighted_graph<S: PairSource>(source: &S) -> Result<PairGraph<S::Node>> {
    let pairs = source.valid_pairs();
    let mut nodes = Vec::new();
    let mut index = HashMap::new();
    let mut edges = Vec::with_capacity(pairs.len());

    for (a, b, cost) in pairs {
        let weight = source.cell_value(&a) + source.cell_value(&b) - cost;
        let mut id = |key: S::Node| {
            *index.entry(key.clone()).or_insert_with(|| {
                nodes.push(key);
                nodes.len() - 1
            })
        };
        let u = id(a);
        let v = id(b);
        edges.push((u, v, weight));
    }

    let graph = WeightedGraph::from_edges(nodes.len(), edges)?;
    debug!(
        "adaptor: pair graph with {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    Ok(PairGraph {
        graph,
        nodes,
        index,
    })
}

/// Builds an assignment cost matrix from the pair graph.
///
/// The two sides come from a breadth-first 2-colouring of the pair graph,
/// visiting components in id order; the first node of each component goes
/// to the rows.
///
/// # Errors
///
/// Everything [`build_weighted_graph`] reports, plus
/// [`MatchingError::NotBipartite`] if the pair graph has an odd cycle.
pub fn build_cost_matrix<S: PairSource>(source: &S) -> Result<BipartiteCostMatrix<S::Node>> {
    let pairs = build_weighted_graph(source)?;
    split_sides(pairs)
}

pub(crate) fn split_sides<K>(pairs: PairGraph<K>) -> Result<BipartiteCostMatrix<K>> {
    let graph = &pairs.graph;
    let n = graph.node_count();

    let mut side: Vec<Option<bool>> = vec![None; n];
    let mut queue = VecDeque::new();
    for start in 0..n {
        if side[start].is_some() {
            continue;
        }
        side[start] = Some(false);
        queue.push_back(start);
        while let Some(u) = queue.pop_front() {
            let su = side[u] == Some(true);
            for &k in graph.incident(u) {
                let v = graph.edge(k).other(u);
                match side[v] {
                    None => {
                        side[v] = Some(!su);
                        queue.push_back(v);
                    }
                    Some(sv) if sv == su => return Err(MatchingError::NotBipartite),
                    Some(_) => {}
                }
            }
        }
    }

    let rows: Vec<usize> = (0..n).filter(|&u| side[u] == Some(false)).collect();
    let cols: Vec<usize> = (0..n).filter(|&u| side[u] == Some(true)).collect();
    let mut col_of = vec![0; n];
    for (c, &v) in cols.iter().enumerate() {
        col_of[v] = c;
    }
    let mut row_of = vec![0; n];
    for (r, &u) in rows.iter().enumerate() {
        row_of[u] = r;
    }

    let mut matrix = CostMatrix::filled(rows.len(), cols.len(), 0.0);
    for e in graph.edges() {
        let (r, c) = if side[e.u] == Some(false) {
            (row_of[e.u], col_of[e.v])
        } else {
            (row_of[e.v], col_of[e.u])
        };
        matrix.set(r, c, -e.weight.max(0.0));
    }

    debug!("adaptor: cost matrix {}x{}", rows.len(), cols.len());
    Ok(BipartiteCostMatrix {
        matrix,
        rows,
        cols,
        pairs,
    })
}

/// Score of the configuration with no pairs: the sum of the values of all
/// eligible cells.
///
/// # Errors
///
/// [`MatchingError::NonFinite`] if an eligible cell has a NaN or infinite
/// value.
pub fn baseline_score<S: PairSource>(source: &S) -> Result<f64> {
    let mut total = 0.0;
    for (k, x) in source.eligible_nodes().iter().enumerate() {
        let value = source.cell_value(x);
        if !value.is_finite() {
            return Err(MatchingError::NonFinite(format!(
                "value {value} of eligible cell {k}"
            )));
        }
        total += value;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cells on a line, each pairable with its right neighbour.
    struct Line {
        values: Vec<f64>,
        extra: Vec<(usize, usize, f64)>,
    }

    impl Line {
        fn new(values: &[f64]) -> Self {
            Self {
                values: values.to_vec(),
                extra: Vec::new(),
            }
        }
    }

    impl PairSource for Line {
        type Node = usize;

        fn cell_value(&self, node: &usize) -> f64 {
            self.values[*node]
        }

        fn valid_pairs(&self) -> Vec<(usize, usize, f64)> {
            let mut pairs: Vec<_> = (1..self.values.len())
                .map(|i| (i - 1, i, (self.values[i] - self.values[i - 1]).abs()))
                .collect();
            pairs.extend(self.extra.iter().copied());
            pairs
        }

        fn eligible_nodes(&self) -> Vec<usize> {
            (0..self.values.len()).collect()
        }
    }

    #[test]
    fn test_weights_follow_reduction() {
        let line = Line::new(&[5.0, 8.0]);
        let pg = build_weighted_graph(&line).unwrap();
        assert_eq!(pg.nodes(), &[0, 1]);
        // 5 + 8 - |5 - 8|
        assert_eq!(pg.weight(&0, &1), Some(10.0));
        assert_eq!(baseline_score(&line), Ok(13.0));
    }

    #[test]
    fn test_node_ids_follow_first_appearance() {
        let line = Line::new(&[1.0, 1.0, 1.0, 4.0]);
        let pg = build_weighted_graph(&line).unwrap();
        assert_eq!(pg.nodes(), &[0, 1, 2, 3]);
        assert_eq!(pg.id_of(&3), Some(3));
        assert_eq!(pg.id_of(&9), None);
    }

    #[test]
    fn test_self_pair_rejected() {
        let mut line = Line::new(&[1.0, 2.0]);
        line.extra.push((1, 1, 0.0));
        assert!(matches!(
            build_weighted_graph(&line),
            Err(MatchingError::SelfLoop { .. })
        ));
    }

    #[test]
    fn test_non_finite_value_rejected() {
        let line = Line::new(&[1.0, f64::NAN]);
        assert!(matches!(
            build_weighted_graph(&line),
            Err(MatchingError::NonFinite(_))
        ));
    }

    #[test]
    fn test_unpaired_non_finite_value_rejected_by_baseline() {
        // A lone cell takes part in no pair, so only the baseline sees it.
        let line = Line::new(&[f64::INFINITY]);
        assert!(build_weighted_graph(&line).unwrap().nodes().is_empty());
        assert!(matches!(
            baseline_score(&line),
            Err(MatchingError::NonFinite(_))
        ));

        let line = Line::new(&[f64::NAN]);
        assert!(matches!(
            baseline_score(&line),
            Err(MatchingError::NonFinite(_))
        ));
    }

    #[test]
    fn test_cost_matrix_sides_alternate() {
        // 0-1-2-3 path: rows {0, 2}, cols {1, 3}.
        let line = Line::new(&[2.0, 3.0, 1.0, 6.0]);
        let bm = build_cost_matrix(&line).unwrap();
        assert_eq!(bm.row_keys(), vec![0, 2]);
        assert_eq!(bm.col_keys(), vec![1, 3]);

        let m = bm.matrix();
        assert_eq!((m.rows(), m.cols()), (2, 2));
        // weight(0,1) = 2 + 3 - 1 = 4; weight(2,1) = 1 + 3 - 2 = 2;
        // weight(2,3) = 1 + 6 - 5 = 2; (0,3) is not a pair.
        assert_eq!(m.get(0, 0), -4.0);
        assert_eq!(m.get(0, 1), 0.0);
        assert_eq!(m.get(1, 0), -2.0);
        assert_eq!(m.get(1, 1), -2.0);
    }

    #[test]
    fn test_parallel_pairs_keep_heavier_weight() {
        let mut line = Line::new(&[1.0, 1.0]);
        line.extra.push((0, 1, 10.0));
        let bm = build_cost_matrix(&line).unwrap();
        assert_eq!(bm.matrix().get(0, 0), -2.0);
    }

    #[test]
    fn test_negative_weights_clamped_to_zero() {
        // weight = -1 - 1 - 0 = -2
        let line = Line::new(&[-1.0, -1.0]);
        let bm = build_cost_matrix(&line).unwrap();
        assert_eq!(bm.matrix().get(0, 0), 0.0);
        assert!(bm.read_back(&[(0, 0)]).is_empty());
    }

    #[test]
    fn test_odd_cycle_is_not_bipartite() {
        let mut line = Line::new(&[1.0, 1.0, 1.0]);
        line.extra.push((0, 2, 0.0));
        assert_eq!(
            build_cost_matrix(&line).unwrap_err(),
            MatchingError::NotBipartite
        );
    }

    #[test]
    fn test_read_back_filters_invalid_cells() {
        let line = Line::new(&[2.0, 3.0, 1.0, 6.0]);
        let bm = build_cost_matrix(&line).unwrap();
        // (row 0, col 1) is node pair (0, 3): not a valid pair.
        let kept = bm.read_back(&[(0, 1), (1, 0)]);
        assert_eq!(kept, vec![(2, 1)]);
    }
}
