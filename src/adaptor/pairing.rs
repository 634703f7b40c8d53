//! End-to-end pairing: build solver input, solve, map back to cells.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use log::debug;

use super::builder::{build_weighted_graph, split_sides};
use super::types::{MatchingResult, PairSource};
use crate::assignment::HungarianSolver;
use crate::blossom::{BlossomConfig, BlossomSolver};
use crate::error::Result;

/// Which solver computes the pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PairingStrategy {
    /// Maximum-weight general matching. Works for any pair graph.
    #[default]
    Blossom,

    /// Assignment over the two sides of a bipartite pair graph.
    Hungarian,
}

/// Configuration for [`solve_pairing`].
///
/// # Examples
///
/// ```
/// use u_matching::adaptor::{PairingConfig, PairingStrategy};
///
/// let config = PairingConfig::default().with_strategy(PairingStrategy::Hungarian);
/// assert!(config.validate().is_ok());
/// assert!(config.with_max_cardinality(true).validate().is_err());
/// ```
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PairingConfig {
    /// Solver used for the pairing.
    pub strategy: PairingStrategy,

    /// Prefer a pairing that covers as many cells as possible, then the
    /// heaviest among those. Blossom strategy only.
    pub max_cardinality: bool,
}

impl PairingConfig {
    /// Sets the solver strategy.
    pub fn with_strategy(mut self, strategy: PairingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Enables or disables the maximum-cardinality preference.
    pub fn with_max_cardinality(mut self, max_cardinality: bool) -> Self {
        self.max_cardinality = max_cardinality;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_cardinality && self.strategy == PairingStrategy::Hungarian {
            return Err("max_cardinality is only supported by the blossom strategy".into());
        }
        Ok(())
    }
}

/// Computes the pairing that minimizes the domain score of `source`.
///
/// The domain score of the result is
/// `result.domain_score(baseline_score(source)?)`.
///
/// # Errors
///
/// Everything [`build_weighted_graph`](super::build_weighted_graph)
/// reports; with [`PairingStrategy::Hungarian`], also
/// [`MatchingError::NotBipartite`](crate::error::MatchingError::NotBipartite).
///
/// # Panics
///
/// Panics if `config` is invalid.
pub fn solve_pairing<S: PairSource>(
    source: &S,
    config: &PairingConfig,
) -> Result<MatchingResult<S::Node>> {
    solve_pairing_with_cancel(source, config, None)
}

/// [`solve_pairing`] with an optional cancellation flag, forwarded to the
/// chosen solver.
pub fn solve_pairing_with_cancel<S: PairSource>(
    source: &S,
    config: &PairingConfig,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<MatchingResult<S::Node>> {
    config.validate().expect("invalid PairingConfig");

    let pairs = build_weighted_graph(source)?;
    let (ids, total_weight) = match config.strategy {
        PairingStrategy::Blossom => {
            let blossom = BlossomConfig::default().with_max_cardinality(config.max_cardinality);
            let m = BlossomSolver::solve_with_cancel(pairs.graph(), &blossom, cancel)?;
            (m.pairs, m.total_weight)
        }
        PairingStrategy::Hungarian => {
            let bipartite = split_sides(pairs.clone())?;
            let a = HungarianSolver::solve_with_cancel(bipartite.matrix(), cancel)?;
            let ids = bipartite.read_back(&a.pairs);
            let total: f64 = ids
                .iter()
                .filter_map(|&(u, v)| pairs.graph().weight_between(u, v))
                .sum();
            (ids, total)
        }
    };

    debug!(
        "adaptor: {:?} selected {} pairs, weight {total_weight}",
        config.strategy,
        ids.len()
    );
    Ok(MatchingResult {
        pairs: pairs.keyed(ids),
        total_weight,
    })
}
