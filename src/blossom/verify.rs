//! Optimality certificate for a finished search.
//!
//! Checks the complementary-slackness conditions of the matching LP against
//! the final duals. Comparisons use an absolute tolerance scaled by the
//! largest weight magnitude, so real-valued inputs verify as well as
//! integral ones.

use super::search::SearchContext;

impl SearchContext<'_> {
    /// Returns a description of the first violated condition, if any.
    pub(super) fn verify_optimum(&self, tolerance: f64) -> Result<(), String> {
        let n = self.n;
        let tol = tolerance * (1.0 + self.graph.max_abs_weight());

        let min_vertex_dual = self.dual[..n].iter().copied().fold(f64::INFINITY, f64::min);
        let offset = if self.max_cardinality {
            (-min_vertex_dual).max(0.0)
        } else {
            0.0
        };

        if min_vertex_dual + offset < -tol {
            return Err(format!("negative vertex dual {min_vertex_dual}"));
        }
        for b in n..2 * n {
            if self.is_live(b) && self.dual[b] < -tol {
                return Err(format!("negative dual {} on blossom {b}", self.dual[b]));
            }
        }

        for (k, e) in self.graph.edges().iter().enumerate() {
            let mut s = self.slack(k);
            let ui = self.ancestors(e.u);
            let vi = self.ancestors(e.v);
            for (bu, bv) in ui.iter().rev().zip(vi.iter().rev()) {
                if bu != bv {
                    break;
                }
                s += 2.0 * self.dual[*bu];
            }
            if s < -tol {
                return Err(format!("edge ({}, {}) has negative slack {s}", e.u, e.v));
            }

            let u_to_v = self.mate[e.u].is_some_and(|l| l.to == e.v);
            let v_to_u = self.mate[e.v].is_some_and(|l| l.to == e.u);
            if u_to_v != v_to_u {
                return Err(format!("inconsistent mates on edge ({}, {})", e.u, e.v));
            }
            if u_to_v && s.abs() > tol {
                return Err(format!("matched edge ({}, {}) has slack {s}", e.u, e.v));
            }
        }

        for v in 0..n {
            if self.mate[v].is_none() && (self.dual[v] + offset).abs() > tol {
                return Err(format!(
                    "exposed vertex {v} has nonzero dual {}",
                    self.dual[v] + offset
                ));
            }
        }

        for b in n..2 * n {
            if !self.is_live(b) || self.dual[b] <= tol {
                continue;
            }
            let links = &self.links[b];
            if links.len() % 2 == 0 {
                return Err(format!("blossom {b} has an even cycle"));
            }
            for l in links.iter().skip(1).step_by(2) {
                if self.mate[l.from].map(|m| m.to) != Some(l.to) {
                    return Err(format!(
                        "blossom {b} link ({}, {}) should be matched",
                        l.from, l.to
                    ));
                }
            }
        }

        Ok(())
    }

    /// `v` followed by every blossom enclosing it, innermost first.
    fn ancestors(&self, v: usize) -> Vec<usize> {
        let mut chain = vec![v];
        let mut cur = v;
        while let Some(p) = self.parent[cur] {
            chain.push(p);
            cur = p;
        }
        chain
    }
}
