//! Hungarian algorithm execution engine.
//!
//! # Algorithm
//!
//! Works on a matrix with at least as many columns as rows (the caller's
//! matrix is transposed first if needed).
//!
//! 1. Subtract each row's minimum from the row, then star a maximal set of
//!    independent zeros in row-major, first-fit order
//! 2. Cover every column holding a starred zero; stop once all rows are covered
//! 3. Prime the first uncovered zero in row-major order. If its row has no
//!    star, go to 4; otherwise cover the row, uncover the star's column and
//!    repeat. With no uncovered zero left, subtract the smallest uncovered
//!    value from uncovered rows, add it to covered columns, and repeat
//! 4. Walk the alternating prime/star path from the last prime, flip it,
//!    erase primes and covers, and go back to 2

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, trace};

use super::types::{Assignment, CostMatrix};
use crate::error::{MatchingError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    None,
    Star,
    Prime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Cover,
    PrimeZeros,
    Augment,
    AdjustPotentials,
    Done,
}

/// Working state of one solve. `rows <= cols` always holds.
struct HungarianState {
    reduced: Vec<f64>,
    rows: usize,
    cols: usize,
    row_covered: Vec<bool>,
    col_covered: Vec<bool>,
    marks: Vec<Mark>,
    last_prime: (usize, usize),
    path: Vec<(usize, usize)>,
}

impl HungarianState {
    fn new(matrix: &CostMatrix) -> Self {
        debug_assert!(matrix.rows() <= matrix.cols());
        let (rows, cols) = (matrix.rows(), matrix.cols());
        Self {
            reduced: matrix.as_slice().to_vec(),
            rows,
            cols,
            row_covered: vec![false; rows],
            col_covered: vec![false; cols],
            marks: vec![Mark::None; rows * cols],
            last_prime: (0, 0),
            path: Vec::with_capacity(rows + cols),
        }
    }

    #[inline]
    fn at(&self, r: usize, c: usize) -> usize {
        r * self.cols + c
    }

    fn clear_covers(&mut self) {
        self.row_covered.iter_mut().for_each(|x| *x = false);
        self.col_covered.iter_mut().for_each(|x| *x = false);
    }

    fn reduce_and_star(&mut self) -> Step {
        for r in 0..self.rows {
            let row = &mut self.reduced[r * self.cols..(r + 1) * self.cols];
            let min = row.iter().copied().fold(f64::INFINITY, f64::min);
            row.iter_mut().for_each(|x| *x -= min);
        }

        // Covers double as "row/column already holds a star" here.
        for r in 0..self.rows {
            for c in 0..self.cols {
                let i = self.at(r, c);
                if self.reduced[i] == 0.0 && !self.row_covered[r] && !self.col_covered[c] {
                    self.marks[i] = Mark::Star;
                    self.row_covered[r] = true;
                    self.col_covered[c] = true;
                }
            }
        }
        self.clear_covers();
        Step::Cover
    }

    fn cover_starred_columns(&mut self) -> Step {
        let mut stars = 0;
        for r in 0..self.rows {
            for c in 0..self.cols {
                if self.marks[self.at(r, c)] == Mark::Star {
                    self.col_covered[c] = true;
                    stars += 1;
                }
            }
        }
        trace!("hungarian: {stars}/{} rows starred", self.rows);
        if stars >= self.rows {
            Step::Done
        } else {
            Step::PrimeZeros
        }
    }

    fn find_uncovered_zero(&self) -> Option<(usize, usize)> {
        for r in (0..self.rows).filter(|&r| !self.row_covered[r]) {
            for c in (0..self.cols).filter(|&c| !self.col_covered[c]) {
                if self.reduced[self.at(r, c)] == 0.0 {
                    return Some((r, c));
                }
            }
        }
        None
    }

    fn mark_in_row(&self, r: usize, mark: Mark) -> Option<usize> {
        (0..self.cols).find(|&c| self.marks[self.at(r, c)] == mark)
    }

    fn star_in_col(&self, c: usize) -> Option<usize> {
        (0..self.rows).find(|&r| self.marks[self.at(r, c)] == Mark::Star)
    }

    fn prime_zeros(&mut self) -> Step {
        loop {
            let Some((r, c)) = self.find_uncovered_zero() else {
                return Step::AdjustPotentials;
            };
            let i = self.at(r, c);
            self.marks[i] = Mark::Prime;
            match self.mark_in_row(r, Mark::Star) {
                None => {
                    self.last_prime = (r, c);
                    return Step::Augment;
                }
                Some(star_col) => {
                    self.row_covered[r] = true;
                    self.col_covered[star_col] = false;
                }
            }
        }
    }

    fn augment_path(&mut self) -> Step {
        self.path.clear();
        self.path.push(self.last_prime);
        loop {
            let (_, c) = self.path[self.path.len() - 1];
            let Some(r) = self.star_in_col(c) else {
                break;
            };
            self.path.push((r, c));
            let prime_col = self
                .mark_in_row(r, Mark::Prime)
                .expect("every starred row on an augmenting path holds a prime");
            self.path.push((r, prime_col));
        }
        trace!("hungarian: augmenting along {} cells", self.path.len());

        for k in 0..self.path.len() {
            let (r, c) = self.path[k];
            let i = self.at(r, c);
            self.marks[i] = match self.marks[i] {
                Mark::Star => Mark::None,
                _ => Mark::Star,
            };
        }
        self.marks
            .iter_mut()
            .filter(|m| **m == Mark::Prime)
            .for_each(|m| *m = Mark::None);
        self.clear_covers();
        Step::Cover
    }

    fn adjust_potentials(&mut self) -> Step {
        let mut delta = f64::INFINITY;
        for r in (0..self.rows).filter(|&r| !self.row_covered[r]) {
            for c in (0..self.cols).filter(|&c| !self.col_covered[c]) {
                delta = delta.min(self.reduced[self.at(r, c)]);
            }
        }
        debug_assert!(delta.is_finite(), "no uncovered cell left before completion");
        if !delta.is_finite() {
            return Step::Done;
        }
        trace!("hungarian: potential adjustment {delta}");

        for r in 0..self.rows {
            for c in 0..self.cols {
                let i = self.at(r, c);
                if !self.row_covered[r] {
                    self.reduced[i] -= delta;
                }
                if self.col_covered[c] {
                    self.reduced[i] += delta;
                }
            }
        }
        Step::PrimeZeros
    }

    fn starred(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::with_capacity(self.rows);
        for r in 0..self.rows {
            if let Some(c) = self.mark_in_row(r, Mark::Star) {
                out.push((r, c));
            }
        }
        out
    }
}

/// Hungarian assignment solver.
pub struct HungarianSolver;

impl HungarianSolver {
    /// Computes a minimum-cost assignment for `matrix`.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_matching::assignment::{CostMatrix, HungarianSolver};
    ///
    /// let m = CostMatrix::from_rows(vec![vec![4.0, 2.0], vec![3.0, 1.0]]).unwrap();
    /// let a = HungarianSolver::solve(&m).unwrap();
    /// assert_eq!(a.len(), 2);
    /// assert!((a.total_cost - 5.0).abs() < 1e-12);
    /// ```
    pub fn solve(matrix: &CostMatrix) -> Result<Assignment> {
        Self::solve_with_cancel(matrix, None)
    }

    /// Computes a minimum-cost assignment with an optional cancellation flag.
    ///
    /// The flag is checked before each cover round, i.e. between
    /// augmentations. A raised flag yields [`MatchingError::Cancelled`].
    pub fn solve_with_cancel(
        matrix: &CostMatrix,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<Assignment> {
        if matrix.is_empty() {
            return Ok(Assignment {
                pairs: Vec::new(),
                total_cost: 0.0,
            });
        }

        let transposed = matrix.cols() < matrix.rows();
        let mut state = if transposed {
            HungarianState::new(&matrix.transpose())
        } else {
            HungarianState::new(matrix)
        };

        let mut step = state.reduce_and_star();
        let mut rounds = 0usize;
        loop {
            step = match step {
                Step::Cover => {
                    if let Some(ref flag) = cancel {
                        if flag.load(Ordering::Relaxed) {
                            debug!("hungarian: cancelled after {rounds} rounds");
                            return Err(MatchingError::Cancelled);
                        }
                    }
                    rounds += 1;
                    state.cover_starred_columns()
                }
                Step::PrimeZeros => state.prime_zeros(),
                Step::Augment => state.augment_path(),
                Step::AdjustPotentials => state.adjust_potentials(),
                Step::Done => break,
            };
        }

        let mut pairs = state.starred();
        if transposed {
            pairs = pairs.into_iter().map(|(r, c)| (c, r)).collect();
            pairs.sort_unstable();
        }
        let total_cost = pairs.iter().map(|&(r, c)| matrix.get(r, c)).sum();
        debug!(
            "hungarian: {}x{} solved in {rounds} rounds, cost {total_cost}",
            matrix.rows(),
            matrix.cols()
        );

        Ok(Assignment { pairs, total_cost })
    }
}

/// Solves the assignment problem for a cost matrix given as rows and
/// returns the `(row, col)` pairs, sorted by row.
///
/// # Errors
///
/// [`MatchingError::Shape`] if the rows differ in length, and
/// [`MatchingError::NonFinite`] if any cost is NaN or infinite.
pub fn solve_assignment(rows: Vec<Vec<f64>>) -> Result<Vec<(usize, usize)>> {
    let matrix = CostMatrix::from_rows(rows)?;
    Ok(HungarianSolver::solve(&matrix)?.pairs)
}
