//! Cost matrix and assignment result.

use crate::error::{MatchingError, Result};

/// A dense `rows x cols` matrix of real costs, stored row-major.
///
/// Rows and columns stand for the two disjoint partitions of the
/// assignment problem; they need not have the same size.
///
/// # Examples
///
/// ```
/// use u_matching::assignment::CostMatrix;
///
/// let m = CostMatrix::from_rows(vec![vec![4.0, 2.0], vec![3.0, 1.0]]).unwrap();
/// assert_eq!(m.rows(), 2);
/// assert_eq!(m.get(1, 0), 3.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl CostMatrix {
    /// Creates a matrix from row-major data.
    ///
    /// Fails with [`MatchingError::Shape`] if `data.len() != rows * cols` and
    /// with [`MatchingError::NonFinite`] if any entry is NaN or infinite.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(MatchingError::Shape(format!(
                "{rows}x{cols} matrix needs {} entries, got {}",
                rows * cols,
                data.len()
            )));
        }
        if let Some(pos) = data.iter().position(|c| !c.is_finite()) {
            return Err(MatchingError::NonFinite(format!(
                "cost {} at ({}, {})",
                data[pos],
                pos / cols,
                pos % cols
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Creates a matrix from a list of rows.
    ///
    /// All rows must have the same length; an empty list gives a `0 x 0`
    /// matrix.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.len();
        let m = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n * m);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != m {
                return Err(MatchingError::Shape(format!(
                    "row {i} has length {}, expected {m}",
                    row.len()
                )));
            }
            data.extend(row);
        }
        Self::new(n, m, data)
    }

    /// Creates a matrix with every entry set to `value`.
    ///
    /// # Panics
    /// Panics if `value` is not finite.
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        assert!(value.is_finite(), "cost must be finite");
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns `true` if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Entry at `(row, col)`.
    ///
    /// # Panics
    /// Panics if the index is out of bounds.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < self.rows && col < self.cols, "index out of bounds");
        self.data[row * self.cols + col]
    }

    /// Overwrites the entry at `(row, col)`.
    ///
    /// # Panics
    /// Panics if the index is out of bounds or `value` is not finite.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(row < self.rows && col < self.cols, "index out of bounds");
        assert!(value.is_finite(), "cost must be finite");
        self.data[row * self.cols + col] = value;
    }

    /// Returns the transposed matrix.
    pub fn transpose(&self) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for c in 0..self.cols {
            for r in 0..self.rows {
                data.push(self.data[r * self.cols + c]);
            }
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    pub(crate) fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// Result of an assignment solve.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assignment {
    /// `(row, col)` pairs, sorted by row. Each row and each column appears
    /// at most once; there are `min(rows, cols)` pairs.
    pub pairs: Vec<(usize, usize)>,
    /// Sum of the costs of the assigned cells.
    pub total_cost: f64,
}

impl Assignment {
    /// Column assigned to `row`, if any.
    pub fn col_for_row(&self, row: usize) -> Option<usize> {
        self.pairs.iter().find(|&&(r, _)| r == row).map(|&(_, c)| c)
    }

    /// Number of assigned pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if nothing was assigned.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_ragged_is_shape_error() {
        let err = CostMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, MatchingError::Shape(_)));
    }

    #[test]
    fn test_new_wrong_length_is_shape_error() {
        let err = CostMatrix::new(2, 3, vec![0.0; 5]).unwrap_err();
        assert!(matches!(err, MatchingError::Shape(_)));
    }

    #[test]
    fn test_nan_rejected() {
        let err = CostMatrix::from_rows(vec![vec![1.0, f64::NAN]]).unwrap_err();
        assert!(matches!(err, MatchingError::NonFinite(_)));
    }

    #[test]
    #[should_panic(expected = "cost must be finite")]
    fn test_filled_rejects_infinity() {
        let _ = CostMatrix::filled(2, 3, f64::INFINITY);
    }

    #[test]
    #[should_panic(expected = "cost must be finite")]
    fn test_filled_rejects_nan() {
        let _ = CostMatrix::filled(2, 3, f64::NAN);
    }

    #[test]
    fn test_empty_rows() {
        let m = CostMatrix::from_rows(vec![]).unwrap();
        assert_eq!((m.rows(), m.cols()), (0, 0));
        assert!(m.is_empty());

        let m = CostMatrix::from_rows(vec![vec![], vec![]]).unwrap();
        assert_eq!((m.rows(), m.cols()), (2, 0));
        assert!(m.is_empty());
    }

    #[test]
    fn test_transpose() {
        let m = CostMatrix::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        let t = m.transpose();
        assert_eq!((t.rows(), t.cols()), (3, 2));
        assert_eq!(t.get(2, 1), 6.0);
        assert_eq!(t.get(0, 1), 4.0);
        assert_eq!(t.transpose(), m);
    }

    #[test]
    fn test_set_and_get() {
        let mut m = CostMatrix::filled(2, 2, 0.0);
        m.set(1, 0, -3.5);
        assert_eq!(m.get(1, 0), -3.5);
        assert_eq!(m.get(0, 1), 0.0);
    }
}
