//! Grid of colored, valued cells.

use std::fmt;
use std::str::FromStr;

use super::color::Color;
use crate::adaptor::PairSource;
use crate::error::{MatchingError, Result};

/// A cell position `(row, col)`.
pub type Cell = (usize, usize);

/// Which cells may be paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PairingRules {
    /// Orthogonally adjacent, non-black cells of compatible colors.
    #[default]
    Original,

    /// As [`Original`](Self::Original), and a white cell additionally pairs
    /// with any other non-black cell anywhere on the grid.
    Extended,
}

/// An `n x m` grid. Each cell has a [`Color`] and a value.
///
/// A configuration of disjoint pairs scores the sum of `|value(a) - value(b)|`
/// over its pairs plus the values of the unpaired non-black cells; lower is
/// better.
///
/// # Examples
///
/// ```
/// use u_matching::adaptor::{baseline_score, solve_pairing, PairingConfig};
/// use u_matching::grid::Grid;
///
/// let grid: Grid = "1 2\n0 0\n5 8\n".parse().unwrap();
/// let result = solve_pairing(&grid, &PairingConfig::default()).unwrap();
/// assert_eq!(result.pairs, vec![((0, 0), (0, 1))]);
/// assert_eq!(grid.score(&result.pairs), 3.0);
/// assert_eq!(result.domain_score(baseline_score(&grid).unwrap()), 3.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid {
    rows: usize,
    cols: usize,
    colors: Vec<Color>,
    values: Vec<f64>,
    rules: PairingRules,
}

impl Grid {
    /// Creates a grid from row-major colors and values.
    ///
    /// An empty `colors` makes every cell white; an empty `values` gives
    /// every cell the value 1.
    ///
    /// # Errors
    ///
    /// [`MatchingError::GridFormat`] if a dimension is zero or a non-empty
    /// table does not have `rows x cols` entries, and
    /// [`MatchingError::NonFinite`] if a value is NaN or infinite.
    pub fn new(
        rows: usize,
        cols: usize,
        colors: Vec<Vec<Color>>,
        values: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(MatchingError::GridFormat(
                "number of rows and columns must be positive".into(),
            ));
        }

        let colors = if colors.is_empty() {
            vec![Color::White; rows * cols]
        } else {
            flatten(colors, rows, cols, "colors")?
        };
        let values = if values.is_empty() {
            vec![1.0; rows * cols]
        } else {
            flatten(values, rows, cols, "values")?
        };
        if let Some(v) = values.iter().find(|v| !v.is_finite()) {
            return Err(MatchingError::NonFinite(format!("cell value {v}")));
        }

        Ok(Self {
            rows,
            cols,
            colors,
            values,
            rules: PairingRules::default(),
        })
    }

    /// Sets the rules used when the grid acts as a [`PairSource`].
    pub fn with_rules(mut self, rules: PairingRules) -> Self {
        self.rules = rules;
        self
    }

    /// Rules used when the grid acts as a [`PairSource`].
    pub fn rules(&self) -> PairingRules {
        self.rules
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns `true` if `cell` lies inside the grid.
    pub fn contains(&self, (i, j): Cell) -> bool {
        i < self.rows && j < self.cols
    }

    #[inline]
    fn at(&self, (i, j): Cell) -> usize {
        assert!(
            self.contains((i, j)),
            "cell ({i}, {j}) outside {}x{} grid",
            self.rows,
            self.cols
        );
        i * self.cols + j
    }

    /// Color of `cell`.
    ///
    /// # Panics
    ///
    /// Panics if `cell` lies outside the grid. The same holds for the other
    /// per-cell accessors.
    pub fn color(&self, cell: Cell) -> Color {
        self.colors[self.at(cell)]
    }

    /// Value of the cell at `cell`.
    pub fn value(&self, cell: Cell) -> f64 {
        self.values[self.at(cell)]
    }

    /// Black cells can be neither paired nor scored.
    pub fn is_forbidden(&self, cell: Cell) -> bool {
        self.color(cell).is_forbidden()
    }

    /// Cost of pairing `a` with `b`: `|value(a) - value(b)|`.
    pub fn pair_cost(&self, a: Cell, b: Cell) -> f64 {
        (self.value(a) - self.value(b)).abs()
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.rows).flat_map(move |i| (0..self.cols).map(move |j| (i, j)))
    }

    /// Every allowed pair `(a, b)` with `a < b`, sorted.
    pub fn all_pairs(&self, rules: PairingRules) -> Vec<(Cell, Cell)> {
        let mut pairs = Vec::new();
        for a in self.cells().filter(|&a| !self.is_forbidden(a)) {
            let ca = self.color(a);
            if rules == PairingRules::Extended && ca == Color::White {
                pairs.extend(
                    self.cells()
                        .filter(|&b| b != a && !self.is_forbidden(b))
                        .map(|b| (a.min(b), a.max(b))),
                );
                continue;
            }

            let (i, j) = a;
            for b in [(i, j + 1), (i + 1, j)] {
                if self.contains(b) && ca.can_pair_with(self.color(b)) {
                    pairs.push((a, b));
                }
            }
        }
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    /// Score of a set of disjoint pairs: pair costs plus the values of all
    /// unpaired non-black cells.
    pub fn score(&self, pairs: &[(Cell, Cell)]) -> f64 {
        let mut taken = vec![false; self.rows * self.cols];
        let mut score = 0.0;
        for &(a, b) in pairs {
            score += self.pair_cost(a, b);
            taken[self.at(a)] = true;
            taken[self.at(b)] = true;
        }
        score
            + self
                .cells()
                .filter(|&x| !taken[self.at(x)] && !self.is_forbidden(x))
                .map(|x| self.value(x))
                .sum::<f64>()
    }
}

fn flatten<T>(table: Vec<Vec<T>>, rows: usize, cols: usize, what: &str) -> Result<Vec<T>> {
    if table.len() != rows || table.iter().any(|r| r.len() != cols) {
        return Err(MatchingError::GridFormat(format!(
            "{what} must be a {rows}x{cols} table"
        )));
    }
    Ok(table.into_iter().flatten().collect())
}

impl PairSource for Grid {
    type Node = Cell;

    fn cell_value(&self, node: &Cell) -> f64 {
        self.value(*node)
    }

    fn valid_pairs(&self) -> Vec<(Cell, Cell, f64)> {
        self.all_pairs(self.rules)
            .into_iter()
            .map(|(a, b)| (a, b, self.pair_cost(a, b)))
            .collect()
    }

    fn eligible_nodes(&self) -> Vec<Cell> {
        self.cells().filter(|&x| !self.is_forbidden(x)).collect()
    }
}

/// Parses the text format: a header line `n m`, then `n` lines of `m` color
/// codes, then optionally `n` lines of `m` values.
impl FromStr for Grid {
    type Err = MatchingError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = |msg: String| MatchingError::GridFormat(msg);
        let mut lines = s.lines().map(str::trim).filter(|l| !l.is_empty());

        let header = lines.next().ok_or_else(|| bad("empty input".into()))?;
        let dims: Vec<usize> = header
            .split_whitespace()
            .map(|t| t.parse().map_err(|_| bad(format!("invalid dimension {t:?}"))))
            .collect::<Result<_>>()?;
        let &[rows, cols] = dims.as_slice() else {
            return Err(bad(format!("expected \"n m\" header, got {header:?}")));
        };
        if rows == 0 || cols == 0 {
            return Err(bad("number of rows and columns must be positive".into()));
        }

        let mut colors = Vec::with_capacity(rows);
        for i in 0..rows {
            let line = lines
                .next()
                .ok_or_else(|| bad(format!("missing color row {i}")))?;
            let row = line
                .split_whitespace()
                .map(|t| {
                    t.parse::<u8>()
                        .ok()
                        .and_then(Color::from_code)
                        .ok_or_else(|| bad(format!("invalid color {t:?} in row {i}")))
                })
                .collect::<Result<Vec<_>>>()?;
            if row.len() != cols {
                return Err(bad(format!(
                    "color row {i} has {} entries, expected {cols}",
                    row.len()
                )));
            }
            colors.push(row);
        }

        let mut values = Vec::new();
        if let Some(first) = lines.next() {
            let rest = lines.by_ref().take(rows - 1);
            for (i, line) in std::iter::once(first).chain(rest).enumerate() {
                let row = line
                    .split_whitespace()
                    .map(|t| {
                        t.parse::<f64>()
                            .map_err(|_| bad(format!("invalid value {t:?} in row {i}")))
                    })
                    .collect::<Result<Vec<_>>>()?;
                if row.len() != cols {
                    return Err(bad(format!(
                        "value row {i} has {} entries, expected {cols}",
                        row.len()
                    )));
                }
                values.push(row);
            }
            if values.len() != rows {
                return Err(bad(format!(
                    "expected {rows} value rows, got {}",
                    values.len()
                )));
            }
            if lines.next().is_some() {
                return Err(bad("trailing input after value rows".into()));
            }
        }

        Self::new(rows, cols, colors, values)
    }
}

/// Writes the text format accepted by [`FromStr`], values included.
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.rows, self.cols)?;
        for i in 0..self.rows {
            let row: Vec<String> = (0..self.cols)
                .map(|j| self.color((i, j)).code().to_string())
                .collect();
            writeln!(f, "{}", row.join(" "))?;
        }
        for i in 0..self.rows {
            let row: Vec<String> = (0..self.cols)
                .map(|j| self.value((i, j)).to_string())
                .collect();
            writeln!(f, "{}", row.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptor::{baseline_score, solve_pairing, PairingConfig, PairingStrategy};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use Color::*;

    fn grid(colors: Vec<Vec<Color>>, values: Vec<Vec<f64>>) -> Grid {
        let (rows, cols) = (colors.len(), colors[0].len());
        Grid::new(rows, cols, colors, values).unwrap()
    }

    #[test]
    fn test_defaults() {
        let g = Grid::new(2, 3, Vec::new(), Vec::new()).unwrap();
        assert!(g.cells().all(|x| g.color(x) == White && g.value(x) == 1.0));
        assert_eq!(baseline_score(&g), Ok(6.0));
        assert_eq!(g.rules(), PairingRules::Original);
    }

    #[test]
    fn test_new_rejects_bad_shapes() {
        assert!(matches!(
            Grid::new(0, 3, Vec::new(), Vec::new()),
            Err(MatchingError::GridFormat(_))
        ));
        assert!(matches!(
            Grid::new(2, 2, vec![vec![White, White]], Vec::new()),
            Err(MatchingError::GridFormat(_))
        ));
        assert!(matches!(
            Grid::new(1, 2, Vec::new(), vec![vec![1.0, f64::INFINITY]]),
            Err(MatchingError::NonFinite(_))
        ));
    }

    #[test]
    fn test_forbidden_cells() {
        let g = grid(vec![vec![White, Black, White], vec![White; 3]], Vec::new());
        assert!(g.is_forbidden((0, 1)));
        assert!(!g.is_forbidden((1, 1)));
        assert_eq!(g.eligible_nodes().len(), 5);
    }

    #[test]
    #[should_panic(expected = "outside 1x2 grid")]
    fn test_out_of_bounds_panics() {
        let g = Grid::new(1, 2, Vec::new(), Vec::new()).unwrap();
        g.color((1, 0));
    }

    #[test]
    fn test_original_pairs_respect_colors() {
        let g = grid(vec![vec![White, Green], vec![Red, Black]], Vec::new());
        assert_eq!(
            g.all_pairs(PairingRules::Original),
            vec![((0, 0), (0, 1)), ((0, 0), (1, 0))]
        );

        let g = grid(vec![vec![Red, Green, Green]], Vec::new());
        assert_eq!(g.all_pairs(PairingRules::Original), vec![((0, 1), (0, 2))]);
    }

    #[test]
    fn test_extended_pairs() {
        let g = Grid::new(2, 3, Vec::new(), Vec::new()).unwrap();
        assert_eq!(g.all_pairs(PairingRules::Extended).len(), 15);

        let g = grid(vec![vec![White, Black, Blue], vec![Red, Blue, Red]], Vec::new());
        assert_eq!(
            g.all_pairs(PairingRules::Extended),
            vec![
                ((0, 0), (0, 2)),
                ((0, 0), (1, 0)),
                ((0, 0), (1, 1)),
                ((0, 0), (1, 2)),
                ((0, 2), (1, 2)),
                ((1, 0), (1, 1)),
                ((1, 1), (1, 2)),
            ]
        );

        // A white cell also reaches non-white cells before it.
        let g = grid(vec![vec![Red, Black], vec![Black, White]], Vec::new());
        assert!(g.all_pairs(PairingRules::Original).is_empty());
        assert_eq!(g.all_pairs(PairingRules::Extended), vec![((0, 0), (1, 1))]);
    }

    #[test]
    fn test_score() {
        let g = grid(
            vec![vec![White, Black, White], vec![White; 3]],
            vec![vec![5.0, 9.0, 2.0], vec![3.0, 4.0, 4.0]],
        );
        assert_eq!(g.score(&[]), 18.0);
        // |5 - 3| + |4 - 4| + unpaired (0, 2)
        assert_eq!(g.score(&[((0, 0), (1, 0)), ((1, 1), (1, 2))]), 4.0);
        assert_eq!(g.pair_cost((0, 0), (0, 2)), 3.0);
    }

    #[test]
    fn test_parse_with_values() {
        let g: Grid = "2 3\n0 4 3\n0 0 0\n5 8 4\n11 1 2\n".parse().unwrap();
        assert_eq!((g.rows(), g.cols()), (2, 3));
        assert_eq!(g.color((0, 2)), Green);
        assert!(g.is_forbidden((0, 1)));
        assert_eq!(g.value((1, 0)), 11.0);
        assert_eq!(g.to_string().parse::<Grid>().unwrap(), g);
    }

    #[test]
    fn test_parse_without_values() {
        let g: Grid = "1 3\n1 2 3\n".parse().unwrap();
        assert_eq!(g.color((0, 0)), Red);
        assert_eq!(g.value((0, 2)), 1.0);
    }

    #[test]
    fn test_parse_errors() {
        for text in [
            "",
            "2\n0 0\n",
            "x 2\n0 0\n",
            "1 2\n0\n",
            "1 2\n0 7\n",
            "2 2\n0 0\n",
            "2 2\n0 0\n0 0\n1 1\n",
            "1 2\n0 0\n1 1\n2 2\n",
            "1 2\n0 0\n1 a\n",
        ] {
            assert!(
                matches!(text.parse::<Grid>(), Err(MatchingError::GridFormat(_))),
                "{text:?} should not parse"
            );
        }
    }

    #[test]
    fn test_pairing_on_adjacent_cells() {
        let g = grid(vec![vec![White, White]], vec![vec![5.0, 8.0]]);
        let result = solve_pairing(&g, &PairingConfig::default()).unwrap();
        assert_eq!(result.pairs, vec![((0, 0), (0, 1))]);
        assert!((result.total_weight - 10.0).abs() < 1e-12);
        assert_eq!(g.score(&result.pairs), 3.0);
        assert!(g.score(&result.pairs) < g.score(&[]));
    }

    #[test]
    fn test_strategies_agree_on_random_grids() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..25 {
            let rows = rng.random_range(1..=4);
            let cols = rng.random_range(1..=5);
            let colors = (0..rows)
                .map(|_| {
                    (0..cols)
                        .map(|_| Color::ALL[rng.random_range(0..5)])
                        .collect()
                })
                .collect();
            let values = (0..rows)
                .map(|_| (0..cols).map(|_| f64::from(rng.random_range(1u8..=9))).collect())
                .collect();
            let g = Grid::new(rows, cols, colors, values).unwrap();

            let blossom = solve_pairing(&g, &PairingConfig::default()).unwrap();
            let config = PairingConfig::default().with_strategy(PairingStrategy::Hungarian);
            let hungarian = solve_pairing(&g, &config).unwrap();

            let baseline = baseline_score(&g).unwrap();
            assert!((g.score(&blossom.pairs) - blossom.domain_score(baseline)).abs() < 1e-9);
            assert!((g.score(&hungarian.pairs) - hungarian.domain_score(baseline)).abs() < 1e-9);
            assert!((blossom.total_weight - hungarian.total_weight).abs() < 1e-9);
        }
    }

    #[test]
    fn test_extended_rules_need_blossom() {
        let g = Grid::new(1, 3, Vec::new(), vec![vec![4.0, 1.0, 4.0]])
            .unwrap()
            .with_rules(PairingRules::Extended);
        let config = PairingConfig::default().with_strategy(PairingStrategy::Hungarian);
        assert_eq!(
            solve_pairing(&g, &config).unwrap_err(),
            MatchingError::NotBipartite
        );

        // The two outer cells pair across the middle one.
        let result = solve_pairing(&g, &PairingConfig::default()).unwrap();
        assert_eq!(result.pairs, vec![((0, 0), (0, 2))]);
        assert_eq!(g.score(&result.pairs), 1.0);
    }
}
