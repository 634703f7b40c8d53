//! Cell colors and their pairing compatibility.

use std::fmt;

/// Color of a grid cell. The numeric codes are those of the text format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Color {
    #[default]
    White = 0,
    Red = 1,
    Blue = 2,
    Green = 3,
    /// Forbidden: never paired, never scored.
    Black = 4,
}

impl Color {
    /// All colors in code order.
    pub const ALL: [Color; 5] = [
        Color::White,
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::Black,
    ];

    /// Decodes a color from its numeric code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// Numeric code of the color.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// One-letter symbol: `w`, `r`, `b`, `g` or `k`.
    pub fn symbol(self) -> char {
        match self {
            Color::White => 'w',
            Color::Red => 'r',
            Color::Blue => 'b',
            Color::Green => 'g',
            Color::Black => 'k',
        }
    }

    /// Black is the only forbidden color.
    pub fn is_forbidden(self) -> bool {
        self == Color::Black
    }

    /// Whether two adjacent cells of these colors may be paired.
    ///
    /// White pairs with every non-black color; red and blue pair with
    /// white, red and blue; green pairs with white and green.
    pub fn can_pair_with(self, other: Color) -> bool {
        use Color::*;
        matches!(
            (self, other),
            (White, White | Red | Blue | Green)
                | (Red | Blue, White | Red | Blue)
                | (Green, White | Green)
        )
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        for (i, c) in Color::ALL.iter().enumerate() {
            assert_eq!(usize::from(c.code()), i);
            assert_eq!(Color::from_code(c.code()), Some(*c));
        }
        assert_eq!(Color::from_code(5), None);
        assert_eq!(Color::default(), Color::White);
    }

    #[test]
    fn test_compatibility_is_symmetric() {
        for a in Color::ALL {
            for b in Color::ALL {
                assert_eq!(a.can_pair_with(b), b.can_pair_with(a), "{a} {b}");
            }
        }
    }

    #[test]
    fn test_compatibility_table() {
        use Color::*;
        assert!(White.can_pair_with(Green));
        assert!(Red.can_pair_with(Blue));
        assert!(!Red.can_pair_with(Green));
        assert!(!Blue.can_pair_with(Green));
        assert!(Green.can_pair_with(Green));
        for c in Color::ALL {
            assert!(!Black.can_pair_with(c));
        }
    }

    #[test]
    fn test_symbols() {
        let s: String = Color::ALL.iter().map(|c| c.symbol()).collect();
        assert_eq!(s, "wrbgk");
        assert!(Color::Black.is_forbidden());
        assert!(!Color::White.is_forbidden());
    }
}
