//! Color grid pairing domain.
//!
//! Cells of an `n x m` grid carry a [`Color`] and a value. Two cells may be
//! paired when the [`PairingRules`] allow it; pairing costs the absolute
//! difference of their values, and every non-black cell left unpaired costs
//! its own value. [`Grid`] implements
//! [`PairSource`](crate::adaptor::PairSource), so the cheapest
//! configuration is found with [`solve_pairing`](crate::adaptor::solve_pairing).
//!
//! Under [`PairingRules::Original`] only orthogonal neighbours pair, which
//! keeps the pair graph bipartite and lets either solver strategy run.
//! [`PairingRules::Extended`] pairs white cells across the whole grid and
//! generally needs the blossom strategy.

mod color;
mod model;

pub use color::Color;
pub use model::{Cell, Grid, PairingRules};
