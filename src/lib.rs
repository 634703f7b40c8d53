//! Exact combinatorial matching.
//!
//! Provides two exact solvers and the adaptor that connects them to a
//! pairing domain:
//!
//! - **Assignment (Hungarian)**: minimum-cost assignment of the rows of a
//!   rectangular cost matrix to its columns, with deterministic row-major
//!   tie-breaking.
//! - **Blossom (Edmonds)**: maximum-weight matching in general graphs, with
//!   an optional maximum-cardinality mode and an LP duality certificate
//!   check.
//! - **Adaptor**: turns "minimize pair costs plus unpaired penalties" into
//!   "maximize selected edge weight" and maps solver output back to domain
//!   keys.
//! - **Grid**: a color grid domain whose cells are paired under adjacency
//!   and color compatibility rules.
//!
//! # Architecture
//!
//! Both solvers are synchronous and deterministic. All search state is
//! owned by a single solve call; long solves can be interrupted between
//! phases through a cancellation flag. Nothing is logged unless the
//! application installs a `log` backend.

pub mod adaptor;
pub mod assignment;
pub mod blossom;
pub mod error;
pub mod grid;

pub use error::{MatchingError, Result};
