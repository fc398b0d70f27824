//! # Tile Search Library
//!
//! This library provides an informed-search engine over implicit state graphs
//! and its specialisation to sliding-tile puzzles: A*, weighted A* with
//! single-pass suboptimality bounds, and pattern databases built by
//! uniform-cost search over abstracted puzzles.
//!
//! It is used by two binaries:
//! - `tile_solver`: Runs weighted A* with bounds over a file of start states
//!   and prints the cost and bound statistics of each.
//! - `pdb_builder`: Builds the pattern databases of chosen strengths and
//!   reports their sizes and heuristic values.
//!
//! ## Modules
//! - `problem`: The `Problem` trait every state space implements.
//! - `tile`: `TileProblem` and `TileState`, the sliding-tile state space.
//! - `frontier`: The lazy-deletion priority queue shared by all searches.
//! - `solver`: `SearchEngine` and the `a_star`/`weighted_a_star`/`make_pdb` entry points.
//! - `bounds`: F-bound and X-bound tracking for weighted A*.
//! - `pdb`: Pattern databases and their enumeration order.
//! - `config`: Search limits.
//! - `error`: The crate error type.
//! - `utils`: Predicate parsing and puzzle description helpers.

pub mod bounds;
pub mod config;
pub mod error;
pub mod frontier;
pub mod pdb;
pub mod problem;
pub mod solver;
pub mod tile;
pub mod utils;

pub use error::{SearchError, SearchResult};
pub use problem::{Cost, Problem};
pub use solver::{SearchEngine, Solution};
pub use tile::{TileProblem, TileState};
