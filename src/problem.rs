//! The capability interface every searchable state space implements.

use std::fmt::Debug;
use std::hash::Hash;

use crate::error::SearchResult;

/// Path cost. Edge costs are positive integers.
pub type Cost = u32;

/// An implicit state graph.
///
/// Search procedures only ever see a problem through this trait: they
/// canonicalise the start, expand states, and test for the goal. Heuristics are
/// passed to the search separately.
pub trait Problem {
    /// Canonical state. Equal values must describe the same configuration.
    type State: Clone + Eq + Hash + Debug;

    /// Parses a raw description into its unique canonical state.
    fn canonical(&self, raw: &str) -> SearchResult<Self::State>;

    /// All `(edge_cost, neighbour)` pairs reachable in one move. No neighbour
    /// appears twice.
    fn expand(&self, state: &Self::State) -> Vec<(Cost, Self::State)>;

    fn is_goal(&self, state: &Self::State) -> bool;
}

/// The zero heuristic, which turns A* into uniform-cost search.
pub fn null_heuristic<S>(_: &S) -> Cost {
    0
}
