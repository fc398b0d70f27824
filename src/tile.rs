//! Sliding-tile state spaces.
//!
//! This module defines the tile-puzzle implementation of [`Problem`]:
//! - `TileState`: a canonical assignment of tile identities to board locations.
//! - `TileProblem`: the fixed board (locations and their adjacency), the goal
//!   configuration, move generation, and the graph-distance heuristic.
//!
//! Boards are described textually with `adj(A,B)` and `at(T,L)` predicates.
//! Adjacency is made symmetric on construction and never changes afterwards.
use parking_lot::RwLock;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::{SearchError, SearchResult};
use crate::problem::{Cost, Problem};
use crate::utils::predicates;

/// Index of a tile identity in the problem's sorted label table.
pub type TileId = u16;

/// Distance marker for location pairs with no connecting path.
const UNREACHABLE: Cost = Cost::MAX;

/// A canonical tile configuration.
///
/// One slot per board location, in the problem's sorted location order;
/// `None` marks a blank. Two descriptions of the same configuration always
/// produce equal values, whatever order their predicates were written in.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileState {
    cells: Box<[Option<TileId>]>,
}

impl TileState {
    /// The tile at location index `loc`, or `None` for a blank.
    ///
    /// # Panics
    /// Panics if `loc` is not a location index of the owning problem.
    pub fn tile_at(&self, loc: usize) -> Option<TileId> {
        self.cells[loc]
    }

    /// Location indices of every blank.
    pub fn blanks(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(loc, _)| loc)
    }

    fn swapped(&self, a: usize, b: usize) -> TileState {
        let mut cells = self.cells.clone();
        cells.swap(a, b);
        TileState { cells }
    }
}

/// The immutable board shared by a problem and all of its abstractions.
#[derive(Debug)]
struct Board {
    names: Vec<String>,
    index: HashMap<String, usize>,
    neighbours: Vec<Vec<usize>>,
}

impl Board {
    fn from_text(text: &str) -> SearchResult<Board> {
        let pairs = predicates(text, "adj", 2)?;
        if pairs.is_empty() {
            return Err(SearchError::domain("no adj(A,B) facts: the board has no locations"));
        }

        let mut graph: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for pair in &pairs {
            let (a, b) = (&pair[0], &pair[1]);
            let forward = graph.entry(a.clone()).or_default();
            if a != b {
                forward.insert(b.clone());
            }
            let backward = graph.entry(b.clone()).or_default();
            if a != b {
                backward.insert(a.clone());
            }
        }

        let names: Vec<String> = graph.keys().cloned().collect();
        let index: HashMap<String, usize> = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        let neighbours = graph
            .values()
            .map(|adjacent| adjacent.iter().map(|name| index[name]).collect())
            .collect();

        Ok(Board { names, index, neighbours })
    }

    fn location(&self, name: &str) -> SearchResult<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| SearchError::domain(format!("unknown location `{}`", name)))
    }

    /// Breadth-first distances from `source` to every location.
    fn distances_from(&self, source: usize) -> Vec<Cost> {
        let mut row = vec![UNREACHABLE; self.names.len()];
        let mut queue = VecDeque::new();
        row[source] = 0;
        queue.push_back(source);
        while let Some(loc) = queue.pop_front() {
            for &next in &self.neighbours[loc] {
                if row[next] == UNREACHABLE {
                    row[next] = row[loc] + 1;
                    queue.push_back(next);
                }
            }
        }
        row
    }
}

/// A sliding-tile puzzle: a fixed board plus a goal configuration.
///
/// Cloning is cheap; clones and abstractions share the board and the
/// location-distance cache.
#[derive(Clone, Debug)]
pub struct TileProblem {
    board: Arc<Board>,
    labels: Arc<Vec<String>>,
    label_index: Arc<HashMap<String, TileId>>,
    goal: TileState,
    /// For each tile identity, the goal locations holding it.
    goal_sites: Vec<Vec<usize>>,
    /// Per-source BFS rows, filled on first use.
    distances: Arc<RwLock<HashMap<usize, Arc<[Cost]>>>>,
}

impl TileProblem {
    /// Builds a problem from its goal description.
    ///
    /// Every `adj(A,B)` fact adds the edge in both directions; every `at(T,L)`
    /// fact places tile `T` in the goal configuration.
    ///
    /// # Errors
    /// * `SearchError::Format` for malformed predicates.
    /// * `SearchError::Domain` if there are no locations, if a goal tile sits
    ///   on an unknown location, or if two tiles share a location.
    pub fn new(text: &str) -> SearchResult<TileProblem> {
        let board = Board::from_text(text)?;

        let placements = predicates(text, "at", 2)?;
        let labels: Vec<String> = placements
            .iter()
            .map(|p| p[0].clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if labels.len() > TileId::MAX as usize {
            return Err(SearchError::domain(format!("too many tiles ({})", labels.len())));
        }
        let label_index = labels
            .iter()
            .enumerate()
            .map(|(i, label)| (label.clone(), i as TileId))
            .collect();

        let mut problem = TileProblem {
            board: Arc::new(board),
            labels: Arc::new(labels),
            label_index: Arc::new(label_index),
            goal: TileState { cells: Vec::new().into_boxed_slice() },
            goal_sites: Vec::new(),
            distances: Arc::new(RwLock::new(HashMap::new())),
        };
        let goal = problem.place(&placements)?;
        problem.set_goal(goal);

        debug!(
            locations = problem.board.names.len(),
            tiles = problem.labels.len(),
            "constructed tile problem"
        );
        Ok(problem)
    }

    fn set_goal(&mut self, goal: TileState) {
        let mut sites = vec![Vec::new(); self.labels.len()];
        for (loc, cell) in goal.cells.iter().enumerate() {
            if let Some(tile) = cell {
                sites[*tile as usize].push(loc);
            }
        }
        self.goal = goal;
        self.goal_sites = sites;
    }

    fn place(&self, placements: &[Vec<String>]) -> SearchResult<TileState> {
        let mut cells = vec![None; self.board.names.len()];
        for placement in placements {
            let tile = self.tile_id(&placement[0])?;
            let loc = self.board.location(&placement[1])?;
            if let Some(existing) = cells[loc] {
                if existing != tile {
                    return Err(SearchError::domain(format!(
                        "location `{}` holds both `{}` and `{}`",
                        placement[1], self.labels[existing as usize], placement[0]
                    )));
                }
            }
            cells[loc] = Some(tile);
        }
        Ok(TileState { cells: cells.into_boxed_slice() })
    }

    fn tile_id(&self, label: &str) -> SearchResult<TileId> {
        self.label_index
            .get(label)
            .copied()
            .ok_or_else(|| SearchError::domain(format!("unknown tile `{}`", label)))
    }

    /// Parses a state description against this problem's board.
    ///
    /// `adj` facts in the description must be edges of the board but do
    /// not alter it. Redundant `at` facts collapse.
    ///
    /// # Errors
    /// `SearchError::Domain` if an `adj` fact names a missing edge, or if the
    /// placed tiles are not the goal's tiles (one copy per goal occurrence).
    pub fn parse_state(&self, text: &str) -> SearchResult<TileState> {
        for pair in predicates(text, "adj", 2)? {
            let a = self.board.location(&pair[0])?;
            let b = self.board.location(&pair[1])?;
            if !self.board.neighbours[a].contains(&b) {
                return Err(SearchError::domain(format!(
                    "`{}` and `{}` are not adjacent on this board",
                    pair[0], pair[1]
                )));
            }
        }
        let state = self.place(&predicates(text, "at", 2)?)?;

        let expected = self.tile_counts(&self.goal);
        let found = self.tile_counts(&state);
        if let Some(tile) = (0..expected.len()).find(|&t| expected[t] != found[t]) {
            return Err(SearchError::domain(format!(
                "tile `{}` is placed {} time(s), the goal has {}",
                self.labels[tile], found[tile], expected[tile]
            )));
        }
        Ok(state)
    }

    fn tile_counts(&self, state: &TileState) -> Vec<usize> {
        let mut counts = vec![0; self.labels.len()];
        for tile in state.cells.iter().flatten() {
            counts[*tile as usize] += 1;
        }
        counts
    }

    pub fn goal(&self) -> &TileState {
        &self.goal
    }

    /// Location names in index order (sorted).
    pub fn locations(&self) -> &[String] {
        &self.board.names
    }

    /// Tile labels in identity order (sorted).
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn tile_count(&self) -> usize {
        self.labels.len()
    }

    pub fn label(&self, tile: TileId) -> &str {
        &self.labels[tile as usize]
    }

    /// Compact canonical form: sorted `at(T,L)` predicates with no separator.
    pub fn compact(&self, state: &TileState) -> String {
        let mut facts = self.at_facts(state);
        facts.sort();
        facts.concat()
    }

    /// Full canonical form, listing adjacency, placements and blanks:
    /// `state([adj(..),..,at(..),..,blank(..)]).`
    pub fn full(&self, state: &TileState) -> String {
        let mut facts = self.at_facts(state);
        for (loc, adjacent) in self.board.neighbours.iter().enumerate() {
            for &other in adjacent {
                facts.push(format!("adj({},{})", self.board.names[loc], self.board.names[other]));
            }
        }
        for loc in state.blanks() {
            facts.push(format!("blank({})", self.board.names[loc]));
        }
        facts.sort();
        format!("state([{}]).", facts.join(","))
    }

    fn at_facts(&self, state: &TileState) -> Vec<String> {
        state
            .cells
            .iter()
            .enumerate()
            .filter_map(|(loc, cell)| {
                cell.map(|tile| format!("at({},{})", self.label(tile), self.board.names[loc]))
            })
            .collect()
    }

    /// Graph distance between two location indices, `Cost::MAX` if disconnected.
    ///
    /// Rows are computed by BFS from `from` the first time it is queried and
    /// cached for the lifetime of the problem and all of its clones.
    pub fn distance(&self, from: usize, to: usize) -> Cost {
        if let Some(row) = self.distances.read().get(&from) {
            return row[to];
        }
        let row: Arc<[Cost]> = self.board.distances_from(from).into();
        let d = row[to];
        self.distances.write().entry(from).or_insert(row);
        d
    }

    /// Sum over tiles of the graph distance to the nearest goal location of
    /// the same identity. Admissible and consistent for unit-cost moves.
    pub fn manhattan(&self, state: &TileState) -> Cost {
        let mut total: Cost = 0;
        for (loc, cell) in state.cells.iter().enumerate() {
            let Some(tile) = cell else { continue };
            let nearest = self
                .goal_sites
                .get(*tile as usize)
                .and_then(|sites| sites.iter().map(|&site| self.distance(loc, site)).min())
                .unwrap_or(0);
            total = total.saturating_add(nearest);
        }
        total
    }

    /// Replaces every identity in `merged` by the first one, leaving locations untouched.
    ///
    /// # Errors
    /// `SearchError::Domain` if `merged` names more tiles than exist or names
    /// an unknown tile.
    pub fn abstractify<S: AsRef<str>>(&self, state: &TileState, merged: &[S]) -> SearchResult<TileState> {
        if merged.len() > self.labels.len() {
            return Err(SearchError::domain(format!(
                "cannot merge {} tiles, the problem has {}",
                merged.len(),
                self.labels.len()
            )));
        }
        let ids = merged
            .iter()
            .map(|label| self.tile_id(label.as_ref()))
            .collect::<SearchResult<Vec<_>>>()?;
        let Some(&representative) = ids.first() else {
            return Ok(state.clone());
        };

        let cells = state
            .cells
            .iter()
            .map(|cell| cell.map(|t| if ids.contains(&t) { representative } else { t }))
            .collect();
        Ok(TileState { cells })
    }

    /// A problem over the same board whose goal merges the identities in `merged`.
    pub fn abstracted<S: AsRef<str>>(&self, merged: &[S]) -> SearchResult<TileProblem> {
        let goal = self.abstractify(&self.goal, merged)?;
        let mut problem = self.clone();
        problem.set_goal(goal);
        Ok(problem)
    }

    /// A reproducible random walk of `moves` steps away from the goal.
    pub fn scrambled(&self, seed: u64, moves: usize) -> TileState {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut state = self.goal.clone();
        for _ in 0..moves {
            let options = self.expand(&state);
            match options.choose(&mut rng) {
                Some((_, next)) => state = next.clone(),
                None => break,
            }
        }
        state
    }
}

impl Problem for TileProblem {
    type State = TileState;

    fn canonical(&self, raw: &str) -> SearchResult<TileState> {
        self.parse_state(raw)
    }

    /// Slides every tile adjacent to a blank into that blank, at cost 1.
    fn expand(&self, state: &TileState) -> Vec<(Cost, TileState)> {
        let mut next: Vec<(Cost, TileState)> = Vec::new();
        for blank in state.blanks() {
            for &loc in &self.board.neighbours[blank] {
                if state.cells[loc].is_some() {
                    next.push((1, state.swapped(blank, loc)));
                }
            }
        }
        next.sort();
        next.dedup();
        next
    }

    fn is_goal(&self, state: &TileState) -> bool {
        *state == self.goal
    }
}

impl fmt::Display for TileProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.compact(&self.goal))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::utils::grid_goal_text;

    /// Line board A-B-C, tiles 1 and 2, blank at C. Adjacency given one way only.
    pub(crate) const LINE: &str = "adj(A,B),adj(B,C),at(1,A),at(2,B)";

    pub(crate) fn line_problem() -> TileProblem {
        TileProblem::new(LINE).unwrap()
    }

    #[test]
    fn test_new_derives_symmetric_adjacency() {
        let problem = line_problem();
        assert_eq!(problem.locations(), &["A", "B", "C"]);
        assert_eq!(problem.labels(), &["1", "2"]);
        assert_eq!(problem.board.neighbours[0], vec![1]);
        assert_eq!(problem.board.neighbours[1], vec![0, 2]);
        assert_eq!(problem.board.neighbours[2], vec![1]);
        assert_eq!(problem.to_string(), "at(1,A)at(2,B)");
    }

    #[test]
    fn test_new_rejects_bad_input() {
        assert!(matches!(TileProblem::new("at(1,A)"), Err(SearchError::Domain(_))));
        assert!(matches!(
            TileProblem::new("adj(A,B),at(1,Z)"),
            Err(SearchError::Domain(_))
        ));
        assert!(matches!(
            TileProblem::new("adj(A,B),at(1,A),at(2,A)"),
            Err(SearchError::Domain(_))
        ));
        assert!(matches!(
            TileProblem::new("adj(A,B),at(1,A"),
            Err(SearchError::Format { .. })
        ));
    }

    #[test]
    fn test_canonical_is_order_independent_and_idempotent() {
        let problem = line_problem();
        let a = problem.canonical("at(2,C),at(1,B)").unwrap();
        let b = problem.canonical("junk at(1,B) adj(A,B) at(2,C) at(1,B)").unwrap();
        assert_eq!(a, b);

        let compact = problem.compact(&a);
        assert_eq!(compact, "at(1,B)at(2,C)");
        assert_eq!(problem.canonical(&compact).unwrap(), a);
        assert_eq!(problem.compact(&problem.canonical(&compact).unwrap()), compact);

        let full = problem.full(&a);
        assert_eq!(
            full,
            "state([adj(A,B),adj(B,A),adj(B,C),adj(C,B),at(1,B),at(2,C),blank(A)])."
        );
        assert_eq!(problem.canonical(&full).unwrap(), a);
    }

    #[test]
    fn test_canonical_domain_errors() {
        let problem = line_problem();
        assert!(matches!(problem.canonical("at(1,Q)"), Err(SearchError::Domain(_))));
        assert!(matches!(problem.canonical("at(9,A)"), Err(SearchError::Domain(_))));
        assert!(matches!(
            problem.canonical("adj(A,Q),at(1,A)"),
            Err(SearchError::Domain(_))
        ));
        // Tile 1 twice, tile 2 missing.
        assert!(matches!(problem.canonical("at(1,A),at(1,C)"), Err(SearchError::Domain(_))));
        // A and C are not neighbours.
        assert!(matches!(
            problem.canonical("adj(A,C),at(1,A),at(2,B)"),
            Err(SearchError::Domain(_))
        ));
        assert!(matches!(problem.canonical(""), Err(SearchError::Domain(_))));
        assert!(matches!(problem.canonical("at(1,A)"), Err(SearchError::Domain(_))));
    }

    #[test]
    fn test_canonical_checks_against_abstract_goal() {
        let problem = TileProblem::new(&grid_goal_text(2, 2)).unwrap();
        let abstract_problem = problem.abstracted(&["1", "3"]).unwrap();
        assert!(abstract_problem.canonical("at(1,a2),at(1,b2),at(2,a1)").is_ok());
        // The merged identity needs both of its copies.
        assert!(matches!(
            abstract_problem.canonical("at(1,a2),at(2,a1)"),
            Err(SearchError::Domain(_))
        ));
        // Tile 3 no longer exists on its own in the abstraction.
        assert!(matches!(
            abstract_problem.canonical("at(1,a2),at(3,b2),at(2,a1)"),
            Err(SearchError::Domain(_))
        ));
    }

    #[test]
    fn test_expand_line() {
        let problem = line_problem();
        let start = problem.canonical("at(1,B),at(2,C)").unwrap();
        let next = problem.expand(&start);
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].0, 1);
        assert_eq!(problem.compact(&next[0].1), "at(1,A)at(2,C)");
    }

    #[test]
    fn test_expand_is_symmetric() {
        let problem = TileProblem::new(&grid_goal_text(3, 3)).unwrap();
        for seed in 0..5 {
            let state = problem.scrambled(seed, 12);
            for (cost, neighbour) in problem.expand(&state) {
                let back = problem.expand(&neighbour);
                assert!(back.contains(&(cost, state.clone())));
            }
        }
    }

    #[test]
    fn test_expand_multiple_blanks_deduplicates() {
        let problem = TileProblem::new("adj(A,B),adj(B,C),at(1,B)").unwrap();
        let next = problem.expand(problem.goal());
        let rendered: Vec<String> = next.iter().map(|(_, s)| problem.compact(s)).collect();
        assert_eq!(rendered.len(), 2);
        assert!(rendered.contains(&"at(1,A)".to_string()));
        assert!(rendered.contains(&"at(1,C)".to_string()));
    }

    #[test]
    fn test_is_goal() {
        let problem = line_problem();
        assert!(problem.is_goal(&problem.canonical("at(2,B),at(1,A)").unwrap()));
        assert!(!problem.is_goal(&problem.canonical("at(1,B),at(2,C)").unwrap()));
    }

    #[test]
    fn test_distance_cache() {
        let problem = line_problem();
        assert_eq!(problem.distance(0, 2), 2);
        assert_eq!(problem.distance(0, 1), 1);
        assert_eq!(problem.distance(2, 2), 0);
        assert_eq!(problem.distances.read().len(), 2);

        // Clones share the cache.
        let clone = problem.clone();
        assert_eq!(clone.distance(1, 0), 1);
        assert_eq!(problem.distances.read().len(), 3);
    }

    #[test]
    fn test_distance_disconnected() {
        let problem = TileProblem::new("adj(A,B),adj(C,D),at(1,A)").unwrap();
        assert_eq!(problem.distance(0, 3), Cost::MAX);
    }

    #[test]
    fn test_manhattan() {
        let problem = line_problem();
        assert_eq!(problem.manhattan(problem.goal()), 0);
        let start = problem.canonical("at(1,B),at(2,C)").unwrap();
        assert_eq!(problem.manhattan(&start), 2);
        let swapped = problem.canonical("at(2,A),at(1,B)").unwrap();
        assert_eq!(problem.manhattan(&swapped), 2);
    }

    #[test]
    fn test_abstractify() {
        let problem = TileProblem::new(&grid_goal_text(2, 2)).unwrap();
        let goal = problem.goal().clone();
        let merged = problem.abstractify(&goal, &["1", "3"]).unwrap();
        assert_eq!(problem.compact(&merged), "at(1,a1)at(1,b1)at(2,a2)");
        let one = problem.tile_id("1").unwrap();
        assert_eq!(merged.tile_at(0), Some(one));
        assert_eq!(goal.tile_at(2), problem.tile_id("3").ok());
        assert_eq!(merged.tile_at(2), Some(one));
        assert_eq!(merged.tile_at(3), None);
        assert_eq!(merged.blanks().collect::<Vec<_>>(), goal.blanks().collect::<Vec<_>>());

        assert_eq!(problem.abstractify(&goal, &[] as &[&str]).unwrap(), goal);
        assert!(matches!(
            problem.abstractify(&goal, &["1", "2", "3", "4"]),
            Err(SearchError::Domain(_))
        ));
        assert!(matches!(
            problem.abstractify(&goal, &["7"]),
            Err(SearchError::Domain(_))
        ));
    }

    #[test]
    fn test_abstracted_goal_and_heuristic() {
        let problem = TileProblem::new(&grid_goal_text(2, 2)).unwrap();
        let abstract_problem = problem.abstracted(&["1", "3"]).unwrap();
        assert_eq!(abstract_problem.to_string(), "at(1,a1)at(1,b1)at(2,a2)");
        // Tile 1 in a1 and b1 swapped with the other merged copy is still a goal.
        let state = abstract_problem.canonical("at(1,b1),at(1,a1),at(2,a2)").unwrap();
        assert!(abstract_problem.is_goal(&state));
        assert_eq!(abstract_problem.manhattan(&state), 0);
    }

    #[test]
    fn test_scrambled_is_reproducible() {
        let problem = TileProblem::new(&grid_goal_text(3, 3)).unwrap();
        assert_eq!(problem.scrambled(7, 30), problem.scrambled(7, 30));
        assert_eq!(&problem.scrambled(7, 0), problem.goal());
    }
}
