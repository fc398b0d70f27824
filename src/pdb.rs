//! Pattern databases over merged tile identities.
//!
//! A pattern names a subset of tile IDs (1-indexed integers) to treat as one
//! indistinguishable identity. Merging shrinks the state space enough to
//! enumerate it completely: a uniform-cost search from the abstracted goal
//! records the exact abstract distance of every reachable abstract state.
//! Since tile moves are reversible, that is also the distance back to the goal,
//! and it never exceeds the true distance of any concrete state that maps to it.
//!
//! Building one pattern touches nothing outside its own abstract problem, so
//! `PdbSet::build_parallel` can fan the patterns out over `rayon`.

use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;
use tracing::info;

use crate::error::{SearchError, SearchResult};
use crate::problem::Cost;
use crate::solver::{DistanceTable, SearchEngine};
use crate::tile::{TileProblem, TileState};

/// All `strength`-element subsets of `1..=total`, as ascending tuples in
/// lexicographic order.
///
/// # Examples
/// ```
/// use tile_search::pdb::patterns;
///
/// assert_eq!(patterns(3, 2), vec![vec![1, 2], vec![1, 3], vec![2, 3]]);
/// assert_eq!(patterns(2, 0), vec![Vec::<usize>::new()]);
/// assert!(patterns(2, 3).is_empty());
/// ```
pub fn patterns(total: usize, strength: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    if strength > total {
        return out;
    }
    let mut current: Vec<usize> = (1..=strength).collect();
    loop {
        out.push(current.clone());
        // Rightmost position that can still advance.
        let Some(i) = (0..strength).rev().find(|&i| current[i] < total - (strength - 1 - i)) else {
            return out;
        };
        current[i] += 1;
        for j in i + 1..strength {
            current[j] = current[j - 1] + 1;
        }
    }
}

/// Exact abstract distances for one pattern.
#[derive(Clone, Debug)]
pub struct PatternDatabase {
    pattern: Vec<String>,
    problem: TileProblem,
    table: DistanceTable<TileState>,
}

impl PatternDatabase {
    /// Enumerates the abstract space of `problem` with the tiles in `pattern` merged.
    ///
    /// # Errors
    /// `SearchError::Domain` if the pattern is larger than the tile set or
    /// names a tile the problem does not have.
    pub fn build(problem: &TileProblem, pattern: &[usize]) -> SearchResult<PatternDatabase> {
        let pattern: Vec<String> = pattern.iter().map(|id| id.to_string()).collect();
        let abstract_problem = problem.abstracted(&pattern)?;
        let table = SearchEngine::new(&abstract_problem).build_distance_table(abstract_problem.goal())?;
        info!(pattern = ?pattern, states = table.len(), "built pattern database");
        Ok(PatternDatabase {
            pattern,
            problem: abstract_problem,
            table,
        })
    }

    /// The merged tile labels; the first one represents the rest.
    pub fn pattern(&self) -> &[String] {
        &self.pattern
    }

    /// The abstracted problem the table was built over.
    pub fn problem(&self) -> &TileProblem {
        &self.problem
    }

    pub fn table(&self) -> &DistanceTable<TileState> {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Distance of an already abstracted state.
    pub fn get(&self, abstract_state: &TileState) -> Option<Cost> {
        self.table.get(abstract_state).copied()
    }

    /// Abstracts a concrete state and looks it up. `None` means the goal is
    /// unreachable from it.
    pub fn lookup(&self, state: &TileState) -> Option<Cost> {
        let abstract_state = self.problem.abstractify(state, &self.pattern).ok()?;
        self.get(&abstract_state)
    }
}

/// Every pattern database of one strength, in pattern order.
#[derive(Clone, Debug)]
pub struct PdbSet {
    strength: usize,
    databases: Vec<PatternDatabase>,
}

impl PdbSet {
    /// Builds one database per `strength`-subset of the problem's tiles, in turn.
    pub fn build(problem: &TileProblem, strength: usize) -> SearchResult<PdbSet> {
        let subsets = Self::subsets(problem, strength)?;
        let databases = subsets
            .iter()
            .map(|pattern| PatternDatabase::build(problem, pattern))
            .collect::<SearchResult<Vec<_>>>()?;
        Ok(PdbSet { strength, databases })
    }

    /// Same as [`PdbSet::build`], with patterns built concurrently.
    pub fn build_parallel(problem: &TileProblem, strength: usize) -> SearchResult<PdbSet> {
        let subsets = Self::subsets(problem, strength)?;
        let databases = subsets
            .par_iter()
            .map(|pattern| PatternDatabase::build(problem, pattern))
            .collect::<SearchResult<Vec<_>>>()?;
        Ok(PdbSet { strength, databases })
    }

    fn subsets(problem: &TileProblem, strength: usize) -> SearchResult<Vec<Vec<usize>>> {
        let total = problem.tile_count();
        if strength > total {
            return Err(SearchError::domain(format!(
                "strength {} exceeds the {} tiles of the problem",
                strength, total
            )));
        }
        Ok(patterns(total, strength))
    }

    pub fn strength(&self) -> usize {
        self.strength
    }

    pub fn databases(&self) -> &[PatternDatabase] {
        &self.databases
    }

    pub fn len(&self) -> usize {
        self.databases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    /// One lookup per database, in pattern order.
    pub fn values(&self, state: &TileState) -> Vec<Option<Cost>> {
        self.databases.iter().map(|db| db.lookup(state)).collect()
    }

    /// The largest lookup over all databases; admissible since each one is.
    /// `Cost::MAX` if any abstraction proves the goal unreachable.
    pub fn max_heuristic(&self, state: &TileState) -> Cost {
        self.databases
            .iter()
            .map(|db| db.lookup(state).unwrap_or(Cost::MAX))
            .max()
            .unwrap_or(0)
    }

    /// A random `fraction` of the databases (rounded down), without repeats.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, fraction: f64) -> Vec<&PatternDatabase> {
        let amount = (self.databases.len() as f64 * fraction.clamp(0.0, 1.0)) as usize;
        self.databases.choose_multiple(rng, amount).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Problem;
    use crate::tile::tests::line_problem;
    use crate::utils::grid_goal_text;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::collections::{HashMap, VecDeque};

    fn small_grid() -> TileProblem {
        TileProblem::new(&grid_goal_text(2, 3)).unwrap()
    }

    /// Plain BFS, independent of the search engine and frontier.
    fn bfs(problem: &TileProblem, start: &TileState) -> HashMap<TileState, Cost> {
        let mut seen = HashMap::new();
        let mut queue = VecDeque::new();
        seen.insert(start.clone(), 0);
        queue.push_back(start.clone());
        while let Some(state) = queue.pop_front() {
            let d = seen[&state];
            for (_, next) in problem.expand(&state) {
                if !seen.contains_key(&next) {
                    seen.insert(next.clone(), d + 1);
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    #[test]
    fn test_patterns_lexicographic() {
        assert_eq!(
            patterns(4, 2),
            vec![vec![1, 2], vec![1, 3], vec![1, 4], vec![2, 3], vec![2, 4], vec![3, 4]]
        );
        assert_eq!(patterns(5, 5), vec![vec![1, 2, 3, 4, 5]]);
        assert_eq!(patterns(8, 3).len(), 56);
        assert_eq!(patterns(3, 1), vec![vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn test_line_pattern_database() {
        let problem = line_problem();
        let db = PatternDatabase::build(&problem, &[1, 2]).unwrap();
        assert_eq!(db.problem().to_string(), "at(1,A)at(1,B)");
        assert_eq!(db.len(), 3);
        let start = problem.canonical("at(1,B),at(2,C)").unwrap();
        assert_eq!(db.lookup(&start), Some(2));
        // Unreachable in the concrete space, but not once 1 and 2 are merged.
        let swapped = problem.canonical("at(2,A),at(1,B)").unwrap();
        assert_eq!(db.lookup(&swapped), Some(0));
    }

    #[test]
    fn test_pdb_matches_independent_bfs() {
        let problem = small_grid();
        let db = PatternDatabase::build(&problem, &[1, 2]).unwrap();
        let expected = bfs(db.problem(), db.problem().goal());
        assert_eq!(db.len(), expected.len());
        for (state, distance) in &expected {
            assert_eq!(db.get(state), Some(*distance));
        }
    }

    #[test]
    fn test_abstraction_never_overestimates() {
        let problem = small_grid();
        let exact = bfs(&problem, problem.goal());
        let set = PdbSet::build(&problem, 2).unwrap();
        assert_eq!(set.len(), 10);
        for (state, distance) in &exact {
            for value in set.values(state) {
                let value = value.expect("abstraction of a reachable state is reachable");
                assert!(value <= *distance);
            }
            assert!(set.max_heuristic(state) <= *distance);
        }
        assert_eq!(set.max_heuristic(problem.goal()), 0);
    }

    #[test]
    fn test_parallel_build_matches_sequential() {
        let problem = small_grid();
        let sequential = PdbSet::build(&problem, 3).unwrap();
        let parallel = PdbSet::build_parallel(&problem, 3).unwrap();
        assert_eq!(sequential.strength(), 3);
        assert_eq!(sequential.len(), parallel.len());
        for (a, b) in sequential.databases().iter().zip(parallel.databases()) {
            assert_eq!(a.pattern(), b.pattern());
            assert_eq!(a.table(), b.table());
        }
    }

    #[test]
    fn test_strength_too_large() {
        let problem = line_problem();
        assert!(matches!(PdbSet::build(&problem, 3), Err(SearchError::Domain(_))));
        assert!(matches!(
            PatternDatabase::build(&problem, &[1, 2, 3]),
            Err(SearchError::Domain(_))
        ));
        assert!(matches!(
            PatternDatabase::build(&problem, &[4]),
            Err(SearchError::Domain(_))
        ));
    }

    #[test]
    fn test_sample_is_reproducible() {
        let problem = small_grid();
        let set = PdbSet::build(&problem, 2).unwrap();

        let pick = |seed| -> Vec<Vec<String>> {
            let mut rng = SmallRng::seed_from_u64(seed);
            set.sample(&mut rng, 0.5).iter().map(|db| db.pattern().to_vec()).collect()
        };
        let first = pick(42);
        assert_eq!(first.len(), 5);
        assert_eq!(first, pick(42));

        let mut unique = first.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 5);

        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(set.sample(&mut rng, 1.0).len(), 10);
        assert!(set.sample(&mut rng, 0.0).is_empty());
    }
}
