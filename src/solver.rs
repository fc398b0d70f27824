//! Generalised best-first search.
//!
//! A*, weighted A* and uniform-cost search are one loop with different
//! priority functions:
//!
//! | mode          | priority      | goal test |
//! |---------------|---------------|-----------|
//! | A*            | `g + h`       | yes       |
//! | weighted A*   | `g + w * h`   | yes       |
//! | uniform cost  | `g`           | no, runs to exhaustion |
//!
//! g-values only change on strict improvement, so the loop stays correct
//! when an inconsistent (or weighted) heuristic forces a state to be reopened.
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use tracing::{debug, trace, warn};

use crate::bounds::{BoundedSolution, BoundsTracker};
use crate::config::SearchConfig;
use crate::error::{SearchError, SearchResult};
use crate::frontier::Frontier;
use crate::problem::{null_heuristic, Cost, Problem};

/// Exact distance from the search origin to every reachable state.
pub type DistanceTable<S> = HashMap<S, Cost>;

/// Which member of the best-first family to run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mode {
    AStar,
    /// Weighted A* with the given weight (at least 1).
    Weighted(f64),
    /// Dijkstra without a goal test.
    UniformCost,
}

impl Mode {
    fn weight(&self) -> f64 {
        match self {
            Mode::AStar => 1.0,
            Mode::Weighted(w) => *w,
            Mode::UniformCost => 0.0,
        }
    }

    fn has_goal_test(&self) -> bool {
        !matches!(self, Mode::UniformCost)
    }
}

/// Lifecycle of a [`SearchEngine`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStatus {
    NotStarted,
    Running,
    /// A goal state was popped.
    Succeeded,
    /// The frontier emptied. For goal-seeking modes the goal is unreachable.
    Exhausted,
    /// The expansion limit was hit with states still on the frontier.
    Stopped,
}

/// Counters for the most recent search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Frontier pops, the goal pop included.
    pub iterations: usize,
    pub expanded: usize,
    /// Neighbours produced by expansion, before duplicate detection.
    pub generated: usize,
    /// Expansions of a state that had already been expanded once.
    pub reopened: usize,
}

/// A path from the start to a goal and its cost.
#[derive(Clone, Debug)]
pub struct Solution<S> {
    pub cost: Cost,
    /// Start first, goal last.
    pub path: Vec<S>,
    pub stats: SearchStats,
}

/// Hooks into the search loop. Both default to doing nothing.
pub trait SearchObserver<S> {
    /// A state entered the frontier (or improved its entry) with cost `g`.
    fn on_push(&mut self, _g: Cost, _state: &S) {}

    /// `state` was popped at `priority`, before it is goal-tested or expanded.
    fn on_pop(&mut self, _iteration: usize, _priority: f64, _state: &S) {}
}

struct Silent;

impl<S> SearchObserver<S> for Silent {}

/// Everything a finished loop leaves behind.
struct Run<S> {
    goal: Option<S>,
    g_values: HashMap<S, Cost>,
    parents: HashMap<S, S>,
    frontier: Frontier<S>,
}

/// Runs best-first searches over one problem.
///
/// Each call builds its own frontier and bookkeeping and discards them when it
/// returns; only the status and statistics of the latest call are kept.
pub struct SearchEngine<'p, P: Problem> {
    problem: &'p P,
    config: SearchConfig,
    status: SearchStatus,
    stats: SearchStats,
}

impl<'p, P: Problem> SearchEngine<'p, P> {
    pub fn new(problem: &'p P) -> Self {
        Self::with_config(problem, SearchConfig::default())
    }

    pub fn with_config(problem: &'p P, config: SearchConfig) -> Self {
        SearchEngine {
            problem,
            config,
            status: SearchStatus::NotStarted,
            stats: SearchStats::default(),
        }
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    /// Statistics collected by the most recent call.
    pub fn last_stats(&self) -> SearchStats {
        self.stats
    }

    /// A*: returns a cheapest path when `h` is admissible, `None` if no goal
    /// is reachable from `start`.
    pub fn search<H>(&mut self, start: &P::State, h: H) -> SearchResult<Option<Solution<P::State>>>
    where
        H: Fn(&P::State) -> Cost,
    {
        let run = self.run(start, &h, Mode::AStar, &mut Silent)?;
        Ok(self.solution(&run))
    }

    /// Weighted A*: the returned cost is at most `weight` times optimal.
    ///
    /// # Errors
    /// `SearchError::Domain` if `weight` is below 1, infinite or not a number.
    pub fn weighted_search<H>(
        &mut self,
        start: &P::State,
        h: H,
        weight: f64,
    ) -> SearchResult<Option<Solution<P::State>>>
    where
        H: Fn(&P::State) -> Cost,
    {
        check_weight(weight)?;
        let run = self.run(start, &h, Mode::Weighted(weight), &mut Silent)?;
        Ok(self.solution(&run))
    }

    /// Weighted A* that also reports F- and X-bounds on its suboptimality.
    pub fn weighted_search_with_bounds<H>(
        &mut self,
        start: &P::State,
        h: H,
        weight: f64,
    ) -> SearchResult<Option<BoundedSolution<P::State>>>
    where
        H: Fn(&P::State) -> Cost,
    {
        check_weight(weight)?;
        let mut tracker = BoundsTracker::new();
        let run = self.run(start, &h, Mode::Weighted(weight), &mut tracker)?;
        let Some(solution) = self.solution(&run) else {
            return Ok(None);
        };

        let lowest_f = run
            .frontier
            .states()
            .map(|s| run.g_values[s] as f64 + h(s) as f64)
            .fold(solution.cost as f64, f64::min);
        let bounds = tracker.finish(solution.cost, weight, lowest_f);
        if bounds.is_anomalous() {
            warn!(
                cost = solution.cost,
                f_bound = bounds.f_bound,
                x_bound = bounds.x_bound,
                "F-bound is below X-bound"
            );
        }
        Ok(Some(BoundedSolution { solution, bounds }))
    }

    /// Uniform-cost search from `start` until the frontier is empty.
    pub fn build_distance_table(&mut self, start: &P::State) -> SearchResult<DistanceTable<P::State>> {
        let run = self.run(start, &null_heuristic::<P::State>, Mode::UniformCost, &mut Silent)?;
        Ok(run.g_values)
    }

    fn solution(&self, run: &Run<P::State>) -> Option<Solution<P::State>> {
        run.goal.as_ref().map(|goal| Solution {
            cost: run.g_values[goal],
            path: reconstruct_path(goal, &run.parents),
            stats: self.stats,
        })
    }

    fn run<H, O>(&mut self, start: &P::State, h: &H, mode: Mode, observer: &mut O) -> SearchResult<Run<P::State>>
    where
        H: Fn(&P::State) -> Cost,
        O: SearchObserver<P::State>,
    {
        let weight = mode.weight();
        let priority = |g: Cost, state: &P::State| -> f64 {
            if weight == 0.0 {
                g as f64
            } else {
                g as f64 + weight * h(state) as f64
            }
        };

        self.stats = SearchStats::default();
        self.status = SearchStatus::Running;
        debug!(?mode, "search started");

        let mut frontier = Frontier::new();
        let mut g_values: HashMap<P::State, Cost> = HashMap::new();
        let mut parents: HashMap<P::State, P::State> = HashMap::new();
        let mut expanded: HashSet<P::State> = HashSet::new();

        g_values.insert(start.clone(), 0);
        frontier.push(priority(0, start), start.clone());
        observer.on_push(0, start);

        while let Some((key, state)) = frontier.pop_min() {
            self.stats.iterations += 1;
            let g = g_values[&state];
            trace!(iteration = self.stats.iterations, priority = key, g, "pop");
            observer.on_pop(self.stats.iterations, key, &state);

            if mode.has_goal_test() && self.problem.is_goal(&state) {
                self.status = SearchStatus::Succeeded;
                debug!(cost = g, stats = ?self.stats, "search succeeded");
                return Ok(Run {
                    goal: Some(state),
                    g_values,
                    parents,
                    frontier,
                });
            }

            if let Some(limit) = self.config.max_expansions {
                if self.stats.expanded >= limit {
                    warn!(limit, "expansion limit reached");
                    self.status = SearchStatus::Stopped;
                    return Err(SearchError::ResourceExhausted {
                        expanded: self.stats.expanded,
                        limit,
                    });
                }
            }

            self.stats.expanded += 1;
            if !expanded.insert(state.clone()) {
                self.stats.reopened += 1;
            }

            for (edge_cost, neighbour) in self.problem.expand(&state) {
                self.stats.generated += 1;
                let tentative = g.saturating_add(edge_cost);
                let improved = g_values.get(&neighbour).map_or(true, |&old| tentative < old);
                if !improved {
                    continue;
                }
                g_values.insert(neighbour.clone(), tentative);
                parents.insert(neighbour.clone(), state.clone());
                frontier.decrease_or_insert(priority(tentative, &neighbour), neighbour.clone());
                observer.on_push(tentative, &neighbour);
            }
        }

        self.status = SearchStatus::Exhausted;
        debug!(reached = g_values.len(), stats = ?self.stats, "search exhausted");
        Ok(Run {
            goal: None,
            g_values,
            parents,
            frontier,
        })
    }
}

fn check_weight(weight: f64) -> SearchResult<()> {
    if weight.is_finite() && weight >= 1.0 {
        Ok(())
    } else {
        Err(SearchError::domain(format!("weight must be at least 1, got {}", weight)))
    }
}

/// Follows parent links from `state` back to the start, returning the path start-first.
pub fn reconstruct_path<S: Clone + Eq + Hash>(state: &S, parents: &HashMap<S, S>) -> Vec<S> {
    let mut path = vec![state.clone()];
    let mut current = state;
    while let Some(parent) = parents.get(current) {
        path.push(parent.clone());
        current = parent;
    }
    path.reverse();
    path
}

/// A* from a raw start description.
pub fn a_star<P, H>(start: &str, problem: &P, h: H) -> SearchResult<Option<Solution<P::State>>>
where
    P: Problem,
    H: Fn(&P::State) -> Cost,
{
    let start = problem.canonical(start)?;
    SearchEngine::new(problem).search(&start, h)
}

/// Weighted A* from a raw start description.
pub fn weighted_a_star<P, H>(start: &str, problem: &P, h: H, weight: f64) -> SearchResult<Option<Solution<P::State>>>
where
    P: Problem,
    H: Fn(&P::State) -> Cost,
{
    let start = problem.canonical(start)?;
    SearchEngine::new(problem).weighted_search(&start, h, weight)
}

/// Weighted A* with F-/X-bounds from a raw start description.
pub fn weighted_a_star_with_bounds<P, H>(
    start: &str,
    problem: &P,
    h: H,
    weight: f64,
) -> SearchResult<Option<BoundedSolution<P::State>>>
where
    P: Problem,
    H: Fn(&P::State) -> Cost,
{
    let start = problem.canonical(start)?;
    SearchEngine::new(problem).weighted_search_with_bounds(&start, h, weight)
}

/// Distances from a raw start description to every state reachable from it.
pub fn make_pdb<P: Problem>(start: &str, problem: &P) -> SearchResult<DistanceTable<P::State>> {
    let start = problem.canonical(start)?;
    SearchEngine::new(problem).build_distance_table(&start)
}
