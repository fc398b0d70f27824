//! Suboptimality bounds gathered during a single weighted A* pass.
//!
//! `BoundsTracker` watches the weighted search loop: every push and pop is
//! mirrored into a secondary frontier keyed purely by g, so the minimum g among
//! not-yet-expanded states is always at hand. When the search reaches the goal
//! the tracker turns its statistics into two estimates of the ratio between the
//! returned cost and the optimal cost:
//!
//! - F-bound: `cost * w / (F + (w - 1) * g_min)`, where `F` is the largest
//!   weighted priority popped and `g_min` the smallest active g when `F` was set.
//! - X-bound: `cost / min(g + h)` over the states still active at termination,
//!   the goal included.
//!
//! The X-bound normally dominates the F-bound. When it does not, the result is
//! flagged as anomalous but still returned.

use std::hash::Hash;

use crate::frontier::Frontier;
use crate::problem::Cost;
use crate::solver::{SearchObserver, Solution};

/// Statistics and bounds for one weighted A* run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// Largest weighted priority `g + w*h` popped during the search.
    pub f: f64,
    /// Iteration (1-based pop count) at which `f` last increased.
    pub f_iteration: usize,
    /// Smallest g among active states when `f` was set.
    pub g_min: Cost,
    /// Iteration at which `g_min` was recorded.
    pub g_min_iteration: usize,
    pub f_bound: f64,
    pub x_bound: f64,
}

impl Bounds {
    /// True when the F-bound is tighter than the X-bound, which should not
    /// normally happen.
    pub fn is_anomalous(&self) -> bool {
        self.f_bound < self.x_bound
    }

    /// `f_bound / x_bound`.
    pub fn ratio(&self) -> f64 {
        self.f_bound / self.x_bound
    }
}

/// A weighted A* solution together with its bounds.
#[derive(Clone, Debug)]
pub struct BoundedSolution<S> {
    pub solution: Solution<S>,
    pub bounds: Bounds,
}

/// Collects `F` and `g_min` while weighted A* runs.
#[derive(Debug)]
pub struct BoundsTracker<S> {
    active: Frontier<S>,
    f: f64,
    f_iteration: usize,
    g_min: Cost,
    g_min_iteration: usize,
}

impl<S: Clone + Eq + Hash> Default for BoundsTracker<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone + Eq + Hash> BoundsTracker<S> {
    pub fn new() -> Self {
        BoundsTracker {
            active: Frontier::new(),
            f: f64::NEG_INFINITY,
            f_iteration: 0,
            g_min: 0,
            g_min_iteration: 0,
        }
    }

    fn active_g_min(&mut self) -> Option<Cost> {
        self.active.peek_min().map(|(g, _)| g as Cost)
    }

    /// Computes the bounds for a goal of `cost` found with `weight`.
    ///
    /// `lowest_f` is the minimum unweighted `g + h` over the states active at
    /// termination, including the goal itself.
    pub fn finish(&self, cost: Cost, weight: f64, lowest_f: f64) -> Bounds {
        let (f_bound, x_bound) = if cost == 0 {
            (1.0, 1.0)
        } else {
            let c = cost as f64;
            (
                ratio(c * weight, self.f + (weight - 1.0) * self.g_min as f64),
                ratio(c, lowest_f),
            )
        };
        Bounds {
            f: self.f,
            f_iteration: self.f_iteration,
            g_min: self.g_min,
            g_min_iteration: self.g_min_iteration,
            f_bound,
            x_bound,
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        f64::INFINITY
    }
}

impl<S: Clone + Eq + Hash> SearchObserver<S> for BoundsTracker<S> {
    fn on_push(&mut self, g: Cost, state: &S) {
        self.active.push(g as f64, state.clone());
    }

    /// Called before `state` leaves the active set, so it counts towards `g_min`.
    fn on_pop(&mut self, iteration: usize, priority: f64, state: &S) {
        if priority > self.f {
            self.f = priority;
            self.f_iteration = iteration;
            if let Some(g) = self.active_g_min() {
                self.g_min = g;
                self.g_min_iteration = iteration;
            }
        } else if priority == self.f {
            if let Some(g) = self.active_g_min() {
                if g < self.g_min {
                    self.g_min = g;
                    self.g_min_iteration = iteration;
                }
            }
        }
        self.active.remove(state);
    }
}
