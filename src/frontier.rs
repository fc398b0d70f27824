//! Min-priority frontier with lazy deletion.
//!
//! Entries live in a binary heap; a side map records the one live entry per
//! state. Pushing a state that is already present supersedes its old entry,
//! and superseded or removed entries are skipped when they reach the top.
//!
//! Ties on priority are broken by insertion order (first in, first out), so a
//! search over the same input always pops states in the same order.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;

#[derive(Debug, Clone)]
struct Entry<S> {
    priority: f64,
    seq: u64,
    state: S,
}

impl<S> PartialEq for Entry<S> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<S> Eq for Entry<S> {}

impl<S> PartialOrd for Entry<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S> Ord for Entry<S> {
    // Reversed on both keys so the max-heap pops the lowest priority, oldest first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// A decrease-key capable min-priority queue over states.
#[derive(Debug, Clone)]
pub struct Frontier<S> {
    heap: BinaryHeap<Entry<S>>,
    live: HashMap<S, (u64, f64)>,
    next_seq: u64,
}

impl<S: Clone + Eq + Hash> Default for Frontier<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone + Eq + Hash> Frontier<S> {
    pub fn new() -> Self {
        Frontier {
            heap: BinaryHeap::new(),
            live: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Inserts `state`, replacing any entry it already has.
    pub fn push(&mut self, priority: f64, state: S) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.live.insert(state.clone(), (seq, priority));
        self.heap.push(Entry { priority, seq, state });
    }

    /// Removes and returns the live entry with the lowest priority.
    pub fn pop_min(&mut self) -> Option<(f64, S)> {
        while let Some(entry) = self.heap.pop() {
            if self.is_live(&entry) {
                self.live.remove(&entry.state);
                return Some((entry.priority, entry.state));
            }
        }
        None
    }

    /// The lowest live priority and its state, without removing it.
    pub fn peek_min(&mut self) -> Option<(f64, &S)> {
        while let Some(top) = self.heap.peek() {
            if self.is_live(top) {
                break;
            }
            self.heap.pop();
        }
        self.heap.peek().map(|entry| (entry.priority, &entry.state))
    }

    /// Invalidates the entry for `state`, returning its priority if it was present.
    pub fn remove(&mut self, state: &S) -> Option<f64> {
        self.live.remove(state).map(|(_, priority)| priority)
    }

    /// Invalidates `state`'s old entry and inserts it again at `priority`.
    ///
    /// Equivalent to `push`; kept separate so call sites read as the
    /// decrease-key they perform.
    pub fn decrease_or_insert(&mut self, priority: f64, state: S) {
        self.remove(&state);
        self.push(priority, state);
    }

    pub fn contains(&self, state: &S) -> bool {
        self.live.contains_key(state)
    }

    pub fn priority_of(&self, state: &S) -> Option<f64> {
        self.live.get(state).map(|&(_, priority)| priority)
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Live states in no particular order.
    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.live.keys()
    }

    fn is_live(&self, entry: &Entry<S>) -> bool {
        matches!(self.live.get(&entry.state), Some(&(seq, _)) if seq == entry.seq)
    }
}
