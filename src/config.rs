//! Search configuration.

/// Knobs shared by every search mode.
///
/// The default configuration places no cap on the number of expansions, so a
/// search runs until it succeeds or the frontier is exhausted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchConfig {
    /// Maximum number of states a single search may expand. Hitting it yields
    /// [`SearchError::ResourceExhausted`](crate::error::SearchError::ResourceExhausted).
    pub max_expansions: Option<usize>,
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_expansions(mut self, limit: usize) -> Self {
        self.max_expansions = Some(limit);
        self
    }
}
