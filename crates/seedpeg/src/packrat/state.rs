use super::cache::MemoCache;
use super::stack::CallStack;
use crate::error::FailureTracker;
use std::time::Duration;

/// Counters collected during one parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseMetrics {
    /// Rule body evaluations, counting every growth iteration.
    pub evaluations: usize,
    /// Rule applications answered from the memo cache.
    pub cache_hits: usize,
    /// Re-entries of an in-progress (rule, position).
    pub recursions_detected: usize,
    /// Body re-evaluations after a seed was found.
    pub growth_iterations: usize,
    /// Deepest call stack reached.
    pub max_depth: usize,
    pub parse_time: Duration,
}

/// Mutable state of one parse.
///
/// Owned by a [`PackratParser`](super::PackratParser) and reset at the start
/// of every parse. The allocations are kept between parses.
#[derive(Debug)]
pub struct ParserState<V> {
    pub(crate) cache: MemoCache<V>,
    pub(crate) stack: CallStack<V>,
    pub(crate) failures: FailureTracker,
    pub(crate) metrics: ParseMetrics,
}

impl<V> ParserState<V> {
    #[must_use]
    pub fn new(rule_count: usize, stack_capacity: usize) -> Self {
        Self {
            cache: MemoCache::new(rule_count),
            stack: CallStack::with_capacity(stack_capacity),
            failures: FailureTracker::new(),
            metrics: ParseMetrics::default(),
        }
    }

    /// Prepare for a new parse over a grammar of `rule_count` rules.
    pub fn reset(&mut self, rule_count: usize) {
        self.cache.reset(rule_count);
        self.stack.reset();
        self.failures.reset();
        self.metrics = ParseMetrics::default();
    }

    #[must_use]
    pub const fn cache(&self) -> &MemoCache<V> {
        &self.cache
    }

    #[must_use]
    pub const fn stack(&self) -> &CallStack<V> {
        &self.stack
    }

    #[must_use]
    pub const fn failures(&self) -> &FailureTracker {
        &self.failures
    }

    #[must_use]
    pub const fn metrics(&self) -> &ParseMetrics {
        &self.metrics
    }
}
