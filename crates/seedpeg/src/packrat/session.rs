//! Rule invocation with memoization and seed-growing left recursion.
//!
//! [`Session::apply`] is the single entry point through which rule bodies
//! invoke rules. For rule `R` at position `p`:
//!
//! 1. A cached outcome at `(R, p)` is returned directly.
//! 2. An in-progress marker at `(R, p)` means the evaluation cycled back to an
//!    activation that has not finished. The activation is told which rules
//!    lie on the cycle and the re-entry fails, which forces the seed parse.
//! 3. Otherwise `R` is pushed, marked in progress, and its body is evaluated
//!    until the activation's [`GrowthStep`] says it is done.

use super::cache::CacheEntry;
use super::config::PackratConfig;
use super::head::{GrowthStep, HeadId, HeadState, RecursionHead};
use super::outcome::Outcome;
use super::state::ParserState;
use crate::error::{InvariantViolation, ParseError};
use crate::grammar::{Grammar, RuleBody, RuleId};
use compact_str::format_compact;
use tracing::trace;

/// Descriptor recorded when [`Session::match_any`] runs out of input.
pub const ANY_SYMBOL: &str = "any character";

/// A parse in progress: the input, the scan position and the per-parse state.
///
/// Rule bodies receive a session and use it to match terminals and apply
/// other rules.
pub struct Session<'a, S, V> {
    grammar: &'a Grammar<S, V>,
    input: &'a [S],
    state: &'a mut ParserState<V>,
    config: &'a PackratConfig,
    index: usize,
}

impl<'a, S, V> Session<'a, S, V> {
    pub(crate) fn new(
        grammar: &'a Grammar<S, V>,
        input: &'a [S],
        state: &'a mut ParserState<V>,
        config: &'a PackratConfig,
        index: usize,
    ) -> Self {
        Self {
            grammar,
            input,
            state,
            config,
            index,
        }
    }

    /// Current scan position.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.index
    }

    /// Move the scan position, typically back to a mark after a failed
    /// alternative.
    pub const fn reset_to(&mut self, index: usize) {
        self.index = index;
    }

    #[must_use]
    pub const fn input(&self) -> &'a [S] {
        self.input
    }

    /// Symbols left after the scan position.
    #[must_use]
    pub fn remaining(&self) -> &'a [S] {
        self.input.get(self.index..).unwrap_or_default()
    }

    #[must_use]
    pub const fn at_end(&self) -> bool {
        self.index >= self.input.len()
    }

    #[must_use]
    pub const fn grammar(&self) -> &'a Grammar<S, V> {
        self.grammar
    }

    /// The rule whose body is being evaluated, if any.
    #[must_use]
    pub fn current_rule(&self) -> Option<RuleId> {
        self.state.stack.live().last().map(RecursionHead::rule)
    }

    /// Record a terminal failure at the scan position.
    pub fn fail(&mut self, expected: &str) {
        self.state.failures.record(self.index, expected);
    }

    /// Match `symbols` exactly, advancing past them.
    pub fn match_literal(&mut self, symbols: &[S], expected: &str) -> bool
    where
        S: PartialEq,
    {
        let end = self.index.checked_add(symbols.len());
        if let Some(end) = end
            && self.input.get(self.index..end) == Some(symbols)
        {
            self.index = end;
            true
        } else {
            self.fail(expected);
            false
        }
    }

    /// Match one symbol satisfying `test`.
    pub fn match_class(&mut self, test: fn(&S) -> bool, expected: &str) -> bool {
        if let Some(symbol) = self.input.get(self.index)
            && test(symbol)
        {
            self.index += 1;
            true
        } else {
            self.fail(expected);
            false
        }
    }

    /// Match any one symbol.
    pub fn match_any(&mut self) -> bool {
        if self.at_end() {
            self.fail(ANY_SYMBOL);
            false
        } else {
            self.index += 1;
            true
        }
    }
}

impl<S, V: Clone> Session<'_, S, V> {
    /// Invoke `rule` at the scan position.
    ///
    /// On success the position is the end of the match; on failure it is
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Only aborts are errors: an unknown rule, the nesting limit, or an
    /// [`InvariantViolation`] in the recursion bookkeeping.
    pub fn apply(&mut self, rule: RuleId) -> Result<Outcome<V>, ParseError> {
        let start = self.index;
        match self.state.cache.get(rule, start) {
            Some(CacheEntry::Outcome(outcome)) => {
                let outcome = outcome.clone();
                self.state.metrics.cache_hits += 1;
                if let Some(end) = outcome.end() {
                    self.index = end;
                }
                return Ok(outcome);
            }
            Some(CacheEntry::InProgress(head)) => {
                let head = *head;
                self.detect_cycle(rule, start, head)?;
                return Ok(Outcome::Failure);
            }
            None => {}
        }

        let grammar = self.grammar;
        let body = grammar
            .body(rule)
            .ok_or_else(|| ParseError::UnknownRule(format_compact!("{rule}")))?;
        if self.state.stack.depth() >= self.config.max_depth {
            return Err(ParseError::RecursionLimit {
                limit: self.config.max_depth,
                index: start,
            });
        }

        let head = self.state.stack.push(rule);
        let depth = self.state.stack.depth();
        if depth > self.state.metrics.max_depth {
            self.state.metrics.max_depth = depth;
        }
        self.state.cache.put(rule, start, CacheEntry::InProgress(head));

        let result = self.grow(rule, start, head, body);
        if result.is_err() {
            self.clear_marker(rule, start, head);
        }
        let released = self.state.stack.pop();
        let outcome = result?;
        let popped = released?;
        if popped != head {
            return Err(InvariantViolation::UnbalancedStack {
                expected: head.slot(),
                found: popped.slot(),
            }
            .into());
        }
        Ok(outcome)
    }

    /// A cycle came back to the activation in slot `head`.
    fn detect_cycle(&mut self, rule: RuleId, start: usize, head: HeadId) -> Result<(), ParseError> {
        let owned = self
            .state
            .stack
            .head(head)
            .is_some_and(|active| active.rule() == rule);
        if !owned {
            return Err(InvariantViolation::OrphanedInProgress {
                rule,
                position: start,
                head: head.slot(),
            }
            .into());
        }
        self.state.metrics.recursions_detected += 1;
        trace!(
            rule = self.grammar.label(rule),
            position = start,
            frames = self.state.stack.frames_above(head).len(),
            "left recursion detected"
        );
        self.state.stack.found(head);
        Ok(())
    }

    /// Evaluate the body of `rule` at `start` until its growth settles.
    fn grow(
        &mut self,
        rule: RuleId,
        start: usize,
        head: HeadId,
        body: &dyn RuleBody<S, V>,
    ) -> Result<Outcome<V>, ParseError> {
        // Each growth step strictly extends the match, so the loop settles
        // within one step per remaining symbol plus the seed and final steps.
        let limit = self.input.len().saturating_sub(start) + 2;
        let mut iterations = 0;
        loop {
            if iterations == limit {
                return Err(InvariantViolation::NonTerminatingGrowth {
                    rule,
                    position: start,
                    iterations,
                }
                .into());
            }
            iterations += 1;
            self.state.metrics.evaluations += 1;
            self.index = start;

            let attempt = body.evaluate(self)?;
            if let Some(outcome) = self.update(rule, start, head, attempt)? {
                return Ok(outcome);
            }
            self.state.metrics.growth_iterations += 1;
        }
    }

    /// Apply one growth step. Returns the final outcome once the activation
    /// is settled, `None` when the body must be evaluated again.
    fn update(
        &mut self,
        rule: RuleId,
        start: usize,
        head_id: HeadId,
        attempt: Outcome<V>,
    ) -> Result<Option<Outcome<V>>, ParseError> {
        let orphaned = move || InvariantViolation::OrphanedInProgress {
            rule,
            position: start,
            head: head_id.slot(),
        };
        let state = self
            .state
            .stack
            .head(head_id)
            .map(RecursionHead::state)
            .ok_or_else(orphaned)?;
        if state != HeadState::NoRecursion {
            self.state.stack.report_to_parents(head_id);
        }

        let best_end = self.state.cache.outcome(rule, start).and_then(Outcome::end);
        let step = GrowthStep::classify(state, attempt.end(), best_end);
        trace!(
            rule = self.grammar.label(rule),
            position = start,
            ?state,
            ?step,
            attempt_end = attempt.end(),
            best_end,
            "growth step"
        );

        let ParserState { cache, stack, .. } = &mut *self.state;
        let head = stack.head_mut(head_id).ok_or_else(orphaned)?;
        match step {
            GrowthStep::Accept => {
                self.index = attempt.end().unwrap_or(start);
                cache.put(rule, start, CacheEntry::Outcome(attempt.clone()));
                Ok(Some(attempt))
            }
            GrowthStep::Grow => {
                head.set_state(HeadState::GrowLR);
                self.index = start;
                head.uncache_involved(cache, start);
                cache.put(rule, start, CacheEntry::Outcome(attempt));
                Ok(None)
            }
            GrowthStep::Finish => {
                head.set_state(HeadState::NoRecursion);
                let seed = cache
                    .outcome(rule, start)
                    .and_then(Outcome::as_success)
                    .cloned()
                    .ok_or(InvariantViolation::MissingSeed {
                        rule,
                        position: start,
                    })?;
                self.index = seed.end;
                head.restore_involved(cache, start);
                trace!(
                    rule = self.grammar.label(rule),
                    position = start,
                    end = seed.end,
                    "growth finished"
                );
                Ok(Some(Outcome::Success(seed)))
            }
            GrowthStep::Fail => {
                head.set_state(HeadState::NoRecursion);
                self.index = start;
                cache.put(rule, start, CacheEntry::Outcome(Outcome::Failure));
                trace!(
                    rule = self.grammar.label(rule),
                    position = start,
                    "seed parse failed"
                );
                Ok(Some(Outcome::Failure))
            }
        }
    }

    /// Drop the in-progress marker of an aborted activation.
    fn clear_marker(&mut self, rule: RuleId, start: usize, head: HeadId) {
        if let Some(CacheEntry::InProgress(marker)) = self.state.cache.get(rule, start)
            && *marker == head
        {
            self.state.cache.delete(rule, start);
        }
    }
}
