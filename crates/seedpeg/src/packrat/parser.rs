use super::config::{PackratConfig, ParseOptions};
use super::outcome::{Outcome, ParseResult};
use super::session::Session;
use super::state::{ParseMetrics, ParserState};
use crate::error::{ParseError, failure_message};
use crate::grammar::{Grammar, RuleId};
use compact_str::{CompactString, format_compact};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Packrat parser over a shared [`Grammar`].
///
/// The parser owns the per-parse state and reuses its allocations across
/// parses. Any number of parsers may share one grammar; each one parses one
/// input at a time.
#[derive(Debug)]
pub struct PackratParser<S, V> {
    grammar: Arc<Grammar<S, V>>,
    config: PackratConfig,
    state: ParserState<V>,
}

impl<S, V> PackratParser<S, V> {
    #[must_use]
    pub fn new(grammar: Arc<Grammar<S, V>>, config: PackratConfig) -> Self {
        let state = ParserState::new(grammar.len(), config.initial_stack_capacity);
        Self {
            grammar,
            config,
            state,
        }
    }

    #[must_use]
    pub fn grammar(&self) -> &Arc<Grammar<S, V>> {
        &self.grammar
    }

    #[must_use]
    pub const fn config(&self) -> &PackratConfig {
        &self.config
    }

    /// State left by the last parse.
    #[must_use]
    pub const fn state(&self) -> &ParserState<V> {
        &self.state
    }

    #[must_use]
    pub const fn metrics(&self) -> &ParseMetrics {
        &self.state.metrics
    }

    /// Rightmost index at which a terminal failed during the last parse.
    #[must_use]
    pub const fn failure_index(&self) -> usize {
        self.state.failures.index()
    }

    /// Distinct descriptors of the terminals that failed at
    /// [`failure_index`](Self::failure_index).
    #[must_use]
    pub fn terminal_failures(&self) -> &[CompactString] {
        self.state.failures.expected()
    }

    /// A sentence describing the furthest failure of the last parse, or
    /// `None` when no terminal failed.
    #[must_use]
    pub fn failure_reason(&self) -> Option<String> {
        let failures = &self.state.failures;
        (!failures.is_empty()).then(|| failure_message(failures.index(), failures.expected()))
    }
}

impl<S, V: Clone> PackratParser<S, V> {
    /// Parse `input` starting with `start_rule`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::NoMatch`] or [`ParseError::InputExhausted`] when
    /// the start rule fails, [`ParseError::IncompleteConsumption`] when it
    /// leaves input behind under [`ParseOptions::consume_all_input`],
    /// [`ParseError::StartOutOfBounds`] when [`ParseOptions::start_index`] is
    /// past the end of `input`, and the abort variants when evaluation cannot
    /// continue.
    pub fn parse(
        &mut self,
        input: &[S],
        start_rule: RuleId,
        options: &ParseOptions,
    ) -> Result<ParseResult<V>, ParseError> {
        let started = Instant::now();
        let grammar = Arc::clone(&self.grammar);
        if start_rule.index() >= grammar.len() {
            return Err(ParseError::UnknownRule(format_compact!("{start_rule}")));
        }

        self.state.reset(grammar.len());
        let start_index = options.start_index.unwrap_or(0);
        if start_index > input.len() {
            return Err(ParseError::StartOutOfBounds {
                start_index,
                input_len: input.len(),
            });
        }
        debug!(
            rule = grammar.label(start_rule),
            start_index,
            input_len = input.len(),
            "parse started"
        );

        let outcome = Session::new(&grammar, input, &mut self.state, &self.config, start_index)
            .apply(start_rule);
        self.state.metrics.parse_time = started.elapsed();

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!(error = %err, "parse aborted");
                self.state.stack.reset();
                return Err(err);
            }
        };

        let metrics = &self.state.metrics;
        debug!(
            success = outcome.is_success(),
            end = outcome.end(),
            evaluations = metrics.evaluations,
            cache_hits = metrics.cache_hits,
            recursions = metrics.recursions_detected,
            growth_iterations = metrics.growth_iterations,
            max_depth = metrics.max_depth,
            elapsed = ?metrics.parse_time,
            "parse finished"
        );

        match outcome {
            Outcome::Success(result) if !options.consume_all_input || result.end == input.len() => {
                Ok(result)
            }
            Outcome::Success(result) => Err(self.incomplete(result.end, input.len())),
            Outcome::Failure => Err(self.no_match(input.len())),
        }
    }

    /// Parse `input` starting with the rule called `start_rule`.
    ///
    /// # Errors
    ///
    /// As [`parse`](Self::parse), plus [`ParseError::UnknownRule`] when no
    /// rule has that name.
    pub fn parse_named(
        &mut self,
        input: &[S],
        start_rule: &str,
        options: &ParseOptions,
    ) -> Result<ParseResult<V>, ParseError> {
        let rule = self
            .grammar
            .rule_id(start_rule)
            .ok_or_else(|| ParseError::UnknownRule(CompactString::from(start_rule)))?;
        self.parse(input, rule, options)
    }

    fn no_match(&self, input_len: usize) -> ParseError {
        let failures = &self.state.failures;
        let index = failures.index();
        let expected = failures.expected().to_vec();
        if !failures.is_empty() && index >= input_len {
            ParseError::InputExhausted { index, expected }
        } else {
            ParseError::NoMatch { index, expected }
        }
    }

    /// The start rule stopped at `consumed`. Terminal failures left of that
    /// point belong to alternatives that lost, so they are not reported.
    fn incomplete(&self, consumed: usize, input_len: usize) -> ParseError {
        let failures = &self.state.failures;
        let (failure_index, expected) = if failures.index() >= consumed {
            (failures.index(), failures.expected().to_vec())
        } else {
            (consumed, Vec::new())
        };
        ParseError::IncompleteConsumption {
            consumed,
            input_len,
            failure_index,
            expected,
        }
    }
}
