//! # Error Types
//!
//! Error types for grammar construction and parsing.
//!
//! ## Overview
//!
//! An ordinary non-match is not an error: rules report it as
//! [`Outcome::Failure`](crate::packrat::Outcome) and it flows back up through
//! every invocation layer as a value. The types here cover what is left:
//!
//! - [`ParseError`]: the overall result of a failed parse, carrying the
//!   furthest-failure diagnostics, plus the conditions that abort a parse.
//! - [`InvariantViolation`]: implementation defects in the recursion
//!   machinery. These must never occur for a well-formed grammar and input;
//!   they are reported instead of silently producing a wrong tree.
//! - [`GrammarError`]: problems found while building a [`Grammar`](crate::grammar::Grammar).
//!
//! ## Diagnostics Support
//!
//! When the `diagnostics` feature is enabled, errors integrate with [`miette`]
//! and carry stable diagnostic codes.

mod tracker;

pub use tracker::FailureTracker;

use crate::grammar::RuleId;
use compact_str::CompactString;
use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// Why a parse did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum ParseError {
    /// The start rule did not match.
    #[error("{}", describe(.index, .expected))]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parser::no_match)))]
    NoMatch {
        index: usize,
        expected: Vec<CompactString>,
    },

    /// The start rule did not match and the furthest failure was a terminal
    /// reading past the end of the input.
    #[error("Unexpected end of input: {}", describe(.index, .expected))]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parser::input_exhausted)))]
    InputExhausted {
        index: usize,
        expected: Vec<CompactString>,
    },

    /// The start rule matched a prefix, but input remains and the
    /// consume-all policy is active.
    #[error("Unconsumed input after index {consumed} of {input_len}: {}", describe(.failure_index, .expected))]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(code(parser::incomplete_consumption))
    )]
    IncompleteConsumption {
        consumed: usize,
        input_len: usize,
        failure_index: usize,
        expected: Vec<CompactString>,
    },

    /// The requested start rule is not part of the grammar.
    #[error("Unknown rule: {0}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parser::unknown_rule)))]
    UnknownRule(CompactString),

    /// [`ParseOptions::start_index`](crate::packrat::ParseOptions) lies past
    /// the end of the input.
    #[error("Start index {start_index} is out of bounds for input of length {input_len}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parser::start_out_of_bounds)))]
    StartOutOfBounds { start_index: usize, input_len: usize },

    /// Rule nesting exceeded [`PackratConfig::max_depth`](crate::packrat::PackratConfig).
    #[error("Maximum rule nesting depth ({limit}) exceeded at index {index}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parser::recursion_limit)))]
    RecursionLimit { limit: usize, index: usize },

    #[error(transparent)]
    #[cfg_attr(feature = "diagnostics", diagnostic(transparent))]
    Invariant(#[from] InvariantViolation),
}

impl ParseError {
    /// The furthest terminal failure index, for failures that carry one.
    #[must_use]
    pub const fn failure_index(&self) -> Option<usize> {
        match self {
            Self::NoMatch { index, .. } | Self::InputExhausted { index, .. } => Some(*index),
            Self::IncompleteConsumption { failure_index, .. } => Some(*failure_index),
            Self::UnknownRule(_)
            | Self::StartOutOfBounds { .. }
            | Self::RecursionLimit { .. }
            | Self::Invariant(_) => None,
        }
    }

    /// The deduplicated expected descriptors at the furthest failure index.
    #[must_use]
    pub fn expected(&self) -> &[CompactString] {
        match self {
            Self::NoMatch { expected, .. }
            | Self::InputExhausted { expected, .. }
            | Self::IncompleteConsumption { expected, .. } => expected,
            Self::UnknownRule(_)
            | Self::StartOutOfBounds { .. }
            | Self::RecursionLimit { .. }
            | Self::Invariant(_) => &[],
        }
    }

    /// Returns `true` for ordinary parse failures, as opposed to aborts.
    #[must_use]
    pub const fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            Self::NoMatch { .. } | Self::InputExhausted { .. } | Self::IncompleteConsumption { .. }
        )
    }
}

/// A defect in the recursion bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum InvariantViolation {
    #[error("Call stack underflow")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(invariant::stack_underflow)))]
    StackUnderflow,

    #[error("Popped call stack slot {found}, expected slot {expected}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(invariant::unbalanced_stack)))]
    UnbalancedStack { expected: usize, found: usize },

    #[error("In-progress marker for rule {rule} at {position} has no live head (slot {head})")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(invariant::orphaned_in_progress)))]
    OrphanedInProgress {
        rule: RuleId,
        position: usize,
        head: usize,
    },

    #[error("Growth of rule {rule} at {position} did not settle after {iterations} iterations")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(invariant::non_terminating_growth)))]
    NonTerminatingGrowth {
        rule: RuleId,
        position: usize,
        iterations: usize,
    },

    #[error("Growth of rule {rule} at {position} finished without a cached seed")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(invariant::missing_seed)))]
    MissingSeed { rule: RuleId, position: usize },
}

/// Errors raised while building a grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum GrammarError {
    #[error("Rule '{0}' is declared more than once")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::duplicate_rule)))]
    DuplicateRule(CompactString),

    #[error("Rule '{0}' is declared but has no body")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::missing_body)))]
    MissingBody(CompactString),

    #[error("Rule '{referenced_from}' references undefined rule '{name}'")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::undefined_rule)))]
    UndefinedRule {
        name: CompactString,
        referenced_from: CompactString,
    },

    #[error("Grammar has no rules")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::empty)))]
    EmptyGrammar,
}

/// Render the "expected" part of a failure message.
///
/// A single descriptor reads `Expected "l" at index 2`; several read
/// `Expected one of "a", "b" at index 2`.
#[must_use]
pub fn failure_message(index: usize, expected: &[CompactString]) -> String {
    match expected {
        [] => format!("No match at index {index}"),
        [only] => format!("Expected {only} at index {index}"),
        many => {
            let joined = many
                .iter()
                .map(CompactString::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            format!("Expected one of {joined} at index {index}")
        }
    }
}

fn describe(index: &usize, expected: &[CompactString]) -> String {
    failure_message(*index, expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_message_forms() {
        assert_eq!(failure_message(4, &[]), "No match at index 4");
        assert_eq!(
            failure_message(2, &["\"l\"".into()]),
            "Expected \"l\" at index 2"
        );
        assert_eq!(
            failure_message(0, &["\"a\"".into(), "[0-9]".into()]),
            "Expected one of \"a\", [0-9] at index 0"
        );
    }

    #[test]
    fn test_parse_failure_classification() {
        let err = ParseError::NoMatch {
            index: 3,
            expected: vec!["\"x\"".into()],
        };
        assert!(err.is_parse_failure());
        assert_eq!(err.failure_index(), Some(3));
        assert_eq!(err.expected().len(), 1);

        let err = ParseError::from(InvariantViolation::StackUnderflow);
        assert!(!err.is_parse_failure());
        assert_eq!(err.failure_index(), None);
        assert!(err.expected().is_empty());
    }
}
