/// A successful match: the half-open interval `[start, end)` over the input
/// and the rule's payload.
///
/// The packrat core reads only `start` and `end`; `value` belongs to whoever
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult<V> {
    pub start: usize,
    pub end: usize,
    pub value: V,
}

impl<V> ParseResult<V> {
    #[must_use]
    pub const fn new(start: usize, end: usize, value: V) -> Self {
        Self { start, end, value }
    }

    #[must_use]
    pub const fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// Result of evaluating a rule at a position.
///
/// `Failure` is a definite negative result and is cached like a success; it
/// is distinct from "not yet computed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<V> {
    Success(ParseResult<V>),
    Failure,
}

impl<V> Outcome<V> {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// End of the match, if any.
    #[must_use]
    pub const fn end(&self) -> Option<usize> {
        match self {
            Self::Success(result) => Some(result.end),
            Self::Failure => None,
        }
    }

    #[must_use]
    pub const fn as_success(&self) -> Option<&ParseResult<V>> {
        match self {
            Self::Success(result) => Some(result),
            Self::Failure => None,
        }
    }
}
