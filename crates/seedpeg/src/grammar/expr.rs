//! PEG expression interpreter.
//!
//! [`Expr`] is a reference body evaluator: an interpreted form of the rule
//! bodies a grammar compiler would otherwise generate. It produces [`Node`]
//! trees as the rule payload.
//!
//! Every expression restores the scan position when it fails, so ordered
//! choice can try the next alternative from the same place.

use super::{RuleBody, RuleId, RuleNames};
use crate::error::{GrammarError, ParseError};
use crate::packrat::{Outcome, ParseResult, Session};
use compact_str::{CompactString, format_compact};
use std::fmt::Debug;
use std::sync::Arc;

/// Syntax tree node produced by [`Expr`] bodies.
///
/// Terminal matches are leaves with neither `rule` nor `tag`. Rule results
/// carry the rule id; [`Expr::Tagged`] results carry the tag. Both are
/// interior nodes over the children matched inside them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub rule: Option<RuleId>,
    pub tag: Option<CompactString>,
    pub start: usize,
    pub end: usize,
    pub children: Vec<Arc<Node>>,
}

impl Node {
    fn leaf(start: usize, end: usize) -> Arc<Self> {
        Arc::new(Self {
            rule: None,
            tag: None,
            start,
            end,
            children: Vec::new(),
        })
    }

    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.rule.is_none() && self.tag.is_none()
    }

    #[must_use]
    pub const fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }

    /// The slice of `input` this node covers.
    #[must_use]
    pub fn slice<'a, S>(&self, input: &'a [S]) -> &'a [S] {
        input.get(self.start..self.end).unwrap_or_default()
    }
}

/// A parsing expression.
#[derive(Debug, Clone)]
pub enum Expr<S> {
    /// Exact sequence of symbols.
    Literal {
        symbols: Vec<S>,
        description: CompactString,
    },
    /// One symbol satisfying a predicate.
    Class {
        test: fn(&S) -> bool,
        description: CompactString,
    },
    /// Any one symbol.
    Any,
    /// Reference by name, replaced by [`Expr::Rule`] when the grammar is built.
    Ref(CompactString),
    Rule(RuleId),
    Sequence(Vec<Expr<S>>),
    /// Ordered choice: the first alternative that matches wins.
    Choice(Vec<Expr<S>>),
    Repeat {
        expr: Box<Expr<S>>,
        min: usize,
        max: Option<usize>,
    },
    /// `&e` when `positive`, `!e` otherwise. Never consumes input.
    Lookahead { expr: Box<Expr<S>>, positive: bool },
    /// Wrap whatever `expr` matches in a node labelled `tag`.
    Tagged { tag: CompactString, expr: Box<Expr<S>> },
}

impl<S> Expr<S> {
    pub fn literal(symbols: impl IntoIterator<Item = S>, description: &str) -> Self {
        Self::Literal {
            symbols: symbols.into_iter().collect(),
            description: CompactString::from(description),
        }
    }

    pub fn class(test: fn(&S) -> bool, description: &str) -> Self {
        Self::Class {
            test,
            description: CompactString::from(description),
        }
    }

    #[must_use]
    pub const fn any() -> Self {
        Self::Any
    }

    #[must_use]
    pub fn rule(name: &str) -> Self {
        Self::Ref(CompactString::from(name))
    }

    pub fn seq(items: impl IntoIterator<Item = Self>) -> Self {
        Self::Sequence(items.into_iter().collect())
    }

    pub fn choice(alternatives: impl IntoIterator<Item = Self>) -> Self {
        Self::Choice(alternatives.into_iter().collect())
    }

    #[must_use]
    pub fn zero_or_more(expr: Self) -> Self {
        Self::repeat(expr, 0, None)
    }

    #[must_use]
    pub fn one_or_more(expr: Self) -> Self {
        Self::repeat(expr, 1, None)
    }

    #[must_use]
    pub fn optional(expr: Self) -> Self {
        Self::repeat(expr, 0, Some(1))
    }

    #[must_use]
    pub fn repeat(expr: Self, min: usize, max: Option<usize>) -> Self {
        Self::Repeat {
            expr: Box::new(expr),
            min,
            max,
        }
    }

    #[must_use]
    pub fn and(expr: Self) -> Self {
        Self::Lookahead {
            expr: Box::new(expr),
            positive: true,
        }
    }

    #[must_use]
    pub fn not(expr: Self) -> Self {
        Self::Lookahead {
            expr: Box::new(expr),
            positive: false,
        }
    }

    #[must_use]
    pub fn tagged(tag: &str, expr: Self) -> Self {
        Self::Tagged {
            tag: CompactString::from(tag),
            expr: Box::new(expr),
        }
    }

    fn resolve_refs(&mut self, names: &RuleNames, owner: &str) -> Result<(), GrammarError> {
        match self {
            Self::Ref(name) => {
                let id = names.get(name).ok_or_else(|| GrammarError::UndefinedRule {
                    name: name.clone(),
                    referenced_from: CompactString::from(owner),
                })?;
                *self = Self::Rule(id);
                Ok(())
            }
            Self::Sequence(items) | Self::Choice(items) => items
                .iter_mut()
                .try_for_each(|item| item.resolve_refs(names, owner)),
            Self::Repeat { expr, .. } | Self::Lookahead { expr, .. } | Self::Tagged { expr, .. } => {
                expr.resolve_refs(names, owner)
            }
            Self::Literal { .. } | Self::Class { .. } | Self::Any | Self::Rule(_) => Ok(()),
        }
    }
}

impl Expr<char> {
    /// Literal text, described as `"text"` in failure reports.
    #[must_use]
    pub fn text(text: &str) -> Self {
        Self::Literal {
            symbols: text.chars().collect(),
            description: format_compact!("\"{text}\""),
        }
    }
}

impl<S> Expr<S>
where
    S: PartialEq + Debug,
{
    /// Match this expression at the session's position, appending produced
    /// nodes to `out`. On failure the position and `out` are left unchanged.
    fn eval(
        &self,
        session: &mut Session<'_, S, Arc<Node>>,
        out: &mut Vec<Arc<Node>>,
    ) -> Result<bool, ParseError> {
        let start = session.position();
        let mark = out.len();

        let matched = match self {
            Self::Literal {
                symbols,
                description,
            } => session.match_literal(symbols, description),
            Self::Class { test, description } => session.match_class(*test, description),
            Self::Any => session.match_any(),
            Self::Ref(name) => return Err(ParseError::UnknownRule(name.clone())),
            Self::Rule(rule) => match session.apply(*rule)? {
                Outcome::Success(result) => {
                    out.push(result.value);
                    true
                }
                Outcome::Failure => false,
            },
            Self::Sequence(items) => {
                let mut all = true;
                for item in items {
                    if !item.eval(session, out)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            Self::Choice(alternatives) => {
                let mut any = false;
                for alternative in alternatives {
                    if alternative.eval(session, out)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            Self::Repeat { expr, min, max } => {
                let limit = *max;
                let mut count = 0;
                while limit.is_none_or(|limit| count < limit) {
                    let before = session.position();
                    if !expr.eval(session, out)? {
                        break;
                    }
                    count += 1;
                    // An empty match would repeat forever.
                    if session.position() == before {
                        break;
                    }
                }
                count >= *min
            }
            Self::Lookahead { expr, positive } => {
                let mut scratch = Vec::new();
                let found = expr.eval(session, &mut scratch)?;
                session.reset_to(start);
                found == *positive
            }
            Self::Tagged { tag, expr } => {
                let mut children = Vec::new();
                if expr.eval(session, &mut children)? {
                    out.push(Arc::new(Node {
                        rule: None,
                        tag: Some(tag.clone()),
                        start,
                        end: session.position(),
                        children,
                    }));
                    true
                } else {
                    false
                }
            }
        };

        if matched {
            if matches!(self, Self::Literal { .. } | Self::Class { .. } | Self::Any) {
                out.push(Node::leaf(start, session.position()));
            }
        } else {
            session.reset_to(start);
            out.truncate(mark);
        }
        Ok(matched)
    }
}

impl<S> RuleBody<S, Arc<Node>> for Expr<S>
where
    S: PartialEq + Debug + Send + Sync,
{
    fn evaluate(
        &self,
        session: &mut Session<'_, S, Arc<Node>>,
    ) -> Result<Outcome<Arc<Node>>, ParseError> {
        let start = session.position();
        let mut children = Vec::new();
        if !self.eval(session, &mut children)? {
            return Ok(Outcome::Failure);
        }
        let end = session.position();
        let node = Node {
            rule: session.current_rule(),
            tag: None,
            start,
            end,
            children,
        };
        Ok(Outcome::Success(ParseResult::new(start, end, Arc::new(node))))
    }

    fn resolve(&mut self, names: &RuleNames, owner: &str) -> Result<(), GrammarError> {
        self.resolve_refs(names, owner)
    }
}
