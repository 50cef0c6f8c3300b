//! # Grammar
//!
//! The rule table the packrat core dispatches through.
//!
//! ## Overview
//!
//! A grammar is a dense table from [`RuleId`] to a [`RuleBody`]. Rule names
//! are resolved to ids once, when the grammar is built, so invoking a rule
//! during a parse is a single indirect call and never a name lookup.
//!
//! The core treats a rule body as opaque: "evaluate the body of rule R at the
//! current position". Bodies call back into the core only through
//! [`Session::apply`](crate::packrat::Session::apply), which is where caching
//! and left-recursion handling happen.
//!
//! Two ways to define bodies are provided:
//!
//! - [`Expr`]: a small PEG expression interpreter producing [`Node`] trees.
//! - Closures, via [`GrammarBuilder::rule_fn`], for hand-written bodies with
//!   any payload type.
//!
//! ## Example
//!
//! ```rust
//! use seedpeg::grammar::{Expr, GrammarBuilder};
//! use seedpeg::packrat::{PackratParser, PackratConfig, ParseOptions};
//! use std::sync::Arc;
//!
//! // lr: lr "l" / "l"
//! let mut builder: GrammarBuilder<char, _> = GrammarBuilder::new();
//! let lr = builder.rule(
//!     "lr",
//!     Expr::choice([
//!         Expr::seq([Expr::rule("lr"), Expr::text("l")]),
//!         Expr::text("l"),
//!     ]),
//! );
//! let grammar = Arc::new(builder.build().unwrap());
//!
//! let mut parser = PackratParser::new(grammar, PackratConfig::default());
//! let input: Vec<char> = "lll".chars().collect();
//! let result = parser.parse(&input, lr, &ParseOptions::default()).unwrap();
//! assert_eq!(result.end, 3);
//! ```

mod builder;
pub mod expr;

pub use builder::{FnBody, GrammarBuilder};
pub use expr::{Expr, Node};

use crate::error::{GrammarError, ParseError};
use crate::packrat::{Outcome, Session};
use compact_str::CompactString;
use hashbrown::HashMap;
use std::fmt;

/// Identity of a rule within one [`Grammar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleId(u32);

impl RuleId {
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Position of the rule in the grammar's rule table.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The evaluation procedure of one rule.
///
/// `evaluate` runs with the session positioned at the rule's start and must
/// leave the position at the end of the match on success. Sub-rules are
/// invoked only through [`Session::apply`]. Ordinary non-matching is
/// `Ok(Outcome::Failure)`; `Err` is reserved for conditions that abort the
/// whole parse.
pub trait RuleBody<S, V>: Send + Sync {
    fn evaluate(&self, session: &mut Session<'_, S, V>) -> Result<Outcome<V>, ParseError>;

    /// Resolve rule names referenced by this body. Called once by
    /// [`GrammarBuilder::build`]; `owner` is the name of the rule being resolved.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::UndefinedRule`] for a reference with no rule.
    fn resolve(&mut self, names: &RuleNames, owner: &str) -> Result<(), GrammarError> {
        let _ = (names, owner);
        Ok(())
    }
}

/// Name to id mapping shared by the builder and the finished grammar.
#[derive(Debug, Clone, Default)]
pub struct RuleNames {
    ids: HashMap<CompactString, RuleId, ahash::RandomState>,
}

impl RuleNames {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<RuleId> {
        self.ids.get(name).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn insert(&mut self, name: CompactString, id: RuleId) -> bool {
        if self.ids.contains_key(&name) {
            return false;
        }
        self.ids.insert(name, id);
        true
    }
}

struct RuleDef<S, V> {
    name: CompactString,
    body: Box<dyn RuleBody<S, V>>,
}

/// A built grammar: an immutable rule table.
///
/// A grammar holds no per-parse state, so one `Arc<Grammar>` can back any
/// number of sequential or separately-owned parsers.
pub struct Grammar<S, V> {
    rules: Vec<RuleDef<S, V>>,
    names: RuleNames,
}

impl<S, V> Grammar<S, V> {
    /// Look up a rule by name.
    #[must_use]
    pub fn rule_id(&self, name: &str) -> Option<RuleId> {
        self.names.get(name)
    }

    /// The name a rule was declared with.
    #[must_use]
    pub fn name(&self, rule: RuleId) -> Option<&str> {
        self.rules.get(rule.index()).map(|def| def.name.as_str())
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All rule ids in declaration order.
    pub fn rule_ids(&self) -> impl Iterator<Item = RuleId> + '_ {
        (0..self.rules.len()).map(|index| RuleId::new(index as u32))
    }

    pub(crate) fn body(&self, rule: RuleId) -> Option<&dyn RuleBody<S, V>> {
        self.rules.get(rule.index()).map(|def| def.body.as_ref())
    }

    /// Display helper for logging.
    pub(crate) fn label(&self, rule: RuleId) -> &str {
        self.name(rule).unwrap_or("<unknown>")
    }
}

impl<S, V> fmt::Debug for Grammar<S, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field(
                "rules",
                &self.rules.iter().map(|def| def.name.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
