//! # Seedpeg
//!
//! A packrat PEG evaluation core with left recursion.
//!
//! ## Overview
//!
//! Seedpeg evaluates parsing expression grammars with memoization, and lets
//! rules be left recursive, directly or through other rules, using seed
//! growing:
//!
//! - **Memoization**: each (rule, position) result is computed once per parse
//! - **Left recursion**: direct, indirect and mutual, left-associative by
//!   construction
//! - **Ordered choice priority**: growth only replaces a match with a strictly
//!   longer one
//! - **Furthest-failure diagnostics**: the rightmost failing terminals are
//!   collected for error messages
//!
//! A grammar is a table of rule bodies. The core never looks inside a body;
//! bodies call back into it through [`Session::apply`](packrat::Session::apply).
//! [`grammar::Expr`] is an interpreted body type for building grammars
//! directly in Rust; closures work too.
//!
//! ## Quick Start
//!
//! ```rust
//! use seedpeg::grammar::{Expr, GrammarBuilder};
//! use seedpeg::packrat::{PackratConfig, PackratParser, ParseOptions};
//! use std::sync::Arc;
//!
//! // expr: expr "-" num / num
//! // num:  [0-9]
//! let mut builder: GrammarBuilder<char, _> = GrammarBuilder::new();
//! let expr = builder.rule(
//!     "expr",
//!     Expr::choice([
//!         Expr::seq([Expr::rule("expr"), Expr::text("-"), Expr::rule("num")]),
//!         Expr::rule("num"),
//!     ]),
//! );
//! builder.rule("num", Expr::class(char::is_ascii_digit, "[0-9]"));
//! let grammar = Arc::new(builder.build().unwrap());
//!
//! let mut parser = PackratParser::new(grammar, PackratConfig::default());
//! let input: Vec<char> = "3-1-2".chars().collect();
//! let tree = parser.parse(&input, expr, &ParseOptions::default()).unwrap().value;
//!
//! // Left-associative: the outer node's first child covers "3-1".
//! assert_eq!(tree.children[0].range(), 0..3);
//! ```
//!
//! ## Feature Flags
//!
//! - `diagnostics`: derive [`miette::Diagnostic`] for the error types.
//! - `serialize`: serde support for configuration and rule ids.

pub mod error;
pub mod grammar;
pub mod packrat;

pub use error::{GrammarError, InvariantViolation, ParseError};
pub use grammar::{Grammar, GrammarBuilder, RuleId};
pub use packrat::{Outcome, PackratConfig, PackratParser, ParseOptions, ParseResult};
