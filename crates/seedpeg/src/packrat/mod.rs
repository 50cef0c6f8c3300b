//! # Packrat core
//!
//! Memoized rule evaluation with support for direct, indirect and mutual
//! left recursion.
//!
//! ## Overview
//!
//! Every rule application goes through [`Session::apply`], which consults the
//! [`MemoCache`] keyed on (rule, position). Without left recursion each rule
//! body runs at most once per position, which keeps parsing linear in the
//! input length.
//!
//! Left recursion is handled by seed growing: when an application re-enters
//! a (rule, position) that is still being evaluated, the re-entry fails. The
//! outer activation's first successful match becomes the seed. Its body is
//! then evaluated again with the seed cached, and every strictly longer match
//! replaces the seed until no further progress is made.
//!
//! The bookkeeping for a live activation is a [`RecursionHead`] held in a
//! pooled [`CallStack`] slot. A head records which other rules passed
//! through the cycle, so their cached results can be set aside between
//! growth iterations and restored afterwards.
//!
//! ## Example
//!
//! ```rust
//! use seedpeg::grammar::{Expr, GrammarBuilder};
//! use seedpeg::packrat::{PackratConfig, PackratParser, ParseOptions};
//! use seedpeg::ParseError;
//! use std::sync::Arc;
//!
//! let mut builder: GrammarBuilder<char, _> = GrammarBuilder::new();
//! let lr = builder.rule(
//!     "lr",
//!     Expr::choice([
//!         Expr::seq([Expr::rule("lr"), Expr::text("l")]),
//!         Expr::text("l"),
//!     ]),
//! );
//! let mut parser = PackratParser::new(Arc::new(builder.build().unwrap()), PackratConfig::default());
//!
//! let input: Vec<char> = "llr".chars().collect();
//! let err = parser.parse(&input, lr, &ParseOptions::default()).unwrap_err();
//! assert!(matches!(err, ParseError::IncompleteConsumption { consumed: 2, .. }));
//! assert_eq!(parser.failure_reason().as_deref(), Some("Expected \"l\" at index 2"));
//! ```

mod cache;
mod config;
mod head;
mod outcome;
mod parser;
mod session;
mod stack;
mod state;

pub use cache::{CacheEntry, MemoCache};
pub use config::{PackratConfig, ParseOptions};
pub use head::{GrowthStep, HeadId, HeadState, RecursionHead};
pub use outcome::{Outcome, ParseResult};
pub use parser::PackratParser;
pub use session::{ANY_SYMBOL, Session};
pub use stack::CallStack;
pub use state::{ParseMetrics, ParserState};
