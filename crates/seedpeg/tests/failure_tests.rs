//! Failure reporting, parse options and abort conditions.

use compact_str::CompactString;
use seedpeg::grammar::{Expr, GrammarBuilder, Node};
use seedpeg::packrat::{Outcome, PackratConfig, PackratParser, ParseOptions, ParseResult};
use seedpeg::{InvariantViolation, ParseError, RuleId};
use std::sync::Arc;

fn chars(input: &str) -> Vec<char> {
    input.chars().collect()
}

fn expected(items: &[&str]) -> Vec<CompactString> {
    items.iter().map(|item| CompactString::from(*item)).collect()
}

fn lr_parser() -> (PackratParser<char, Arc<Node>>, RuleId) {
    let mut builder = GrammarBuilder::new();
    let lr = builder.rule(
        "lr",
        Expr::choice([
            Expr::seq([Expr::rule("lr"), Expr::text("l")]),
            Expr::text("l"),
        ]),
    );
    let grammar = Arc::new(builder.build().unwrap());
    (PackratParser::new(grammar, PackratConfig::default()), lr)
}

#[test]
fn test_trailing_input_reports_furthest_failure() {
    let (mut parser, lr) = lr_parser();
    let err = parser
        .parse(&chars("llr"), lr, &ParseOptions::default())
        .unwrap_err();
    assert_eq!(
        err,
        ParseError::IncompleteConsumption {
            consumed: 2,
            input_len: 3,
            failure_index: 2,
            expected: expected(&["\"l\""]),
        }
    );
    assert_eq!(parser.failure_index(), 2);
    assert_eq!(parser.terminal_failures(), &["\"l\""]);
    assert_eq!(
        err.to_string(),
        "Unconsumed input after index 2 of 3: Expected \"l\" at index 2"
    );
}

#[test]
fn test_empty_input_is_exhausted() {
    let (mut parser, lr) = lr_parser();
    let err = parser.parse(&[], lr, &ParseOptions::default()).unwrap_err();
    assert_eq!(
        err,
        ParseError::InputExhausted {
            index: 0,
            expected: expected(&["\"l\""]),
        }
    );
    assert!(err.is_parse_failure());
}

#[test]
fn test_no_match_at_start() {
    let (mut parser, lr) = lr_parser();
    let err = parser
        .parse(&chars("r"), lr, &ParseOptions::default())
        .unwrap_err();
    assert_eq!(
        err,
        ParseError::NoMatch {
            index: 0,
            expected: expected(&["\"l\""]),
        }
    );
    assert_eq!(
        parser.failure_reason().as_deref(),
        Some("Expected \"l\" at index 0")
    );
}

#[test]
fn test_expected_set_collects_alternatives_at_furthest_index() {
    // s: "a" "b" / "a" "c" / "x"
    let mut builder = GrammarBuilder::new();
    let s = builder.rule(
        "s",
        Expr::choice([
            Expr::seq([Expr::text("a"), Expr::text("b")]),
            Expr::seq([Expr::text("a"), Expr::text("c")]),
            Expr::text("x"),
        ]),
    );
    let mut parser = PackratParser::new(Arc::new(builder.build().unwrap()), PackratConfig::default());

    let err = parser
        .parse(&chars("ad"), s, &ParseOptions::default())
        .unwrap_err();
    // The failure of "x" at index 0 is left of the furthest failure.
    assert_eq!(
        err,
        ParseError::NoMatch {
            index: 1,
            expected: expected(&["\"b\"", "\"c\""]),
        }
    );
    assert_eq!(
        parser.failure_reason().as_deref(),
        Some("Expected one of \"b\", \"c\" at index 1")
    );
}

#[test]
fn test_any_and_class_descriptors() {
    // s: [0-9] .
    let mut builder = GrammarBuilder::new();
    let s = builder.rule(
        "s",
        Expr::seq([Expr::class(char::is_ascii_digit, "[0-9]"), Expr::any()]),
    );
    let mut parser = PackratParser::new(Arc::new(builder.build().unwrap()), PackratConfig::default());
    let options = ParseOptions::default();

    assert!(parser.parse(&chars("7x"), s, &options).is_ok());

    let err = parser.parse(&chars("7"), s, &options).unwrap_err();
    assert_eq!(
        err,
        ParseError::InputExhausted {
            index: 1,
            expected: expected(&["any character"]),
        }
    );

    let err = parser.parse(&chars("x7"), s, &options).unwrap_err();
    assert_eq!(err.expected(), &["[0-9]"]);
}

#[test]
fn test_prefix_match_without_consume_all() {
    let (mut parser, lr) = lr_parser();
    let result = parser
        .parse(&chars("llr"), lr, &ParseOptions::prefix())
        .unwrap();
    assert_eq!(result.range(), 0..2);
}

#[test]
fn test_start_index() {
    let (mut parser, lr) = lr_parser();
    let input = chars("xll");

    let result = parser
        .parse(&input, lr, &ParseOptions::default().starting_at(1))
        .unwrap();
    assert_eq!(result.range(), 1..3);

    let err = parser
        .parse(&input, lr, &ParseOptions::default())
        .unwrap_err();
    assert_eq!(err.failure_index(), Some(0));
}

#[test]
fn test_start_index_past_end_is_rejected() {
    // s: "ab"
    let mut builder = GrammarBuilder::new();
    let s = builder.rule("s", Expr::text("ab"));
    let mut parser = PackratParser::new(Arc::new(builder.build().unwrap()), PackratConfig::default());
    let input = chars("ab");

    for start_index in [3, 5, usize::MAX] {
        let err = parser
            .parse(&input, s, &ParseOptions::default().starting_at(start_index))
            .unwrap_err();
        assert_eq!(
            err,
            ParseError::StartOutOfBounds {
                start_index,
                input_len: 2,
            }
        );
        assert!(!err.is_parse_failure());
        assert_eq!(err.failure_index(), None);
        assert_eq!(parser.failure_reason(), None);
    }

    // Starting exactly at the end is a normal failure.
    let err = parser
        .parse(&input, s, &ParseOptions::default().starting_at(2))
        .unwrap_err();
    assert_eq!(
        err,
        ParseError::InputExhausted {
            index: 2,
            expected: expected(&["\"ab\""]),
        }
    );
}

#[test]
fn test_unknown_start_rule() {
    let (mut parser, _) = lr_parser();
    let options = ParseOptions::default();
    assert_eq!(
        parser.parse_named(&chars("l"), "nope", &options).unwrap_err(),
        ParseError::UnknownRule("nope".into())
    );
    assert_eq!(
        parser.parse(&chars("l"), RuleId::new(9), &options).unwrap_err(),
        ParseError::UnknownRule("#9".into())
    );
}

fn right_recursive_parser(max_depth: usize) -> (PackratParser<char, Arc<Node>>, RuleId) {
    // r: "a" r / "a"
    let mut builder = GrammarBuilder::new();
    let r = builder.rule(
        "r",
        Expr::choice([
            Expr::seq([Expr::text("a"), Expr::rule("r")]),
            Expr::text("a"),
        ]),
    );
    let config = PackratConfig {
        max_depth,
        ..PackratConfig::default()
    };
    (PackratParser::new(Arc::new(builder.build().unwrap()), config), r)
}

#[test]
fn test_depth_limit_aborts_and_cleans_up() {
    let (mut parser, r) = right_recursive_parser(10);
    let options = ParseOptions::default();

    let err = parser.parse(&vec!['a'; 50], r, &options).unwrap_err();
    assert_eq!(err, ParseError::RecursionLimit { limit: 10, index: 10 });
    assert!(!err.is_parse_failure());
    assert_eq!(parser.state().stack().depth(), 0);
    assert!(parser.state().cache().is_empty());

    // The parser stays usable after an abort.
    assert_eq!(parser.parse(&chars("aaa"), r, &options).unwrap().end, 3);
}

#[test]
fn test_runaway_growth_is_reported() {
    // A body that claims one more symbol each time it sees its own result.
    let mut builder: GrammarBuilder<char, ()> = GrammarBuilder::new();
    let s = builder.declare("s");
    builder.define_fn(s, move |session| {
        let start = session.position();
        let inner = session.apply(s)?;
        let end = inner.end().unwrap_or(start) + 1;
        Ok(Outcome::Success(ParseResult::new(start, end, ())))
    });
    let mut parser = PackratParser::new(Arc::new(builder.build().unwrap()), PackratConfig::default());

    let err = parser
        .parse(&chars("abc"), s, &ParseOptions::default())
        .unwrap_err();
    assert_eq!(
        err,
        ParseError::Invariant(InvariantViolation::NonTerminatingGrowth {
            rule: s,
            position: 0,
            iterations: 5,
        })
    );
    assert_eq!(parser.state().stack().depth(), 0);
}

#[test]
fn test_body_errors_propagate_through_nested_rules() {
    // outer: inner; inner aborts outright.
    let mut builder: GrammarBuilder<char, ()> = GrammarBuilder::new();
    let outer = builder.declare("outer");
    let inner = builder.declare("inner");
    builder.define_fn(outer, move |session| session.apply(inner));
    builder.define_fn(inner, |_| Err(ParseError::UnknownRule("missing".into())));
    let mut parser = PackratParser::new(Arc::new(builder.build().unwrap()), PackratConfig::default());

    let err = parser
        .parse(&chars("x"), outer, &ParseOptions::default())
        .unwrap_err();
    assert_eq!(err, ParseError::UnknownRule("missing".into()));
    assert_eq!(parser.state().stack().depth(), 0);
    assert!(parser.state().cache().is_empty());
}

#[cfg(feature = "diagnostics")]
#[test]
fn test_diagnostic_codes() {
    use miette::Diagnostic;

    let err = ParseError::NoMatch {
        index: 0,
        expected: Vec::new(),
    };
    assert_eq!(
        err.code().map(|code| code.to_string()).as_deref(),
        Some("parser::no_match")
    );
}
