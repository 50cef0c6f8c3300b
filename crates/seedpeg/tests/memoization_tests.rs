//! Memoization bound, metrics and state reuse.

use seedpeg::grammar::{Expr, GrammarBuilder, Node};
use seedpeg::packrat::{Outcome, PackratConfig, PackratParser, ParseOptions, ParseResult, Session};
use seedpeg::{ParseError, RuleId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type Calls = Arc<Mutex<HashMap<(&'static str, usize), usize>>>;

fn record(calls: &Calls, rule: &'static str, position: usize) {
    let mut calls = calls.lock().unwrap();
    *calls.entry((rule, position)).or_default() += 1;
}

fn literal(session: &mut Session<'_, char, ()>, text: &str) -> bool {
    let symbols: Vec<char> = text.chars().collect();
    session.match_literal(&symbols, text)
}

fn matched(start: usize, session: &Session<'_, char, ()>) -> Outcome<()> {
    Outcome::Success(ParseResult::new(start, session.position(), ()))
}

/// list: item "," list / item
/// item: "x" / "y"
///
/// Both alternatives of `list` start with `item`, so every `item` position is
/// requested twice.
fn counting_list_grammar(calls: &Calls) -> (PackratParser<char, ()>, RuleId) {
    let mut builder: GrammarBuilder<char, ()> = GrammarBuilder::new();
    let list = builder.declare("list");
    let item = builder.declare("item");

    let list_calls = Arc::clone(calls);
    builder.define_fn(list, move |session| {
        let start = session.position();
        record(&list_calls, "list", start);
        if session.apply(item)?.is_success()
            && literal(session, ",")
            && session.apply(list)?.is_success()
        {
            return Ok(matched(start, session));
        }
        session.reset_to(start);
        if session.apply(item)?.is_success() {
            return Ok(matched(start, session));
        }
        session.reset_to(start);
        Ok(Outcome::Failure)
    });

    let item_calls = Arc::clone(calls);
    builder.define_fn(item, move |session| {
        let start = session.position();
        record(&item_calls, "item", start);
        if literal(session, "x") || literal(session, "y") {
            Ok(matched(start, session))
        } else {
            Ok(Outcome::Failure)
        }
    });

    let grammar = Arc::new(builder.build().unwrap());
    (PackratParser::new(grammar, PackratConfig::default()), list)
}

#[test]
fn test_each_rule_body_runs_once_per_position() {
    let calls = Calls::default();
    let (mut parser, list) = counting_list_grammar(&calls);
    let input: Vec<char> = "x,y,x".chars().collect();

    let result = parser.parse(&input, list, &ParseOptions::default()).unwrap();
    assert_eq!(result.range(), 0..5);

    let calls = calls.lock().unwrap();
    assert_eq!(calls.get(&("item", 0)), Some(&1));
    assert_eq!(calls.get(&("item", 2)), Some(&1));
    assert_eq!(calls.get(&("item", 4)), Some(&1));
    assert!(calls.values().all(|&count| count == 1), "{calls:?}");
    assert!(parser.metrics().cache_hits >= 1);
    assert_eq!(parser.metrics().recursions_detected, 0);
}

#[test]
fn test_memoization_survives_failed_alternatives() {
    let calls = Calls::default();
    let (mut parser, list) = counting_list_grammar(&calls);
    let input: Vec<char> = "x,y,".chars().collect();

    let err = parser.parse(&input, list, &ParseOptions::default()).unwrap_err();
    assert!(matches!(err, ParseError::IncompleteConsumption { consumed: 3, .. }));
    assert!(calls.lock().unwrap().values().all(|&count| count == 1));
}

fn expr_parser(rules: impl FnOnce(&mut GrammarBuilder<char, Arc<Node>>)) -> PackratParser<char, Arc<Node>> {
    let mut builder = GrammarBuilder::new();
    rules(&mut builder);
    PackratParser::new(Arc::new(builder.build().unwrap()), PackratConfig::default())
}

#[test]
fn test_metrics_without_recursion() {
    // s: a "y" / a "z"
    // a: "x"
    let mut parser = expr_parser(|b| {
        b.rule(
            "s",
            Expr::choice([
                Expr::seq([Expr::rule("a"), Expr::text("y")]),
                Expr::seq([Expr::rule("a"), Expr::text("z")]),
            ]),
        );
        b.rule("a", Expr::text("x"));
    });
    let input: Vec<char> = "xz".chars().collect();
    parser.parse_named(&input, "s", &ParseOptions::default()).unwrap();

    let metrics = parser.metrics();
    assert_eq!(metrics.evaluations, 2);
    assert_eq!(metrics.cache_hits, 1);
    assert_eq!(metrics.growth_iterations, 0);
    assert_eq!(metrics.max_depth, 2);
    assert_eq!(parser.state().cache().len(), 2);
    assert_eq!(parser.state().stack().depth(), 0);
}

#[test]
fn test_metrics_with_direct_recursion() {
    let mut parser = expr_parser(|b| {
        b.rule(
            "lr",
            Expr::choice([
                Expr::seq([Expr::rule("lr"), Expr::text("l")]),
                Expr::text("l"),
            ]),
        );
    });
    let input: Vec<char> = "lll".chars().collect();
    parser.parse_named(&input, "lr", &ParseOptions::default()).unwrap();

    let metrics = parser.metrics();
    // Seed, two growth steps, and the final non-progressing attempt.
    assert_eq!(metrics.evaluations, 4);
    assert_eq!(metrics.growth_iterations, 3);
    assert_eq!(metrics.recursions_detected, 1);
    assert_eq!(metrics.cache_hits, 3);
}

#[test]
fn test_parser_state_is_reset_between_parses() {
    let mut parser = expr_parser(|b| {
        b.rule(
            "lr",
            Expr::choice([
                Expr::seq([Expr::rule("lr"), Expr::text("l")]),
                Expr::text("l"),
            ]),
        );
    });
    let options = ParseOptions::default();
    let long: Vec<char> = "llll".chars().collect();
    let short: Vec<char> = "ll".chars().collect();

    assert_eq!(parser.parse_named(&long, "lr", &options).unwrap().end, 4);
    // Nothing cached for the longer input may leak into this parse.
    assert_eq!(parser.parse_named(&short, "lr", &options).unwrap().end, 2);
    assert_eq!(parser.state().cache().len(), 1);
}

#[test]
fn test_repeated_parses_are_deterministic() {
    let mut parser = expr_parser(|b| {
        b.rule("x", Expr::rule("expr"));
        b.rule(
            "expr",
            Expr::choice([
                Expr::seq([Expr::rule("x"), Expr::text("-"), Expr::rule("num")]),
                Expr::rule("num"),
            ]),
        );
        b.rule("num", Expr::class(char::is_ascii_digit, "[0-9]"));
    });
    let options = ParseOptions::default();
    let input: Vec<char> = "9-4-1-1".chars().collect();

    let first = parser.parse_named(&input, "x", &options);
    let second = parser.parse_named(&input, "x", &options);
    assert!(first.is_ok());
    assert_eq!(first, second);

    let grammar = Arc::clone(parser.grammar());
    let mut fresh = PackratParser::new(grammar, PackratConfig::default());
    assert_eq!(fresh.parse_named(&input, "x", &options), first);
}

#[test]
fn test_grammar_is_shared_across_threads() {
    let mut builder: GrammarBuilder<char, Arc<Node>> = GrammarBuilder::new();
    let lr = builder.rule(
        "lr",
        Expr::choice([
            Expr::seq([Expr::rule("lr"), Expr::text("l")]),
            Expr::text("l"),
        ]),
    );
    let grammar = Arc::new(builder.build().unwrap());

    let handles: Vec<_> = (1..=4)
        .map(|n| {
            let grammar = Arc::clone(&grammar);
            std::thread::spawn(move || {
                let mut parser = PackratParser::new(grammar, PackratConfig::default());
                let input = vec!['l'; n * 10];
                parser
                    .parse(&input, lr, &ParseOptions::default())
                    .map(|result| result.end)
            })
        })
        .collect();

    for (n, handle) in (1..=4).zip(handles) {
        assert_eq!(handle.join().unwrap(), Ok(n * 10));
    }
}
