//! Left-recursive arithmetic example
//!
//! This example demonstrates how to:
//! 1. Write a left-recursive grammar with the expression interpreter
//! 2. Evaluate the resulting tree, which is left-associative
//! 3. Report the furthest failure for invalid input
//!
//! Run with: `cargo run --example left_recursion -- "8-3-2*2"`

use seedpeg::grammar::{Expr, GrammarBuilder, Node};
use seedpeg::packrat::{PackratConfig, PackratParser, ParseOptions};
use std::sync::Arc;

fn evaluate(node: &Node, input: &[char]) -> i64 {
    match node.tag.as_deref() {
        Some("add") => evaluate(&node.children[0], input) + evaluate(&node.children[2], input),
        Some("sub") => evaluate(&node.children[0], input) - evaluate(&node.children[2], input),
        Some("mul") => evaluate(&node.children[0], input) * evaluate(&node.children[2], input),
        Some("num") => node
            .slice(input)
            .iter()
            .collect::<String>()
            .parse()
            .unwrap_or_default(),
        Some("group") => evaluate(&node.children[1], input),
        _ => node
            .children
            .first()
            .map_or(0, |child| evaluate(child, input)),
    }
}

fn main() {
    let text = std::env::args().nth(1).unwrap_or_else(|| "8-3-2*2".to_string());

    println!("=== Left Recursion Example ===\n");
    println!("1. Building grammar...");
    let mut builder = GrammarBuilder::new();
    let expr = builder.rule(
        "expr",
        Expr::choice([
            Expr::tagged(
                "add",
                Expr::seq([Expr::rule("expr"), Expr::text("+"), Expr::rule("term")]),
            ),
            Expr::tagged(
                "sub",
                Expr::seq([Expr::rule("expr"), Expr::text("-"), Expr::rule("term")]),
            ),
            Expr::rule("term"),
        ]),
    );
    builder.rule(
        "term",
        Expr::choice([
            Expr::tagged(
                "mul",
                Expr::seq([Expr::rule("term"), Expr::text("*"), Expr::rule("atom")]),
            ),
            Expr::rule("atom"),
        ]),
    );
    builder.rule(
        "atom",
        Expr::choice([
            Expr::tagged(
                "num",
                Expr::one_or_more(Expr::class(char::is_ascii_digit, "[0-9]")),
            ),
            Expr::tagged(
                "group",
                Expr::seq([Expr::text("("), Expr::rule("expr"), Expr::text(")")]),
            ),
        ]),
    );
    let grammar = match builder.build() {
        Ok(grammar) => Arc::new(grammar),
        Err(err) => {
            eprintln!("   Grammar error: {err}");
            std::process::exit(1);
        }
    };
    println!("   ✓ {} rules\n", grammar.len());

    println!("2. Parsing \"{text}\"...");
    let input: Vec<char> = text.chars().collect();
    let mut parser = PackratParser::new(grammar, PackratConfig::default());
    match parser.parse(&input, expr, &ParseOptions::default()) {
        Ok(result) => {
            println!("   ✓ Value: {}", evaluate(&result.value, &input));
        }
        Err(err) => {
            println!("   ✗ {err}");
        }
    }

    let metrics = parser.metrics();
    println!("\n3. Metrics:");
    println!("   Body evaluations: {}", metrics.evaluations);
    println!("   Cache hits: {}", metrics.cache_hits);
    println!("   Recursions detected: {}", metrics.recursions_detected);
    println!("   Growth iterations: {}", metrics.growth_iterations);
    println!("   Parse time: {:?}", metrics.parse_time);
}
