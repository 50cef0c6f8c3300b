#![no_main]
use libfuzzer_sys::fuzz_target;
use seedpeg::grammar::{Expr, GrammarBuilder, Node};
use seedpeg::packrat::{PackratConfig, PackratParser, ParseOptions};
use seedpeg::{Grammar, ParseError, RuleId};
use std::sync::{Arc, OnceLock};

fn byte(b: u8) -> Expr<u8> {
    Expr::literal([b], &format!("{:?}", char::from(b)))
}

/// a: b "a" / c "a"
/// b: c "b" / a "b"
/// c: a "c" / b "c" / e "c" / "c"
/// e: e "-" c / c
fn grammar() -> &'static (Arc<Grammar<u8, Arc<Node>>>, RuleId) {
    static GRAMMAR: OnceLock<(Arc<Grammar<u8, Arc<Node>>>, RuleId)> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        let mut builder = GrammarBuilder::new();
        let a = builder.rule(
            "a",
            Expr::choice([
                Expr::seq([Expr::rule("b"), byte(b'a')]),
                Expr::seq([Expr::rule("c"), byte(b'a')]),
            ]),
        );
        builder.rule(
            "b",
            Expr::choice([
                Expr::seq([Expr::rule("c"), byte(b'b')]),
                Expr::seq([Expr::rule("a"), byte(b'b')]),
            ]),
        );
        builder.rule(
            "c",
            Expr::choice([
                Expr::seq([Expr::rule("a"), byte(b'c')]),
                Expr::seq([Expr::rule("b"), byte(b'c')]),
                Expr::seq([Expr::rule("e"), byte(b'c')]),
                byte(b'c'),
            ]),
        );
        builder.rule(
            "e",
            Expr::choice([
                Expr::seq([Expr::rule("e"), byte(b'-'), Expr::rule("c")]),
                Expr::rule("c"),
            ]),
        );
        (Arc::new(builder.build().unwrap()), a)
    })
}

fuzz_target!(|data: &[u8]| {
    if data.len() > 512 {
        return;
    }
    let (grammar, start) = grammar();
    let mut parser = PackratParser::new(Arc::clone(grammar), PackratConfig::default());
    let options = ParseOptions::prefix();

    let first = parser.parse(data, *start, &options);
    if let Err(err) = &first {
        assert!(
            err.is_parse_failure() || matches!(err, ParseError::RecursionLimit { .. }),
            "unexpected abort: {err}"
        );
    }
    assert_eq!(parser.state().stack().depth(), 0);

    let second = parser.parse(data, *start, &options);
    assert_eq!(first, second);
});
