//! Interpolation splitting, including delimiter edge cases.

use template_compiler::parser::ast::TextPiece;
use template_compiler::parser::text_parser::parse_text;

fn expr(s: &str) -> TextPiece {
    TextPiece::Expression(s.to_string())
}

fn lit(s: &str) -> TextPiece {
    TextPiece::Literal(s.to_string())
}

#[test]
fn literal_only_text_returns_none() {
    assert_eq!(parse_text("no interpolation here", None), None);
    assert_eq!(parse_text("{ not } { tags }", None), None);
    assert_eq!(parse_text("", None), None);
}

#[test]
fn unclosed_delimiters_stay_literal() {
    assert_eq!(parse_text("{{ open", None), None);
    assert_eq!(parse_text("close }}", None), None);
}

#[test]
fn expressions_keep_inner_structure() {
    let pieces = parse_text("{{ fmt(user.name, 'short') }}", None).unwrap();
    assert_eq!(pieces, vec![expr("fmt(user.name, 'short')")]);
}

#[test]
fn surrounding_literals_are_kept_verbatim() {
    let pieces = parse_text("total:  {{n}}  items", None).unwrap();
    assert_eq!(pieces, vec![lit("total:  "), expr("n"), lit("  items")]);
}

#[test]
fn several_expressions_interleave() {
    let pieces = parse_text("{{a}}-{{b}}-{{c}}", None).unwrap();
    assert_eq!(
        pieces,
        vec![expr("a"), lit("-"), expr("b"), lit("-"), expr("c")]
    );
}

#[test]
fn custom_delimiters_with_regex_metacharacters() {
    let delims = ("${".to_string(), "}".to_string());
    let pieces = parse_text("hi ${name}!", Some(&delims)).unwrap();
    assert_eq!(pieces, vec![lit("hi "), expr("name"), lit("!")]);
}

#[test]
fn custom_delimiters_disable_the_default_pair() {
    let delims = ("[[".to_string(), "]]".to_string());
    assert_eq!(parse_text("{{ x }}", Some(&delims)), None);
    let pieces = parse_text("[[x]] {{ y }}", Some(&delims)).unwrap();
    assert_eq!(pieces, vec![expr("x"), lit(" {{ y }}")]);
}

#[test]
fn expression_trimming_only_touches_the_edges() {
    let pieces = parse_text("{{   a  +  b   }}", None).unwrap();
    assert_eq!(pieces, vec![expr("a  +  b")]);
}

#[test]
fn newlines_inside_expressions_are_allowed() {
    let pieces = parse_text("{{ list\n  .length }}", None).unwrap();
    assert_eq!(pieces, vec![expr("list\n  .length")]);
}
