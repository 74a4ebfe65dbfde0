//! End-to-end tokenization of realistic templates.

use template_compiler::parser::lexer::{tokenize, Token};

fn attr_values(tokens: &[Token]) -> Vec<String> {
    tokens
        .iter()
        .filter_map(|t| match t {
            Token::AttrValue { value, .. } => Some(value.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn tokenizes_a_realistic_template() {
    let source = concat!(
        "<div id=\"app\" class=\"wrap\">\n",
        "  <!-- header -->\n",
        "  <h1 :title=\"heading\">{{ heading }}</h1>\n",
        "  <input disabled>\n",
        "</div>"
    );
    let result = tokenize(source);
    assert!(result.errors.is_empty());

    let opens: Vec<String> = result
        .tokens
        .iter()
        .filter_map(|t| match t {
            Token::TagOpenStart { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(opens, vec!["div", "h1", "input"]);

    let comments: Vec<&str> = result
        .tokens
        .iter()
        .filter_map(|t| match t {
            Token::Comment { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(comments, vec![" header "]);

    assert!(matches!(result.tokens.last(), Some(Token::Eof { .. })));
}

#[test]
fn spans_slice_back_into_the_source() {
    let source = r#"<a href="/home">go</a>"#;
    let result = tokenize(source);
    for token in &result.tokens {
        match token {
            Token::TagOpenStart { span, .. } => assert_eq!(span.slice(source), "<a"),
            Token::AttrName { span, .. } => assert_eq!(span.slice(source), "href"),
            Token::AttrValue { span, .. } => assert_eq!(span.slice(source), "\"/home\""),
            Token::Text { span, .. } => assert_eq!(span.slice(source), "go"),
            _ => {}
        }
    }
}

#[test]
fn entities_decode_in_text_and_attribute_values() {
    let result = tokenize(r#"<a title="a &amp; b">x &lt; y</a>"#);
    assert_eq!(attr_values(&result.tokens), vec!["a & b"]);
    assert!(result
        .tokens
        .iter()
        .any(|t| matches!(t, Token::Text { text, .. } if text == "x < y")));
}

#[test]
fn bare_attribute_values() {
    let result = tokenize("<input type=text value=42>");
    assert_eq!(attr_values(&result.tokens), vec!["text", "42"]);
}

#[test]
fn textarea_contents_are_taken_raw() {
    let result = tokenize("<textarea>{{ a }} < b</textarea>");
    assert!(result
        .tokens
        .iter()
        .any(|t| matches!(t, Token::RawText { text, .. } if text == "{{ a }} < b")));
}

#[test]
fn script_ignores_embedded_markup() {
    let result = tokenize("<script>var x = '<div>' + 1;</script>");
    let raw: Vec<&str> = result
        .tokens
        .iter()
        .filter_map(|t| match t {
            Token::RawText { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(raw, vec!["var x = '<div>' + 1;"]);
}

#[test]
fn malformed_input_still_yields_a_consumable_stream() {
    let result = tokenize(r#"<div id="x <p>text"#);
    assert!(!result.errors.is_empty());
    assert!(matches!(result.tokens.last(), Some(Token::Eof { .. })));
}

#[test]
fn stray_slash_in_tag_is_reported_and_skipped() {
    let result = tokenize("<div / id=\"a\"></div>");
    assert!(result
        .errors
        .iter()
        .any(|e| e.message.contains("unexpected '/'")));
    assert!(result
        .tokens
        .iter()
        .any(|t| matches!(t, Token::AttrName { name, .. } if name == "id")));
}
