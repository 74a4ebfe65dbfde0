//! Interpolation splitter.
//!
//! Breaks a text run into literal and expression pieces using the
//! configured delimiters (default `{{` `}}`). Returns `None` when the
//! text holds no interpolation at all, so plain text stays a plain
//! (and trivially static) node.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::parser::ast::TextPiece;

static DEFAULT_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{((?s:.)+?)\}\}").unwrap());

fn build_tag_re(delimiters: &(String, String)) -> Regex {
    let pattern = format!(
        "{}((?s:.)+?){}",
        regex::escape(&delimiters.0),
        regex::escape(&delimiters.1)
    );
    // Both halves are escaped literals, so the pattern always compiles.
    Regex::new(&pattern).unwrap_or_else(|_| DEFAULT_TAG_RE.clone())
}

/// Split `text` into pieces. Expression pieces are trimmed but
/// otherwise raw; transcoding and validation happen in the code
/// generator.
pub fn parse_text(text: &str, delimiters: Option<&(String, String)>) -> Option<Vec<TextPiece>> {
    let custom;
    let tag_re = match delimiters {
        Some(d) => {
            custom = build_tag_re(d);
            &custom
        }
        None => &*DEFAULT_TAG_RE,
    };

    if !tag_re.is_match(text) {
        return None;
    }

    let mut pieces = Vec::new();
    let mut last_end = 0;
    for caps in tag_re.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        if whole.start() > last_end {
            pieces.push(TextPiece::Literal(text[last_end..whole.start()].to_string()));
        }
        let expression = caps.get(1).unwrap().as_str().trim().to_string();
        pieces.push(TextPiece::Expression(expression));
        last_end = whole.end();
    }
    if last_end < text.len() {
        pieces.push(TextPiece::Literal(text[last_end..].to_string()));
    }
    Some(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_interpolated() {
        assert_eq!(parse_text("hello", None), None);
        assert_eq!(parse_text("{single brace}", None), None);
    }

    #[test]
    fn splits_literals_and_expressions() {
        let pieces = parse_text("a {{ b }} c", None).unwrap();
        assert_eq!(
            pieces,
            vec![
                TextPiece::Literal("a ".to_string()),
                TextPiece::Expression("b".to_string()),
                TextPiece::Literal(" c".to_string()),
            ]
        );
    }

    #[test]
    fn adjacent_expressions() {
        let pieces = parse_text("{{a}}{{b}}", None).unwrap();
        assert_eq!(
            pieces,
            vec![
                TextPiece::Expression("a".to_string()),
                TextPiece::Expression("b".to_string()),
            ]
        );
    }

    #[test]
    fn custom_delimiters() {
        let delims = ("[[".to_string(), "]]".to_string());
        let pieces = parse_text("x [[ y ]]", Some(&delims)).unwrap();
        assert_eq!(
            pieces,
            vec![
                TextPiece::Literal("x ".to_string()),
                TextPiece::Expression("y".to_string()),
            ]
        );
        // Default delimiters are literal text under custom ones.
        assert_eq!(parse_text("{{ y }}", Some(&delims)), None);
    }

    #[test]
    fn multiline_expression() {
        let pieces = parse_text("{{ a +\n b }}", None).unwrap();
        assert_eq!(pieces, vec![TextPiece::Expression("a +\n b".to_string())]);
    }
}
