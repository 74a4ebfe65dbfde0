//! Embedded-expression transcoding helpers.
//!
//! Template expressions are embedded verbatim into the generated
//! render code, so before embedding they pass a structural check: a
//! string-literal-aware scanner verifying the expression is non-empty
//! and all brackets pair up. This is not a full parse of the target
//! language (type checking and deeper validation are out of scope);
//! it catches exactly the class of errors that would make the final
//! code string syntactically invalid.

use crate::chars;

/// Escape `s` for inclusion inside a double-quoted target string
/// literal. Line/paragraph separators are legal in source text but
/// not in target literals, so they are escaped as well.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            chars::BACKSLASH => out.push_str("\\\\"),
            chars::DQ => out.push_str("\\\""),
            chars::LF => out.push_str("\\n"),
            chars::CR => out.push_str("\\r"),
            chars::TAB => out.push_str("\\t"),
            chars::LINE_SEPARATOR => out.push_str("\\u2028"),
            chars::PARAGRAPH_SEPARATOR => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}

/// `s` as a double-quoted target string literal.
pub fn quote(s: &str) -> String {
    format!("\"{}\"", escape_string(s))
}

/// Structural validity check for an embedded expression.
pub fn check_expression(expression: &str) -> Result<(), String> {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return Err("expression is empty".to_string());
    }

    let mut stack: Vec<char> = Vec::new();
    let mut iter = trimmed.chars();
    while let Some(c) = iter.next() {
        match c {
            chars::DQ | chars::SQ | chars::BACKTICK => {
                // Skip the string literal body, honoring escapes.
                let mut closed = false;
                while let Some(s) = iter.next() {
                    if s == chars::BACKSLASH {
                        iter.next();
                    } else if s == c {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(format!("unterminated string literal starting with {}", c));
                }
            }
            chars::LPAREN => stack.push(chars::RPAREN),
            chars::LBRACKET => stack.push(chars::RBRACKET),
            chars::LBRACE => stack.push(chars::RBRACE),
            chars::RPAREN | chars::RBRACKET | chars::RBRACE => {
                if stack.pop() != Some(c) {
                    return Err(format!("unbalanced '{}'", c));
                }
            }
            _ => {}
        }
    }
    if let Some(open) = stack.pop() {
        return Err(format!("missing closing '{}'", open));
    }
    Ok(())
}
