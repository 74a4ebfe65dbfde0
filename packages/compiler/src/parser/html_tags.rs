//! Tag tables the lexer and tree builder consult: void elements that
//! never take a closing tag, raw-text elements whose contents are not
//! scanned for markup, and whitespace-preserving elements.

use once_cell::sync::Lazy;
use std::collections::HashSet;

static VOID_ELEMENTS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
        "source", "track", "wbr",
    ]
    .into_iter()
    .collect()
});

/// Contents are opaque to the markup grammar.
static RAW_TEXT_ELEMENTS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["script", "style", "textarea"].into_iter().collect());

/// Void elements close implicitly; `<br>` needs no `</br>`.
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(tag.to_ascii_lowercase().as_str())
}

pub fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(tag.to_ascii_lowercase().as_str())
}

/// Raw-text element whose contents still get interpolation handling.
pub fn is_escapable_raw_text_element(tag: &str) -> bool {
    tag.eq_ignore_ascii_case("textarea")
}

/// Whitespace inside `<pre>` is always significant.
pub fn is_pre_element(tag: &str) -> bool {
    tag.eq_ignore_ascii_case("pre")
}
