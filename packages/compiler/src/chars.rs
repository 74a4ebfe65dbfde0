//! Character constants and predicates shared by the lexer and the
//! embedded-expression scanner.

pub const EOF: char = '\0';
pub const TAB: char = '\t';
pub const LF: char = '\n';
pub const CR: char = '\r';
pub const FF: char = '\x0C';
pub const SPACE: char = ' ';

pub const BANG: char = '!';
pub const DQ: char = '"';
pub const SQ: char = '\'';
pub const AMPERSAND: char = '&';
pub const MINUS: char = '-';
pub const SLASH: char = '/';
pub const COLON: char = ':';
pub const LT: char = '<';
pub const EQ: char = '=';
pub const GT: char = '>';
pub const AT: char = '@';
pub const BACKTICK: char = '`';
pub const BACKSLASH: char = '\\';
pub const LPAREN: char = '(';
pub const RPAREN: char = ')';
pub const LBRACKET: char = '[';
pub const RBRACKET: char = ']';
pub const LBRACE: char = '{';
pub const RBRACE: char = '}';

/// Line separator / paragraph separator. Valid inside target string
/// literals only when escaped, so the code emitter must escape them.
pub const LINE_SEPARATOR: char = '\u{2028}';
pub const PARAGRAPH_SEPARATOR: char = '\u{2029}';

pub fn is_whitespace(code: char) -> bool {
    matches!(code, TAB | LF | FF | CR | SPACE)
}

/// Characters that may start a tag name after `<`.
pub fn is_tag_name_start(code: char) -> bool {
    code.is_ascii_alphabetic()
}

/// Characters allowed inside a tag name.
pub fn is_tag_name_char(code: char) -> bool {
    code.is_ascii_alphanumeric() || code == MINUS || code == '_' || code == COLON || code == '.'
}

/// Characters that terminate an attribute name.
pub fn is_attr_name_end(code: char) -> bool {
    is_whitespace(code) || matches!(code, EQ | GT | SLASH | EOF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_predicate() {
        assert!(is_whitespace(' '));
        assert!(is_whitespace('\t'));
        assert!(is_whitespace('\n'));
        assert!(!is_whitespace('a'));
        assert!(!is_whitespace('\u{00A0}'));
    }

    #[test]
    fn tag_name_chars() {
        assert!(is_tag_name_start('d'));
        assert!(!is_tag_name_start('1'));
        assert!(is_tag_name_char('-'));
        assert!(!is_tag_name_char('>'));
    }
}
