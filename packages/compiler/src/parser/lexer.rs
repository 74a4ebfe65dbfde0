//! Markup tokenizer.
//!
//! Converts the template source into a flat token stream with byte
//! spans. Malformed constructs produce a non-fatal diagnostic and the
//! lexer resynchronizes, so the tree builder downstream always receives
//! a consumable stream. Interpolation inside text is left alone here;
//! the tree builder runs the text parser over text tokens.

use crate::chars;
use crate::parse_util::{Diagnostic, SourceSpan};
use crate::parser::html_tags::{is_raw_text_element, is_void_element};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `<name`, attributes follow.
    TagOpenStart { name: String, span: SourceSpan },
    AttrName { name: String, span: SourceSpan },
    /// Value of the preceding `AttrName`.
    AttrValue { value: String, span: SourceSpan },
    /// `>`
    TagOpenEnd { span: SourceSpan },
    /// `/>`
    TagOpenEndVoid { span: SourceSpan },
    /// `</name>`
    TagClose { name: String, span: SourceSpan },
    Text { text: String, span: SourceSpan },
    /// Unscanned contents of a raw-text element (`script`, `style`,
    /// `textarea`).
    RawText { text: String, span: SourceSpan },
    Comment { text: String, span: SourceSpan },
    Eof { span: SourceSpan },
}

impl Token {
    pub fn span(&self) -> SourceSpan {
        match self {
            Token::TagOpenStart { span, .. }
            | Token::AttrName { span, .. }
            | Token::AttrValue { span, .. }
            | Token::TagOpenEnd { span }
            | Token::TagOpenEndVoid { span }
            | Token::TagClose { span, .. }
            | Token::Text { span, .. }
            | Token::RawText { span, .. }
            | Token::Comment { span, .. }
            | Token::Eof { span } => *span,
        }
    }
}

#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<Diagnostic>,
}

/// Tokenize a full template.
pub fn tokenize(source: &str) -> LexResult {
    let mut lexer = Lexer::new(source);
    lexer.tokenize();
    LexResult {
        tokens: lexer.tokens,
        errors: lexer.errors,
    }
}

struct Lexer<'a> {
    source: &'a str,
    offset: usize,
    tokens: Vec<Token>,
    errors: Vec<Diagnostic>,
    /// Set after emitting `TagOpenEnd` for a raw-text element; the
    /// following content is consumed without markup scanning.
    raw_text_tag: Option<String>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Lexer {
            source,
            offset: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
            raw_text_tag: None,
        }
    }

    fn peek(&self) -> char {
        self.source[self.offset..].chars().next().unwrap_or(chars::EOF)
    }

    fn peek_ahead(&self, n: usize) -> char {
        self.source[self.offset..]
            .chars()
            .nth(n)
            .unwrap_or(chars::EOF)
    }

    fn at_eof(&self) -> bool {
        self.offset >= self.source.len()
    }

    fn advance(&mut self) {
        if let Some(c) = self.source[self.offset..].chars().next() {
            self.offset += c.len_utf8();
        }
    }

    /// Consume `s` if the input starts with it here.
    fn attempt_str(&mut self, s: &str) -> bool {
        if self.source[self.offset..].starts_with(s) {
            self.offset += s.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while chars::is_whitespace(self.peek()) && !self.at_eof() {
            self.advance();
        }
    }

    fn span_from(&self, start: usize) -> SourceSpan {
        SourceSpan::new(start, self.offset)
    }

    fn report(&mut self, message: impl Into<String>, span: SourceSpan) {
        self.errors.push(Diagnostic::parse(message, span));
    }

    fn tokenize(&mut self) {
        while !self.at_eof() {
            if let Some(tag) = self.raw_text_tag.take() {
                self.consume_raw_text(&tag);
                continue;
            }
            if self.peek() == chars::LT {
                let next = self.peek_ahead(1);
                if self.source[self.offset..].starts_with("<!--") {
                    self.consume_comment();
                } else if next == chars::SLASH {
                    self.consume_tag_close();
                } else if chars::is_tag_name_start(next) {
                    self.consume_tag_open();
                } else if next == chars::BANG {
                    self.consume_markup_declaration();
                } else {
                    // A lone `<` is ordinary text.
                    self.consume_text();
                }
            } else {
                self.consume_text();
            }
        }
        let span = self.span_from(self.offset);
        self.tokens.push(Token::Eof { span });
    }

    /// Text runs until the next construct that looks like markup.
    fn consume_text(&mut self) {
        let start = self.offset;
        let mut text = String::new();
        loop {
            let c = self.peek();
            if c == chars::EOF && self.at_eof() {
                break;
            }
            if c == chars::LT {
                let next = self.peek_ahead(1);
                if chars::is_tag_name_start(next) || next == chars::SLASH || next == chars::BANG {
                    break;
                }
            }
            text.push(c);
            self.advance();
        }
        if !text.is_empty() {
            let span = self.span_from(start);
            self.tokens.push(Token::Text {
                text: decode_entities(&text),
                span,
            });
        }
    }

    fn consume_comment(&mut self) {
        let start = self.offset;
        // Skip `<!--`.
        self.offset += 4;
        match self.source[self.offset..].find("-->") {
            Some(rel) => {
                let text = self.source[self.offset..self.offset + rel].to_string();
                self.offset += rel + 3;
                let span = self.span_from(start);
                self.tokens.push(Token::Comment { text, span });
            }
            None => {
                let text = self.source[self.offset..].to_string();
                self.offset = self.source.len();
                let span = self.span_from(start);
                self.report("unterminated comment", span);
                self.tokens.push(Token::Comment { text, span });
            }
        }
    }

    /// `<!DOCTYPE ...>` and other markup declarations carry no meaning
    /// for the render output and are dropped.
    fn consume_markup_declaration(&mut self) {
        while !self.at_eof() && self.peek() != chars::GT {
            self.advance();
        }
        if self.peek() == chars::GT {
            self.advance();
        }
    }

    fn consume_tag_open(&mut self) {
        let start = self.offset;
        self.advance(); // `<`
        let name = self.consume_tag_name();
        self.tokens.push(Token::TagOpenStart {
            name: name.clone(),
            span: self.span_from(start),
        });

        loop {
            self.skip_whitespace();
            let c = self.peek();
            if c == chars::GT {
                let end_start = self.offset;
                self.advance();
                self.tokens.push(Token::TagOpenEnd {
                    span: self.span_from(end_start),
                });
                if is_raw_text_element(&name) && !is_void_element(&name) {
                    self.raw_text_tag = Some(name);
                }
                return;
            }
            if c == chars::SLASH {
                let end_start = self.offset;
                if self.attempt_str("/>") {
                    self.tokens.push(Token::TagOpenEndVoid {
                        span: self.span_from(end_start),
                    });
                    return;
                }
                self.advance();
                self.report("unexpected '/' inside tag", self.span_from(end_start));
                continue;
            }
            if self.at_eof() {
                let span = self.span_from(start);
                self.report(
                    format!("unexpected end of template inside tag <{}>", name),
                    span,
                );
                self.tokens.push(Token::TagOpenEnd { span });
                return;
            }
            self.consume_attribute();
        }
    }

    fn consume_tag_name(&mut self) -> String {
        let start = self.offset;
        while chars::is_tag_name_char(self.peek()) {
            self.advance();
        }
        self.source[start..self.offset].to_string()
    }

    fn consume_attribute(&mut self) {
        let start = self.offset;
        let c = self.peek();
        if c == chars::EQ || c == chars::DQ || c == chars::SQ {
            // `=foo` or a stray quote cannot begin an attribute name.
            self.advance();
            self.report("invalid attribute name", self.span_from(start));
            return;
        }

        while !chars::is_attr_name_end(self.peek()) && !self.at_eof() {
            self.advance();
        }
        let name = self.source[start..self.offset].to_string();
        self.tokens.push(Token::AttrName {
            name,
            span: self.span_from(start),
        });

        self.skip_whitespace();
        if self.peek() != chars::EQ {
            // Valueless attribute.
            return;
        }
        self.advance(); // `=`
        self.skip_whitespace();
        self.consume_attribute_value();
    }

    fn consume_attribute_value(&mut self) {
        let start = self.offset;
        let c = self.peek();
        if c == chars::DQ || c == chars::SQ {
            self.advance();
            let value_start = self.offset;
            while self.peek() != c && !self.at_eof() {
                self.advance();
            }
            let value = self.source[value_start..self.offset].to_string();
            if self.at_eof() {
                self.report("unterminated attribute value", self.span_from(start));
            } else {
                self.advance(); // closing quote
            }
            self.tokens.push(Token::AttrValue {
                value: decode_entities(&value),
                span: self.span_from(start),
            });
            return;
        }
        if c == chars::GT || self.at_eof() {
            let span = self.span_from(start);
            self.report("missing attribute value after '='", span);
            self.tokens.push(Token::AttrValue {
                value: String::new(),
                span,
            });
            return;
        }
        // Bare value: up to whitespace, `>` or `/>`.
        while !self.at_eof() {
            let c = self.peek();
            if chars::is_whitespace(c) || c == chars::GT {
                break;
            }
            if c == chars::SLASH && self.peek_ahead(1) == chars::GT {
                break;
            }
            self.advance();
        }
        let value = self.source[start..self.offset].to_string();
        self.tokens.push(Token::AttrValue {
            value: decode_entities(&value),
            span: self.span_from(start),
        });
    }

    fn consume_tag_close(&mut self) {
        let start = self.offset;
        self.offset += 2; // `</`
        self.skip_whitespace();
        let name = self.consume_tag_name();
        self.skip_whitespace();
        if name.is_empty() {
            if self.peek() == chars::GT {
                self.advance();
            }
            self.report("invalid closing tag", self.span_from(start));
            return;
        }
        if self.peek() == chars::GT {
            self.advance();
        } else {
            // Resynchronize at the next `>` or give up at EOF.
            while !self.at_eof() && self.peek() != chars::GT {
                self.advance();
            }
            if self.peek() == chars::GT {
                self.advance();
            }
            self.report(
                format!("malformed closing tag </{}>", name),
                self.span_from(start),
            );
        }
        self.tokens.push(Token::TagClose {
            name,
            span: self.span_from(start),
        });
    }

    /// Contents of a raw-text element: scan only for the matching
    /// closing tag. A missing closing tag is reported when the tree
    /// builder sees the element still open at EOF.
    fn consume_raw_text(&mut self, tag: &str) {
        let start = self.offset;
        let haystack = self.source[self.offset..].to_ascii_lowercase();
        let needle = format!("</{}", tag.to_ascii_lowercase());
        let mut search_from = 0;
        let end = loop {
            match haystack[search_from..].find(&needle) {
                Some(rel) => {
                    let abs = search_from + rel;
                    let after = haystack[abs + needle.len()..].chars().next();
                    match after {
                        Some(c) if chars::is_whitespace(c) || c == chars::GT => break Some(abs),
                        None => break Some(abs),
                        _ => search_from = abs + needle.len(),
                    }
                }
                None => break None,
            }
        };
        match end {
            Some(rel) => {
                let text = self.source[self.offset..self.offset + rel].to_string();
                self.offset += rel;
                if !text.is_empty() {
                    self.tokens.push(Token::RawText {
                        text,
                        span: self.span_from(start),
                    });
                }
            }
            None => {
                let text = self.source[self.offset..].to_string();
                self.offset = self.source.len();
                if !text.is_empty() {
                    self.tokens.push(Token::RawText {
                        text,
                        span: self.span_from(start),
                    });
                }
            }
        }
    }
}

/// Decode the common named character references plus numeric ones.
/// Unknown references pass through verbatim.
pub fn decode_entities(text: &str) -> String {
    if !text.contains(chars::AMPERSAND) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find(chars::AMPERSAND) {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match decode_one_entity(rest) {
            Some((decoded, len)) => {
                out.push_str(&decoded);
                rest = &rest[len..];
            }
            None => {
                out.push(chars::AMPERSAND);
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_one_entity(input: &str) -> Option<(String, usize)> {
    debug_assert!(input.starts_with(chars::AMPERSAND));
    let body = &input[1..];
    let semi = body.find(';').filter(|&i| i > 0 && i <= 10)?;
    let name = &body[..semi];
    let consumed = semi + 2;
    let decoded = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        let code = u32::from_str_radix(hex, 16).ok()?;
        char::from_u32(code)?.to_string()
    } else if let Some(dec) = name.strip_prefix('#') {
        let code: u32 = dec.parse().ok()?;
        char::from_u32(code)?.to_string()
    } else {
        match name {
            "amp" => "&".to_string(),
            "lt" => "<".to_string(),
            "gt" => ">".to_string(),
            "quot" => "\"".to_string(),
            "apos" => "'".to_string(),
            "nbsp" => "\u{00A0}".to_string(),
            _ => return None,
        }
    };
    Some((decoded, consumed))
}
