//! Template parser: markup string to arena AST.
//!
//! A two-layer design: the lexer produces a flat token stream, the
//! tree builder here folds it into a single-rooted tree, classifying
//! attributes into plain attributes, bindings, events and directives
//! as elements close. Malformed markup is recovered with a synthesized
//! minimally valid shape and a diagnostic; only the absence of a usable
//! single root element is fatal.

pub mod ast;
pub mod html_tags;
pub mod lexer;
pub mod text_parser;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::options::{CompilerOptions, WhitespaceMode};
use crate::parse_util::{Diagnostic, SourceSpan, TemplateParseError};
use ast::{Ast, Directive, Element, ForInfo, IfCondition, NodeId, NodeKind};
use html_tags::{is_escapable_raw_text_element, is_pre_element, is_void_element};
use lexer::{decode_entities, tokenize, Token};
use text_parser::parse_text;

/// Result of a successful parse. Non-fatal problems live on `errors`
/// and `tips`; the tree is always well-formed.
#[derive(Debug)]
pub struct ParseOutcome {
    pub ast: Ast,
    pub errors: Vec<Diagnostic>,
    pub tips: Vec<Diagnostic>,
}

/// The default parser stage.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlParser;

impl HtmlParser {
    pub fn new() -> Self {
        HtmlParser
    }

    /// Parse a pre-trimmed template into a single-rooted tree.
    pub fn parse(
        &self,
        template: &str,
        options: &CompilerOptions,
    ) -> Result<ParseOutcome, TemplateParseError> {
        let lexed = tokenize(template);
        let mut builder = TreeBuilder::new(options);
        builder.errors = lexed.errors;
        for token in lexed.tokens {
            builder.process(token);
        }
        builder.finish()
    }
}

static FOR_ALIAS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*(.*?)\s+(?:in|of)\s+(.*?)\s*$").unwrap());
static FOR_ITERATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",([^,\}\]]*)(?:,([^,\}\]]*))?$").unwrap());
static STRIP_PARENS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\(|\)$").unwrap());
static WS_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\r\n\x0C]+").unwrap());

/// Parse a `v-for` expression like `(item, i) in list`.
pub fn parse_for(expression: &str) -> Option<ForInfo> {
    let caps = FOR_ALIAS_RE.captures(expression)?;
    let list = caps.get(2)?.as_str().trim().to_string();
    if list.is_empty() {
        return None;
    }
    let alias_part = STRIP_PARENS_RE
        .replace_all(caps.get(1)?.as_str().trim(), "")
        .to_string();
    let (alias, iterator1, iterator2) = match FOR_ITERATOR_RE.captures(&alias_part) {
        Some(it) => {
            let alias = FOR_ITERATOR_RE.replace(&alias_part, "").trim().to_string();
            let iterator1 = it.get(1).map(|m| m.as_str().trim().to_string());
            let iterator2 = it.get(2).map(|m| m.as_str().trim().to_string());
            (alias, iterator1, iterator2)
        }
        None => (alias_part.trim().to_string(), None, None),
    };
    if alias.is_empty() {
        return None;
    }
    Some(ForInfo {
        list,
        alias,
        iterator1: iterator1.filter(|s| !s.is_empty()),
        iterator2: iterator2.filter(|s| !s.is_empty()),
    })
}

/// `v-else` / `v-else-if` marker held until the element attaches to
/// its parent, where the chain head is looked up among prior siblings.
enum ElseKind {
    Else,
    ElseIf(String),
}

struct PendingAttr {
    name: String,
    value: Option<String>,
    span: SourceSpan,
}

struct PendingElement {
    tag: String,
    attrs: Vec<PendingAttr>,
    span_start: usize,
}

struct TreeBuilder<'a> {
    options: &'a CompilerOptions,
    ast: Ast,
    /// Open, not yet closed elements; the parent of new nodes is the top.
    stack: Vec<NodeId>,
    /// Completed top-level nodes, in document order.
    top_level: Vec<NodeId>,
    pending: Option<PendingElement>,
    /// Set when the last attribute name was rejected (duplicate), so
    /// its value token must not attach to the previous attribute.
    discard_next_value: bool,
    else_markers: HashMap<NodeId, ElseKind>,
    pre_depth: usize,
    errors: Vec<Diagnostic>,
    tips: Vec<Diagnostic>,
}

impl<'a> TreeBuilder<'a> {
    fn new(options: &'a CompilerOptions) -> Self {
        TreeBuilder {
            options,
            ast: Ast::new(),
            stack: Vec::new(),
            top_level: Vec::new(),
            pending: None,
            discard_next_value: false,
            else_markers: HashMap::new(),
            pre_depth: 0,
            errors: Vec::new(),
            tips: Vec::new(),
        }
    }

    fn process(&mut self, token: Token) {
        match token {
            Token::TagOpenStart { name, span } => {
                self.pending = Some(PendingElement {
                    tag: name,
                    attrs: Vec::new(),
                    span_start: span.start,
                });
            }
            Token::AttrName { name, span } => {
                if let Some(pending) = &mut self.pending {
                    if pending.attrs.iter().any(|a| a.name == name) {
                        self.errors.push(Diagnostic::parse(
                            format!("duplicate attribute \"{}\"", name),
                            span,
                        ));
                        self.discard_next_value = true;
                    } else {
                        pending.attrs.push(PendingAttr {
                            name,
                            value: None,
                            span,
                        });
                        self.discard_next_value = false;
                    }
                }
            }
            Token::AttrValue { value, span } => {
                if self.discard_next_value {
                    self.discard_next_value = false;
                } else if let Some(pending) = &mut self.pending {
                    if let Some(last) = pending.attrs.last_mut() {
                        last.value = Some(value);
                        last.span = SourceSpan::new(last.span.start, span.end);
                    }
                }
            }
            Token::TagOpenEnd { span } => self.finish_open_tag(span.end, false),
            Token::TagOpenEndVoid { span } => self.finish_open_tag(span.end, true),
            Token::TagClose { name, span } => self.close_tag(&name, span),
            Token::Text { text, span } => self.add_text(text, span, false),
            Token::RawText { text, span } => self.add_raw_text(text, span),
            Token::Comment { text, span } => self.add_comment(text, span),
            Token::Eof { span } => self.close_unclosed(span),
        }
    }

    fn finish_open_tag(&mut self, span_end: usize, self_closing: bool) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let span = SourceSpan::new(pending.span_start, span_end);
        let parent = self.stack.last().copied();
        let mut element = Element::new(pending.tag.clone());
        element.self_closing = self_closing;
        let id = self
            .ast
            .alloc(NodeKind::Element(element), parent, span);
        self.classify_attrs(id, pending.attrs);

        let completes = self_closing || is_void_element(&pending.tag);
        if completes {
            self.complete_element(id);
        } else {
            if is_pre_element(&pending.tag) {
                self.pre_depth += 1;
            }
            self.stack.push(id);
        }
    }

    /// Sort every raw attribute into the element's maps. Order within
    /// each map follows source order.
    fn classify_attrs(&mut self, id: NodeId, attrs: Vec<PendingAttr>) {
        for attr in attrs {
            let PendingAttr { name, value, span } = attr;
            let expression = value.clone().unwrap_or_default();
            if name == "v-for" {
                match parse_for(&expression) {
                    Some(info) => {
                        self.ast.element_mut(id).unwrap().for_info = Some(info);
                    }
                    None => self.errors.push(Diagnostic::parse(
                        format!("invalid v-for expression: \"{}\"", expression),
                        span,
                    )),
                }
            } else if name == "v-if" {
                self.ast.element_mut(id).unwrap().if_conditions.push(IfCondition {
                    expression: Some(expression),
                    node: id,
                });
            } else if name == "v-else-if" {
                self.else_markers.insert(id, ElseKind::ElseIf(expression));
            } else if name == "v-else" {
                self.else_markers.insert(id, ElseKind::Else);
            } else if name == "v-once" {
                self.ast.node_mut(id).static_info.once = true;
            } else if let Some(rest) = name
                .strip_prefix(':')
                .or_else(|| name.strip_prefix("v-bind:"))
            {
                if rest.is_empty() {
                    self.errors.push(Diagnostic::parse(
                        format!("binding \"{}\" is missing an attribute name", name),
                        span,
                    ));
                } else if rest == "key" {
                    self.ast.element_mut(id).unwrap().key = Some(expression);
                } else {
                    self.ast
                        .element_mut(id)
                        .unwrap()
                        .bindings
                        .insert(rest.to_string(), expression);
                }
            } else if let Some(rest) = name
                .strip_prefix('@')
                .or_else(|| name.strip_prefix("v-on:"))
            {
                if rest.is_empty() {
                    self.errors.push(Diagnostic::parse(
                        format!("event binding \"{}\" is missing an event name", name),
                        span,
                    ));
                } else {
                    self.ast
                        .element_mut(id)
                        .unwrap()
                        .events
                        .insert(rest.to_string(), expression);
                }
            } else if let Some(rest) = name.strip_prefix("v-") {
                let (dir_name, arg) = match rest.split_once(':') {
                    Some((n, a)) => (n.to_string(), Some(a.to_string())),
                    None => (rest.to_string(), None),
                };
                if dir_name.is_empty() {
                    self.errors
                        .push(Diagnostic::parse("invalid directive name", span));
                } else {
                    self.ast.element_mut(id).unwrap().directives.insert(
                        dir_name.clone(),
                        Directive {
                            name: dir_name,
                            raw_name: name,
                            arg,
                            expression: value,
                            span,
                        },
                    );
                }
            } else {
                self.ast
                    .element_mut(id)
                    .unwrap()
                    .attrs
                    .insert(name, expression);
            }
        }
    }

    fn close_tag(&mut self, name: &str, span: SourceSpan) {
        let matching = self
            .stack
            .iter()
            .rposition(|&id| self.tag_of(id).eq_ignore_ascii_case(name));
        let Some(pos) = matching else {
            self.errors.push(Diagnostic::parse(
                format!("unexpected closing tag </{}>", name),
                span,
            ));
            return;
        };
        // Anything above the match was left unclosed.
        while self.stack.len() > pos + 1 {
            let id = self.stack.last().copied().unwrap();
            self.errors.push(Diagnostic::parse(
                format!("tag <{}> has no matching end tag", self.tag_of(id)),
                self.ast.node(id).span,
            ));
            self.pop_and_complete();
        }
        self.pop_and_complete();
    }

    fn close_unclosed(&mut self, _eof_span: SourceSpan) {
        while let Some(&id) = self.stack.last() {
            self.errors.push(Diagnostic::parse(
                format!("tag <{}> has no matching end tag", self.tag_of(id)),
                self.ast.node(id).span,
            ));
            self.pop_and_complete();
        }
    }

    fn pop_and_complete(&mut self) {
        if let Some(id) = self.stack.pop() {
            if is_pre_element(&self.tag_of(id)) {
                self.pre_depth = self.pre_depth.saturating_sub(1);
            }
            self.complete_element(id);
        }
    }

    fn tag_of(&self, id: NodeId) -> String {
        self.ast
            .element(id)
            .map(|el| el.tag.clone())
            .unwrap_or_default()
    }

    /// Runs module hooks, resolves `v-else` chains and attaches the
    /// finished element to its parent (or the top level).
    fn complete_element(&mut self, id: NodeId) {
        for module in &self.options.modules {
            module.transform_element(&mut self.ast, id, &mut self.errors);
        }

        match self.else_markers.remove(&id) {
            Some(kind) => self.attach_else_branch(id, kind),
            None => self.attach(id),
        }
    }

    fn attach_else_branch(&mut self, id: NodeId, kind: ElseKind) {
        let expression = match kind {
            ElseKind::Else => None,
            ElseKind::ElseIf(e) => Some(e),
        };
        let parent = self.ast.node(id).parent;
        let siblings: &[NodeId] = match parent {
            Some(p) => self.ast.children(p),
            None => &self.top_level,
        };
        // The chain head is the nearest previous element sibling.
        let head = siblings
            .iter()
            .rev()
            .find(|&&s| self.ast.element(s).is_some())
            .copied()
            .filter(|&s| {
                !self
                    .ast
                    .element(s)
                    .map(|el| el.if_conditions.is_empty())
                    .unwrap_or(true)
            });
        match head {
            Some(head_id) => {
                self.ast
                    .element_mut(head_id)
                    .unwrap()
                    .if_conditions
                    .push(IfCondition {
                        expression,
                        node: id,
                    });
            }
            None => {
                let raw = if expression.is_some() {
                    "v-else-if"
                } else {
                    "v-else"
                };
                self.errors.push(Diagnostic::parse(
                    format!(
                        "{} on <{}> has no adjacent v-if",
                        raw,
                        self.tag_of(id)
                    ),
                    self.ast.node(id).span,
                ));
            }
        }
    }

    fn attach(&mut self, id: NodeId) {
        match self.ast.node(id).parent {
            Some(parent) => {
                if let Some(el) = self.ast.element_mut(parent) {
                    el.children.push(id);
                }
            }
            None => self.top_level.push(id),
        }
    }

    fn add_text(&mut self, text: String, span: SourceSpan, verbatim: bool) {
        let parent = self.stack.last().copied();
        let in_pre = self.pre_depth > 0 || verbatim;

        let processed = if in_pre {
            text
        } else if text.trim().is_empty() {
            // Whitespace-only runs never appear at the top level and
            // are dropped entirely in condense mode when they span a
            // line break.
            if parent.is_none() {
                return;
            }
            match self.options.whitespace {
                WhitespaceMode::Condense => {
                    let empty_parent = self
                        .ast
                        .element(parent.unwrap())
                        .map(|el| el.children.is_empty())
                        .unwrap_or(true);
                    if text.contains('\n') || empty_parent {
                        return;
                    }
                    " ".to_string()
                }
                WhitespaceMode::Preserve => text,
            }
        } else {
            match self.options.whitespace {
                WhitespaceMode::Condense => WS_RUN_RE.replace_all(&text, " ").to_string(),
                WhitespaceMode::Preserve => text,
            }
        };

        let kind = match parse_text(&processed, self.options.delimiters.as_ref()) {
            Some(pieces) => NodeKind::Interpolation {
                raw: processed,
                pieces,
            },
            None => NodeKind::Text { text: processed },
        };
        let id = self.ast.alloc(kind, parent, span);
        self.attach(id);
    }

    fn add_raw_text(&mut self, text: String, span: SourceSpan) {
        let parent_tag = self.stack.last().map(|&id| self.tag_of(id));
        match parent_tag {
            // `<textarea>` keeps entity decoding and interpolation.
            Some(tag) if is_escapable_raw_text_element(&tag) => {
                self.add_text(decode_entities(&text), span, true);
            }
            _ => {
                let parent = self.stack.last().copied();
                let id = self.ast.alloc(NodeKind::Text { text }, parent, span);
                self.attach(id);
            }
        }
    }

    fn add_comment(&mut self, text: String, span: SourceSpan) {
        let parent = self.stack.last().copied();
        if parent.is_none() {
            // A comment can never be the root; drop it either way.
            self.tips.push(Diagnostic::tip(
                "comment outside the root element is ignored",
                Some(span),
            ));
            return;
        }
        if !self.options.comments {
            return;
        }
        let id = self.ast.alloc(NodeKind::Comment { text }, parent, span);
        self.attach(id);
    }

    fn finish(mut self) -> Result<ParseOutcome, TemplateParseError> {
        self.close_unclosed(SourceSpan::new(0, 0));

        if self.top_level.is_empty() {
            return Err(TemplateParseError::MissingRoot {
                diagnostics: self.errors,
            });
        }
        if self.top_level.len() > 1 {
            return Err(TemplateParseError::MultipleRoots {
                count: self.top_level.len(),
                diagnostics: self.errors,
            });
        }
        let root = self.top_level[0];
        if self.ast.element(root).is_none() {
            // A lone text node cannot anchor a render tree.
            return Err(TemplateParseError::MissingRoot {
                diagnostics: self.errors,
            });
        }
        self.ast.set_root(root);
        Ok(ParseOutcome {
            ast: self.ast,
            errors: self.errors,
            tips: self.tips,
        })
    }
}
