//! Code generation: annotated AST to render code.
//!
//! A depth-first, document-order walk emits one target-language
//! expression per node. Element nodes become `_c(tag, data, children)`
//! constructor calls, text becomes `_v(...)`, interpolation routes
//! through the `_s` stringifier. A node selected as a static root is
//! not expanded in place: its full expansion is pushed onto the
//! `static_render_fns` list exactly once and the dynamic render body
//! references it as `_m(index)` (`_m(index,true)` inside a repeating
//! construct, where the cached fragment is keyed per iteration).
//! Fragment indices are assigned in first-encounter document order and
//! referenced only by that index, which keeps output byte-stable
//! across identical compiles.
//!
//! Unparsable embedded expressions never abort generation: they are
//! recorded as diagnostics and replaced with a no-op fallback.

pub mod expr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::options::CompilerOptions;
use crate::parse_util::{Diagnostic, SourceSpan};
use crate::parser::ast::{Ast, Element, IfCondition, NodeId, NodeKind, TextPiece};
use expr::{check_expression, quote};

/// Output of the generator stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode {
    /// Body of the dynamic render procedure.
    pub render: String,
    /// Bodies of the hoisted static fragments, in first-encounter
    /// document order.
    pub static_render_fns: Vec<String>,
    pub errors: Vec<Diagnostic>,
    pub tips: Vec<Diagnostic>,
}

/// The default generator stage.
#[derive(Debug, Default, Clone, Copy)]
pub struct CodeGenerator;

impl CodeGenerator {
    pub fn new() -> Self {
        CodeGenerator
    }

    pub fn generate(&self, ast: &Ast, options: &CompilerOptions) -> GeneratedCode {
        let mut state = GenState {
            ast,
            options,
            static_render_fns: Vec::new(),
            errors: Vec::new(),
            tips: Vec::new(),
            once_count: 0,
        };
        if ast
            .element(ast.root())
            .map(|el| el.for_info.is_some())
            .unwrap_or(false)
        {
            state.tips.push(Diagnostic::tip(
                "v-for on the root element renders multiple fragments; wrap it in a container",
                Some(ast.node(ast.root()).span),
            ));
        }
        let root_code = state.gen_node(ast.root(), Skip::empty());
        GeneratedCode {
            render: wrap_body(&root_code),
            static_render_fns: state.static_render_fns,
            errors: state.errors,
            tips: state.tips,
        }
    }
}

fn wrap_body(code: &str) -> String {
    format!("with(this){{return {}}}", code)
}

/// Matches a bare member path like `handleClick` or `a.b.c`, which can
/// be emitted as an event handler reference without wrapping.
static SIMPLE_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*$").unwrap());

/// Which generation branches were already taken for the current node.
/// The walk re-enters `gen_element` once per structural concern
/// (static, once, for, if), peeling one layer each time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Skip(u8);

impl Skip {
    const STATIC: u8 = 1;
    const ONCE: u8 = 2;
    const FOR: u8 = 4;
    const IF: u8 = 8;

    fn empty() -> Self {
        Skip(0)
    }

    fn with(self, flag: u8) -> Self {
        Skip(self.0 | flag)
    }

    fn has(self, flag: u8) -> bool {
        self.0 & flag != 0
    }
}

struct GenState<'a> {
    ast: &'a Ast,
    options: &'a CompilerOptions,
    static_render_fns: Vec<String>,
    errors: Vec<Diagnostic>,
    tips: Vec<Diagnostic>,
    once_count: usize,
}

impl<'a> GenState<'a> {
    fn gen_node(&mut self, id: NodeId, skip: Skip) -> String {
        match &self.ast.node(id).kind {
            NodeKind::Element(_) => self.gen_element(id, skip),
            NodeKind::Text { text } => format!("_v({})", quote(text)),
            NodeKind::Interpolation { pieces, .. } => {
                let pieces = pieces.clone();
                let span = self.ast.node(id).span;
                format!("_v({})", self.gen_interpolation(&pieces, span))
            }
            NodeKind::Comment { text } => format!("_e({})", quote(text)),
        }
    }

    fn gen_element(&mut self, id: NodeId, skip: Skip) -> String {
        let info = self.ast.node(id).static_info;
        let el = self.ast.element(id).expect("gen_element on non-element");

        // `static_in_for` alone can also mark a non-static `v-once`
        // node, which must go through the once path below.
        let hoisted = info.static_root || (info.static_in_for && info.is_static);
        if hoisted && !skip.has(Skip::STATIC) {
            return self.gen_static(id, skip);
        }
        if info.once && !skip.has(Skip::ONCE) {
            return self.gen_once(id, skip);
        }
        if el.for_info.is_some() && !skip.has(Skip::FOR) {
            return self.gen_for(id, skip);
        }
        if !el.if_conditions.is_empty() && !skip.has(Skip::IF) {
            return self.gen_if(id, skip);
        }
        self.gen_plain_element(id, skip)
    }

    /// Push the node's full expansion as a fresh static fragment and
    /// reference it by index.
    fn gen_static(&mut self, id: NodeId, skip: Skip) -> String {
        let in_for = self.ast.node(id).static_info.static_in_for;
        let body = self.gen_element(id, skip.with(Skip::STATIC));
        self.static_render_fns.push(wrap_body(&body));
        let index = self.static_render_fns.len() - 1;
        if in_for {
            format!("_m({},true)", index)
        } else {
            format!("_m({})", index)
        }
    }

    /// `v-once`: outside a repeat the subtree is cached exactly like a
    /// static fragment; inside a repeat it must be keyed per iteration.
    fn gen_once(&mut self, id: NodeId, skip: Skip) -> String {
        let skip = skip.with(Skip::ONCE);
        let info = self.ast.node(id).static_info;
        if info.static_in_for {
            let key = self.enclosing_for_key(id);
            match key {
                Some(key) => {
                    self.once_count += 1;
                    let once_id = self.once_count;
                    format!("_o({},{},{})", self.gen_element(id, skip), once_id, key)
                }
                None => {
                    self.tips.push(Diagnostic::tip(
                        "v-once inside v-for requires a :key on the repeated element",
                        Some(self.ast.node(id).span),
                    ));
                    self.gen_element(id, skip)
                }
            }
        } else {
            self.gen_static(id, skip)
        }
    }

    /// The key of the nearest enclosing repeated element.
    fn enclosing_for_key(&self, id: NodeId) -> Option<String> {
        let mut current = self.ast.node(id).parent;
        while let Some(p) = current {
            if let Some(el) = self.ast.element(p) {
                if el.for_info.is_some() {
                    return el.key.clone();
                }
            }
            current = self.ast.node(p).parent;
        }
        None
    }

    fn gen_for(&mut self, id: NodeId, skip: Skip) -> String {
        let el = self.ast.element(id).unwrap();
        let info = el.for_info.clone().unwrap();
        let span = self.ast.node(id).span;
        let list = self.checked(&info.list, span, "[]");
        let mut params = info.alias.clone();
        if let Some(it1) = &info.iterator1 {
            params.push(',');
            params.push_str(it1);
        }
        if let Some(it2) = &info.iterator2 {
            params.push(',');
            params.push_str(it2);
        }
        let body = self.gen_element(id, skip.with(Skip::FOR));
        format!("_l(({}),function({}){{return {}}})", list, params, body)
    }

    fn gen_if(&mut self, id: NodeId, skip: Skip) -> String {
        let conditions = self.ast.element(id).unwrap().if_conditions.clone();
        self.gen_conditions(id, &conditions, skip.with(Skip::IF))
    }

    /// Fold the condition chain into nested ternaries; a chain without
    /// a final `v-else` falls back to the empty node.
    fn gen_conditions(&mut self, head: NodeId, conditions: &[IfCondition], skip: Skip) -> String {
        let Some((first, rest)) = conditions.split_first() else {
            return "_e()".to_string();
        };
        // Only the chain head re-enters with the IF branch peeled;
        // detached branches carry no conditions of their own.
        let branch_skip = if first.node == head { skip } else { Skip::empty() };
        let branch = self.gen_element(first.node, branch_skip);
        match &first.expression {
            Some(cond) => {
                let span = self.ast.node(first.node).span;
                let cond = self.checked(cond, span, "void 0");
                format!(
                    "({})?{}:{}",
                    cond,
                    branch,
                    self.gen_conditions(head, rest, skip)
                )
            }
            None => branch,
        }
    }

    fn gen_plain_element(&mut self, id: NodeId, _skip: Skip) -> String {
        let span = self.ast.node(id).span;
        let el = self.ast.element(id).unwrap().clone();
        let data = self.gen_data(id, &el);
        let children = self.gen_children(&el);

        let mut parts = vec![format!("'{}'", el.tag)];
        if let Some(data) = data {
            parts.push(data);
        }
        if let Some(children) = children {
            parts.push(children);
        }
        let mut code = format!("_c({})", parts.join(","));
        if self.options.output_source_range {
            code.push_str(&format!("/*span:{}-{}*/", span.start, span.end));
        }
        code
    }

    /// The element's data object: key, directives, merged attributes,
    /// event handlers and module contributions, in that order.
    fn gen_data(&mut self, id: NodeId, el: &Element) -> Option<String> {
        let span = self.ast.node(id).span;
        let mut segments: Vec<String> = Vec::new();

        if let Some(key) = &el.key {
            let key = self.checked(key, span, "undefined");
            segments.push(format!("key:{}", key));
        }

        if !el.directives.is_empty() {
            let mut dirs: Vec<String> = Vec::new();
            for directive in el.directives.values() {
                let handled = self
                    .options
                    .directives
                    .iter()
                    .find(|h| h.name() == directive.name)
                    .and_then(|h| h.gen_directive(self.ast, id, directive));
                let body = match handled {
                    Some(body) => body,
                    None => {
                        let mut fields = vec![
                            format!("name:{}", quote(&directive.name)),
                            format!("rawName:{}", quote(&directive.raw_name)),
                        ];
                        if let Some(expression) = &directive.expression {
                            let value = self.checked(expression, directive.span, "undefined");
                            fields.push(format!("value:({})", value));
                            fields.push(format!("expression:{}", quote(expression)));
                        }
                        if let Some(arg) = &directive.arg {
                            fields.push(format!("arg:{}", quote(arg)));
                        }
                        fields.join(",")
                    }
                };
                dirs.push(format!("{{{}}}", body));
            }
            segments.push(format!("directives:[{}]", dirs.join(",")));
        }

        if !el.attrs.is_empty() || !el.bindings.is_empty() {
            let mut attrs: Vec<String> = Vec::new();
            for (name, value) in &el.attrs {
                attrs.push(format!("{}:{}", quote(name), quote(value)));
            }
            for (name, expression) in &el.bindings {
                let value = self.checked(expression, span, "undefined");
                attrs.push(format!("{}:({})", quote(name), value));
            }
            segments.push(format!("attrs:{{{}}}", attrs.join(",")));
        }

        if !el.events.is_empty() {
            let mut handlers: Vec<String> = Vec::new();
            for (name, expression) in &el.events {
                handlers.push(format!(
                    "{}:{}",
                    quote(name),
                    self.gen_handler(expression, span)
                ));
            }
            segments.push(format!("on:{{{}}}", handlers.join(",")));
        }

        for module in &self.options.modules {
            if let Some(segment) = module.gen_data(self.ast, id) {
                segments.push(segment);
            }
        }

        if segments.is_empty() {
            None
        } else {
            Some(format!("{{{}}}", segments.join(",")))
        }
    }

    /// A bare member path is referenced directly; anything else is
    /// wrapped into a handler taking the event object.
    fn gen_handler(&mut self, expression: &str, span: SourceSpan) -> String {
        let trimmed = expression.trim();
        if SIMPLE_PATH_RE.is_match(trimmed) {
            return trimmed.to_string();
        }
        let checked = self.checked(trimmed, span, "void 0");
        format!("function($event){{return ({})}}", checked)
    }

    fn gen_children(&mut self, el: &Element) -> Option<String> {
        if el.children.is_empty() {
            return None;
        }
        let rendered: Vec<String> = el
            .children
            .clone()
            .into_iter()
            .map(|child| self.gen_node(child, Skip::empty()))
            .collect();
        Some(format!("[{}]", rendered.join(",")))
    }

    fn gen_interpolation(&mut self, pieces: &[TextPiece], span: SourceSpan) -> String {
        let mut parts: Vec<String> = Vec::new();
        for piece in pieces {
            match piece {
                TextPiece::Literal(text) => parts.push(quote(text)),
                TextPiece::Expression(expression) => {
                    let checked = self.checked(expression, span, "void 0");
                    parts.push(format!("_s({})", checked));
                }
            }
        }
        parts.join("+")
    }

    /// Validate an embedded expression; on failure record a codegen
    /// diagnostic and return the no-op fallback instead.
    fn checked(&mut self, expression: &str, span: SourceSpan, fallback: &str) -> String {
        match check_expression(expression) {
            Ok(()) => expression.trim().to_string(),
            Err(reason) => {
                self.errors.push(Diagnostic::codegen(
                    format!("invalid expression \"{}\": {}", expression, reason),
                    Some(span),
                ));
                fallback.to_string()
            }
        }
    }
}
