//! Arena-based template AST.
//!
//! All nodes of one parsed template live in a single [`Ast`] arena and
//! refer to each other through [`NodeId`] indices. Parent links are
//! plain indices too, so the tree stays acyclic by construction and the
//! optimizer can annotate nodes through `&mut Ast` without any aliasing
//! between a pre- and post-optimize tree: there is exactly one tree per
//! compile call and the caller gets it back inside the compiled result.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::parse_util::SourceSpan;

/// Index of a node inside its [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Static-ness metadata written by the optimizer stage. All flags are
/// `false` on a freshly parsed tree and stay `false` when the optimizer
/// is disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticInfo {
    /// Node and every descendant are unaffected by reactive state.
    pub is_static: bool,
    /// Selected as a hoisting unit; expanded once into a cached
    /// static fragment.
    pub static_root: bool,
    /// Hoisted fragment sits inside a repeating construct and must be
    /// keyed per iteration rather than cached once globally.
    pub static_in_for: bool,
    /// Compiled once and never re-rendered (`v-once`).
    pub once: bool,
}

/// A generic directive binding (`v-name:arg="expression"`) that is not
/// one of the structurally recognized ones (`v-if`, `v-for`, `v-once`,
/// `v-bind`, `v-on`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub name: String,
    /// Attribute name exactly as written, e.g. `v-model:value`.
    pub raw_name: String,
    pub arg: Option<String>,
    pub expression: Option<String>,
    pub span: SourceSpan,
}

/// Parsed `v-for` expression, e.g. `(item, index) in list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForInfo {
    pub list: String,
    pub alias: String,
    pub iterator1: Option<String>,
    pub iterator2: Option<String>,
}

/// One branch of a `v-if`/`v-else-if`/`v-else` chain. The chain head
/// element holds the full condition list; `expression` is `None` for
/// the final `v-else` branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IfCondition {
    pub expression: Option<String>,
    pub node: NodeId,
}

/// An element node. Attribute maps preserve source insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    /// Plain attributes with literal values.
    pub attrs: IndexMap<String, String>,
    /// Dynamic attribute bindings (`:name` / `v-bind:name`).
    pub bindings: IndexMap<String, String>,
    /// Event listeners (`@name` / `v-on:name`).
    pub events: IndexMap<String, String>,
    /// Remaining `v-*` directives.
    pub directives: IndexMap<String, Directive>,
    pub for_info: Option<ForInfo>,
    pub if_conditions: Vec<IfCondition>,
    /// `:key` binding, split out because repeat/once codegen needs it.
    pub key: Option<String>,
    pub children: Vec<NodeId>,
    pub self_closing: bool,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            attrs: IndexMap::new(),
            bindings: IndexMap::new(),
            events: IndexMap::new(),
            directives: IndexMap::new(),
            for_info: None,
            if_conditions: Vec::new(),
            key: None,
            children: Vec::new(),
            self_closing: false,
        }
    }

    /// True when the element carries anything the reactivity tracker
    /// would have to watch.
    pub fn has_dynamic_bindings(&self) -> bool {
        !self.bindings.is_empty()
            || !self.events.is_empty()
            || !self.directives.is_empty()
            || self.for_info.is_some()
            || !self.if_conditions.is_empty()
            || self.key.is_some()
    }
}

/// One literal or expression piece of an interpolated text run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextPiece {
    Literal(String),
    Expression(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Element(Element),
    /// Plain text with no interpolation.
    Text { text: String },
    /// Text containing at least one `{{ ... }}` expression.
    Interpolation { raw: String, pieces: Vec<TextPiece> },
    Comment { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    /// Non-owning back-reference; `None` only on the root.
    pub parent: Option<NodeId>,
    pub span: SourceSpan,
    #[serde(rename = "static")]
    pub static_info: StaticInfo,
}

/// The arena holding every node of one parsed template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ast {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Ast {
    pub fn new() -> Self {
        Ast {
            nodes: Vec::new(),
            root: NodeId(0),
        }
    }

    pub fn alloc(&mut self, kind: NodeKind, parent: Option<NodeId>, span: SourceSpan) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent,
            span,
            static_info: StaticInfo::default(),
        });
        id
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// The element payload of `id`, if it is an element node.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.node(id).kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.node_mut(id).kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Child ids of `id` (empty for non-element nodes).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.node(id).kind {
            NodeKind::Element(el) => &el.children,
            _ => &[],
        }
    }

    /// Ids of `id`'s whole subtree in depth-first document order,
    /// `id` included. `v-else`/`v-else-if` branches hang off their
    /// chain head's condition list, not the child list, and are
    /// visited right after the head.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            if let NodeKind::Element(el) = &self.node(next).kind {
                let mut order: Vec<NodeId> = el.children.clone();
                order.extend(el.if_conditions.iter().skip(1).map(|c| c.node));
                order.reverse();
                stack.extend(order);
            }
        }
        out
    }
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}
