//! Static-analysis optimization pass.
//!
//! Two walks over the arena: `mark_static` decides per node whether it
//! can ever be affected by reactive state, `mark_static_roots` selects
//! the subtrees worth hoisting into cached fragments. Hoisting turns
//! re-render cost from the full tree size into the dynamic subtree
//! size, so the selection rules deliberately skip degenerate cases
//! where a fragment would not pay for itself.

use crate::options::CompilerOptions;
use crate::parser::ast::{Ast, NodeId, NodeKind};

/// The default optimizer stage.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticOptimizer;

impl StaticOptimizer {
    pub fn new() -> Self {
        StaticOptimizer
    }

    /// Annotate the tree in place. No-op when `options.optimize` is
    /// false: every flag stays unset and codegen hoists nothing.
    pub fn optimize(&self, ast: &mut Ast, options: &CompilerOptions) {
        if !options.optimize {
            return;
        }
        mark_static(ast, ast.root());
        mark_static_roots(ast, ast.root(), false);
    }
}

/// Post-order: a node is static iff it carries nothing the reactivity
/// tracker would watch and every child is static. Returns the flag it
/// stored for the node.
fn mark_static(ast: &mut Ast, id: NodeId) -> bool {
    let is_static = match &ast.node(id).kind {
        NodeKind::Text { .. } | NodeKind::Comment { .. } => true,
        NodeKind::Interpolation { .. } => false,
        NodeKind::Element(el) => {
            let own = !el.has_dynamic_bindings() && !ast.node(id).static_info.once;
            let children = el.children.clone();
            let branches: Vec<NodeId> =
                el.if_conditions.iter().skip(1).map(|c| c.node).collect();
            let mut all_children_static = true;
            for child in children {
                if !mark_static(ast, child) {
                    all_children_static = false;
                }
            }
            // Detached else branches are annotated too; they never
            // make the chain head static (the head is dynamic by
            // having conditions at all).
            for branch in branches {
                mark_static(ast, branch);
            }
            own && all_children_static
        }
    };
    ast.node_mut(id).static_info.is_static = is_static;
    is_static
}

/// Pre-order hoist selection. A static node with real content becomes
/// a `static_root` (or `static_in_for` inside a repeating construct,
/// where the fragment must be keyed per iteration); the walk does not
/// descend into a chosen root since its whole subtree is hoisted with
/// it.
fn mark_static_roots(ast: &mut Ast, id: NodeId, in_for: bool) {
    let NodeKind::Element(el) = &ast.node(id).kind else {
        return;
    };
    let children = el.children.clone();
    let is_for = el.for_info.is_some();
    let info = ast.node(id).static_info;

    if info.is_static || info.once {
        if info.is_static && qualifies_as_root(&children) {
            if in_for {
                ast.node_mut(id).static_info.static_in_for = true;
            } else {
                ast.node_mut(id).static_info.static_root = true;
            }
            return;
        }
        if info.once && in_for {
            ast.node_mut(id).static_info.static_in_for = true;
        }
        if info.is_static {
            // Static without hoistable content means no children, so
            // there is nothing left to walk.
            return;
        }
    }

    // Conditional branches hung off the chain head are rendered
    // through the condition ternary and are not hoist candidates.
    let child_in_for = in_for || is_for;
    for child in children {
        mark_static_roots(ast, child, child_in_for);
    }
}

/// Hoisting a childless element yields no benefit over rendering it
/// inline. Text leaves are never candidates at all: only elements are
/// walked, which keeps a lone static text child from ever being
/// promoted on its own.
fn qualifies_as_root(children: &[NodeId]) -> bool {
    !children.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::HtmlParser;

    fn optimized(template: &str) -> Ast {
        let options = CompilerOptions::default();
        let mut outcome = HtmlParser::new().parse(template, &options).unwrap();
        StaticOptimizer::new().optimize(&mut outcome.ast, &options);
        outcome.ast
    }

    #[test]
    fn fully_static_tree_is_marked() {
        let ast = optimized("<div><p>hi</p></div>");
        let root = ast.root();
        assert!(ast.node(root).static_info.is_static);
        assert!(ast.node(root).static_info.static_root);
        // Descendants are static but not roots themselves.
        let p = ast.children(root)[0];
        assert!(ast.node(p).static_info.is_static);
        assert!(!ast.node(p).static_info.static_root);
    }

    #[test]
    fn lone_static_text_child_is_not_hoisted() {
        let ast = optimized("<div>hi</div>");
        let root = ast.root();
        // The element itself still hoists (it has a child)...
        assert!(ast.node(root).static_info.static_root);
        // ...but the text child is never a root of its own.
        let text = ast.children(root)[0];
        assert!(ast.node(text).static_info.is_static);
        assert!(!ast.node(text).static_info.static_root);
    }

    #[test]
    fn childless_static_element_is_not_a_root() {
        let ast = optimized("<div><span></span>{{x}}</div>");
        let root = ast.root();
        assert!(!ast.node(root).static_info.static_root);
        let span = ast.children(root)[0];
        assert!(ast.node(span).static_info.is_static);
        assert!(!ast.node(span).static_info.static_root);
    }

    #[test]
    fn interpolation_poisons_ancestors() {
        let ast = optimized("<div><p>{{ x }}</p><p>static</p></div>");
        let root = ast.root();
        assert!(!ast.node(root).static_info.is_static);
        let dynamic_p = ast.children(root)[0];
        assert!(!ast.node(dynamic_p).static_info.is_static);
        // The sibling subtree stays static and hoists on its own.
        let static_p = ast.children(root)[1];
        assert!(ast.node(static_p).static_info.is_static);
        assert!(ast.node(static_p).static_info.static_root);
    }

    #[test]
    fn static_monotonicity_holds() {
        let ast = optimized(r#"<div><p>a<b>c</b></p><span :x="y">d</span></div>"#);
        for id in ast.descendants(ast.root()) {
            if ast.node(id).static_info.is_static {
                for desc in ast.descendants(id) {
                    assert!(
                        ast.node(desc).static_info.is_static,
                        "static node has non-static descendant"
                    );
                }
            }
        }
    }

    #[test]
    fn static_root_implies_static() {
        let ast = optimized("<div><p>a<b>c</b></p>{{ x }}</div>");
        for id in ast.descendants(ast.root()) {
            let info = ast.node(id).static_info;
            if info.static_root {
                assert!(info.is_static);
            }
        }
    }

    #[test]
    fn static_inside_for_is_tagged_in_for() {
        let ast = optimized(r#"<ul><li v-for="i in xs"><p><b>s</b></p></li></ul>"#);
        let li = ast.children(ast.root())[0];
        let p = ast.children(li)[0];
        let info = ast.node(p).static_info;
        assert!(info.is_static);
        assert!(info.static_in_for);
        assert!(!info.static_root);
    }

    #[test]
    fn bindings_make_elements_dynamic() {
        let ast = optimized(r#"<div @click="go"><span>x</span></div>"#);
        assert!(!ast.node(ast.root()).static_info.is_static);
    }

    #[test]
    fn optimizer_disabled_leaves_no_flags() {
        let options = CompilerOptions {
            optimize: false,
            ..CompilerOptions::default()
        };
        let mut outcome = HtmlParser::new()
            .parse("<div><p>hi</p></div>", &options)
            .unwrap();
        StaticOptimizer::new().optimize(&mut outcome.ast, &options);
        for id in outcome.ast.descendants(outcome.ast.root()) {
            let info = outcome.ast.node(id).static_info;
            assert!(!info.is_static && !info.static_root && !info.static_in_for);
        }
    }

    #[test]
    fn else_branches_are_annotated() {
        let ast = optimized(r#"<div><p v-if="a">x</p><p v-else><b>s</b></p></div>"#);
        let head = ast.children(ast.root())[0];
        let conditions = &ast.element(head).unwrap().if_conditions;
        let else_node = conditions[1].node;
        // The else branch subtree is statically analyzable on its own.
        assert!(!ast.node(head).static_info.is_static);
        assert!(ast.node(ast.children(else_node)[0]).static_info.is_static);
    }
}
