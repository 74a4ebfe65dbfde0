//! Extension points injected through `CompilerOptions`.
//!
//! Modules are consulted by the parser as each element closes and by
//! the code generator while assembling an element's data object;
//! directive handlers may take over code generation for a custom
//! directive. Both are identified by a stable `name` so distinct
//! module sets produce distinct compiled-template cache fingerprints.

use crate::parse_util::Diagnostic;
use crate::parser::ast::{Ast, Directive, NodeId};

/// An injected transform consulted by the parser and code generator.
pub trait TransformModule: Send + Sync {
    /// Stable identifier, part of the options fingerprint.
    fn name(&self) -> &str;

    /// Called by the tree builder right after the element is closed
    /// and its attributes classified. May rewrite the element in place
    /// and report non-fatal diagnostics.
    fn transform_element(&self, _ast: &mut Ast, _id: NodeId, _diagnostics: &mut Vec<Diagnostic>) {}

    /// Extra segment for the element's data object, without braces,
    /// e.g. `staticClass:"red"`. `None` contributes nothing.
    fn gen_data(&self, _ast: &Ast, _id: NodeId) -> Option<String> {
        None
    }
}

/// Custom code generation for a directive the core does not know.
pub trait DirectiveHandler: Send + Sync {
    /// Directive name without the `v-` prefix, part of the options
    /// fingerprint.
    fn name(&self) -> &str;

    /// Emit the runtime directive descriptor body for `directive`,
    /// without braces. `None` falls back to the generic descriptor.
    fn gen_directive(&self, _ast: &Ast, _id: NodeId, _directive: &Directive) -> Option<String> {
        None
    }
}
