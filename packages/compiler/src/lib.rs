#![deny(clippy::all)]

//! Declarative template compiler.
//!
//! Compiles markup templates into render code for a reactive view
//! runtime in three stages: parse (markup to arena AST), optimize
//! (static-subtree marking and hoist selection) and generate (render
//! code plus hoisted fragment code). The [`compiler`] module wires the
//! stages into a reusable pipeline; a process-wide default compiler is
//! exposed through the crate-level [`compile`] and
//! [`compile_to_functions`] functions.

use std::sync::Arc;

use once_cell::sync::Lazy;

// Shared infrastructure
pub mod chars;
pub mod options;
pub mod parse_util;

// Pipeline stages
pub mod codegen;
pub mod optimizer;
pub mod parser;

// Orchestration
pub mod cache;
pub mod compiler;
pub mod modules;
pub mod to_function;

pub use codegen::{CodeGenerator, GeneratedCode};
pub use compiler::{
    create_compiler, create_default_compiler, BaseCompiler, CompiledResult, Compiler,
    DefaultCompiler, Generate, Optimize, Parse,
};
pub use modules::{DirectiveHandler, TransformModule};
pub use optimizer::StaticOptimizer;
pub use options::{CompileOptions, CompilerOptions, WhitespaceMode};
pub use parse_util::{
    CompilationError, CompileError, Diagnostic, DiagnosticKind, SourceSpan, TemplateParseError,
};
pub use parser::{HtmlParser, ParseOutcome};
pub use to_function::{CompiledFunctions, RenderProcedure};

static DEFAULT_COMPILER: Lazy<DefaultCompiler> =
    Lazy::new(|| create_default_compiler(CompilerOptions::default()));

/// Compile `template` with the default stages, merging `options` over
/// the stock defaults for this call only.
pub fn compile(
    template: &str,
    options: &CompileOptions,
) -> Result<CompiledResult, TemplateParseError> {
    DEFAULT_COMPILER.compile(template, options)
}

/// Compile `template` into cached render procedures using the default
/// compiler and options.
pub fn compile_to_functions(template: &str) -> Result<Arc<CompiledFunctions>, CompileError> {
    DEFAULT_COMPILER.compile_to_functions(template)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_level_compile_works() {
        let result = compile("<div>{{msg}}</div>", &CompileOptions::default()).unwrap();
        assert_eq!(result.render, "with(this){return _c('div',[_v(_s(msg))])}");
    }

    #[test]
    fn crate_level_functions_are_shared() {
        let a = compile_to_functions("<span>shared entry</span>").unwrap();
        let b = compile_to_functions("<span>shared entry</span>").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
