//! Pipeline orchestration and the compiler factory.
//!
//! The three stages are injected values behind the [`Parse`],
//! [`Optimize`] and [`Generate`] traits; [`BaseCompiler`] chains them
//! and [`create_compiler`] wraps a base compiler with configured
//! defaults, diagnostic collection and the compiled-procedure cache.
//! Any call site may assemble a distinct compiler from alternate stage
//! implementations (for example a generator targeting a different
//! execution model) without touching this orchestration.

use std::sync::Arc;

use crate::cache::{CacheKey, CompiledFunctionCache};
use crate::codegen::{CodeGenerator, GeneratedCode};
use crate::optimizer::StaticOptimizer;
use crate::options::{CompileOptions, CompilerOptions};
use crate::parse_util::{CompileError, Diagnostic, TemplateParseError};
use crate::parser::ast::Ast;
use crate::parser::{HtmlParser, ParseOutcome};
use crate::to_function::{to_function, CompiledFunctions};

/// Parser stage: markup string to arena AST.
pub trait Parse {
    fn parse(
        &self,
        template: &str,
        options: &CompilerOptions,
    ) -> Result<ParseOutcome, TemplateParseError>;
}

/// Optimizer stage: annotates the tree in place.
pub trait Optimize {
    fn optimize(&self, ast: &mut Ast, options: &CompilerOptions);
}

/// Generator stage: annotated tree to code strings.
pub trait Generate {
    fn generate(&self, ast: &Ast, options: &CompilerOptions) -> GeneratedCode;
}

impl Parse for HtmlParser {
    fn parse(
        &self,
        template: &str,
        options: &CompilerOptions,
    ) -> Result<ParseOutcome, TemplateParseError> {
        HtmlParser::parse(self, template, options)
    }
}

impl Optimize for StaticOptimizer {
    fn optimize(&self, ast: &mut Ast, options: &CompilerOptions) {
        StaticOptimizer::optimize(self, ast, options)
    }
}

impl Generate for CodeGenerator {
    fn generate(&self, ast: &Ast, options: &CompilerOptions) -> GeneratedCode {
        CodeGenerator::generate(self, ast, options)
    }
}

/// Everything one compile call produces. Fresh per call, immutable
/// afterwards; the caller owns the tree.
#[derive(Debug)]
pub struct CompiledResult {
    pub ast: Ast,
    pub render: String,
    pub static_render_fns: Vec<String>,
    pub errors: Vec<Diagnostic>,
    pub tips: Vec<Diagnostic>,
}

/// The raw three-stage pipeline over concrete stage implementations.
pub struct BaseCompiler<P, O, G> {
    pub parser: P,
    pub optimizer: O,
    pub generator: G,
}

impl<P: Parse, O: Optimize, G: Generate> BaseCompiler<P, O, G> {
    pub fn new(parser: P, optimizer: O, generator: G) -> Self {
        BaseCompiler {
            parser,
            optimizer,
            generator,
        }
    }

    /// text -> tree -> annotated tree -> code, strictly in that order.
    pub fn compile(
        &self,
        template: &str,
        options: &CompilerOptions,
    ) -> Result<CompiledResult, TemplateParseError> {
        let outcome = self.parser.parse(template.trim(), options)?;
        let ParseOutcome {
            mut ast,
            mut errors,
            mut tips,
        } = outcome;
        self.optimizer.optimize(&mut ast, options);
        let generated = self.generator.generate(&ast, options);
        errors.extend(generated.errors);
        tips.extend(generated.tips);
        Ok(CompiledResult {
            ast,
            render: generated.render,
            static_render_fns: generated.static_render_fns,
            errors,
            tips,
        })
    }
}

/// A base compiler plus configured defaults and the process-wide
/// compiled-procedure cache.
pub struct Compiler<P, O, G> {
    base: BaseCompiler<P, O, G>,
    defaults: CompilerOptions,
    cache: CompiledFunctionCache,
}

/// Compose a reusable compiler from a base pipeline and default
/// options.
pub fn create_compiler<P: Parse, O: Optimize, G: Generate>(
    base: BaseCompiler<P, O, G>,
    defaults: CompilerOptions,
) -> Compiler<P, O, G> {
    Compiler {
        base,
        defaults,
        cache: CompiledFunctionCache::new(),
    }
}

/// The stock compiler over the default stages.
pub type DefaultCompiler = Compiler<HtmlParser, StaticOptimizer, CodeGenerator>;

/// Build the stock compiler.
pub fn create_default_compiler(defaults: CompilerOptions) -> DefaultCompiler {
    create_compiler(
        BaseCompiler::new(HtmlParser::new(), StaticOptimizer::new(), CodeGenerator::new()),
        defaults,
    )
}

impl<P: Parse, O: Optimize, G: Generate> Compiler<P, O, G> {
    pub fn defaults(&self) -> &CompilerOptions {
        &self.defaults
    }

    /// Compile with caller overrides merged over the configured
    /// defaults.
    pub fn compile(
        &self,
        template: &str,
        options: &CompileOptions,
    ) -> Result<CompiledResult, TemplateParseError> {
        let resolved = options.merged(&self.defaults);
        self.base.compile(template, &resolved)
    }

    /// Compile and convert the generated code into invocable render
    /// procedures, cached process-wide by exact template text and
    /// options fingerprint. The cache never evicts; concurrent first
    /// writers race benignly and every caller sees the same entry.
    pub fn compile_to_functions(
        &self,
        template: &str,
    ) -> Result<Arc<CompiledFunctions>, CompileError> {
        self.compile_to_functions_with(template, &CompileOptions::default())
    }

    pub fn compile_to_functions_with(
        &self,
        template: &str,
        options: &CompileOptions,
    ) -> Result<Arc<CompiledFunctions>, CompileError> {
        let resolved = options.merged(&self.defaults);
        let key = CacheKey::new(template, &resolved.fingerprint());
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let result = self.base.compile(template, &resolved)?;
        let mut diagnostics = result.errors.clone();
        diagnostics.extend(result.tips.iter().cloned());

        let render = to_function(&result.render, &diagnostics)?;
        let mut static_render_fns = Vec::with_capacity(result.static_render_fns.len());
        for code in &result.static_render_fns {
            static_render_fns.push(to_function(code, &diagnostics)?);
        }
        let functions = Arc::new(CompiledFunctions {
            render,
            static_render_fns,
        });
        Ok(self.cache.insert_if_absent(key, functions))
    }

    /// Number of cached compiled-procedure entries (test support).
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}
