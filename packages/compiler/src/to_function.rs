//! Conversion of generated code strings into invocable procedures.
//!
//! The generator emits code for a dynamic target runtime; this host
//! cannot execute it, so "invocable" here means a validated, ready-to-
//! hand-off procedure value. Conversion is the one place where a
//! compilation failure is promoted from accumulated diagnostics to a
//! hard error: code that fails the structural check never reaches the
//! cache.

use serde::{Deserialize, Serialize};

use crate::codegen::expr::check_expression;
use crate::parse_util::{CompilationError, Diagnostic};

/// A validated render procedure. Holds the exact code string the
/// generator produced; equality is code equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderProcedure {
    source: String,
}

impl RenderProcedure {
    /// The procedure body as emitted by the generator.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// The cached unit: one render procedure plus the hoisted fragment
/// procedures it refers to by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledFunctions {
    pub render: RenderProcedure,
    pub static_render_fns: Vec<RenderProcedure>,
}

/// Validate `code` and wrap it as a procedure. On failure the error
/// carries the offending code and whatever diagnostics the pipeline
/// accumulated, so the caller can report the full picture.
pub fn to_function(
    code: &str,
    diagnostics: &[Diagnostic],
) -> Result<RenderProcedure, CompilationError> {
    match check_expression(code) {
        Ok(()) => Ok(RenderProcedure {
            source: code.to_string(),
        }),
        Err(reason) => Err(CompilationError {
            reason,
            code: code.to_string(),
            diagnostics: diagnostics.to_vec(),
        }),
    }
}
