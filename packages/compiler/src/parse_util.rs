//! Source spans, diagnostics and the fatal error types shared by every
//! compilation stage.
//!
//! Recoverable problems never abort the pipeline: they are accumulated
//! as [`Diagnostic`] values on the stage results and surface on the
//! final `CompiledResult`. Only the two unrecoverable conditions (no
//! usable root element, generated code that cannot become a procedure)
//! are modeled as Rust errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Byte-offset range into the original template string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        SourceSpan { start, end }
    }

    /// The spanned slice of `source`. Empty when the span is out of
    /// bounds (spans of synthesized recovery nodes may be).
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or("")
    }
}

/// Which stage reported a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Malformed markup fragment; a recovery node was synthesized.
    Parse,
    /// Unparsable embedded expression; a no-op fallback was emitted.
    CodeGen,
    /// Advisory only, reported on the `tips` list.
    Tip,
}

/// A non-fatal problem found while compiling a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    pub span: Option<SourceSpan>,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn parse(message: impl Into<String>, span: SourceSpan) -> Self {
        Diagnostic {
            message: message.into(),
            span: Some(span),
            kind: DiagnosticKind::Parse,
        }
    }

    pub fn codegen(message: impl Into<String>, span: Option<SourceSpan>) -> Self {
        Diagnostic {
            message: message.into(),
            span,
            kind: DiagnosticKind::CodeGen,
        }
    }

    pub fn tip(message: impl Into<String>, span: Option<SourceSpan>) -> Self {
        Diagnostic {
            message: message.into(),
            span,
            kind: DiagnosticKind::Tip,
        }
    }
}

/// Fatal parse failure: no usable root node could be established.
///
/// Carries whatever diagnostics had accumulated before the structural
/// failure was detected.
#[derive(Debug, Clone, Error)]
pub enum TemplateParseError {
    #[error("template must contain exactly one root element, found none")]
    MissingRoot { diagnostics: Vec<Diagnostic> },
    #[error("template must contain exactly one root element, found {count} top-level siblings")]
    MultipleRoots {
        count: usize,
        diagnostics: Vec<Diagnostic>,
    },
}

impl TemplateParseError {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            TemplateParseError::MissingRoot { diagnostics } => diagnostics,
            TemplateParseError::MultipleRoots { diagnostics, .. } => diagnostics,
        }
    }
}

/// Fatal failure to turn a generated code string into an invocable
/// render procedure. Reports the offending code plus every diagnostic
/// accumulated during the compile that produced it.
#[derive(Debug, Clone, Error)]
#[error("generated code is not a valid render procedure: {reason}")]
pub struct CompilationError {
    pub reason: String,
    pub code: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Umbrella error for `compile_to_functions`.
#[derive(Debug, Clone, Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] TemplateParseError),
    #[error(transparent)]
    Compilation(#[from] CompilationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_slices_source() {
        let span = SourceSpan::new(1, 4);
        assert_eq!(span.slice("<div>"), "div");
    }

    #[test]
    fn out_of_bounds_span_is_empty() {
        let span = SourceSpan::new(10, 20);
        assert_eq!(span.slice("<p>"), "");
    }

    #[test]
    fn parse_error_exposes_diagnostics() {
        let err = TemplateParseError::MissingRoot {
            diagnostics: vec![Diagnostic::parse("oops", SourceSpan::new(0, 1))],
        };
        assert_eq!(err.diagnostics().len(), 1);
        assert!(err.to_string().contains("found none"));
    }
}
