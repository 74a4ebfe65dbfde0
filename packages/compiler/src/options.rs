//! Compiler configuration.
//!
//! [`CompilerOptions`] is the fully resolved configuration every stage
//! receives (by reference, never retained beyond the call).
//! [`CompileOptions`] is the caller-facing partial form: unset fields
//! inherit the compiler's configured defaults and module/directive
//! lists are appended rather than replaced.

use std::sync::Arc;

use serde::Serialize;

use crate::modules::{DirectiveHandler, TransformModule};

/// How insignificant whitespace in text is handled during parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WhitespaceMode {
    /// Keep text content verbatim.
    Preserve,
    /// Collapse whitespace runs to a single space and drop
    /// whitespace-only text nodes between tags.
    Condense,
}

/// Resolved configuration for one compile call.
#[derive(Clone)]
pub struct CompilerOptions {
    /// Run the static optimizer (default true).
    pub optimize: bool,
    pub whitespace: WhitespaceMode,
    /// Interpolation delimiters; `None` means the default `{{` `}}`.
    pub delimiters: Option<(String, String)>,
    /// Keep comment nodes in the tree and render output.
    pub comments: bool,
    /// Emit `/*span:start-end*/` hints after node expressions.
    pub output_source_range: bool,
    pub modules: Vec<Arc<dyn TransformModule>>,
    pub directives: Vec<Arc<dyn DirectiveHandler>>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            optimize: true,
            whitespace: WhitespaceMode::Condense,
            delimiters: None,
            comments: false,
            output_source_range: false,
            modules: Vec::new(),
            directives: Vec::new(),
        }
    }
}

impl std::fmt::Debug for CompilerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilerOptions")
            .field("optimize", &self.optimize)
            .field("whitespace", &self.whitespace)
            .field("delimiters", &self.delimiters)
            .field("comments", &self.comments)
            .field("output_source_range", &self.output_source_range)
            .field("modules", &self.modules.iter().map(|m| m.name().to_string()).collect::<Vec<_>>())
            .field("directives", &self.directives.iter().map(|d| d.name().to_string()).collect::<Vec<_>>())
            .finish()
    }
}

impl CompilerOptions {
    /// Stable fingerprint of everything that can change compiled
    /// output, used with the template text as the compiled-template
    /// cache key. Modules and directive handlers participate through
    /// their names.
    pub fn fingerprint(&self) -> String {
        #[derive(Serialize)]
        struct Fingerprint<'a> {
            optimize: bool,
            whitespace: WhitespaceMode,
            delimiters: &'a Option<(String, String)>,
            comments: bool,
            output_source_range: bool,
            modules: Vec<&'a str>,
            directives: Vec<&'a str>,
        }

        let fp = Fingerprint {
            optimize: self.optimize,
            whitespace: self.whitespace,
            delimiters: &self.delimiters,
            comments: self.comments,
            output_source_range: self.output_source_range,
            modules: self.modules.iter().map(|m| m.name()).collect(),
            directives: self.directives.iter().map(|d| d.name()).collect(),
        };
        // Field order is fixed by the struct, so the encoding is stable.
        serde_json::to_string(&fp).unwrap_or_default()
    }
}

/// Caller-supplied overrides merged over a compiler's configured
/// defaults. `Default` inherits everything.
#[derive(Clone, Default)]
pub struct CompileOptions {
    pub optimize: Option<bool>,
    pub whitespace: Option<WhitespaceMode>,
    pub delimiters: Option<(String, String)>,
    pub comments: Option<bool>,
    pub output_source_range: Option<bool>,
    /// Appended after the compiler's configured modules.
    pub modules: Vec<Arc<dyn TransformModule>>,
    /// Appended after the compiler's configured directive handlers.
    pub directives: Vec<Arc<dyn DirectiveHandler>>,
}

impl CompileOptions {
    /// Resolve against `defaults`: scalars overwrite when set, lists
    /// concatenate defaults-then-caller.
    pub fn merged(&self, defaults: &CompilerOptions) -> CompilerOptions {
        let mut resolved = defaults.clone();
        if let Some(optimize) = self.optimize {
            resolved.optimize = optimize;
        }
        if let Some(whitespace) = self.whitespace {
            resolved.whitespace = whitespace;
        }
        if let Some(delimiters) = &self.delimiters {
            resolved.delimiters = Some(delimiters.clone());
        }
        if let Some(comments) = self.comments {
            resolved.comments = comments;
        }
        if let Some(range) = self.output_source_range {
            resolved.output_source_range = range;
        }
        resolved.modules.extend(self.modules.iter().cloned());
        resolved.directives.extend(self.directives.iter().cloned());
        resolved
    }
}
