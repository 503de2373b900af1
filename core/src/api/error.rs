//! Public error types.

use std::fmt;
use std::ops::Range;

use quill_types::LibrarySet;
use thiserror::Error;

use crate::evaluator::ExecutionError;

/// Error returned by [`Engine`](super::Engine) and
/// [`CompiledExpression`](super::CompiledExpression).
#[derive(Debug, Error)]
pub enum Error {
    /// The front-end rejected the text. Not retried.
    #[error("compilation of `{text}` failed with {} error(s)", error_count(.diagnostics))]
    Compilation {
        text: String,
        diagnostics: Vec<Diagnostic>,
    },

    /// A name matched two variables of the same scope.
    #[error("`{name}` is ambiguous in `{text}`: more than one variable has that name")]
    AmbiguousBinding { text: String, name: String },

    /// No front-end instance could be created for a library set.
    #[error("cannot create a compiler for {libraries:?}: {reason}")]
    PoolConstruction {
        libraries: LibrarySet,
        reason: String,
    },

    /// The front-end service failed while compiling.
    #[error("front-end failed on `{text}`: {reason}")]
    FrontEnd { text: String, reason: String },

    #[error("runtime error: {0}")]
    Runtime(#[from] ExecutionError),
}

fn error_count(diagnostics: &[Diagnostic]) -> usize {
    diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count()
}

impl Error {
    /// Text of the expression the error is about, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Error::Compilation { text, .. }
            | Error::AmbiguousBinding { text, .. }
            | Error::FrontEnd { text, .. } => Some(text),
            Error::PoolConstruction { .. } | Error::Runtime(_) => None,
        }
    }
}

/// A front-end message about the compiled text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Byte range in the expression text.
    pub span: Option<Range<usize>>,
    /// Optional error code (e.g., "Q0001") for documentation lookup.
    pub code: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            span: None,
            code: None,
        }
    }

    pub fn with_span(mut self, span: Range<usize>) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}
