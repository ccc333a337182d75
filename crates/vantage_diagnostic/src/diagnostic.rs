use std::fmt;

use vantage_ir::Span;

use crate::ErrorCode;

/// Severity level for a diagnostic.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A labeled span with a message, e.g. the call site of an erroring call.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

impl Label {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Label {
            span,
            message: message.into(),
        }
    }
}

/// A renderable diagnostic produced from a `vantage_object::Error`.
///
/// The engine itself never constructs these — it only ever produces
/// `Error` objects (spec.md §7). Converting one into a `Diagnostic` is
/// the host's job; this type exists so hosts share one rendering
/// pipeline across compiler-front-end and engine-reported errors.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[must_use = "diagnostics should be reported, not silently dropped"]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub severity: Severity,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    /// Named call-stack frames, outermost first, rendered below the
    /// primary message (spec.md §7: "every error message includes
    /// file:line:col and a stack trace of named function frames").
    pub call_stack: Vec<String>,
}

impl Diagnostic {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Diagnostic {
            code,
            severity: Severity::Error,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
            call_stack: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    #[must_use]
    pub fn with_call_stack(mut self, frames: Vec<String>) -> Self {
        self.call_stack = frames;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_methods_accumulate() {
        let diag = Diagnostic::error(ErrorCode::E6002, "identifier not found")
            .with_label(Label::new(Span::DUMMY, "here"))
            .with_note("did you mean `Greet`?")
            .with_call_stack(vec!["main.run".to_string()]);

        assert_eq!(diag.labels.len(), 1);
        assert_eq!(diag.notes.len(), 1);
        assert_eq!(diag.call_stack, vec!["main.run".to_string()]);
    }
}
