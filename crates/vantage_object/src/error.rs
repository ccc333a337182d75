//! Error objects (spec.md §7).
//!
//! Every error kind carries a source position and a formatted
//! call-stack snapshot, matching the spec's "every error message
//! includes file:line:col and a stack trace of named function frames".

use std::rc::Rc;

use vantage_ir::Span;

use crate::object::Object;

/// One frame of a call-stack snapshot, named after the function that
/// was executing, for display in error messages.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StackFrame {
    pub function_name: Rc<str>,
    pub span: Span,
}

/// The kind of evaluation error (spec.md §7). `#[non_exhaustive]` since
/// a host consuming this enum should not break when a new internal
/// error kind is added.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Surfaced from the scanner; fatal to the triggering evaluation.
    ParseError,
    /// Raised only when the enclosing package is in primary scope.
    IdentifierNotFound,
    /// Operator mismatch when both operands are concrete.
    TypeMismatch,
    /// Function application with mismatched non-variadic arity.
    WrongArity,
    /// Callee is neither `Function` nor `Intrinsic` nor a callable placeholder.
    NotAFunction,
    /// Multi-assign arity disagreement.
    AssignmentMismatch,
    /// Same function object reentered with the same caller frame on the stack.
    InfiniteRecursion,
    /// Evaluation budget exhausted.
    StepLimitExceeded,
    /// Program-level panic, carrying the panicked value (possibly `Nil`).
    Panic,
    /// Caller context cancelled.
    Cancellation,
}

/// An evaluation error. This is itself an `Object` variant (spec.md
/// §3), since bounded analysis routes errors through the same value
/// channel as everything else rather than a separate exception type.
#[derive(Clone, Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: Rc<str>,
    pub span: Option<Span>,
    pub call_stack: Rc<[StackFrame]>,
    /// If this error wraps a program-level panic value, the panicked
    /// object (`Nil` is valid and must not be treated as "no value").
    pub panic_value: Option<Rc<Object>>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<Rc<str>>) -> Self {
        Error {
            kind,
            message: message.into(),
            span: None,
            call_stack: Rc::from([]),
            panic_value: None,
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    #[must_use]
    pub fn with_call_stack(mut self, frames: Vec<StackFrame>) -> Self {
        self.call_stack = frames.into();
        self
    }

    #[must_use]
    pub fn with_panic_value(mut self, value: Object) -> Self {
        self.panic_value = Some(Rc::new(value));
        self
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(span) = self.span {
            write!(f, "{}:{}: {}", span.file, span.start, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}
