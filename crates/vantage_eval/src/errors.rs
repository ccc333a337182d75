//! Centralized error constructors (spec.md §7).
//!
//! A single import point for every evaluation error, matching the
//! teacher's `ori_eval::errors` centralization rationale: one place to
//! change wording, or swap in translation keys, without hunting through
//! every call site.

use std::rc::Rc;

use vantage_ir::Span;
use vantage_object::{Error, ErrorKind, StackFrame};

fn new(kind: ErrorKind, message: impl Into<Rc<str>>, span: Span) -> Error {
    Error::new(kind, message).with_span(span)
}

pub fn parse_error(import_path: &str, message: &str, span: Span) -> Error {
    new(
        ErrorKind::ParseError,
        format!("{import_path}: {message}"),
        span,
    )
}

pub fn identifier_not_found(name: &str, span: Span) -> Error {
    new(
        ErrorKind::IdentifierNotFound,
        format!("identifier not found: {name}"),
        span,
    )
}

pub fn type_mismatch(message: &str, span: Span) -> Error {
    new(ErrorKind::TypeMismatch, message.to_string(), span)
}

pub fn wrong_arity(expected: usize, got: usize, span: Span) -> Error {
    new(
        ErrorKind::WrongArity,
        format!("wrong number of arguments: expected {expected}, got {got}"),
        span,
    )
}

pub fn not_a_function(span: Span) -> Error {
    new(
        ErrorKind::NotAFunction,
        "not a function".to_string(),
        span,
    )
}

pub fn assignment_mismatch(targets: usize, values: usize, span: Span) -> Error {
    new(
        ErrorKind::AssignmentMismatch,
        format!("assignment mismatch: {targets} targets but {values} values"),
        span,
    )
}

pub fn infinite_recursion(function_name: &str, span: Span) -> Error {
    new(
        ErrorKind::InfiniteRecursion,
        format!("infinite recursion detected in {function_name}"),
        span,
    )
}

pub fn step_limit_exceeded(limit: u64) -> Error {
    new(
        ErrorKind::StepLimitExceeded,
        format!("evaluation step limit exceeded: {limit}"),
        Span::DUMMY,
    )
}

pub fn panic(value: vantage_object::Object, span: Span) -> Error {
    new(ErrorKind::Panic, "panic".to_string(), span).with_panic_value(value)
}

pub fn cancellation(span: Span) -> Error {
    new(
        ErrorKind::Cancellation,
        "evaluation cancelled".to_string(),
        span,
    )
}

/// Snapshot the current call stack (most recent frame last) for
/// attachment to an error, per spec.md §7's "every error message
/// includes ... a stack trace of named function frames".
pub fn snapshot_call_stack(frames: &[(Rc<str>, Span)]) -> Vec<StackFrame> {
    frames
        .iter()
        .map(|(name, span)| StackFrame {
            function_name: Rc::clone(name),
            span: *span,
        })
        .collect()
}
