//! Evaluator Core (spec.md §4.3): walks syntax trees against an
//! `Environment`, driven by the ambient `Services` rather than a
//! mutable `Interpreter` borrow.
//!
//! Organized the way the teacher splits its own `exec/` module: free
//! functions grouped by syntactic category (`expr`, `control`, `call`,
//! `builtins`) rather than methods on a god object, so a function
//! literal's body can be evaluated without re-entering through the
//! facade.

pub mod builtins;
pub mod call;
pub mod control;
pub mod expr;

use std::rc::Rc;

use vantage_ir::{Expr, Span};
use vantage_object::{Error, Object, Package};

use crate::services::Services;
use crate::tracer::NodeKind;

/// Everything a single evaluation call needs beyond the `Environment`
/// it's walking: the shared ambient state, and the package whose
/// import path/scope membership governs identifier-not-found and
/// selector resolution.
#[derive(Clone)]
pub struct EvalCtx<'a> {
    pub services: &'a Rc<Services>,
    pub package: &'a Rc<Package>,
}

impl<'a> EvalCtx<'a> {
    pub fn new(services: &'a Rc<Services>, package: &'a Rc<Package>) -> Self {
        EvalCtx { services, package }
    }

    pub fn is_primary_scope(&self) -> bool {
        self.services.is_primary_scope(&self.package.import_path)
    }
}

/// Advance the step counter and report a trace event for `span`. On
/// step-limit exhaustion or cancellation, returns the `Object::Error`
/// the caller must short-circuit on instead of continuing evaluation.
pub(crate) fn step(ctx: &EvalCtx, kind: NodeKind, span: Span) -> Option<Object> {
    if ctx.services.is_cancelled() {
        return Some(Object::Error(crate::errors::cancellation(span)));
    }
    match ctx.services.tick() {
        Ok(step) => {
            ctx.services.tracer.trace(&crate::tracer::TraceEvent {
                step,
                kind,
                pos: span,
            });
            None
        }
        Err(err) => Some(Object::Error(err)),
    }
}

/// Whether `obj` should short-circuit the enclosing block/loop/switch
/// (spec.md §4.3: "Block evaluation stops on the first ReturnValue,
/// Error, Break, or Continue").
pub fn is_short_circuit(obj: &Object) -> bool {
    matches!(
        obj,
        Object::ReturnValue(_) | Object::Break | Object::Continue | Object::Error(_)
    )
}

fn attach_call_stack(ctx: &EvalCtx, err: Error) -> Error {
    let frames = ctx.services.call_stack_snapshot();
    err.with_call_stack(crate::errors::snapshot_call_stack(&frames))
}

pub(crate) fn error_object(ctx: &EvalCtx, err: Error) -> Object {
    Object::Error(attach_call_stack(ctx, err))
}

/// Evaluate a single expression without a surrounding call/control
/// context, for callers that only have `Services` + `Package` +
/// `Environment` in hand — namely the Package Loader's lazy
/// `var`/`const` initializers (spec.md §4.2), which must call back
/// into the evaluator from inside a `'static` closure.
pub fn eval_expr_standalone(
    services: &Rc<Services>,
    package: &Rc<Package>,
    env: &vantage_object::Environment,
    expr: &Expr,
) -> Object {
    let ctx = EvalCtx::new(services, package);
    expr::eval_expr(&ctx, env, expr)
}
