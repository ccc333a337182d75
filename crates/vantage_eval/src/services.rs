//! Ambient services shared by every evaluation function.
//!
//! Rather than threading a dozen separate fields through every `eval_*`
//! function, they're grouped into one `Rc<Services>` and passed by
//! reference. Every field is internally mutable (`RefCell`/`Cell`/the
//! lock already inside `TypeRelations`), so cloning the `Rc` and
//! capturing it in a package-level variable's lazy initializer
//! (`loader::materialize`) observes the same registries, call stack,
//! and step counter as the rest of evaluation — this is what lets a
//! `var`'s lazy thunk call back into the full evaluator without the
//! circular-ownership problem a `&mut Interpreter` borrow would create.
//!
//! `Services` outliving the `Interpreter` that built it, kept alive by
//! a lazy initializer closure stored in a package's environment, is an
//! accepted reference cycle in the same family as the function/environment
//! cycle spec.md §9 already mandates tolerating: the whole graph is
//! dropped together when the `Interpreter` and every `Package` it
//! cached are dropped.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use vantage_diagnostic::Logger;
use vantage_ir::{NameInterner, Scanner, Span};
use vantage_object::Error;

use crate::intrinsics::IntrinsicRegistry;
use crate::loader::PackageLoader;
use crate::memo::MemoCache;
use crate::scope_pattern::ScopePattern;
use crate::tracer::Tracer;
use crate::type_relations::TypeRelations;

/// One entry of the call stack, used for infinite-recursion detection
/// and error call-stack snapshots.
#[derive(Clone)]
pub struct CallFrame {
    pub function_identity: usize,
    pub function_name: Rc<str>,
    pub span: Span,
}

pub struct Services {
    pub scanner: Rc<dyn Scanner>,
    pub interner: Rc<NameInterner>,
    pub logger: Rc<dyn Logger>,
    pub tracer: Rc<dyn Tracer>,
    pub loader: PackageLoader,
    pub type_relations: TypeRelations,
    pub intrinsics: RefCell<IntrinsicRegistry>,
    pub memo: MemoCache,
    pub memoize: bool,
    pub step_count: Cell<u64>,
    pub step_limit: u64,
    pub call_stack: RefCell<Vec<CallFrame>>,
    pub cancelled: Cell<bool>,
    pub primary_scope: Vec<ScopePattern>,
    pub symbolic_scope: Vec<ScopePattern>,
    pub scan_policy_override: Option<Rc<dyn Fn(&str) -> bool>>,
}

impl Services {
    /// Advance the step counter and check it against the budget. On
    /// exhaustion, returns the `StepLimitExceeded` error the caller
    /// should short-circuit evaluation with (spec.md §4.7).
    pub fn tick(&self) -> Result<u64, Error> {
        let step = self.step_count.get();
        if step >= self.step_limit {
            return Err(crate::errors::step_limit_exceeded(self.step_limit));
        }
        self.step_count.set(step + 1);
        Ok(step)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// Whether `import_path` is in primary-analysis scope. Governed by
    /// the override callback when present, else by `primary_scope`
    /// patterns (spec.md §4.6: empty pattern list means everything is
    /// in scope).
    pub fn is_primary_scope(&self, import_path: &str) -> bool {
        if let Some(override_fn) = &self.scan_policy_override {
            return override_fn(import_path);
        }
        crate::scope_pattern::matches_any(&self.primary_scope, import_path)
    }

    pub fn is_symbolic_scope(&self, import_path: &str) -> bool {
        crate::scope_pattern::matches_any(&self.symbolic_scope, import_path)
    }

    pub fn call_stack_snapshot(&self) -> Vec<(Rc<str>, Span)> {
        self.call_stack
            .borrow()
            .iter()
            .map(|frame| (Rc::clone(&frame.function_name), frame.span))
            .collect()
    }
}
