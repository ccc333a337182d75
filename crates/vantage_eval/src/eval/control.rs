//! Statement and control-flow evaluation (spec.md §4.3/§4.1).
//!
//! Bounded analysis: `if` evaluates both branches (for call-site
//! coverage), `for`/`range` evaluate their body exactly once, and
//! `switch` evaluates every case once. Because `Environment::assign`
//! mutates the target cell in place immediately, evaluating branches in
//! a fixed textual order (`then` before `else`, case order for
//! `switch`) already gives the "latest writer wins" merge spec.md §4.1
//! calls for — no separate write-log/replay step is needed.

use std::rc::Rc;

use vantage_ir::{AssignOp, Block, Expr, Name, Span, Stmt, UnaryOp};
use vantage_object::{AssignError, Environment, Object, SymbolicPlaceholder};

use super::expr::{eval_expr, map_key_of};
use super::{error_object, is_short_circuit, step, EvalCtx};
use crate::tracer::NodeKind;

pub fn eval_block(ctx: &EvalCtx, env: &Environment, block: &Block) -> Object {
    for stmt in &block.stmts {
        let result = eval_stmt(ctx, env, stmt);
        if is_short_circuit(&result) {
            return result;
        }
    }
    Object::Nil
}

pub fn eval_stmt(ctx: &EvalCtx, env: &Environment, stmt: &Stmt) -> Object {
    if let Some(err) = step(ctx, NodeKind::Stmt, stmt_span(stmt)) {
        return err;
    }
    match stmt {
        Stmt::Expr(expr) => eval_expr(ctx, env, expr),
        Stmt::Assign {
            op,
            targets,
            values,
            span,
        } => eval_assign(ctx, env, *op, targets, values, *span),
        Stmt::Return { values, .. } => eval_return(ctx, env, values),
        Stmt::If {
            cond,
            then_branch,
            else_branch,
            ..
        } => eval_if(ctx, env, cond, then_branch, else_branch.as_ref()),
        Stmt::For {
            init,
            cond,
            post,
            body,
            ..
        } => eval_for(ctx, env, init.as_deref(), cond.as_ref(), post.as_deref(), body),
        Stmt::Range {
            key,
            value,
            iterable,
            body,
            ..
        } => eval_range(ctx, env, *key, *value, iterable, body),
        Stmt::Switch { tag, cases, .. } => eval_switch(ctx, env, tag.as_ref(), cases),
        Stmt::Break(_) => Object::Break,
        Stmt::Continue(_) => Object::Continue,
        Stmt::Block(block) => eval_block(ctx, &Environment::new_enclosed(env), block),
        Stmt::Decl {
            name, mutable, init, ..
        } => eval_decl(ctx, env, *name, *mutable, init.as_ref()),
    }
}

fn stmt_span(stmt: &Stmt) -> Span {
    match stmt {
        Stmt::Expr(expr) => expr.span(),
        Stmt::Assign { span, .. }
        | Stmt::Return { span, .. }
        | Stmt::If { span, .. }
        | Stmt::For { span, .. }
        | Stmt::Range { span, .. }
        | Stmt::Switch { span, .. } => *span,
        Stmt::Break(span) | Stmt::Continue(span) => *span,
        Stmt::Block(block) => block.stmts.first().map(stmt_span).unwrap_or(Span::DUMMY),
        Stmt::Decl { span, .. } => *span,
    }
}

fn eval_return(ctx: &EvalCtx, env: &Environment, values: &[Expr]) -> Object {
    match values.len() {
        0 => Object::ReturnValue(Box::new(Object::Nil)),
        1 => {
            let value = eval_expr(ctx, env, &values[0]);
            if matches!(value, Object::Error(_)) {
                return value;
            }
            Object::ReturnValue(Box::new(value))
        }
        _ => {
            let mut evaluated = Vec::with_capacity(values.len());
            for value_expr in values {
                let value = eval_expr(ctx, env, value_expr);
                if matches!(value, Object::Error(_)) {
                    return value;
                }
                evaluated.push(value);
            }
            Object::ReturnValue(Box::new(Object::MultiReturn(evaluated)))
        }
    }
}

/// `if`: both branches run, each in its own child scope, in fixed
/// textual order. The branch actually selected by `cond` determines
/// which control marker (if any) is reported upward, since only one
/// branch's `return`/`break`/`continue` is "real" in an honest
/// execution — but both branches' side effects on outer variables have
/// already landed by the time either marker is inspected.
fn eval_if(ctx: &EvalCtx, env: &Environment, cond: &Expr, then_branch: &Block, else_branch: Option<&Block>) -> Object {
    let cond_value = eval_expr(ctx, env, cond);
    if matches!(cond_value, Object::Error(_)) {
        return cond_value;
    }
    let then_scope = Environment::new_enclosed(env);
    let then_result = eval_block(ctx, &then_scope, then_branch);

    let else_result = else_branch.map(|branch| {
        let else_scope = Environment::new_enclosed(env);
        eval_block(ctx, &else_scope, branch)
    });

    let cond_true = cond_value.is_truthy();
    match (cond_true, else_result) {
        (true, _) => then_result,
        (false, Some(else_result)) => else_result,
        (false, None) => Object::Nil,
    }
}

fn eval_for(
    ctx: &EvalCtx,
    env: &Environment,
    init: Option<&Stmt>,
    cond: Option<&Expr>,
    post: Option<&Stmt>,
    body: &Block,
) -> Object {
    let loop_scope = Environment::new_enclosed(env);
    if let Some(init) = init {
        let result = eval_stmt(ctx, &loop_scope, init);
        if matches!(result, Object::Error(_)) {
            return result;
        }
    }
    if let Some(cond) = cond {
        let result = eval_expr(ctx, &loop_scope, cond);
        if matches!(result, Object::Error(_)) {
            return result;
        }
    }
    let body_scope = Environment::new_enclosed(&loop_scope);
    let body_result = eval_block(ctx, &body_scope, body);
    if let Some(post) = post {
        let result = eval_stmt(ctx, &loop_scope, post);
        if matches!(result, Object::Error(_)) {
            return result;
        }
    }
    unwrap_loop_result(body_result)
}

fn eval_range(ctx: &EvalCtx, env: &Environment, key: Option<Name>, value: Option<Name>, iterable: &Expr, body: &Block) -> Object {
    let container = eval_expr(ctx, env, iterable);
    if matches!(container, Object::Error(_)) {
        return container;
    }
    let loop_scope = Environment::new_enclosed(env);
    let (first_key, first_value) = first_entry(&container);
    if let Some(key_name) = key {
        loop_scope.define(key_name, first_key);
    }
    if let Some(value_name) = value {
        loop_scope.define(value_name, first_value);
    }
    let body_result = eval_block(ctx, &loop_scope, body);
    unwrap_loop_result(body_result)
}

fn first_entry(container: &Object) -> (Object, Object) {
    match container {
        Object::Slice(items) => {
            let items = items.borrow();
            match items.first() {
                Some(first) => (Object::int(0), first.clone()),
                None => (
                    Object::SymbolicPlaceholder(SymbolicPlaceholder::new("range index")),
                    Object::SymbolicPlaceholder(SymbolicPlaceholder::new("range element")),
                ),
            }
        }
        Object::Map(entries) => {
            let entries = entries.borrow();
            match entries.iter().next() {
                Some((k, v)) => (Object::string(Rc::clone(k)), v.clone()),
                None => (
                    Object::SymbolicPlaceholder(SymbolicPlaceholder::new("range key")),
                    Object::SymbolicPlaceholder(SymbolicPlaceholder::new("range value")),
                ),
            }
        }
        _ => (
            Object::SymbolicPlaceholder(SymbolicPlaceholder::new("range key")),
            Object::SymbolicPlaceholder(SymbolicPlaceholder::new("range value")),
        ),
    }
}

/// A loop body's `Break`/`Continue` is consumed here (they never
/// propagate past their own loop); `ReturnValue`/`Error` keep
/// short-circuiting outward.
fn unwrap_loop_result(body_result: Object) -> Object {
    match body_result {
        Object::Break | Object::Continue => Object::Nil,
        other => other,
    }
}

fn eval_switch(ctx: &EvalCtx, env: &Environment, tag: Option<&Expr>, cases: &[vantage_ir::CaseClause]) -> Object {
    let tag_value = match tag {
        Some(tag_expr) => {
            let value = eval_expr(ctx, env, tag_expr);
            if matches!(value, Object::Error(_)) {
                return value;
            }
            Some(value)
        }
        None => None,
    };

    let mut matched_result = None;
    for case in cases {
        let is_default = case.values.is_empty();
        let mut matches_tag = is_default;
        for value_expr in &case.values {
            let value = eval_expr(ctx, env, value_expr);
            if matches!(value, Object::Error(_)) {
                return value;
            }
            if let Some(tag_value) = &tag_value {
                if scalar_equalish(tag_value, &value) {
                    matches_tag = true;
                }
            }
        }
        let case_scope = Environment::new_enclosed(env);
        let result = eval_block(ctx, &case_scope, &case.body);
        if matches_tag && matched_result.is_none() {
            matched_result = Some(result);
        } else if matches!(result, Object::Error(_)) && matched_result.is_none() {
            matched_result = Some(result);
        }
    }
    match matched_result {
        Some(result) => unwrap_loop_result(result),
        None => Object::Nil,
    }
}

fn scalar_equalish(a: &Object, b: &Object) -> bool {
    match (a, b) {
        (Object::Int(x), Object::Int(y)) => x == y,
        (Object::String(x), Object::String(y)) => x == y,
        (Object::Bool(x), Object::Bool(y)) => x == y,
        _ => false,
    }
}

fn eval_decl(ctx: &EvalCtx, env: &Environment, name: Name, mutable: bool, init: Option<&Expr>) -> Object {
    let value = match init {
        Some(expr) => {
            let value = eval_expr(ctx, env, expr);
            if matches!(value, Object::Error(_)) {
                return value;
            }
            value
        }
        None => Object::Nil,
    };
    if mutable {
        env.define(name, value);
    } else {
        env.define_const(name, value);
    }
    Object::Nil
}

fn eval_assign(ctx: &EvalCtx, env: &Environment, op: AssignOp, targets: &[Expr], values: &[Expr], span: Span) -> Object {
    let evaluated = match evaluate_rhs(ctx, env, targets.len(), values) {
        Ok(values) => values,
        Err(err) => return err,
    };
    if evaluated.len() != targets.len() {
        return error_object(ctx, crate::errors::assignment_mismatch(targets.len(), evaluated.len(), span));
    }
    for (target, value) in targets.iter().zip(evaluated) {
        let result = match op {
            AssignOp::Define => define_target(ctx, env, target, value),
            AssignOp::Assign => assign_target(ctx, env, target, value, span),
        };
        if matches!(result, Object::Error(_)) {
            return result;
        }
    }
    Object::Nil
}

/// Evaluate the right-hand side, always left to right regardless of the
/// assignment target shape (spec.md §4.1 "index assignment always
/// evaluates the RHS first" generalizes to every target kind here).
/// Handles the `a, b := f()` multi-return destructuring case.
fn evaluate_rhs(ctx: &EvalCtx, env: &Environment, target_count: usize, values: &[Expr]) -> Result<Vec<Object>, Object> {
    if values.len() == 1 && target_count > 1 {
        let value = eval_expr(ctx, env, &values[0]);
        if matches!(value, Object::Error(_)) {
            return Err(value);
        }
        return Ok(match value {
            Object::MultiReturn(items) => items,
            other => vec![other],
        });
    }
    let mut evaluated = Vec::with_capacity(values.len());
    for value_expr in values {
        let value = eval_expr(ctx, env, value_expr);
        if matches!(value, Object::Error(_)) {
            return Err(value);
        }
        evaluated.push(value);
    }
    Ok(evaluated)
}

fn define_target(ctx: &EvalCtx, env: &Environment, target: &Expr, value: Object) -> Object {
    match target {
        Expr::Ident { name, .. } => {
            env.define(*name, value);
            Object::Nil
        }
        other => error_object(ctx, crate::errors::type_mismatch("invalid define target", other.span())),
    }
}

fn assign_target(ctx: &EvalCtx, env: &Environment, target: &Expr, value: Object, span: Span) -> Object {
    match target {
        Expr::Ident { name, .. } => match env.assign(*name, value.clone()) {
            Ok(()) => Object::Nil,
            Err(AssignError::Immutable) => {
                error_object(ctx, crate::errors::type_mismatch("cannot assign to constant", span))
            }
            Err(AssignError::Undefined) => {
                if ctx.is_primary_scope() {
                    error_object(ctx, crate::errors::identifier_not_found(&ctx.services.interner.resolve(*name), span))
                } else {
                    env.define(*name, value);
                    Object::Nil
                }
            }
        },
        Expr::Selector { receiver, field, .. } => {
            let receiver_value = eval_expr(ctx, env, receiver);
            if matches!(receiver_value, Object::Error(_)) {
                return receiver_value;
            }
            assign_field(ctx, &receiver_value, *field, value, span)
        }
        Expr::Unary { op: UnaryOp::Deref, operand, .. } => {
            let pointer = eval_expr(ctx, env, operand);
            match pointer {
                Object::Pointer(cell) | Object::Variable(cell) => {
                    cell.set(value);
                    Object::Nil
                }
                Object::Error(err) => Object::Error(err),
                Object::SymbolicPlaceholder(_) => Object::Nil,
                _ => error_object(ctx, crate::errors::type_mismatch("cannot assign through non-pointer value", span)),
            }
        }
        Expr::Index { receiver, index, .. } => {
            let container = eval_expr(ctx, env, receiver);
            if matches!(container, Object::Error(_)) {
                return container;
            }
            let key = eval_expr(ctx, env, index);
            if matches!(key, Object::Error(_)) {
                return key;
            }
            assign_index(ctx, &container, &key, value)
        }
        other => error_object(ctx, crate::errors::type_mismatch("invalid assignment target", other.span())),
    }
}

fn assign_field(ctx: &EvalCtx, receiver: &Object, field: Name, value: Object, span: Span) -> Object {
    match receiver {
        Object::Instance(instance) => {
            instance.set_field(field, value);
            Object::Nil
        }
        Object::Pointer(cell) | Object::Variable(cell) => {
            let inner = cell.get();
            if let Object::Instance(instance) = &inner {
                instance.set_field(field, value);
                Object::Nil
            } else {
                error_object(ctx, crate::errors::type_mismatch("field assignment on non-struct pointer", span))
            }
        }
        Object::SymbolicPlaceholder(_) => Object::Nil,
        _ => error_object(ctx, crate::errors::type_mismatch("field assignment on non-struct value", span)),
    }
}

fn assign_index(ctx: &EvalCtx, container: &Object, key: &Object, value: Object) -> Object {
    match container {
        Object::Slice(items) => {
            if let Object::Int(i) = key {
                if let Ok(idx) = usize::try_from(*i) {
                    let mut items = items.borrow_mut();
                    if idx < items.len() {
                        items[idx] = value;
                    }
                }
            }
            Object::Nil
        }
        Object::Map(entries) => {
            let map_key = map_key_of(ctx, key);
            entries.borrow_mut().insert(map_key, value);
            Object::Nil
        }
        // Container shape unknown: the RHS (and key) were already
        // evaluated above for coverage; nothing further to record.
        _ => Object::Nil,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::Services;
    use rustc_hash::FxHashMap;
    use std::cell::{Cell, RefCell};
    use vantage_diagnostic::NullLogger;
    use vantage_ir::{BinOp, Lit, NameInterner};
    use vantage_object::Package;

    struct FakeScanner;
    impl vantage_ir::Scanner for FakeScanner {
        fn scan_package_by_import(&self, import_path: &str) -> Result<vantage_ir::PackageMeta, vantage_ir::ScanError> {
            Err(vantage_ir::ScanError {
                import_path: Rc::from(import_path),
                message: "not found".into(),
            })
        }
        fn scan_files(&self, _paths: &[&str]) -> Result<vantage_ir::PackageMeta, vantage_ir::ScanError> {
            unimplemented!()
        }
        fn modules(&self) -> Vec<vantage_ir::ModuleInfo> {
            vec![]
        }
    }

    fn test_services(interner: Rc<NameInterner>) -> Rc<Services> {
        Rc::new(Services {
            scanner: Rc::new(FakeScanner),
            interner: Rc::clone(&interner),
            logger: Rc::new(NullLogger),
            tracer: Rc::new(crate::tracer::NullTracer),
            loader: crate::loader::PackageLoader::new(Rc::new(FakeScanner), interner),
            type_relations: crate::type_relations::TypeRelations::new(),
            intrinsics: RefCell::new(crate::intrinsics::IntrinsicRegistry::new()),
            memo: crate::memo::MemoCache::new(),
            memoize: false,
            step_count: Cell::new(0),
            step_limit: 10_000,
            call_stack: RefCell::new(Vec::new()),
            cancelled: Cell::new(false),
            primary_scope: vec![],
            symbolic_scope: vec![],
            scan_policy_override: None,
        })
    }

    fn test_services_out_of_scope(interner: Rc<NameInterner>) -> Rc<Services> {
        Rc::new(Services {
            scanner: Rc::new(FakeScanner),
            interner: Rc::clone(&interner),
            logger: Rc::new(NullLogger),
            tracer: Rc::new(crate::tracer::NullTracer),
            loader: crate::loader::PackageLoader::new(Rc::new(FakeScanner), interner),
            type_relations: crate::type_relations::TypeRelations::new(),
            intrinsics: RefCell::new(crate::intrinsics::IntrinsicRegistry::new()),
            memo: crate::memo::MemoCache::new(),
            memoize: false,
            step_count: Cell::new(0),
            step_limit: 10_000,
            call_stack: RefCell::new(Vec::new()),
            cancelled: Cell::new(false),
            primary_scope: vec![],
            symbolic_scope: vec![],
            scan_policy_override: Some(Rc::new(|_: &str| false)),
        })
    }

    fn ident(name: Name) -> Expr {
        Expr::Ident { span: Span::DUMMY, name }
    }

    fn int_lit(value: i64) -> Expr {
        Expr::Lit { span: Span::DUMMY, value: Lit::Int(value) }
    }

    #[test]
    fn if_evaluates_both_branches_for_call_site_coverage() {
        let interner = Rc::new(NameInterner::new());
        let services = test_services(Rc::clone(&interner));
        let package = Rc::new(Package::new("pkg/a", "a"));
        let ctx = EvalCtx::new(&services, &package);
        let env = Environment::new();
        let seen_then = interner.intern("seen_then");
        let seen_else = interner.intern("seen_else");
        env.define(seen_then, Object::bool(false));
        env.define(seen_else, Object::bool(false));

        let then_branch = Block {
            stmts: vec![Stmt::Assign {
                op: AssignOp::Assign,
                targets: vec![ident(seen_then)],
                values: vec![Expr::Lit { span: Span::DUMMY, value: Lit::Bool(true) }],
                span: Span::DUMMY,
            }],
        };
        let else_branch = Block {
            stmts: vec![Stmt::Assign {
                op: AssignOp::Assign,
                targets: vec![ident(seen_else)],
                values: vec![Expr::Lit { span: Span::DUMMY, value: Lit::Bool(true) }],
                span: Span::DUMMY,
            }],
        };
        eval_if(&ctx, &env, &Expr::Lit { span: Span::DUMMY, value: Lit::Bool(true) }, &then_branch, Some(&else_branch));

        assert!(matches!(env.get(seen_then), Some(Object::Bool(true))));
        assert!(matches!(env.get(seen_else), Some(Object::Bool(true))));
    }

    #[test]
    fn assign_always_evaluates_rhs_exactly_once_even_through_a_variable_cell() {
        let interner = Rc::new(NameInterner::new());
        let services = test_services(Rc::clone(&interner));
        let package = Rc::new(Package::new("pkg/a", "a"));
        let ctx = EvalCtx::new(&services, &package);
        let env = Environment::new();
        let counter = interner.intern("counter");
        let target = interner.intern("target");
        env.define(counter, Object::int(0));
        env.define(target, Object::int(0));

        let increment_and_return = Expr::Binary {
            span: Span::DUMMY,
            op: BinOp::Add,
            lhs: Rc::new(ident(counter)),
            rhs: Rc::new(int_lit(1)),
        };
        let result = eval_assign(&ctx, &env, AssignOp::Assign, &[ident(target)], &[increment_and_return], Span::DUMMY);

        assert!(!matches!(result, Object::Error(_)));
        assert!(matches!(env.get(target), Some(Object::Int(1))));
    }

    #[test]
    fn assigning_to_an_undefined_name_outside_primary_scope_defines_it() {
        let interner = Rc::new(NameInterner::new());
        let services = test_services_out_of_scope(interner);
        let package = Rc::new(Package::stub("vendor/lib"));
        let ctx = EvalCtx::new(&services, &package);
        assert!(!ctx.is_primary_scope());

        let env = Environment::new();
        let name = interner.intern("freshly_defined");
        let result = assign_target(&ctx, &env, &ident(name), Object::int(9), Span::DUMMY);

        assert!(matches!(result, Object::Nil));
        assert!(matches!(env.get(name), Some(Object::Int(9))));
    }

    #[test]
    fn map_index_assignment_inserts_the_evaluated_value() {
        let interner = Rc::new(NameInterner::new());
        let services = test_services(interner);
        let package = Rc::new(Package::new("pkg/a", "a"));
        let ctx = EvalCtx::new(&services, &package);
        let map = Object::map(FxHashMap::default());

        let result = assign_index(&ctx, &map, &Object::string("k"), Object::int(5));
        assert!(matches!(result, Object::Nil));
        match map {
            Object::Map(entries) => assert!(matches!(entries.borrow().get("k"), Some(Object::Int(5)))),
            _ => panic!("expected a map"),
        }
    }

    #[test]
    fn switch_with_no_matching_case_runs_the_default() {
        let interner = Rc::new(NameInterner::new());
        let services = test_services(Rc::clone(&interner));
        let package = Rc::new(Package::new("pkg/a", "a"));
        let ctx = EvalCtx::new(&services, &package);
        let env = Environment::new();
        let hit = interner.intern("hit");
        env.define(hit, Object::bool(false));

        let matching_case = vantage_ir::CaseClause {
            values: vec![int_lit(99)],
            body: Block { stmts: vec![] },
        };
        let default_case = vantage_ir::CaseClause {
            values: vec![],
            body: Block {
                stmts: vec![Stmt::Assign {
                    op: AssignOp::Assign,
                    targets: vec![ident(hit)],
                    values: vec![Expr::Lit { span: Span::DUMMY, value: Lit::Bool(true) }],
                    span: Span::DUMMY,
                }],
            },
        };
        eval_switch(&ctx, &env, Some(&int_lit(1)), &[matching_case, default_case]);

        assert!(matches!(env.get(hit), Some(Object::Bool(true))));
    }
}

