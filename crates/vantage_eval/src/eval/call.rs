//! Call dispatch (spec.md §4.3): the
//! `{Lookup, ResolveReceiver, DispatchIntrinsic, BindParams, EvalBody,
//! Unwrap, RecordCall}` state machine.

use std::rc::Rc;

use vantage_ir::{Expr, Name, Span, TypeArg};
use vantage_object::{
    EvalContext, Environment, Function, FunctionBody, Object, Package, SymbolicPlaceholder,
    UnresolvedFunction, UnresolvedType, VariableCell,
};

use super::expr::{eval_expr, resolve_selector};
use super::{error_object, is_short_circuit, EvalCtx};
use crate::services::CallFrame;

/// Adapts an `EvalCtx` to the `vantage_object::EvalContext` trait so an
/// `Intrinsic` handler can call back into `apply_callable` without
/// needing a concrete `Interpreter` in scope.
struct FreeEvalContext<'a, 'b> {
    ctx: &'a EvalCtx<'b>,
}

impl<'a, 'b> EvalContext for FreeEvalContext<'a, 'b> {
    fn apply(&mut self, callee: &Object, args: &[Object]) -> Object {
        apply_callable(self.ctx, callee, args)
    }
}

/// What a callee expression resolved to, plus enough bookkeeping for
/// intrinsic precedence and interface-dispatch replay.
struct CalleeResolution {
    object: Object,
    /// Fully-qualified names to check for a specific intrinsic, most
    /// likely first. A method receiver yields both the value- and
    /// pointer-receiver spellings since the object model doesn't track
    /// which one the call site used syntactically.
    fq_candidates: Vec<Rc<str>>,
    interface_dispatch: Option<(Rc<str>, Rc<str>)>,
}

pub fn eval_call(
    ctx: &EvalCtx,
    env: &Environment,
    func: &Expr,
    args: &[Expr],
    type_args: &[TypeArg],
    spread: bool,
    span: Span,
) -> Object {
    if let Expr::Ident { name, .. } = func {
        if env.get(*name).is_none() {
            if let Some(builtin) = crate::eval::builtins::recognize(&ctx.services.interner.resolve(*name)) {
                let mut evaluated = Vec::with_capacity(args.len());
                for arg_expr in args {
                    let value = eval_expr(ctx, env, arg_expr);
                    if matches!(value, Object::Error(_)) {
                        return value;
                    }
                    evaluated.push(value);
                }
                return crate::eval::builtins::call(ctx, builtin, &evaluated, span);
            }
        }
    }

    let resolution = resolve_callee(ctx, env, func);
    if matches!(resolution.object, Object::Error(_)) {
        return resolution.object;
    }

    let mut evaluated_args = Vec::with_capacity(args.len());
    for arg_expr in args {
        let value = eval_expr(ctx, env, arg_expr);
        if matches!(value, Object::Error(_)) {
            return value;
        }
        evaluated_args.push(value);
    }
    let _ = spread; // variadic spread folds into ordinary arity checks at bind time.

    if let Some((iface_qname, method_name)) = &resolution.interface_dispatch {
        ctx.services.type_relations.record_call(iface_qname, method_name);
    }

    let matched_intrinsic = resolution
        .fq_candidates
        .iter()
        .find_map(|fq| ctx.services.intrinsics.borrow().lookup_specific(fq));
    let result = match matched_intrinsic {
        Some(intrinsic) => {
            let mut adapter = FreeEvalContext { ctx };
            intrinsic.call(&mut adapter, &evaluated_args)
        }
        None => apply_callable_with_generics(ctx, &resolution.object, &evaluated_args, type_args),
    };

    fire_default_intrinsic(ctx, &resolution.object, &evaluated_args);

    if let Some((iface_qname, method_name)) = &resolution.interface_dispatch {
        dispatch_interface_calls(ctx, iface_qname, method_name, evaluated_args.len());
    }

    result
}

fn fire_default_intrinsic(ctx: &EvalCtx, callee: &Object, args: &[Object]) {
    let Some(default) = ctx.services.intrinsics.borrow().default_handler() else {
        return;
    };
    let mut call_args = Vec::with_capacity(args.len() + 1);
    call_args.push(callee.clone());
    call_args.extend_from_slice(args);
    let mut adapter = FreeEvalContext { ctx };
    default.call(&mut adapter, &call_args);
}

fn resolve_callee(ctx: &EvalCtx, env: &Environment, func: &Expr) -> CalleeResolution {
    match func {
        Expr::Ident { name, span } => {
            let name_str = ctx.services.interner.resolve(*name);
            match env.get(*name) {
                Some(obj) => {
                    let fq_candidates = match &obj {
                        Object::Function(f) => f
                            .package
                            .as_ref()
                            .map(|p| vec![Rc::from(vantage_ir::package_func(&p.import_path, &name_str)) as Rc<str>])
                            .unwrap_or_default(),
                        _ => Vec::new(),
                    };
                    CalleeResolution {
                        object: obj,
                        fq_candidates,
                        interface_dispatch: None,
                    }
                }
                None => {
                    let object = if ctx.is_primary_scope() {
                        error_object(ctx, crate::errors::identifier_not_found(&name_str, *span))
                    } else {
                        Object::SymbolicPlaceholder(SymbolicPlaceholder::new("call of unresolved identifier"))
                    };
                    CalleeResolution {
                        object,
                        fq_candidates: Vec::new(),
                        interface_dispatch: None,
                    }
                }
            }
        }
        Expr::Selector { receiver, field, span } => resolve_selector_callee(ctx, env, receiver, *field, *span),
        other => CalleeResolution {
            object: eval_expr(ctx, env, other),
            fq_candidates: Vec::new(),
            interface_dispatch: None,
        },
    }
}

fn resolve_selector_callee(ctx: &EvalCtx, env: &Environment, receiver_expr: &Expr, field: Name, span: Span) -> CalleeResolution {
    let receiver = eval_expr(ctx, env, receiver_expr);
    if matches!(receiver, Object::Error(_)) {
        return CalleeResolution {
            object: receiver,
            fq_candidates: Vec::new(),
            interface_dispatch: None,
        };
    }

    if let Object::Package(pkg) = &receiver {
        let object = resolve_package_callee(ctx, pkg, field);
        let fq_candidates = vec![Rc::from(vantage_ir::package_func(
            &pkg.import_path,
            &ctx.services.interner.resolve(field),
        )) as Rc<str>];
        return CalleeResolution {
            object,
            fq_candidates,
            interface_dispatch: None,
        };
    }

    // `receiver.type_info()` always reports the concrete dynamic type
    // (our object model has no notion of a separate static interface
    // type for a variable holding a concrete struct). Interface
    // dispatch replay therefore only triggers when the receiver itself
    // is still carrying interface-kind metadata directly — a
    // placeholder/unresolved value typed as the interface, or one
    // explicitly bound via `bindInterface` (spec.md §4.6) — not for an
    // already-narrowed concrete struct, which executes its one real
    // method body directly below instead.
    let type_info = receiver.type_info();
    if let Some(type_info) = &type_info {
        if type_info.kind == vantage_ir::TypeKind::Interface {
            let iface_qname: Rc<str> = Rc::from(type_info.qualified_name(&ctx.services.interner));
            let method_name = ctx.services.interner.resolve(field);
            let object = resolve_selector(ctx, &receiver, field, span);
            return CalleeResolution {
                object,
                fq_candidates: Vec::new(),
                interface_dispatch: Some((iface_qname, method_name)),
            };
        }
    }

    let object = resolve_selector(ctx, &receiver, field, span);
    let fq_candidates = match &type_info {
        Some(type_info) => {
            let type_name = ctx.services.interner.resolve(type_info.name);
            let method_name = ctx.services.interner.resolve(field);
            vec![
                Rc::from(vantage_ir::value_method(&type_info.import_path, &type_name, &method_name)) as Rc<str>,
                Rc::from(vantage_ir::pointer_method(&type_info.import_path, &type_name, &method_name)) as Rc<str>,
            ]
        }
        None => Vec::new(),
    };
    CalleeResolution {
        object,
        fq_candidates,
        interface_dispatch: None,
    }
}

fn resolve_package_callee(ctx: &EvalCtx, pkg: &Rc<Package>, field: Name) -> Object {
    if let Some(value) = pkg.env.get(field) {
        return value;
    }
    let field_name = ctx.services.interner.resolve(field);
    Object::UnresolvedFunction(UnresolvedFunction {
        import_path: Rc::clone(&pkg.import_path),
        name: field_name,
    })
}

fn apply_callable_with_generics(ctx: &EvalCtx, callee: &Object, args: &[Object], type_args: &[TypeArg]) -> Object {
    let _ = type_args;
    apply_callable(ctx, callee, args)
}

/// Apply a callable object to already-evaluated arguments (spec.md
/// §4.3 `BindParams`/`EvalBody`/`Unwrap`).
pub fn apply_callable(ctx: &EvalCtx, callee: &Object, args: &[Object]) -> Object {
    match callee {
        Object::Intrinsic(intrinsic) => {
            let mut adapter = FreeEvalContext { ctx };
            intrinsic.call(&mut adapter, args)
        }
        Object::Function(function) => apply_function(ctx, function, args),
        Object::UnresolvedFunction(_) => {
            Object::SymbolicPlaceholder(SymbolicPlaceholder::new("result of calling unresolved function"))
        }
        Object::SymbolicPlaceholder(placeholder) => {
            if let Some(func) = placeholder.underlying_func.clone() {
                apply_function(ctx, &func, args)
            } else {
                Object::SymbolicPlaceholder(SymbolicPlaceholder::new("result of calling unresolved value"))
            }
        }
        Object::Error(err) => Object::Error(err.clone()),
        _ => error_object(ctx, crate::errors::not_a_function(Span::DUMMY)),
    }
}

/// Ordinary recursion driven by real program state (spec.md §8 S2)
/// terminates on its own; this only guards against the degenerate case
/// where a function calls itself without ever changing the data its
/// own termination depends on, which would otherwise recurse until the
/// step limit or the native stack gives out. Set far above any
/// legitimate recursive algorithm a static-analysis target is likely
/// to exercise.
const MAX_SAME_FUNCTION_DEPTH: usize = 10_000;

fn apply_function(ctx: &EvalCtx, function: &Rc<Function>, args: &[Object]) -> Object {
    let identity = crate::memo::function_identity(function);
    let same_function_depth = ctx
        .services
        .call_stack
        .borrow()
        .iter()
        .filter(|frame| frame.function_identity == identity)
        .count();
    if same_function_depth >= MAX_SAME_FUNCTION_DEPTH {
        let name = function
            .name
            .map(|n| ctx.services.interner.resolve(n))
            .unwrap_or_else(|| Rc::from("<closure>"));
        return error_object(ctx, crate::errors::infinite_recursion(&name, Span::DUMMY));
    }

    let memo_key = if ctx.services.memoize {
        let key = crate::memo::MemoKey::new(identity, args);
        if let Some(cached) = ctx.services.memo.get(&key) {
            return cached;
        }
        Some(key)
    } else {
        None
    };

    let params = function.decl.params();
    let variadic = function.decl.variadic();
    if !variadic && args.len() != params.len() {
        return error_object(ctx, crate::errors::wrong_arity(params.len(), args.len(), Span::DUMMY));
    }
    if variadic && args.len() < params.len().saturating_sub(1) {
        return error_object(ctx, crate::errors::wrong_arity(params.len(), args.len(), Span::DUMMY));
    }

    let new_env = Environment::new_enclosed(&function.defining_env);

    if let Some(receiver_cell) = &function.bound_receiver {
        if let FunctionBody::Decl(decl) = &function.decl {
            if let Some((receiver_name, _, _)) = decl.receiver {
                new_env.define_cell(receiver_name, Rc::clone(receiver_cell));
            }
        }
    }

    if let FunctionBody::Decl(decl) = &function.decl {
        for type_param in &decl.type_params {
            let name_str = ctx.services.interner.resolve(*type_param);
            new_env.define(
                *type_param,
                Object::UnresolvedType(UnresolvedType {
                    import_path: Rc::clone(&ctx.package.import_path),
                    name: name_str,
                }),
            );
        }
    }

    bind_params(&new_env, &params, variadic, args);

    let name_for_frame = function
        .name
        .map(|n| ctx.services.interner.resolve(n))
        .unwrap_or_else(|| Rc::from("<closure>"));
    ctx.services.call_stack.borrow_mut().push(CallFrame {
        function_identity: identity,
        function_name: name_for_frame,
        span: Span::DUMMY,
    });

    let body_result = match function.decl.body() {
        Some(body) => vantage_stack::ensure_sufficient_stack(|| super::control::eval_block(ctx, &new_env, &body)),
        None => Object::SymbolicPlaceholder(SymbolicPlaceholder::new("function with no body")),
    };

    ctx.services.call_stack.borrow_mut().pop();

    let result = unwrap_function_result(body_result);

    if let (Some(key), true) = (memo_key, !matches!(result, Object::Error(_))) {
        ctx.services.memo.insert(key, result.clone());
    }

    result
}

fn bind_params(env: &Environment, params: &[vantage_ir::Param], variadic: bool, args: &[Object]) {
    if !variadic {
        for (param, arg) in params.iter().zip(args) {
            env.define(param.name, arg.clone());
        }
        return;
    }
    let fixed_count = params.len().saturating_sub(1);
    for (param, arg) in params.iter().take(fixed_count).zip(args) {
        env.define(param.name, arg.clone());
    }
    if let Some(last) = params.last() {
        let rest = args.get(fixed_count..).unwrap_or(&[]).to_vec();
        env.define(last.name, Object::slice(rest));
    }
}

fn unwrap_function_result(result: Object) -> Object {
    match result {
        Object::ReturnValue(value) => *value,
        Object::Break | Object::Continue => Object::Nil,
        other => other,
    }
}

/// After a call through an interface-typed receiver, symbolically
/// apply the same method to every other known implementer, so
/// intrinsics registered on implementers not exercised by the concrete
/// call path still fire (spec.md §4.4 "pending calls" replay).
fn dispatch_interface_calls(ctx: &EvalCtx, iface_qname: &Rc<str>, method_name: &Rc<str>, arg_count: usize) {
    for implementer in ctx.services.type_relations.implementers(iface_qname) {
        if !ctx.services.type_relations.mark_applied(iface_qname, method_name, &implementer) {
            continue;
        }
        let Some((import_path, type_name)) = implementer.rsplit_once('.') else {
            continue;
        };
        let value_fq: Rc<str> = Rc::from(vantage_ir::value_method(import_path, type_name, method_name));
        let pointer_fq: Rc<str> = Rc::from(vantage_ir::pointer_method(import_path, type_name, method_name));
        let synthetic_args: Vec<Object> = (0..arg_count)
            .map(|_| Object::SymbolicPlaceholder(SymbolicPlaceholder::new("synthetic interface-dispatch argument")))
            .collect();

        let intrinsic = ctx
            .services
            .intrinsics
            .borrow()
            .lookup_specific(&value_fq)
            .or_else(|| ctx.services.intrinsics.borrow().lookup_specific(&pointer_fq));
        if let Some(intrinsic) = intrinsic {
            let mut adapter = FreeEvalContext { ctx };
            intrinsic.call(&mut adapter, &synthetic_args);
            continue;
        }

        let package = ctx.services.loader.load(import_path, ctx.services);
        if let Some(function) = package.find_method(&value_fq).or_else(|| package.find_method(&pointer_fq)) {
            let receiver = Object::Instance(vantage_object::Instance::new(
                function.name.unwrap_or(Name::EMPTY),
                None,
            ));
            let bound = Rc::new((*function).clone().with_bound_receiver(VariableCell::new(receiver)));
            apply_callable(ctx, &Object::Function(bound), &synthetic_args);
        }
    }
}
