//! Expression evaluation (spec.md §4.3).

use std::rc::Rc;

use vantage_ir::{BinOp, Expr, Lit, Name, Span, UnaryOp};
use vantage_object::{
    Environment, Function, FunctionBody, Instance, Object, Package, SymbolicPlaceholder,
    UnresolvedFunction, UnresolvedType, VariableCell,
};

use super::{error_object, step, EvalCtx};
use crate::tracer::NodeKind;

pub fn eval_expr(ctx: &EvalCtx, env: &Environment, expr: &Expr) -> Object {
    vantage_stack::ensure_sufficient_stack(|| eval_expr_inner(ctx, env, expr))
}

fn eval_expr_inner(ctx: &EvalCtx, env: &Environment, expr: &Expr) -> Object {
    if let Some(err) = step(ctx, NodeKind::Expr, expr.span()) {
        return err;
    }
    match expr {
        Expr::Lit { value, .. } => eval_lit(value),
        Expr::Ident { name, span } => eval_ident(ctx, env, *name, *span),
        Expr::Binary { op, lhs, rhs, span } => eval_binary(ctx, env, *op, lhs, rhs, *span),
        Expr::Unary { op, operand, span } => eval_unary(ctx, env, *op, operand, *span),
        Expr::Call {
            func,
            args,
            type_args,
            spread,
            span,
        } => super::call::eval_call(ctx, env, func, args, type_args, *spread, *span),
        Expr::Selector {
            receiver,
            field,
            span,
        } => eval_selector(ctx, env, receiver, *field, *span),
        Expr::Index {
            receiver,
            index,
            span,
        } => eval_index(ctx, env, receiver, index, *span),
        Expr::Composite {
            type_name,
            fields,
            span,
        } => eval_composite(ctx, env, *type_name, fields, *span),
        Expr::FuncLit {
            params,
            variadic,
            body,
            ..
        } => Object::Function(Rc::new(Function::new(
            None,
            FunctionBody::Lit {
                params: params.clone(),
                variadic: *variadic,
                body: Rc::clone(body),
            },
            env.clone(),
        ))),
    }
}

fn eval_lit(value: &Lit) -> Object {
    match value {
        Lit::Int(i) => Object::Int(*i),
        Lit::Float(f) => Object::Float(*f),
        Lit::String(s) => Object::String(Rc::clone(s)),
        Lit::Bool(b) => Object::Bool(*b),
        Lit::Nil => Object::Nil,
    }
}

fn eval_ident(ctx: &EvalCtx, env: &Environment, name: Name, span: Span) -> Object {
    match env.get(name) {
        Some(value) => value,
        None => {
            if ctx.is_primary_scope() {
                error_object(ctx, crate::errors::identifier_not_found(&ctx.services.interner.resolve(name), span))
            } else {
                Object::SymbolicPlaceholder(SymbolicPlaceholder::new("out-of-scope identifier"))
            }
        }
    }
}

fn eval_binary(ctx: &EvalCtx, env: &Environment, op: BinOp, lhs: &Expr, rhs: &Expr, span: Span) -> Object {
    let left = eval_expr(ctx, env, lhs);
    if matches!(left, Object::Error(_)) {
        return left;
    }
    // Short-circuit: the right operand is still visited for coverage
    // (bounded analysis values call-site coverage over exact
    // short-circuit fidelity), but its value only matters when the
    // left operand didn't already decide the result.
    let right = eval_expr(ctx, env, rhs);
    if matches!(right, Object::Error(_)) {
        return right;
    }
    if left.kind() == vantage_object::ObjectKind::SymbolicPlaceholder
        || right.kind() == vantage_object::ObjectKind::SymbolicPlaceholder
    {
        return Object::SymbolicPlaceholder(SymbolicPlaceholder::new("binary op over symbolic operand"));
    }
    apply_binary(ctx, op, &left, &right, span)
}

fn apply_binary(ctx: &EvalCtx, op: BinOp, left: &Object, right: &Object, span: Span) -> Object {
    use Object::*;
    match (op, left, right) {
        (BinOp::Add, Int(a), Int(b)) => Int(a + b),
        (BinOp::Add, Float(a), Float(b)) => Float(a + b),
        (BinOp::Add, String(a), String(b)) => Object::string(format!("{a}{b}")),
        (BinOp::Sub, Int(a), Int(b)) => Int(a - b),
        (BinOp::Sub, Float(a), Float(b)) => Float(a - b),
        (BinOp::Mul, Int(a), Int(b)) => Int(a * b),
        (BinOp::Mul, Float(a), Float(b)) => Float(a * b),
        (BinOp::Div, Int(a), Int(b)) if *b != 0 => Int(a / b),
        (BinOp::Div, Float(a), Float(b)) => Float(a / b),
        (BinOp::Rem, Int(a), Int(b)) if *b != 0 => Int(a % b),
        (BinOp::Eq, a, b) => Bool(scalar_eq(a, b)),
        (BinOp::Ne, a, b) => Bool(!scalar_eq(a, b)),
        (BinOp::Lt, Int(a), Int(b)) => Bool(a < b),
        (BinOp::Le, Int(a), Int(b)) => Bool(a <= b),
        (BinOp::Gt, Int(a), Int(b)) => Bool(a > b),
        (BinOp::Ge, Int(a), Int(b)) => Bool(a >= b),
        (BinOp::Lt, Float(a), Float(b)) => Bool(a < b),
        (BinOp::Le, Float(a), Float(b)) => Bool(a <= b),
        (BinOp::Gt, Float(a), Float(b)) => Bool(a > b),
        (BinOp::Ge, Float(a), Float(b)) => Bool(a >= b),
        (BinOp::And, a, b) => Bool(a.is_truthy() && b.is_truthy()),
        (BinOp::Or, a, b) => Bool(a.is_truthy() || b.is_truthy()),
        (BinOp::BitAnd, Int(a), Int(b)) => Int(a & b),
        (BinOp::BitOr, Int(a), Int(b)) => Int(a | b),
        (BinOp::BitXor, Int(a), Int(b)) => Int(a ^ b),
        (BinOp::Shl, Int(a), Int(b)) => Int(a << (b & 63)),
        (BinOp::Shr, Int(a), Int(b)) => Int(a >> (b & 63)),
        (BinOp::Div, Int(_), Int(0)) | (BinOp::Rem, Int(_), Int(0)) => {
            error_object(ctx, crate::errors::type_mismatch("division by zero", span))
        }
        _ => error_object(
            ctx,
            crate::errors::type_mismatch("operand type mismatch in binary expression", span),
        ),
    }
}

fn scalar_eq(a: &Object, b: &Object) -> bool {
    match (a, b) {
        (Object::Int(x), Object::Int(y)) => x == y,
        (Object::Float(x), Object::Float(y)) => x == y,
        (Object::String(x), Object::String(y)) => x == y,
        (Object::Bool(x), Object::Bool(y)) => x == y,
        (Object::Nil, Object::Nil) => true,
        _ => false,
    }
}

fn eval_unary(ctx: &EvalCtx, env: &Environment, op: UnaryOp, operand: &Expr, span: Span) -> Object {
    match op {
        UnaryOp::Addr => eval_addr(ctx, env, operand, span),
        UnaryOp::Deref => eval_deref(ctx, env, operand, span),
        UnaryOp::Neg => match eval_expr(ctx, env, operand) {
            Object::Int(i) => Object::Int(-i),
            Object::Float(f) => Object::Float(-f),
            Object::SymbolicPlaceholder(_) => {
                Object::SymbolicPlaceholder(SymbolicPlaceholder::new("negation of symbolic value"))
            }
            other if matches!(other, Object::Error(_)) => other,
            _ => error_object(ctx, crate::errors::type_mismatch("cannot negate non-numeric value", span)),
        },
        UnaryOp::Not => match eval_expr(ctx, env, operand) {
            Object::Error(err) => Object::Error(err),
            other => Object::Bool(!other.is_truthy()),
        },
    }
}

/// `&x`: for a bare identifier, produce a `Pointer` sharing the
/// variable's actual cell (Testable Property 6). Any other operand
/// (field/index expression, etc.) isn't cell-backed in this model, so
/// address-of falls back to a symbolic pointer placeholder — exact
/// interior-pointer semantics are outside the non-goal-bounded
/// "approximate, don't simulate" execution model (spec.md §1).
fn eval_addr(ctx: &EvalCtx, env: &Environment, operand: &Expr, span: Span) -> Object {
    match operand {
        Expr::Ident { name, .. } => match env.get_cell(*name) {
            Some(cell) => Object::Pointer(cell),
            None => {
                if ctx.is_primary_scope() {
                    error_object(
                        ctx,
                        crate::errors::identifier_not_found(&ctx.services.interner.resolve(*name), span),
                    )
                } else {
                    Object::SymbolicPlaceholder(SymbolicPlaceholder::new("address of unresolved identifier"))
                }
            }
        },
        _ => {
            let value = eval_expr(ctx, env, operand);
            if matches!(value, Object::Error(_)) {
                return value;
            }
            Object::Pointer(VariableCell::new(value))
        }
    }
}

fn eval_deref(ctx: &EvalCtx, env: &Environment, operand: &Expr, span: Span) -> Object {
    match eval_expr(ctx, env, operand) {
        Object::Pointer(cell) | Object::Variable(cell) => cell.get(),
        Object::SymbolicPlaceholder(p) => Object::SymbolicPlaceholder(p),
        Object::Nil => error_object(ctx, crate::errors::type_mismatch("nil pointer dereference", span)),
        Object::Error(err) => Object::Error(err),
        _ => error_object(ctx, crate::errors::type_mismatch("cannot dereference non-pointer value", span)),
    }
}

fn eval_index(ctx: &EvalCtx, env: &Environment, receiver: &Expr, index: &Expr, span: Span) -> Object {
    let container = eval_expr(ctx, env, receiver);
    if matches!(container, Object::Error(_)) {
        return container;
    }
    let key = eval_expr(ctx, env, index);
    if matches!(key, Object::Error(_)) {
        return key;
    }
    match &container {
        Object::Slice(items) => match &key {
            Object::Int(i) => {
                let items = items.borrow();
                let idx = usize::try_from(*i).ok();
                match idx.and_then(|idx| items.get(idx)) {
                    Some(value) => value.clone(),
                    None => error_object(ctx, crate::errors::type_mismatch("slice index out of range", span)),
                }
            }
            _ => Object::SymbolicPlaceholder(SymbolicPlaceholder::new("slice index of unknown shape")),
        },
        Object::Map(entries) => {
            let map_key = map_key_of(ctx, &key);
            entries
                .borrow()
                .get(&map_key)
                .cloned()
                .unwrap_or(Object::Nil)
        }
        Object::SymbolicPlaceholder(_) => {
            Object::SymbolicPlaceholder(SymbolicPlaceholder::new("index into unresolved container"))
        }
        _ => error_object(ctx, crate::errors::type_mismatch("cannot index non-container value", span)),
    }
}

pub(crate) fn map_key_of(ctx: &EvalCtx, key: &Object) -> Rc<str> {
    Rc::from(key.inspect(&ctx.services.interner))
}

fn eval_composite(ctx: &EvalCtx, env: &Environment, type_name: Option<Name>, fields: &[(Option<Name>, Expr)], span: Span) -> Object {
    match type_name {
        Some(name) => {
            let type_info = env
                .get(name)
                .and_then(|obj| obj.type_info())
                .or_else(|| lookup_type_info_in_package(ctx, name));
            let instance = Instance::new(name, type_info);
            for (field_name, field_expr) in fields {
                let value = eval_expr(ctx, env, field_expr);
                if matches!(value, Object::Error(_)) {
                    return value;
                }
                if let Some(field_name) = field_name {
                    instance.set_field(*field_name, value);
                }
            }
            Object::Instance(instance)
        }
        None => {
            // Slice/map composite literal: positional entries become a slice.
            let mut items = Vec::with_capacity(fields.len());
            for (_, field_expr) in fields {
                let value = eval_expr(ctx, env, field_expr);
                if matches!(value, Object::Error(_)) {
                    return value;
                }
                items.push(value);
            }
            let _ = span;
            Object::slice(items)
        }
    }
}

fn lookup_type_info_in_package(ctx: &EvalCtx, name: Name) -> Option<Rc<vantage_ir::TypeInfo>> {
    ctx.package.meta.as_ref()?.find_type(name).cloned()
}

/// `x.Sel` evaluated as an ordinary expression (not a call): field
/// access, a bound method value, a package member, or a placeholder
/// (spec.md §4.3 selector rules).
pub fn eval_selector(ctx: &EvalCtx, env: &Environment, receiver_expr: &Expr, field: Name, span: Span) -> Object {
    let receiver = eval_expr(ctx, env, receiver_expr);
    if matches!(receiver, Object::Error(_)) {
        return receiver;
    }
    resolve_selector(ctx, &receiver, field, span)
}

pub(crate) fn resolve_selector(ctx: &EvalCtx, receiver: &Object, field: Name, span: Span) -> Object {
    match receiver {
        Object::Package(pkg) => resolve_package_member(ctx, pkg, field, span),
        Object::Pointer(cell) | Object::Variable(cell) => {
            let inner = cell.get();
            match resolve_instance_selector(ctx, &inner, field, Some(Rc::clone(cell)), span) {
                Some(result) => result,
                None => resolve_selector(ctx, &inner, field, span),
            }
        }
        Object::Instance(_) => resolve_instance_selector(ctx, receiver, field, None, span)
            .unwrap_or_else(|| error_object(ctx, crate::errors::type_mismatch("no such field or method", span))),
        Object::SymbolicPlaceholder(placeholder) => {
            if let Some(func) = &placeholder.underlying_func {
                resolve_method_on_type_info(ctx, func.signature.as_deref(), field, receiver.clone(), span)
            } else if let Some(type_info) = &placeholder.type_info {
                resolve_method_on_type_info(ctx, Some(type_info), field, receiver.clone(), span)
            } else {
                Object::SymbolicPlaceholder(SymbolicPlaceholder::new("selector on unresolved value"))
            }
        }
        Object::UnresolvedType(ty) => {
            Object::UnresolvedFunction(UnresolvedFunction {
                import_path: Rc::clone(&ty.import_path),
                name: ctx.services.interner.resolve(field),
            })
        }
        _ => error_object(ctx, crate::errors::type_mismatch("selector on non-selectable value", span)),
    }
}

fn resolve_package_member(ctx: &EvalCtx, pkg: &Rc<Package>, field: Name, span: Span) -> Object {
    if let Some(value) = pkg.env.get(field) {
        return value;
    }
    let _ = span;
    let field_name = ctx.services.interner.resolve(field);
    if pkg.out_of_scope {
        let placeholder = Object::UnresolvedFunction(UnresolvedFunction {
            import_path: Rc::clone(&pkg.import_path),
            name: field_name,
        });
        pkg.env.define(field, placeholder.clone());
        placeholder
    } else {
        Object::SymbolicPlaceholder(SymbolicPlaceholder::new("unknown package member"))
    }
}

/// Try field access, then method-value binding, on a concrete
/// `Instance`. Returns `None` when `receiver` isn't an `Instance` at
/// all, so the caller can fall through to other selector rules.
fn resolve_instance_selector(
    ctx: &EvalCtx,
    receiver: &Object,
    field: Name,
    receiver_cell: Option<vantage_object::VarCell>,
    span: Span,
) -> Option<Object> {
    let Object::Instance(instance) = receiver else {
        return None;
    };
    if let Some(value) = instance.get_field(field) {
        return Some(value);
    }
    let type_info = instance.type_info.clone();
    Some(resolve_method_on_type_info_with_cell(
        ctx,
        type_info.as_deref(),
        field,
        receiver.clone(),
        receiver_cell,
        span,
    ))
}

fn resolve_method_on_type_info(
    ctx: &EvalCtx,
    type_info: Option<&vantage_ir::TypeInfo>,
    field: Name,
    receiver: Object,
    span: Span,
) -> Object {
    resolve_method_on_type_info_with_cell(ctx, type_info, field, receiver, None, span)
}

fn resolve_method_on_type_info_with_cell(
    ctx: &EvalCtx,
    type_info: Option<&vantage_ir::TypeInfo>,
    field: Name,
    receiver: Object,
    receiver_cell: Option<vantage_object::VarCell>,
    span: Span,
) -> Object {
    let Some(type_info) = type_info else {
        return Object::SymbolicPlaceholder(SymbolicPlaceholder::new("method on untyped value"));
    };
    let Some(method) = type_info.find_method(field) else {
        if type_info.kind == vantage_ir::TypeKind::Interface {
            // Recording happens at call time (call.rs); here we just
            // hand back a callable placeholder for a bare method value.
            return Object::SymbolicPlaceholder(
                SymbolicPlaceholder::new("interface method value").with_type_info(Rc::new(type_info.clone())),
            );
        }
        return error_object(ctx, crate::errors::type_mismatch("no such method", span));
    };
    let type_name = ctx.services.interner.resolve(type_info.name);
    let method_name = ctx.services.interner.resolve(field);
    let fq: Rc<str> = Rc::from(if method.pointer_receiver {
        vantage_ir::pointer_method(&type_info.import_path, &type_name, &method_name)
    } else {
        vantage_ir::value_method(&type_info.import_path, &type_name, &method_name)
    });
    let package = ctx.services.loader.load(&type_info.import_path, ctx.services);
    let Some(function) = package.find_method(&fq) else {
        return Object::SymbolicPlaceholder(SymbolicPlaceholder::new("method with no body"));
    };
    let cell = receiver_cell.unwrap_or_else(|| VariableCell::new(receiver));
    Object::Function(Rc::new((*function).clone().with_bound_receiver(cell)))
}
