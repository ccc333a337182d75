//! Go built-in free functions (spec.md §4.3): `len`, `cap`, `new`,
//! `make`, `append`, `panic`, `recover`, `delete`, `close`, `copy`,
//! `clear`.
//!
//! Recognized by name ahead of ordinary identifier lookup, since they
//! are never user-shadowable bindings in Go. Concrete when the operand
//! is already known (a real `Slice`/`Map`/`String`), symbolic otherwise
//! — matching the same "concrete when known, placeholder when not"
//! texture as the rest of expression evaluation (spec.md §4.1).

use vantage_object::{Object, SymbolicPlaceholder, VariableCell};

use super::EvalCtx;

/// Which built-in a call resolved to, recognized purely by name.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Builtin {
    Len,
    Cap,
    New,
    Make,
    Append,
    Panic,
    Recover,
    Delete,
    Close,
    Copy,
    Clear,
}

/// Whether `name` is a built-in, checked only once the identifier isn't
/// already bound in scope — so a local shadowing `len` still wins
/// (spec.md §4.1 scoping rules apply uniformly).
pub fn recognize(name: &str) -> Option<Builtin> {
    Some(match name {
        "len" => Builtin::Len,
        "cap" => Builtin::Cap,
        "new" => Builtin::New,
        "make" => Builtin::Make,
        "append" => Builtin::Append,
        "panic" => Builtin::Panic,
        "recover" => Builtin::Recover,
        "delete" => Builtin::Delete,
        "close" => Builtin::Close,
        "copy" => Builtin::Copy,
        "clear" => Builtin::Clear,
        _ => return None,
    })
}

pub fn call(ctx: &EvalCtx, builtin: Builtin, args: &[Object], span: vantage_ir::Span) -> Object {
    match builtin {
        Builtin::Len => len(args),
        Builtin::Cap => cap(args),
        Builtin::New => new(args),
        Builtin::Make => make(args),
        Builtin::Append => append(args),
        Builtin::Panic => panic(ctx, args, span),
        Builtin::Recover => recover(),
        Builtin::Delete => delete(ctx, args),
        Builtin::Close => close(),
        Builtin::Copy => copy(args),
        Builtin::Clear => clear(args),
    }
}

fn placeholder_int(reason: &'static str) -> Object {
    Object::SymbolicPlaceholder(SymbolicPlaceholder::new(reason))
}

fn unwrap_addressable(obj: &Object) -> Object {
    match obj {
        Object::Pointer(cell) | Object::Variable(cell) => cell.get(),
        other => other.clone(),
    }
}

fn len(args: &[Object]) -> Object {
    match args.first().map(unwrap_addressable) {
        Some(Object::Slice(items)) => Object::int(items.borrow().len() as i64),
        Some(Object::Map(entries)) => Object::int(entries.borrow().len() as i64),
        Some(Object::String(s)) => Object::int(s.chars().count() as i64),
        Some(Object::Nil) => Object::int(0),
        _ => placeholder_int("result of len()"),
    }
}

/// Go's `cap` differs from `len` for slices grown via `make` with a
/// separate capacity argument; this engine doesn't track capacity apart
/// from length (spec.md §1 non-goal: exact execution semantics), so a
/// concrete slice reports its length as a lower-bound approximation.
fn cap(args: &[Object]) -> Object {
    match args.first().map(unwrap_addressable) {
        Some(Object::Slice(items)) => Object::int(items.borrow().len() as i64),
        Some(Object::Nil) => Object::int(0),
        _ => placeholder_int("result of cap()"),
    }
}

fn new(args: &[Object]) -> Object {
    let type_info = args.first().and_then(Object::type_info);
    let mut placeholder = SymbolicPlaceholder::new("result of new()");
    if let Some(type_info) = type_info {
        placeholder = placeholder.with_type_info(type_info);
    }
    Object::Pointer(VariableCell::new(Object::SymbolicPlaceholder(placeholder)))
}

/// `make(T)` / `make(T, len)` / `make(T, len, cap)`. `T` reaches this
/// builtin as an ordinary evaluated argument — a named slice/map type
/// resolves (via the package loader's type placeholders, see
/// `loader.rs`) to a `SymbolicPlaceholder` whose `TypeInfo` is a
/// `TypeKind::Alias` carrying the slice/map-shaped `FieldType` in
/// `underlying`. Anything else, including channel types (spec.md §1
/// non-goal: concurrency semantics of the analyzed program), falls
/// back to a fully symbolic result.
fn make(args: &[Object]) -> Object {
    let underlying = args
        .first()
        .and_then(Object::type_info)
        .filter(|info| info.kind == vantage_ir::TypeKind::Alias)
        .and_then(|info| info.underlying.clone());
    match underlying {
        Some(field_type) if field_type.slice => {
            let len = match args.get(1) {
                Some(Object::Int(n)) if *n >= 0 => *n as usize,
                _ => 0,
            };
            let elems = (0..len)
                .map(|_| Object::SymbolicPlaceholder(SymbolicPlaceholder::new("zero value of made slice")))
                .collect();
            Object::slice(elems)
        }
        Some(field_type) if field_type.map => Object::map(Default::default()),
        _ => Object::SymbolicPlaceholder(SymbolicPlaceholder::new("result of make()")),
    }
}

/// `append(s, elems...)`. Go's aliasing/growth semantics are out of
/// scope (spec.md §1 non-goal); this always returns a fresh slice
/// seeded with a snapshot of `s`'s current contents plus the new
/// elements, so the original and the result never observe each other's
/// further writes.
fn append(args: &[Object]) -> Object {
    let Some(first) = args.first() else {
        return placeholder_int("result of append() with no arguments");
    };
    match unwrap_addressable(first) {
        Object::Slice(items) => {
            let mut result = items.borrow().clone();
            result.extend(args[1..].iter().cloned());
            Object::slice(result)
        }
        Object::Nil => Object::slice(args[1..].to_vec()),
        _ => Object::SymbolicPlaceholder(SymbolicPlaceholder::new("result of append() on unresolved slice")),
    }
}

fn panic(ctx: &EvalCtx, args: &[Object], span: vantage_ir::Span) -> Object {
    let value = args.first().cloned().unwrap_or(Object::Nil);
    super::error_object(ctx, crate::errors::panic(value, span))
}

/// Without a modeled `defer` mechanism (spec.md §1 non-goal: exact
/// execution semantics), this engine has no concrete notion of "a panic
/// currently unwinding through this call", so `recover()` always
/// reports a symbolic result rather than concretely Nil or non-Nil.
fn recover() -> Object {
    Object::SymbolicPlaceholder(SymbolicPlaceholder::new("result of recover()"))
}

fn delete(ctx: &EvalCtx, args: &[Object]) -> Object {
    if let (Some(map_obj), Some(key_obj)) = (args.first(), args.get(1)) {
        if let Object::Map(entries) = unwrap_addressable(map_obj) {
            let key = super::expr::map_key_of(ctx, key_obj);
            entries.borrow_mut().remove(&key);
        }
    }
    Object::Nil
}

fn close() -> Object {
    // Channels aren't modeled (spec.md §1 non-goal); closing one is a no-op.
    Object::Nil
}

fn copy(args: &[Object]) -> Object {
    let (Some(dst_obj), Some(src_obj)) = (args.first(), args.get(1)) else {
        return Object::int(0);
    };
    let (Object::Slice(dst), Object::Slice(src)) = (unwrap_addressable(dst_obj), unwrap_addressable(src_obj)) else {
        return Object::int(0);
    };
    let source = src.borrow().clone();
    let mut target = dst.borrow_mut();
    let n = target.len().min(source.len());
    target[..n].clone_from_slice(&source[..n]);
    Object::int(n as i64)
}

fn clear(args: &[Object]) -> Object {
    match args.first().map(unwrap_addressable) {
        Some(Object::Map(entries)) => entries.borrow_mut().clear(),
        Some(Object::Slice(items)) => {
            let len = items.borrow().len();
            let mut items = items.borrow_mut();
            for slot in items.iter_mut().take(len) {
                *slot = Object::Nil;
            }
        }
        _ => {}
    }
    Object::Nil
}
