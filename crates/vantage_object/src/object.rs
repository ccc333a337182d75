//! The uniform value representation every evaluation step produces and
//! consumes (spec.md §3).

use std::rc::Rc;

use rustc_hash::FxHashMap;
use vantage_ir::{FieldType, Name, TypeInfo};

use crate::error::Error;
use crate::function::{Function, Intrinsic};
use crate::heap::Heap;
use crate::instance::Instance;
use crate::package::Package;
use crate::placeholder::{SymbolicPlaceholder, UnresolvedFunction, UnresolvedType};
use crate::variable::VarCell;

/// The tag returned by `Object::kind`, for host code that wants to
/// branch on shape without matching the full enum (e.g. `len`/`cap`).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ObjectKind {
    Int,
    Float,
    String,
    Bool,
    Nil,
    Function,
    Intrinsic,
    Package,
    Instance,
    Pointer,
    Variable,
    Slice,
    Map,
    MultiReturn,
    ReturnValue,
    Error,
    SymbolicPlaceholder,
    UnresolvedFunction,
    UnresolvedType,
    Break,
    Continue,
}

/// Go maps key on any comparable type, but `Object` holds `f64` and
/// `Rc<RefCell<_>>` members and so cannot derive `Eq`/`Hash` itself.
/// Rather than hand-writing a partial `Eq` for "the comparable subset of
/// Object" (brittle, and easy to get wrong for pointer/interface keys),
/// Vantage follows the teacher's own `ori_patterns::Value` map
/// simplification and keys on the object's `Inspect()` string. This is
/// an intentional over-approximation: two distinct objects that render
/// identically collide. Acceptable here since map keys are almost
/// always strings, ints, or small structs in real Go code, and the
/// engine never needs exact map semantics (spec.md §1 non-goal).
pub type MapKey = Rc<str>;

/// Every value an evaluation step may produce (spec.md §3). `Clone` is
/// shallow: reference-typed variants (`Slice`, `Map`, `Instance`,
/// `Variable`, `Pointer`) share their backing `Heap`/`VarCell`, matching
/// Go's own reference semantics for those types.
#[derive(Clone, Debug)]
pub enum Object {
    Int(i64),
    Float(f64),
    String(Rc<str>),
    Bool(bool),
    Nil,
    Function(Rc<Function>),
    Intrinsic(Intrinsic),
    Package(Rc<Package>),
    Instance(Instance),
    /// `&x`: points at the same `VarCell` that backs `x`, so `*(&x)`
    /// returns a value equal to `x` by identity, not just content
    /// (Testable Property 6).
    Pointer(VarCell),
    /// A named, independently-addressable binding, as distinct from a
    /// `Pointer` obtained by taking `&` of one.
    Variable(VarCell),
    Slice(Heap<Vec<Object>>),
    Map(Heap<FxHashMap<MapKey, Object>>),
    /// The right-hand side of a call in multi-value assignment context
    /// (`a, b := f()`); never appears nested inside another `Object`.
    MultiReturn(Vec<Object>),
    /// A `return` statement's value, threaded up through block/statement
    /// evaluation as a short-circuit marker (spec.md §4.3) and unwrapped
    /// at the function-application boundary.
    ReturnValue(Box<Object>),
    Error(Error),
    SymbolicPlaceholder(SymbolicPlaceholder),
    UnresolvedFunction(UnresolvedFunction),
    UnresolvedType(UnresolvedType),
    /// Short-circuit markers for loop control, unwrapped by the
    /// enclosing `for`/`range`/`switch` evaluation, never observed by
    /// ordinary expression evaluation.
    Break,
    Continue,
}

impl Object {
    pub fn int(value: i64) -> Self {
        Object::Int(value)
    }

    pub fn float(value: f64) -> Self {
        Object::Float(value)
    }

    pub fn string(value: impl Into<Rc<str>>) -> Self {
        Object::String(value.into())
    }

    pub fn bool(value: bool) -> Self {
        Object::Bool(value)
    }

    pub fn slice(items: Vec<Object>) -> Self {
        Object::Slice(Heap::new(items))
    }

    pub fn map(entries: FxHashMap<MapKey, Object>) -> Self {
        Object::Map(Heap::new(entries))
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Int(_) => ObjectKind::Int,
            Object::Float(_) => ObjectKind::Float,
            Object::String(_) => ObjectKind::String,
            Object::Bool(_) => ObjectKind::Bool,
            Object::Nil => ObjectKind::Nil,
            Object::Function(_) => ObjectKind::Function,
            Object::Intrinsic(_) => ObjectKind::Intrinsic,
            Object::Package(_) => ObjectKind::Package,
            Object::Instance(_) => ObjectKind::Instance,
            Object::Pointer(_) => ObjectKind::Pointer,
            Object::Variable(_) => ObjectKind::Variable,
            Object::Slice(_) => ObjectKind::Slice,
            Object::Map(_) => ObjectKind::Map,
            Object::MultiReturn(_) => ObjectKind::MultiReturn,
            Object::ReturnValue(_) => ObjectKind::ReturnValue,
            Object::Error(_) => ObjectKind::Error,
            Object::SymbolicPlaceholder(_) => ObjectKind::SymbolicPlaceholder,
            Object::UnresolvedFunction(_) => ObjectKind::UnresolvedFunction,
            Object::UnresolvedType(_) => ObjectKind::UnresolvedType,
            Object::Break => ObjectKind::Break,
            Object::Continue => ObjectKind::Continue,
        }
    }

    /// The scanner-provided type metadata backing this object, when it
    /// has one. Used by selector resolution to find methods/fields.
    pub fn type_info(&self) -> Option<Rc<TypeInfo>> {
        match self {
            Object::Instance(instance) => instance.type_info.clone(),
            Object::SymbolicPlaceholder(placeholder) => placeholder.type_info.clone(),
            Object::Function(function) => function.signature.clone(),
            Object::Pointer(cell) | Object::Variable(cell) => cell.get().type_info(),
            _ => None,
        }
    }

    /// The scanner-provided field-type descriptor for this object, when
    /// one was propagated onto it (e.g. a placeholder standing in for a
    /// declared field or return value).
    pub fn field_type(&self) -> Option<Rc<FieldType>> {
        match self {
            Object::SymbolicPlaceholder(placeholder) => placeholder.field_type.clone(),
            Object::Pointer(cell) | Object::Variable(cell) => cell.get().field_type(),
            _ => None,
        }
    }

    /// Human-readable rendering for diagnostics and logging. Does not
    /// recurse into a `Function`'s captured environment (only its name
    /// and arity), so closure cycles (spec.md §9) can never make this
    /// loop — no visited-set bookkeeping is needed.
    pub fn inspect(&self, interner: &vantage_ir::NameInterner) -> String {
        match self {
            Object::Int(v) => v.to_string(),
            Object::Float(v) => v.to_string(),
            Object::String(v) => v.to_string(),
            Object::Bool(v) => v.to_string(),
            Object::Nil => "nil".to_string(),
            Object::Function(f) => match f.name {
                Some(name) => format!("func {}(...)", interner.resolve(name)),
                None => "func(...)".to_string(),
            },
            Object::Intrinsic(i) => format!("intrinsic {}", i.fq_name),
            Object::Package(p) => format!("package {}", p.name()),
            Object::Instance(instance) => format!("{}{{...}}", interner.resolve(instance.type_name)),
            Object::Pointer(cell) => format!("&{}", cell.get().inspect(interner)),
            Object::Variable(cell) => cell.get().inspect(interner),
            Object::Slice(items) => {
                let rendered: Vec<String> = items
                    .borrow()
                    .iter()
                    .map(|item| item.inspect(interner))
                    .collect();
                format!("[{}]", rendered.join(", "))
            }
            Object::Map(entries) => {
                let rendered: Vec<String> = entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.inspect(interner)))
                    .collect();
                format!("map[{}]", rendered.join(", "))
            }
            Object::MultiReturn(values) => {
                let rendered: Vec<String> =
                    values.iter().map(|v| v.inspect(interner)).collect();
                rendered.join(", ")
            }
            Object::ReturnValue(value) => value.inspect(interner),
            Object::Error(err) => format!("error: {err}"),
            Object::SymbolicPlaceholder(placeholder) => {
                format!("<symbolic: {}>", placeholder.reason)
            }
            Object::UnresolvedFunction(func) => {
                format!("<unresolved func {}.{}>", func.import_path, func.name)
            }
            Object::UnresolvedType(ty) => {
                format!("<unresolved type {}.{}>", ty.import_path, ty.name)
            }
            Object::Break => "break".to_string(),
            Object::Continue => "continue".to_string(),
        }
    }

    /// Whether this object is truthy for `if`/`for` conditions.
    pub fn is_truthy(&self) -> bool {
        match self {
            Object::Bool(v) => *v,
            Object::Nil => false,
            _ => true,
        }
    }

    /// Identifiers that exist only to be unwrapped by the statement
    /// evaluator, never observed as an ordinary expression result.
    pub fn is_control_marker(&self) -> bool {
        matches!(
            self,
            Object::ReturnValue(_) | Object::Break | Object::Continue
        )
    }
}
