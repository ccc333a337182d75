//! Objects standing in for values the engine deliberately does not model
//! concretely (spec.md §3): symbolic results, and symbols from packages
//! excluded by scan policy.

use std::rc::Rc;

use vantage_ir::{FieldType, TypeInfo};

use crate::function::Function;

/// A value of known type but unknown runtime content.
///
/// Produced wherever the engine over-approximates rather than
/// simulating execution: the result of calling an out-of-scope
/// function, a host intrinsic that returned `Nil`, `new`/`make` results,
/// etc. `reason` is purely diagnostic (shown in `Inspect()`), never
/// matched on.
#[derive(Clone, Debug)]
pub struct SymbolicPlaceholder {
    pub type_info: Option<Rc<TypeInfo>>,
    pub field_type: Option<Rc<FieldType>>,
    pub reason: Rc<str>,
    /// Set when this placeholder models "the result of calling X", so a
    /// later selector expression on it can still resolve methods
    /// against X's declared return type (spec.md §4.3 selector rules).
    pub underlying_func: Option<Rc<Function>>,
}

impl SymbolicPlaceholder {
    pub fn new(reason: impl Into<Rc<str>>) -> Self {
        SymbolicPlaceholder {
            type_info: None,
            field_type: None,
            reason: reason.into(),
            underlying_func: None,
        }
    }

    #[must_use]
    pub fn with_type_info(mut self, type_info: Rc<TypeInfo>) -> Self {
        self.type_info = Some(type_info);
        self
    }

    #[must_use]
    pub fn with_field_type(mut self, field_type: Rc<FieldType>) -> Self {
        self.field_type = Some(field_type);
        self
    }

    #[must_use]
    pub fn with_underlying_func(mut self, func: Rc<Function>) -> Self {
        self.underlying_func = Some(func);
        self
    }
}

/// A function symbol in a package excluded by scan policy: only the
/// identifier and import path survive, no body was ever parsed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnresolvedFunction {
    pub import_path: Rc<str>,
    pub name: Rc<str>,
}

/// A type symbol in a package excluded by scan policy.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnresolvedType {
    pub import_path: Rc<str>,
    pub name: Rc<str>,
}
