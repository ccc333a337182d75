//! Concrete struct instantiations.

use std::rc::Rc;

use vantage_ir::{Name, TypeInfo};

use crate::heap::Heap;
use crate::object::Object;

/// A concrete instantiation of a named struct type.
///
/// `fields` is heap-shared (`Heap`) so that field assignment through a
/// pointer (`p.F = v` where `p` is `*T`) mutates the same backing map
/// every alias observes. The engine does not simulate Go's copy-on-
/// assign value semantics for plain (non-pointer) struct assignment —
/// this is a deliberate over-approximation consistent with spec.md
/// §1's "exact execution semantics" non-goal: treating every struct as
/// reference-shared keeps dispatch coverage correct without tracking
/// which handle is "the" owning one.
#[derive(Clone, Debug)]
pub struct Instance {
    pub type_name: Name,
    pub type_info: Option<Rc<TypeInfo>>,
    pub fields: Heap<rustc_hash::FxHashMap<Name, Object>>,
    /// Whether this instance is currently being treated as `*T` (e.g.
    /// came from `&T{}`) rather than `T`, which determines whether
    /// pointer-receiver methods are in its method set (spec.md §4.3).
    pub is_pointer: bool,
}

impl Instance {
    pub fn new(type_name: Name, type_info: Option<Rc<TypeInfo>>) -> Self {
        Instance {
            type_name,
            type_info,
            fields: Heap::new(rustc_hash::FxHashMap::default()),
            is_pointer: false,
        }
    }

    #[must_use]
    pub fn as_pointer(mut self) -> Self {
        self.is_pointer = true;
        self
    }

    pub fn get_field(&self, name: Name) -> Option<Object> {
        self.fields.borrow().get(&name).cloned()
    }

    pub fn set_field(&self, name: Name, value: Object) {
        self.fields.borrow_mut().insert(name, value);
    }
}
