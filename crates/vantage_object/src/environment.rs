//! Lexically nested environment (spec.md §3/§4.1).
//!
//! Unlike the teacher's `ori_eval::Environment` (a flat scope *stack*,
//! appropriate there because closures in that language never outlive a
//! single evaluation call), this engine's closures retain an arbitrary
//! ancestor environment for the lifetime of the `Interpreter` (a
//! `Function` closes over its *defining* environment, which may be a
//! whole package's global scope, and that environment may in turn
//! contain the very `Function` object — spec.md §9's "closure cycles").
//! So `Environment` here is a tree of `Rc`-shared scopes linked by an
//! `outer` pointer, built exclusively through `new_enclosed`, and `get`
//! guards against cycles with a visited set keyed by scope identity.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use vantage_ir::Name;

use crate::object::Object;
use crate::variable::{LazyInit, VarCell, VariableCell};

struct Scope {
    bindings: FxHashMap<Name, VarCell>,
    constants: FxHashSet<Name>,
    outer: Option<Environment>,
}

/// A lexical scope. Cloning shares identity (all clones see the same
/// bindings) — use `new_enclosed` to create an actual child scope.
#[derive(Clone)]
pub struct Environment(Rc<RefCell<Scope>>);

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Environment({:p})", Rc::as_ptr(&self.0))
    }
}

/// Error returned by `assign` when a `=`-style assignment fails.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AssignError {
    /// The binding exists but was declared as a constant.
    Immutable,
    /// No binding with this name is visible from here.
    Undefined,
}

impl Environment {
    /// Create a new root environment with no outer scope (e.g. the
    /// interpreter's persistent global environment, or a package's).
    pub fn new() -> Self {
        Environment(Rc::new(RefCell::new(Scope {
            bindings: FxHashMap::default(),
            constants: FxHashSet::default(),
            outer: None,
        })))
    }

    /// The only way to create a child scope (spec.md §4.1).
    pub fn new_enclosed(outer: &Environment) -> Self {
        Environment(Rc::new(RefCell::new(Scope {
            bindings: FxHashMap::default(),
            constants: FxHashSet::default(),
            outer: Some(outer.clone()),
        })))
    }

    fn identity(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    /// `:=` / `Set`: bind `name` to a fresh cell in *this* scope,
    /// shadowing any outer binding of the same name.
    pub fn define(&self, name: Name, value: Object) {
        self.0
            .borrow_mut()
            .bindings
            .insert(name, VariableCell::new(value));
    }

    /// Like `define`, but marks `name` as a constant in this scope:
    /// future `=`-assignment to it fails with `AssignError::Immutable`.
    pub fn define_const(&self, name: Name, value: Object) {
        let mut scope = self.0.borrow_mut();
        scope.bindings.insert(name, VariableCell::new(value));
        scope.constants.insert(name);
    }

    /// Bind `name` to a lazily-initialized cell (package-level var/const).
    pub fn define_lazy(&self, name: Name, init: LazyInit, is_const: bool) {
        let mut scope = self.0.borrow_mut();
        scope.bindings.insert(name, VariableCell::new_lazy(init));
        if is_const {
            scope.constants.insert(name);
        }
    }

    /// Bind an existing cell directly, e.g. to re-expose a receiver's
    /// variable under its parameter name when entering a method body.
    pub fn define_cell(&self, name: Name, cell: VarCell) {
        self.0.borrow_mut().bindings.insert(name, cell);
    }

    /// Cycle-safe outward search for the cell bound to `name`.
    pub fn get_cell(&self, name: Name) -> Option<VarCell> {
        let mut visited = FxHashSet::default();
        self.get_cell_inner(name, &mut visited)
    }

    fn get_cell_inner(&self, name: Name, visited: &mut FxHashSet<usize>) -> Option<VarCell> {
        if !visited.insert(self.identity()) {
            return None;
        }
        let scope = self.0.borrow();
        if let Some(cell) = scope.bindings.get(&name) {
            return Some(Rc::clone(cell));
        }
        let outer = scope.outer.clone();
        drop(scope);
        outer.and_then(|outer| outer.get_cell_inner(name, visited))
    }

    /// Read the current value of `name`, forcing lazy initializers.
    pub fn get(&self, name: Name) -> Option<Object> {
        self.get_cell(name).map(|cell| cell.get())
    }

    /// `=` to an identifier: locate the existing cell via outward
    /// lookup and rewrite its value in place. Never creates a new cell.
    pub fn assign(&self, name: Name, value: Object) -> Result<(), AssignError> {
        let mut visited = FxHashSet::default();
        self.assign_inner(name, value, &mut visited)
    }

    fn assign_inner(
        &self,
        name: Name,
        value: Object,
        visited: &mut FxHashSet<usize>,
    ) -> Result<(), AssignError> {
        if !visited.insert(self.identity()) {
            return Err(AssignError::Undefined);
        }
        let scope = self.0.borrow();
        if let Some(cell) = scope.bindings.get(&name) {
            if scope.constants.contains(&name) {
                return Err(AssignError::Immutable);
            }
            cell.set(value);
            return Ok(());
        }
        let outer = scope.outer.clone();
        drop(scope);
        match outer {
            Some(outer) => outer.assign_inner(name, value, visited),
            None => Err(AssignError::Undefined),
        }
    }

    /// Whether `name` is bound (in this scope or any ancestor),
    /// without forcing a lazy initializer.
    pub fn is_defined(&self, name: Name) -> bool {
        self.get_cell(name).is_some()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_ir::NameInterner;

    fn name(interner: &NameInterner, s: &str) -> Name {
        interner.intern(s)
    }

    #[test]
    fn define_then_get_in_same_scope() {
        let interner = NameInterner::new();
        let x = name(&interner, "x");
        let env = Environment::new();
        env.define(x, Object::int(42));
        assert!(matches!(env.get(x), Some(Object::Int(42))));
    }

    #[test]
    fn child_scope_shadows_parent() {
        let interner = NameInterner::new();
        let x = name(&interner, "x");
        let parent = Environment::new();
        parent.define(x, Object::int(1));
        let child = Environment::new_enclosed(&parent);
        child.define(x, Object::int(2));
        assert!(matches!(child.get(x), Some(Object::Int(2))));
        assert!(matches!(parent.get(x), Some(Object::Int(1))));
    }

    #[test]
    fn assign_walks_outward_and_mutates_in_place() {
        let interner = NameInterner::new();
        let x = name(&interner, "x");
        let parent = Environment::new();
        parent.define(x, Object::int(1));
        let child = Environment::new_enclosed(&parent);
        assert!(child.assign(x, Object::int(2)).is_ok());
        assert!(matches!(parent.get(x), Some(Object::Int(2))));
    }

    #[test]
    fn assign_to_undefined_name_fails() {
        let interner = NameInterner::new();
        let x = name(&interner, "x");
        let env = Environment::new();
        assert_eq!(env.assign(x, Object::int(1)), Err(AssignError::Undefined));
    }

    #[test]
    fn constants_cannot_be_reassigned() {
        let interner = NameInterner::new();
        let x = name(&interner, "x");
        let env = Environment::new();
        env.define_const(x, Object::int(1));
        assert_eq!(env.assign(x, Object::int(2)), Err(AssignError::Immutable));
    }

    #[test]
    fn self_referential_environment_graph_terminates_lookup() {
        // Build a cycle: env's own scope is its own outer. This can't
        // happen through normal `new_enclosed` use, but a pathological
        // host (or a future bug) could construct one; `get` must still
        // terminate rather than loop forever.
        let interner = NameInterner::new();
        let missing = name(&interner, "missing");
        let env = Environment::new();
        {
            let mut scope = env.0.borrow_mut();
            scope.outer = Some(env.clone());
        }
        assert_eq!(env.get(missing), None);
    }
}
