//! Memoization cache for pure symbolic function analysis (spec.md
//! §4.3/§9 "memoization caveat").
//!
//! Sound only when intrinsics have no observable side effects; off by
//! default, per spec.md §9.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use vantage_object::{ObjectKind, Object};

/// Key: the function's identity plus the coarse kind of each concrete
/// argument. Using `ObjectKind` rather than full structural equality
/// keeps the key cheap and matches spec.md's "(function, concrete
/// arg-types)" — the engine never needs finer-grained cache keys since
/// it over-approximates by kind, not by value.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct MemoKey {
    function_identity: usize,
    arg_kinds: Vec<ObjectKindTag>,
}

#[derive(Clone, Copy, Eq, PartialEq, Hash)]
struct ObjectKindTag(u8);

fn tag(kind: ObjectKind) -> ObjectKindTag {
    ObjectKindTag(kind as u8)
}

impl MemoKey {
    pub fn new(function_identity: usize, args: &[Object]) -> Self {
        MemoKey {
            function_identity,
            arg_kinds: args.iter().map(|a| tag(a.kind())).collect(),
        }
    }
}

#[derive(Default)]
pub struct MemoCache {
    entries: RefCell<FxHashMap<MemoKey, Object>>,
}

impl MemoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &MemoKey) -> Option<Object> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn insert(&self, key: MemoKey, value: Object) {
        self.entries.borrow_mut().insert(key, value);
    }
}

/// Stable identity for a callable, used as the non-argument half of a
/// `MemoKey`.
pub fn function_identity(function: &Rc<vantage_object::Function>) -> usize {
    Rc::as_ptr(function) as usize
}
