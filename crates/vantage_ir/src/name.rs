//! Interned string identifier.
//!
//! The engine is single-threaded and cooperative (spec mandates no
//! cross-thread sharing of an `Interpreter`), so unlike a compiler
//! front-end that interns identifiers from multiple parser threads,
//! `NameInterner` needs no sharding or locking: a single `RefCell`-backed
//! table is sufficient and cheaper.

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Interned identifier.
///
/// Two `Name`s compare equal iff they were interned from the same
/// `NameInterner` and the same string content.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    /// Pre-interned empty string, valid for any `NameInterner`.
    pub const EMPTY: Name = Name(0);

    #[inline]
    const fn from_raw(raw: u32) -> Self {
        Name(raw)
    }

    #[inline]
    const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Single-threaded string interner.
pub struct NameInterner {
    inner: RefCell<InternerInner>,
}

struct InternerInner {
    map: FxHashMap<Rc<str>, Name>,
    strings: Vec<Rc<str>>,
}

impl NameInterner {
    /// Create a new interner with the empty string pre-interned at `Name::EMPTY`.
    pub fn new() -> Self {
        let empty: Rc<str> = Rc::from("");
        let mut map = FxHashMap::default();
        map.insert(Rc::clone(&empty), Name::EMPTY);
        NameInterner {
            inner: RefCell::new(InternerInner {
                map,
                strings: vec![empty],
            }),
        }
    }

    /// Intern `s`, returning its `Name`. Interning the same content twice
    /// returns the same `Name`.
    pub fn intern(&self, s: &str) -> Name {
        let mut inner = self.inner.borrow_mut();
        if let Some(name) = inner.map.get(s) {
            return *name;
        }
        let rc: Rc<str> = Rc::from(s);
        let raw = u32::try_from(inner.strings.len()).expect("name interner overflowed u32");
        let name = Name::from_raw(raw);
        inner.strings.push(Rc::clone(&rc));
        inner.map.insert(rc, name);
        name
    }

    /// Resolve a previously interned `Name` back to its string content.
    ///
    /// # Panics
    /// Panics if `name` was not produced by this interner.
    pub fn resolve(&self, name: Name) -> Rc<str> {
        let inner = self.inner.borrow();
        Rc::clone(
            inner
                .strings
                .get(name.raw() as usize)
                .expect("Name not produced by this interner"),
        )
    }
}

impl Default for NameInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_same_string_twice_yields_same_name() {
        let interner = NameInterner::new();
        let a = interner.intern("Greet");
        let b = interner.intern("Greet");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_strings_intern_to_distinct_names() {
        let interner = NameInterner::new();
        let a = interner.intern("One");
        let b = interner.intern("Two");
        assert_ne!(a, b);
    }

    #[test]
    fn resolve_round_trips() {
        let interner = NameInterner::new();
        let name = interner.intern("Greet");
        assert_eq!(&*interner.resolve(name), "Greet");
    }

    #[test]
    fn empty_name_is_pre_interned() {
        let interner = NameInterner::new();
        assert_eq!(interner.intern(""), Name::EMPTY);
    }
}
