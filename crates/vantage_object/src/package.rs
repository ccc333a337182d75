//! Package objects (spec.md §3/§4.2).

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use vantage_ir::PackageMeta;

use crate::environment::Environment;
use crate::function::Function;

/// A loaded (or stub) package.
///
/// `Package` objects are created at first reference and cached by
/// import path for the lifetime of an `Interpreter` (spec.md §3);
/// `vantage_eval`'s Package Loader owns that cache and is the only
/// thing that constructs one.
#[derive(Debug)]
pub struct Package {
    pub import_path: Rc<str>,
    /// The name this package is actually known by — the declared
    /// `package` clause name, which may differ from the last
    /// import-path segment. Mutable because the loader corrects it in
    /// place once the real scanner result comes back (spec.md §4.2
    /// "name correction"), while every alias that already captured an
    /// `Rc<Package>` needs to see the correction.
    name: RefCell<Rc<str>>,
    /// `None` for a package rejected by scan policy (no parsing occurred).
    pub meta: Option<Rc<PackageMeta>>,
    /// Exported symbols, populated eagerly for in-scope packages and
    /// lazily (on selector miss) for out-of-scope stubs.
    pub env: Environment,
    /// True if scan policy rejected this import path, so its env only
    /// ever holds `UnresolvedFunction`/`UnresolvedType` stand-ins.
    pub out_of_scope: bool,
    /// Methods, keyed by the `vantage_ir::fq` value/pointer-method string.
    /// Kept separate from `env` because multiple types in one package can
    /// declare a method of the same name (`env` has no receiver axis).
    methods: RefCell<FxHashMap<Rc<str>, Rc<Function>>>,
}

impl Package {
    pub fn new(import_path: impl Into<Rc<str>>, declared_name: impl Into<Rc<str>>) -> Self {
        Package {
            import_path: import_path.into(),
            name: RefCell::new(declared_name.into()),
            meta: None,
            env: Environment::new(),
            out_of_scope: false,
            methods: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn stub(import_path: impl Into<Rc<str>>) -> Self {
        let import_path = import_path.into();
        let fallback_name: Rc<str> = import_path
            .rsplit('/')
            .next()
            .unwrap_or(&import_path)
            .into();
        Package {
            import_path,
            name: RefCell::new(fallback_name),
            meta: None,
            env: Environment::new(),
            out_of_scope: true,
            methods: RefCell::new(FxHashMap::default()),
        }
    }

    #[must_use]
    pub fn with_meta(mut self, meta: Rc<PackageMeta>) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn name(&self) -> Rc<str> {
        Rc::clone(&self.name.borrow())
    }

    /// Overwrite the declared name in place (spec.md §4.2 name correction).
    pub fn set_name(&self, name: impl Into<Rc<str>>) {
        *self.name.borrow_mut() = name.into();
    }

    /// Register a method under its fully-qualified value/pointer-method key.
    pub fn register_method(&self, fq_name: impl Into<Rc<str>>, function: Rc<Function>) {
        self.methods.borrow_mut().insert(fq_name.into(), function);
    }

    pub fn find_method(&self, fq_name: &str) -> Option<Rc<Function>> {
        self.methods.borrow().get(fq_name).cloned()
    }
}
