//! Package Loader (spec.md §4.2).

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use vantage_diagnostic::LogEvent;
use vantage_ir::{NameInterner, Scanner};
use vantage_object::{Function, FunctionBody, Object, Package};

use crate::services::Services;

/// Lazy, policy-gated package cache. Caches by import path for the
/// lifetime of the owning `Interpreter` (spec.md §3 lifecycle note).
pub struct PackageLoader {
    scanner: Rc<dyn Scanner>,
    interner: Rc<NameInterner>,
    cache: RefCell<FxHashMap<Rc<str>, Rc<Package>>>,
}

impl PackageLoader {
    pub fn new(scanner: Rc<dyn Scanner>, interner: Rc<NameInterner>) -> Self {
        PackageLoader {
            scanner,
            interner,
            cache: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn cached(&self, import_path: &str) -> Option<Rc<Package>> {
        self.cache.borrow().get(import_path).cloned()
    }

    pub fn loaded_packages(&self) -> Vec<Rc<Package>> {
        self.cache.borrow().values().cloned().collect()
    }

    /// Resolve `import_path` to a `Package`, materializing it from the
    /// scanner on first request. `services` is threaded through so a
    /// package-level `var`/`const` lazy initializer can later call back
    /// into the full evaluator (see `services.rs`'s module doc).
    pub fn load(&self, import_path: &str, services: &Rc<Services>) -> Rc<Package> {
        if let Some(cached) = self.cached(import_path) {
            return cached;
        }
        let in_scope = services.is_primary_scope(import_path) || services.is_symbolic_scope(import_path);
        let package = if !in_scope {
            services.logger.log(&LogEvent::PackageOutOfScope { import_path });
            Rc::new(Package::stub(import_path))
        } else {
            match self.scanner.scan_package_by_import(import_path) {
                Ok(meta) => {
                    services.logger.log(&LogEvent::PackageLoaded { import_path });
                    self.materialize(meta, services)
                }
                Err(_) => Rc::new(Package::stub(import_path)),
            }
        };
        self.cache
            .borrow_mut()
            .insert(Rc::from(import_path), Rc::clone(&package));
        package
    }

    fn materialize(&self, meta: vantage_ir::PackageMeta, services: &Rc<Services>) -> Rc<Package> {
        let meta = Rc::new(meta);
        let package = Rc::new(
            Package::new(Rc::clone(&meta.import_path), Rc::clone(&meta.declared_name))
                .with_meta(Rc::clone(&meta)),
        );

        for func_decl in &meta.funcs {
            let function = Function::new(
                Some(func_decl.name),
                FunctionBody::Decl(Rc::clone(func_decl)),
                package.env.clone(),
            )
            .with_package(Rc::clone(&package));
            let function = Rc::new(function);
            match &func_decl.receiver {
                None => {
                    package.env.define(func_decl.name, Object::Function(function));
                }
                Some((_, receiver_type, pointer_receiver)) => {
                    let type_name = self.interner.resolve(*receiver_type);
                    let method_name = self.interner.resolve(func_decl.name);
                    let fq: Rc<str> = Rc::from(if *pointer_receiver {
                        vantage_ir::pointer_method(&meta.import_path, &type_name, &method_name)
                    } else {
                        vantage_ir::value_method(&meta.import_path, &type_name, &method_name)
                    });
                    package.register_method(fq, function);
                }
            }
        }

        for type_info in &meta.types {
            let placeholder = Object::SymbolicPlaceholder(
                vantage_object::SymbolicPlaceholder::new("package-level type")
                    .with_type_info(Rc::clone(type_info)),
            );
            package.env.define(type_info.name, placeholder);

            let qname: Rc<str> = Rc::from(type_info.qualified_name(&self.interner));
            match type_info.kind {
                vantage_ir::TypeKind::Interface => {
                    services.type_relations.add_interface(qname, Rc::clone(type_info));
                }
                vantage_ir::TypeKind::Struct => {
                    services.type_relations.add_struct(qname, Rc::clone(type_info));
                }
                vantage_ir::TypeKind::Alias | vantage_ir::TypeKind::Func => {}
            }
        }

        for value in &meta.values {
            let name = value.name;
            let is_const = value.is_const;
            match &value.init {
                Some(init_expr) => {
                    let init_expr = init_expr.clone();
                    let env = package.env.clone();
                    let services = Rc::clone(services);
                    let owning_package = Rc::clone(&package);
                    let init: vantage_object::LazyInit = Box::new(move || {
                        crate::eval::eval_expr_standalone(&services, &owning_package, &env, &init_expr)
                    });
                    package.env.define_lazy(name, init, is_const);
                }
                None => {
                    let placeholder = Object::SymbolicPlaceholder(
                        vantage_object::SymbolicPlaceholder::new("package value with no initializer"),
                    );
                    if is_const {
                        package.env.define_const(name, placeholder);
                    } else {
                        package.env.define(name, placeholder);
                    }
                }
            }
        }

        package
    }

    /// Correct an import alias to the package's declared name
    /// (spec.md §4.2). Binds the declared name too, in the importing
    /// file's environment, so lookups under either name resolve to the
    /// same `Package` object (Testable Property 9).
    pub fn correct_alias(
        &self,
        importer_env: &vantage_object::Environment,
        alias: &str,
        package: &Rc<Package>,
        logger: &dyn vantage_diagnostic::Logger,
    ) {
        let declared_name = package.name();
        if declared_name.as_ref() == alias {
            return;
        }
        let declared = self.interner.intern(&declared_name);
        importer_env.define(declared, Object::Package(Rc::clone(package)));
        logger.log(&LogEvent::ImportNameCorrected {
            import_path: &package.import_path,
            alias,
            declared_name: &declared_name,
        });
    }
}
