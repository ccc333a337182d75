//! `InterpreterBuilder`, the sole construction path for an `Interpreter`
//! (spec.md §4.6 EXPANSION).

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use vantage_diagnostic::{Logger, NullLogger};
use vantage_ir::{NameInterner, Scanner};
use vantage_object::Environment;

use crate::interpreter::Interpreter;
use crate::intrinsics::IntrinsicRegistry;
use crate::loader::PackageLoader;
use crate::memo::MemoCache;
use crate::scope_pattern::ScopePattern;
use crate::services::Services;
use crate::tracer::{NullTracer, Tracer};
use crate::type_relations::TypeRelations;

/// Conservative default so a misconfigured analysis run fails with
/// `StepLimitExceeded` rather than hanging the host process (spec.md
/// §4.7/Testable Property 4: "total node evaluations ≤ configured step
/// limit" — the limit itself is a host choice; this is just the value
/// a caller gets without naming one).
const DEFAULT_STEP_LIMIT: u64 = 2_000_000;

/// Builder for creating `Interpreter` instances with various
/// configurations (spec.md §4.6's configuration-options list).
pub struct InterpreterBuilder {
    scanner: Rc<dyn Scanner>,
    logger: Option<Rc<dyn Logger>>,
    tracer: Option<Rc<dyn Tracer>>,
    primary_scope: Vec<ScopePattern>,
    symbolic_scope: Vec<ScopePattern>,
    scan_policy_override: Option<Rc<dyn Fn(&str) -> bool>>,
    step_limit: u64,
    memoize: bool,
}

impl InterpreterBuilder {
    /// Start a builder over the given `Scanner` capability — the one
    /// required collaborator every `Interpreter` needs (spec.md §6).
    pub fn new(scanner: Rc<dyn Scanner>) -> Self {
        InterpreterBuilder {
            scanner,
            logger: None,
            tracer: None,
            primary_scope: Vec::new(),
            symbolic_scope: Vec::new(),
            scan_policy_override: None,
            step_limit: DEFAULT_STEP_LIMIT,
            memoize: false,
        }
    }

    #[must_use]
    pub fn logger(mut self, logger: Rc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    #[must_use]
    pub fn tracer(mut self, tracer: Rc<dyn Tracer>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Primary-analysis scope patterns (spec.md §4.6/§6). An empty list
    /// (the default) means every package the scanner knows about is in
    /// primary scope.
    #[must_use]
    pub fn primary_scope(mut self, patterns: &[&str]) -> Self {
        self.primary_scope = patterns.iter().map(|p| ScopePattern::parse(p)).collect();
        self
    }

    /// Symbolic-dependency scope patterns: packages parsed for
    /// declarations only, with function bodies discarded (spec.md §2
    /// Package Loader row).
    #[must_use]
    pub fn symbolic_scope(mut self, patterns: &[&str]) -> Self {
        self.symbolic_scope = patterns.iter().map(|p| ScopePattern::parse(p)).collect();
        self
    }

    /// Override the default pattern-based scan policy with an explicit
    /// callback (spec.md §6 "scan-policy callback").
    #[must_use]
    pub fn scan_policy_override(mut self, policy: impl Fn(&str) -> bool + 'static) -> Self {
        self.scan_policy_override = Some(Rc::new(policy));
        self
    }

    #[must_use]
    pub fn step_limit(mut self, limit: u64) -> Self {
        self.step_limit = limit;
        self
    }

    /// Enable memoization of pure symbolic function analysis (spec.md
    /// §9 caveat: off by default since it's only sound when intrinsics
    /// have no observable side effects).
    #[must_use]
    pub fn memoize(mut self, enabled: bool) -> Self {
        self.memoize = enabled;
        self
    }

    pub fn build(self) -> Interpreter {
        let interner = Rc::new(NameInterner::new());
        let loader = PackageLoader::new(Rc::clone(&self.scanner), Rc::clone(&interner));

        let services = Rc::new(Services {
            scanner: self.scanner,
            interner,
            logger: self.logger.unwrap_or_else(|| Rc::new(NullLogger)),
            tracer: self.tracer.unwrap_or_else(|| Rc::new(NullTracer)),
            loader,
            type_relations: TypeRelations::new(),
            intrinsics: RefCell::new(IntrinsicRegistry::new()),
            memo: MemoCache::new(),
            memoize: self.memoize,
            step_count: Cell::new(0),
            step_limit: self.step_limit,
            call_stack: RefCell::new(Vec::new()),
            cancelled: Cell::new(false),
            primary_scope: self.primary_scope,
            symbolic_scope: self.symbolic_scope,
            scan_policy_override: self.scan_policy_override,
        });

        let global_env = Environment::new();
        let root_package = Rc::new(vantage_object::Package::stub("<global>"));
        Interpreter::new(services, global_env, root_package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use vantage_ir::{ModuleInfo, PackageMeta, ScanError};

    struct FakeScanner;
    impl Scanner for FakeScanner {
        fn scan_package_by_import(&self, import_path: &str) -> Result<PackageMeta, ScanError> {
            Err(ScanError {
                import_path: Rc::from(import_path),
                message: "not found".into(),
            })
        }
        fn scan_files(&self, _paths: &[&str]) -> Result<PackageMeta, ScanError> {
            unimplemented!()
        }
        fn modules(&self) -> Vec<ModuleInfo> {
            vec![]
        }
    }

    #[test]
    fn default_build_has_conservative_step_limit() {
        let interpreter = InterpreterBuilder::new(Rc::new(FakeScanner)).build();
        assert_eq!(interpreter.services().step_limit, DEFAULT_STEP_LIMIT);
        assert!(!interpreter.services().memoize);
    }

    #[test]
    fn step_limit_and_memoize_are_configurable() {
        let interpreter = InterpreterBuilder::new(Rc::new(FakeScanner))
            .step_limit(42)
            .memoize(true)
            .build();
        assert_eq!(interpreter.services().step_limit, 42);
        assert!(interpreter.services().memoize);
    }

    #[test]
    fn scope_patterns_are_parsed() {
        let interpreter = InterpreterBuilder::new(Rc::new(FakeScanner))
            .primary_scope(&["app/..."])
            .symbolic_scope(&["vendor/..."])
            .build();
        assert_eq!(interpreter.services().primary_scope.len(), 1);
        assert_eq!(interpreter.services().symbolic_scope.len(), 1);
    }
}
