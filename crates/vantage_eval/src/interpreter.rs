//! Interpreter Facade (spec.md §4.6): the engine's public entry point.

use std::rc::Rc;

use vantage_ir::{Block, Expr, File, Name, Stmt, TypeInfo};
use vantage_object::{
    EvalContext, Environment, Error, Function, FunctionBody, Instance, Intrinsic, Object, Package,
    SymbolicPlaceholder, VariableCell,
};

use crate::eval::{call, control, expr, EvalCtx};
use crate::services::Services;
use crate::type_relations::DispatchKey;

/// A syntax node the facade can evaluate directly (spec.md §4.6:
/// "ask the facade to evaluate a syntax node, typically a file").
pub enum EvalNode<'a> {
    /// Defines every package-level function the file declares into
    /// the facade's persistent global environment, without going
    /// through the Package Loader's scanner-driven materialization —
    /// the bootstrapping step for whichever file holds the caller's
    /// chosen entry point.
    File(&'a File),
    Block(&'a Block),
    Stmt(&'a Stmt),
    Expr(&'a Expr),
}

/// Public entry (spec.md §2/§4.6). Construct exclusively through
/// `InterpreterBuilder`.
pub struct Interpreter {
    services: Rc<Services>,
    /// The "persistent global environment" spec.md §4.6 describes
    /// `evaluate` populating — distinct from any one `Package`'s own
    /// `env`, since the caller's entry file may not have gone through
    /// `loadPackage` at all.
    global_env: Environment,
    /// Context package for facade-level operations that have no
    /// caller-supplied package to hand the Evaluator Core (namely this
    /// type's own `EvalContext` implementation). Carries no scanner
    /// metadata; it only exists to give `EvalCtx` somewhere to resolve
    /// primary-scope checks and loader calls against.
    root_package: Rc<Package>,
}

impl Interpreter {
    pub(crate) fn new(services: Rc<Services>, global_env: Environment, root_package: Rc<Package>) -> Self {
        Interpreter {
            services,
            global_env,
            root_package,
        }
    }

    pub fn global_env(&self) -> &Environment {
        &self.global_env
    }

    pub fn services(&self) -> &Rc<Services> {
        &self.services
    }

    /// Evaluate a syntax node (spec.md §4.6 `evaluate(node, package)`).
    pub fn evaluate(&self, node: EvalNode<'_>, package: &Rc<Package>) -> Result<Object, Error> {
        let ctx = EvalCtx::new(&self.services, package);
        let result = match node {
            EvalNode::File(file) => {
                for func_decl in &file.funcs {
                    if func_decl.receiver.is_some() {
                        // Methods have no place in a flat global
                        // environment; they stay reachable only
                        // through the package's own method registry.
                        continue;
                    }
                    let function = Function::new(
                        Some(func_decl.name),
                        FunctionBody::Decl(Rc::clone(func_decl)),
                        self.global_env.clone(),
                    )
                    .with_package(Rc::clone(package));
                    self.global_env
                        .define(func_decl.name, Object::Function(Rc::new(function)));
                }
                Object::Nil
            }
            EvalNode::Block(block) => control::eval_block(&ctx, &self.global_env, block),
            EvalNode::Stmt(stmt) => control::eval_stmt(&ctx, &self.global_env, stmt),
            EvalNode::Expr(expr_node) => expr::eval_expr(&ctx, &self.global_env, expr_node),
        };
        as_result(result)
    }

    /// Apply a callable to already-evaluated arguments (spec.md §4.6
    /// `apply(fn, args, package)`).
    pub fn apply(&self, callee: &Object, args: &[Object], package: &Rc<Package>) -> Result<Object, Error> {
        let ctx = EvalCtx::new(&self.services, package);
        as_result(call::apply_callable(&ctx, callee, args))
    }

    /// Look up `name` in the persistent global environment.
    pub fn find_object(&self, name: Name) -> Option<Object> {
        self.global_env.get(name)
    }

    /// Look up `name` in a package's exported symbols, loading the
    /// package first if it hasn't been referenced yet.
    pub fn find_object_in_package(&self, import_path: &str, name: Name) -> Option<Object> {
        let package = self.services.loader.load(import_path, &self.services);
        package.env.get(name)
    }

    pub fn register_intrinsic(&self, intrinsic: Intrinsic) {
        self.services.intrinsics.borrow_mut().register(intrinsic);
    }

    pub fn register_default_intrinsic(&self, intrinsic: Intrinsic) {
        self.services.intrinsics.borrow_mut().register_default(intrinsic);
    }

    pub fn push_intrinsics(&self) {
        self.services.intrinsics.borrow_mut().push();
    }

    pub fn pop_intrinsics(&self) {
        self.services.intrinsics.borrow_mut().pop();
    }

    /// Mint a fresh symbolic value under a human-readable name,
    /// optionally carrying scanner-resolved type metadata (spec.md
    /// §4.6 `newSymbolic(name, qualifiedType)`).
    pub fn new_symbolic(&self, reason: &str, qualified_type: Option<Rc<TypeInfo>>) -> Object {
        let mut placeholder = SymbolicPlaceholder::new(Rc::from(reason));
        if let Some(type_info) = qualified_type {
            placeholder = placeholder.with_type_info(type_info);
        }
        Object::SymbolicPlaceholder(placeholder)
    }

    /// Force the engine to treat `concrete_qname` as an implementer of
    /// `iface_qname` regardless of scanner-derived method-set evidence
    /// (spec.md §4.6 `bindInterface`). Returns `true` if this wasn't
    /// already known.
    pub fn bind_interface(&self, iface_qname: impl Into<Rc<str>>, concrete_qname: impl Into<Rc<str>>) -> bool {
        self.services
            .type_relations
            .bind_interface(iface_qname.into(), concrete_qname.into())
    }

    /// Replay every outstanding `(interface, method, implementer)`
    /// dispatch in lexicographic order (spec.md §4.4/§5, Testable
    /// Property 7), so tooling observes coverage even for implementers
    /// whose concrete call site was never exercised during evaluation.
    pub fn finalize(&self) {
        for key in self.services.type_relations.finalize_plan() {
            self.replay_dispatch(&key);
        }
    }

    fn replay_dispatch(&self, key: &DispatchKey) {
        if !self
            .services
            .type_relations
            .mark_applied(&key.interface_qname, &key.method_name, &key.implementer_qname)
        {
            return;
        }
        let Some((import_path, type_name)) = key.implementer_qname.rsplit_once('.') else {
            return;
        };
        let value_fq: Rc<str> = Rc::from(vantage_ir::value_method(import_path, type_name, &key.method_name));
        let pointer_fq: Rc<str> = Rc::from(vantage_ir::pointer_method(import_path, type_name, &key.method_name));

        let package = self.services.loader.load(import_path, &self.services);
        let ctx = EvalCtx::new(&self.services, &package);

        let intrinsic = self
            .services
            .intrinsics
            .borrow()
            .lookup_specific(&value_fq)
            .or_else(|| self.services.intrinsics.borrow().lookup_specific(&pointer_fq));
        if let Some(intrinsic) = intrinsic {
            call::apply_callable(&ctx, &Object::Intrinsic(intrinsic), &[]);
            return;
        }

        if let Some(function) = package.find_method(&value_fq).or_else(|| package.find_method(&pointer_fq)) {
            let receiver = Object::Instance(Instance::new(function.name.unwrap_or(Name::EMPTY), None));
            let bound = Rc::new((*function).clone().with_bound_receiver(VariableCell::new(receiver)));
            call::apply_callable(&ctx, &Object::Function(bound), &[]);
        }
    }
}

fn as_result(obj: Object) -> Result<Object, Error> {
    match obj {
        Object::Error(err) => Err(err),
        other => Ok(other),
    }
}

/// Lets host code outside the evaluator call back into it through the
/// same capability an `Intrinsic` handler uses, without needing a
/// specific package for context.
impl EvalContext for Interpreter {
    fn apply(&mut self, callee: &Object, args: &[Object]) -> Object {
        let ctx = EvalCtx::new(&self.services, &self.root_package);
        call::apply_callable(&ctx, callee, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::InterpreterBuilder;
    use vantage_ir::{Lit, ModuleInfo, NameInterner, PackageMeta, ScanError, Span, Stmt};

    struct FakeScanner;
    impl vantage_ir::Scanner for FakeScanner {
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

    fn test_interner(interpreter: &Interpreter) -> Rc<NameInterner> {
        Rc::clone(&interpreter.services().interner)
    }

    #[test]
    fn evaluating_a_file_defines_its_functions_in_the_global_env() {
        let interpreter = InterpreterBuilder::new(Rc::new(FakeScanner)).build();
        let interner = test_interner(&interpreter);
        let answer = interner.intern("answer");

        let func_decl = Rc::new(vantage_ir::FuncDecl {
            name: answer,
            receiver: None,
            type_params: vec![],
            params: vec![],
            variadic: false,
            results: vec![],
            body: Some(Rc::new(vantage_ir::Block {
                stmts: vec![Stmt::Return {
                    span: Span::DUMMY,
                    values: vec![Expr::Lit {
                        span: Span::DUMMY,
                        value: Lit::Int(42),
                    }],
                }],
            })),
        });
        let file = File {
            path: Rc::from("main.go"),
            funcs: vec![Rc::clone(&func_decl)],
        };
        let package = Rc::new(Package::new("app/main", "main"));

        interpreter.evaluate(EvalNode::File(&file), &package).expect("file evaluates");
        let function = interpreter.find_object(answer).expect("function defined");
        assert!(matches!(function, Object::Function(_)));

        let result = interpreter.apply(&function, &[], &package).expect("apply succeeds");
        assert!(matches!(result, Object::Int(42)));
    }

    #[test]
    fn methods_are_not_defined_in_the_global_env() {
        let interpreter = InterpreterBuilder::new(Rc::new(FakeScanner)).build();
        let interner = test_interner(&interpreter);
        let method_name = interner.intern("Method");
        let recv_name = interner.intern("r");
        let recv_type = interner.intern("T");

        let func_decl = Rc::new(vantage_ir::FuncDecl {
            name: method_name,
            receiver: Some((recv_name, recv_type, false)),
            type_params: vec![],
            params: vec![],
            variadic: false,
            results: vec![],
            body: Some(Rc::new(vantage_ir::Block { stmts: vec![] })),
        });
        let file = File {
            path: Rc::from("main.go"),
            funcs: vec![func_decl],
        };
        let package = Rc::new(Package::new("app/main", "main"));

        interpreter.evaluate(EvalNode::File(&file), &package).expect("file evaluates");
        assert!(interpreter.find_object(method_name).is_none());
    }

    #[test]
    fn new_symbolic_without_type_info() {
        let interpreter = InterpreterBuilder::new(Rc::new(FakeScanner)).build();
        let value = interpreter.new_symbolic("unresolved import", None);
        assert!(matches!(value, Object::SymbolicPlaceholder(_)));
    }

    #[test]
    fn bind_interface_reports_first_binding_as_new() {
        let interpreter = InterpreterBuilder::new(Rc::new(FakeScanner)).build();
        assert!(interpreter.bind_interface("pkg.Iface", "pkg.Concrete"));
        assert!(!interpreter.bind_interface("pkg.Iface", "pkg.Concrete"));
    }

    #[test]
    fn finalize_with_no_pending_dispatch_is_a_no_op() {
        let interpreter = InterpreterBuilder::new(Rc::new(FakeScanner)).build();
        interpreter.finalize();
    }
}
