//! End-to-end scenarios exercising the `Interpreter` facade against
//! hand-built scanner fixtures, standing in for a real front-end.

use std::cell::Cell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use vantage_eval::{EvalNode, InterpreterBuilder};
use vantage_ir::{
    AssignOp, Block, Expr, FuncDecl, Lit, MethodInfo, ModuleInfo, Name, NameInterner, Param,
    PackageMeta, ScanError, Scanner, Span, Stmt, TypeInfo, TypeKind, UnaryOp, ValueMeta,
};
use vantage_object::{Intrinsic, Object};

struct FixtureScanner {
    packages: FxHashMap<Rc<str>, PackageMeta>,
}

impl FixtureScanner {
    fn new(packages: Vec<PackageMeta>) -> Self {
        FixtureScanner {
            packages: packages.into_iter().map(|m| (Rc::clone(&m.import_path), m)).collect(),
        }
    }
}

impl Scanner for FixtureScanner {
    fn scan_package_by_import(&self, import_path: &str) -> Result<PackageMeta, ScanError> {
        self.packages.get(import_path).cloned().ok_or_else(|| ScanError {
            import_path: Rc::from(import_path),
            message: "no such fixture package".into(),
        })
    }

    fn scan_files(&self, _paths: &[&str]) -> Result<PackageMeta, ScanError> {
        unimplemented!("fixtures are addressed by import path only")
    }

    fn modules(&self) -> Vec<ModuleInfo> {
        vec![]
    }
}

fn ident(name: Name) -> Expr {
    Expr::Ident { span: Span::DUMMY, name }
}

fn lit_str(s: &str) -> Expr {
    Expr::Lit {
        span: Span::DUMMY,
        value: Lit::String(Rc::from(s)),
    }
}

fn call_expr(func: Expr, args: Vec<Expr>) -> Expr {
    Expr::Call {
        span: Span::DUMMY,
        func: Rc::new(func),
        args,
        type_args: vec![],
        spread: false,
    }
}

fn func_decl(name: Name, params: Vec<Param>, results: Vec<Name>, body: Vec<Stmt>) -> Rc<FuncDecl> {
    Rc::new(FuncDecl {
        name,
        receiver: None,
        type_params: vec![],
        params,
        variadic: false,
        results,
        body: Some(Rc::new(Block { stmts: body })),
    })
}

#[test]
fn s1_cross_package_interface_dispatch_calls_every_concrete_implementer() {
    let interner = NameInterner::new();
    let greet = interner.intern("Greet");
    let g = interner.intern("G");
    let one = interner.intern("One");
    let two = interner.intern("Two");
    let run = interner.intern("run");
    let g_var = interner.intern("g");

    let greet_method = |name: Name| MethodInfo {
        name,
        pointer_receiver: false,
        params: vec![],
        results: vec![],
    };

    let a_meta = PackageMeta {
        import_path: Rc::from("pkg/a"),
        declared_name: Rc::from("a"),
        types: vec![Rc::new(TypeInfo {
            name: g,
            import_path: Rc::from("pkg/a"),
            kind: TypeKind::Interface,
            fields: vec![],
            methods: vec![greet_method(greet)],
            underlying: None,
        })],
        ..Default::default()
    };

    let one_method = func_decl(
        greet,
        vec![],
        vec![],
        vec![Stmt::Return { span: Span::DUMMY, values: vec![] }],
    );
    let mut one_method_decl = (*one_method).clone();
    one_method_decl.receiver = Some((interner.intern("r"), one, false));
    let mut two_method_decl = (*one_method).clone();
    two_method_decl.receiver = Some((interner.intern("r"), two, false));

    let b_meta = PackageMeta {
        import_path: Rc::from("pkg/b"),
        declared_name: Rc::from("b"),
        types: vec![
            Rc::new(TypeInfo {
                name: one,
                import_path: Rc::from("pkg/b"),
                kind: TypeKind::Struct,
                fields: vec![],
                methods: vec![greet_method(greet)],
                underlying: None,
            }),
            Rc::new(TypeInfo {
                name: two,
                import_path: Rc::from("pkg/b"),
                kind: TypeKind::Struct,
                fields: vec![],
                methods: vec![greet_method(greet)],
                underlying: None,
            }),
        ],
        funcs: vec![Rc::new(one_method_decl), Rc::new(two_method_decl)],
        ..Default::default()
    };

    // `g := One{}; g.Greet(); g = Two{}; g.Greet()`
    let run_body = vec![
        Stmt::Assign {
            span: Span::DUMMY,
            op: AssignOp::Define,
            targets: vec![ident(g_var)],
            values: vec![Expr::Composite { span: Span::DUMMY, type_name: Some(one), fields: vec![] }],
        },
        Stmt::Expr(call_expr(
            Expr::Selector { span: Span::DUMMY, receiver: Rc::new(ident(g_var)), field: greet },
            vec![],
        )),
        Stmt::Assign {
            span: Span::DUMMY,
            op: AssignOp::Assign,
            targets: vec![ident(g_var)],
            values: vec![Expr::Composite { span: Span::DUMMY, type_name: Some(two), fields: vec![] }],
        },
        Stmt::Expr(call_expr(
            Expr::Selector { span: Span::DUMMY, receiver: Rc::new(ident(g_var)), field: greet },
            vec![],
        )),
    ];
    let c_meta = PackageMeta {
        import_path: Rc::from("pkg/c"),
        declared_name: Rc::from("c"),
        funcs: vec![func_decl(run, vec![], vec![], run_body)],
        ..Default::default()
    };

    let scanner = Rc::new(FixtureScanner::new(vec![a_meta, b_meta, c_meta]));
    let interpreter = InterpreterBuilder::new(scanner).build();

    let a_package = interpreter.services().loader.load("pkg/a", interpreter.services());
    let b_package = interpreter.services().loader.load("pkg/b", interpreter.services());
    let c_package = interpreter.services().loader.load("pkg/c", interpreter.services());
    let _ = &a_package;

    // Stand in for what an import of `b` into `c`'s file scope would do:
    // bring `One`/`Two` into the identifiers `Composite` resolves against.
    c_package.env.define(one, b_package.env.get(one).expect("One registered"));
    c_package.env.define(two, b_package.env.get(two).expect("Two registered"));

    let one_calls = Rc::new(Cell::new(0u32));
    let two_calls = Rc::new(Cell::new(0u32));
    {
        let counter = Rc::clone(&one_calls);
        interpreter.register_intrinsic(Intrinsic::new(vantage_ir::value_method("pkg/b", "One", "Greet"), move |_ctx, _args| {
            counter.set(counter.get() + 1);
            Object::Nil
        }));
    }
    {
        let counter = Rc::clone(&two_calls);
        interpreter.register_intrinsic(Intrinsic::new(vantage_ir::value_method("pkg/b", "Two", "Greet"), move |_ctx, _args| {
            counter.set(counter.get() + 1);
            Object::Nil
        }));
    }

    let run_fn = c_package.env.get(run).expect("run defined");
    let result = interpreter.apply(&run_fn, &[], &c_package);
    assert!(result.is_ok(), "apply(run) should not error: {result:?}");
    assert_eq!(one_calls.get(), 1, "(pkg/b.One).Greet should fire exactly once");
    assert_eq!(two_calls.get(), 1, "(pkg/b.Two).Greet should fire exactly once");
}

#[test]
fn s2_recursion_with_state_returns_expected_string_within_step_limit() {
    let interner = NameInterner::new();
    let count = interner.intern("count");
    let get_secret = interner.intern("getSecret");
    let get_greeting = interner.intern("GetGreeting");
    let lib_name = interner.intern("lib");
    let one_expr = |n: i64| Expr::Lit { span: Span::DUMMY, value: Lit::Int(n) };

    // lib.getSecret: count = count + 1; if count < 2 { getSecret() }; return "hello"
    let recurse_once = Stmt::If {
        span: Span::DUMMY,
        cond: Expr::Binary {
            span: Span::DUMMY,
            op: vantage_ir::BinOp::Lt,
            lhs: Rc::new(ident(count)),
            rhs: Rc::new(one_expr(2)),
        },
        then_branch: Block {
            stmts: vec![Stmt::Expr(call_expr(ident(get_secret), vec![]))],
        },
        else_branch: None,
    };
    let get_secret_body = vec![
        Stmt::Assign {
            span: Span::DUMMY,
            op: AssignOp::Assign,
            targets: vec![ident(count)],
            values: vec![Expr::Binary {
                span: Span::DUMMY,
                op: vantage_ir::BinOp::Add,
                lhs: Rc::new(ident(count)),
                rhs: Rc::new(one_expr(1)),
            }],
        },
        recurse_once,
        Stmt::Return {
            span: Span::DUMMY,
            values: vec![lit_str("hello")],
        },
    ];
    let lib_meta = PackageMeta {
        import_path: Rc::from("app/lib"),
        declared_name: Rc::from("lib"),
        funcs: vec![func_decl(get_secret, vec![], vec![], get_secret_body)],
        values: vec![ValueMeta {
            name: count,
            is_const: false,
            init: Some(Expr::Lit { span: Span::DUMMY, value: Lit::Int(0) }),
        }],
        ..Default::default()
    };

    let main_body = vec![Stmt::Return {
        span: Span::DUMMY,
        values: vec![call_expr(
            Expr::Selector { span: Span::DUMMY, receiver: Rc::new(ident(lib_name)), field: get_secret },
            vec![],
        )],
    }];
    let main_meta = PackageMeta {
        import_path: Rc::from("app/main"),
        declared_name: Rc::from("main"),
        funcs: vec![func_decl(get_greeting, vec![], vec![], main_body)],
        ..Default::default()
    };

    let scanner = Rc::new(FixtureScanner::new(vec![lib_meta, main_meta]));
    let interpreter = InterpreterBuilder::new(scanner).build();

    let lib_package = interpreter.services().loader.load("app/lib", interpreter.services());
    let main_package = interpreter.services().loader.load("app/main", interpreter.services());
    main_package.env.define(lib_name, Object::Package(Rc::clone(&lib_package)));

    let get_greeting_fn = main_package.env.get(get_greeting).expect("GetGreeting defined");
    let result = interpreter.apply(&get_greeting_fn, &[], &main_package).expect("apply succeeds");
    assert!(matches!(result, Object::String(ref s) if s.as_ref() == "hello"));
    assert!(interpreter.services().step_count.get() < interpreter.services().step_limit);
}

#[test]
fn s3_external_package_call_yields_placeholder_without_error() {
    let interner = NameInterner::new();
    let use_it = interner.intern("UseIt");
    let ext_name = interner.intern("ext");
    let thing = interner.intern("Thing");
    let do_something = interner.intern("DoSomething");

    let use_it_body = vec![Stmt::Return {
        span: Span::DUMMY,
        values: vec![call_expr(
            Expr::Selector {
                span: Span::DUMMY,
                receiver: Rc::new(call_expr(
                    Expr::Selector { span: Span::DUMMY, receiver: Rc::new(ident(ext_name)), field: thing },
                    vec![],
                )),
                field: do_something,
            },
            vec![],
        )],
    }];
    let app_meta = PackageMeta {
        import_path: Rc::from("app"),
        declared_name: Rc::from("app"),
        funcs: vec![func_decl(use_it, vec![], vec![], use_it_body)],
        ..Default::default()
    };

    // `ext` is never registered with the fixture scanner: out of primary
    // scope, so the loader falls back to a stub package.
    let scanner = Rc::new(FixtureScanner::new(vec![app_meta]));
    let interpreter = InterpreterBuilder::new(scanner).primary_scope(&["app"]).build();

    let app_package = interpreter.services().loader.load("app", interpreter.services());
    let ext_package = interpreter.services().loader.load("ext", interpreter.services());
    assert!(ext_package.out_of_scope);
    app_package.env.define(ext_name, Object::Package(Rc::clone(&ext_package)));

    let use_it_fn = app_package.env.get(use_it).expect("UseIt defined");
    let result = interpreter.apply(&use_it_fn, &[], &app_package);
    assert!(result.is_ok(), "evaluation must return without error: {result:?}");
    assert!(matches!(result.unwrap(), Object::SymbolicPlaceholder(_)));
}

#[test]
fn s4_map_index_assignment_evaluates_rhs_exactly_once() {
    let interner = NameInterner::new();
    let get_value = interner.intern("getValue");
    let m = interner.intern("m");
    let make_fn = interner.intern("make");

    let get_value_decl = func_decl(
        get_value,
        vec![],
        vec![],
        vec![Stmt::Return { span: Span::DUMMY, values: vec![lit_str("world")] }],
    );
    let main_body = vec![
        Stmt::Assign {
            span: Span::DUMMY,
            op: AssignOp::Define,
            targets: vec![ident(m)],
            values: vec![call_expr(ident(make_fn), vec![])],
        },
        Stmt::Assign {
            span: Span::DUMMY,
            op: AssignOp::Assign,
            targets: vec![Expr::Index {
                span: Span::DUMMY,
                receiver: Rc::new(ident(m)),
                index: Rc::new(lit_str("hello")),
            }],
            values: vec![call_expr(ident(get_value), vec![])],
        },
    ];
    let main_meta = PackageMeta {
        import_path: Rc::from("main"),
        declared_name: Rc::from("main"),
        funcs: vec![get_value_decl, func_decl(interner.intern("Run"), vec![], vec![], main_body)],
        ..Default::default()
    };

    let scanner = Rc::new(FixtureScanner::new(vec![main_meta]));
    let interpreter = InterpreterBuilder::new(scanner).build();
    let main_package = interpreter.services().loader.load("main", interpreter.services());

    let calls = Rc::new(Cell::new(0u32));
    {
        let counter = Rc::clone(&calls);
        interpreter.register_intrinsic(Intrinsic::new(vantage_ir::package_func("main", "getValue"), move |_ctx, _args| {
            counter.set(counter.get() + 1);
            Object::string("world")
        }));
    }

    let run_fn = main_package.env.get(interner.intern("Run")).expect("Run defined");
    let result = interpreter.apply(&run_fn, &[], &main_package);
    assert!(result.is_ok(), "{result:?}");
    assert_eq!(calls.get(), 1, "getValue must fire exactly once");
}

#[test]
fn s5_mismatched_package_name_resolves_alias_and_declared_name_to_the_same_package() {
    let interner = NameInterner::new();
    let yaml_meta = PackageMeta {
        import_path: Rc::from("gopkg.in/yaml.v2"),
        declared_name: Rc::from("yaml"),
        ..Default::default()
    };
    let scanner = Rc::new(FixtureScanner::new(vec![yaml_meta]));
    let interpreter = InterpreterBuilder::new(scanner).build();

    let importer_env = vantage_object::Environment::new();
    let package = interpreter.services().loader.load("gopkg.in/yaml.v2", interpreter.services());
    let v2_alias = interner.intern("v2");
    importer_env.define(v2_alias, Object::Package(Rc::clone(&package)));
    interpreter
        .services()
        .loader
        .correct_alias(&importer_env, "v2", &package, interpreter.services().logger.as_ref());

    let yaml_name = interner.intern("yaml");
    let via_alias = importer_env.get(v2_alias);
    let via_declared = importer_env.get(yaml_name);
    match (via_alias, via_declared) {
        (Some(Object::Package(a)), Some(Object::Package(b))) => assert!(Rc::ptr_eq(&a, &b)),
        other => panic!("expected both lookups to resolve to the same package, got {other:?}"),
    }
}

#[test]
fn s6_naked_return_through_pointer_type_produces_nil_without_crashing() {
    let interner = NameInterner::new();
    let get_ptr = interner.intern("GetPtr");
    let result_name = interner.intern("result");
    let ptr_result = interner.intern("r");

    let get_ptr_decl = func_decl(get_ptr, vec![], vec![ptr_result], vec![Stmt::Return { span: Span::DUMMY, values: vec![] }]);
    let run_body = vec![
        Stmt::Assign {
            span: Span::DUMMY,
            op: AssignOp::Define,
            targets: vec![ident(result_name)],
            values: vec![call_expr(ident(get_ptr), vec![])],
        },
        Stmt::Expr(Expr::Unary {
            span: Span::DUMMY,
            op: UnaryOp::Deref,
            operand: Rc::new(ident(result_name)),
        }),
    ];
    let main_meta = PackageMeta {
        import_path: Rc::from("main"),
        declared_name: Rc::from("main"),
        funcs: vec![get_ptr_decl, func_decl(interner.intern("Run"), vec![], vec![], run_body)],
        ..Default::default()
    };

    let scanner = Rc::new(FixtureScanner::new(vec![main_meta]));
    let interpreter = InterpreterBuilder::new(scanner).build();
    let main_package = interpreter.services().loader.load("main", interpreter.services());

    let run_fn = main_package.env.get(interner.intern("Run")).expect("Run defined");
    // Dereferencing the nil pointer produced by the naked return is
    // reported as a graceful `Error` object, not a host-level panic;
    // "must not crash" means exactly that this call below returns.
    let result = interpreter.apply(&run_fn, &[], &main_package);
    match result {
        Ok(_) => {}
        Err(err) => assert_eq!(err.kind, vantage_object::ErrorKind::TypeMismatch),
    }
}

