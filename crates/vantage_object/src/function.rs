//! Callable objects: user-defined functions/closures and host intrinsics.

use std::rc::Rc;

use vantage_ir::{Block, FuncDecl, Name, Param, TypeInfo};

use crate::environment::Environment;
use crate::object::Object;
use crate::package::Package;
use crate::variable::VarCell;

/// Either a package-level/method declaration or a function literal
/// (lambda). Declarations carry their own params/variadic/body, so
/// rather than duplicating those fields on `Function` we just hold
/// whichever shape the syntax tree gave us.
#[derive(Clone, Debug)]
pub enum FunctionBody {
    Decl(Rc<FuncDecl>),
    Lit {
        params: Vec<Param>,
        variadic: bool,
        body: Rc<Block>,
    },
}

impl FunctionBody {
    pub fn params(&self) -> &[Param] {
        match self {
            FunctionBody::Decl(decl) => &decl.params,
            FunctionBody::Lit { params, .. } => params,
        }
    }

    pub fn variadic(&self) -> bool {
        match self {
            FunctionBody::Decl(decl) => decl.variadic,
            FunctionBody::Lit { variadic, .. } => *variadic,
        }
    }

    pub fn body(&self) -> Option<Rc<Block>> {
        match self {
            FunctionBody::Decl(decl) => decl.body.clone(),
            FunctionBody::Lit { body, .. } => Some(Rc::clone(body)),
        }
    }
}

/// A user-defined function, method, or closure (spec.md §3).
///
/// Holds its *defining* environment so that application can extend it
/// rather than the call site's environment (lexical closures,
/// spec.md §2/§4.3). `defining_env` containing `self` back (a function
/// assigned to a package-level name closes over the package scope that
/// holds it) is an intentional cycle (spec.md §9) — cleanup relies on
/// the whole `Interpreter`'s caches being dropped together, never on
/// per-function reference counting reaching zero early.
#[derive(Clone, Debug)]
pub struct Function {
    pub name: Option<Name>,
    pub decl: FunctionBody,
    pub defining_env: Environment,
    /// Bound receiver, for a method value obtained via `x.Method`.
    pub bound_receiver: Option<VarCell>,
    pub package: Option<Rc<Package>>,
    pub signature: Option<Rc<TypeInfo>>,
}

impl Function {
    pub fn new(name: Option<Name>, decl: FunctionBody, defining_env: Environment) -> Self {
        Function {
            name,
            decl,
            defining_env,
            bound_receiver: None,
            package: None,
            signature: None,
        }
    }

    #[must_use]
    pub fn with_bound_receiver(mut self, receiver: VarCell) -> Self {
        self.bound_receiver = Some(receiver);
        self
    }

    #[must_use]
    pub fn with_package(mut self, package: Rc<Package>) -> Self {
        self.package = Some(package);
        self
    }

    #[must_use]
    pub fn with_signature(mut self, signature: Rc<TypeInfo>) -> Self {
        self.signature = Some(signature);
        self
    }
}

/// Capability host intrinsics use to call back into the evaluator
/// (spec.md §6: "The callback may read arguments, call back into
/// `interp.apply`, or return any object"). Defined here, rather than in
/// `vantage_eval`, so `Intrinsic` (an `Object` variant) doesn't need a
/// dependency cycle between the object model and the evaluator crate
/// that implements this trait.
pub trait EvalContext {
    /// Apply a callable `Object` (`Function`/`Intrinsic`) to `args`,
    /// over-approximating to a placeholder on any internal error
    /// rather than propagating one back through the intrinsic boundary.
    fn apply(&mut self, callee: &Object, args: &[Object]) -> Object;
}

/// A host-provided handler invoked when a specific fully-qualified
/// function name is called during evaluation (spec.md §4.5/§6).
#[derive(Clone)]
pub struct Intrinsic {
    pub fq_name: Rc<str>,
    pub handler: Rc<dyn Fn(&mut dyn EvalContext, &[Object]) -> Object>,
}

impl std::fmt::Debug for Intrinsic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Intrinsic({})", self.fq_name)
    }
}

impl Intrinsic {
    pub fn new(
        fq_name: impl Into<Rc<str>>,
        handler: impl Fn(&mut dyn EvalContext, &[Object]) -> Object + 'static,
    ) -> Self {
        Intrinsic {
            fq_name: fq_name.into(),
            handler: Rc::new(handler),
        }
    }

    pub fn call(&self, ctx: &mut dyn EvalContext, args: &[Object]) -> Object {
        (self.handler)(ctx, args)
    }
}
