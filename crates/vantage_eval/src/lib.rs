//! Vantage Eval — the symbolic execution engine (spec.md §2).
//!
//! Ties together the Evaluator Core (`eval`), Package Loader
//! (`loader`), Type-Relations Registry (`type_relations`), Intrinsic
//! Registry (`intrinsics`), and Execution Tracer (`tracer`) behind one
//! `Interpreter` facade, built exclusively through `InterpreterBuilder`.
//!
//! `vantage_eval` depends on `vantage_object` for the value
//! representation and on `vantage_ir` for the syntax/metadata the
//! Scanner capability produces; it never depends on a concrete
//! front-end.

pub mod builder;
pub mod errors;
pub mod eval;
pub mod interpreter;
pub mod intrinsics;
pub mod loader;
pub mod memo;
pub mod scope_pattern;
pub mod services;
pub mod tracer;
pub mod type_relations;

pub use builder::InterpreterBuilder;
pub use interpreter::{EvalNode, Interpreter};
pub use scope_pattern::ScopePattern;
pub use services::{CallFrame, Services};
pub use type_relations::{DispatchKey, TypeRelations};
