//! Vantage IR — shared metadata and syntax types consumed from the
//! scanner capability.
//!
//! This crate defines what `vantage_eval` consumes, not how it is
//! produced: `Scanner`, `PackageMeta`, `TypeInfo`/`FieldType`, and the
//! minimal syntax tree the Evaluator Core walks. A host implementing a
//! real front-end scanner depends on this crate alone, without pulling
//! in the evaluator.

mod fq;
mod metadata;
mod name;
mod scanner;
mod span;
mod syntax;
mod type_info;

pub use fq::{package_func, pointer_method, value_method};
pub use metadata::{ModuleInfo, PackageMeta, ValueMeta};
pub use name::{Name, NameInterner};
pub use scanner::{ScanError, Scanner};
pub use span::Span;
pub use syntax::{
    AssignOp, BinOp, Block, CaseClause, Expr, File, FuncDecl, Lit, Param, Stmt, TypeArg, UnaryOp,
};
pub use type_info::{FieldInfo, FieldType, MethodInfo, TypeInfo, TypeKind};
