//! Scanner-provided package and module metadata.

use std::rc::Rc;

use crate::name::Name;
use crate::syntax::{File, FuncDecl};
use crate::type_info::TypeInfo;

/// A package-level variable or constant as reported by the scanner.
#[derive(Clone, Debug)]
pub struct ValueMeta {
    pub name: Name,
    pub is_const: bool,
    /// Initializer expression, evaluated lazily on first read (spec.md §4.2).
    pub init: Option<crate::syntax::Expr>,
}

/// Everything the scanner knows about one package.
#[derive(Clone, Debug, Default)]
pub struct PackageMeta {
    pub import_path: Rc<str>,
    /// The name declared by the package clause, which may differ from the
    /// last import-path segment (spec.md §4.2 "name correction").
    pub declared_name: Rc<str>,
    pub files: Vec<File>,
    pub types: Vec<Rc<TypeInfo>>,
    pub funcs: Vec<Rc<FuncDecl>>,
    pub values: Vec<ValueMeta>,
}

impl PackageMeta {
    pub fn find_func(&self, name: Name) -> Option<&Rc<FuncDecl>> {
        self.funcs.iter().find(|f| f.name == name)
    }

    pub fn find_type(&self, name: Name) -> Option<&Rc<TypeInfo>> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn find_value(&self, name: Name) -> Option<&ValueMeta> {
        self.values.iter().find(|v| v.name == name)
    }
}

/// One module known to the scanner (a collection of packages sharing an
/// import-path prefix and a single `go.mod`-equivalent root).
#[derive(Clone, Debug)]
pub struct ModuleInfo {
    pub root_import_path: Rc<str>,
}
