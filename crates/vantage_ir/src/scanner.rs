//! The `Scanner` capability the engine consumes (spec.md §6).
//!
//! The engine never parses source text; it asks a host-supplied
//! `Scanner` for package metadata and syntax trees. A real scanner
//! reads source files and runs a type checker; `vantage_ir` only
//! defines the contract.

use std::rc::Rc;

use crate::metadata::{ModuleInfo, PackageMeta};

/// Error surfaced from the scanner while resolving or parsing a package.
#[derive(Clone, Debug)]
pub struct ScanError {
    pub import_path: Rc<str>,
    pub message: String,
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.import_path, self.message)
    }
}

impl std::error::Error for ScanError {}

/// Capability the engine consumes to resolve packages on demand.
///
/// Implementations may perform arbitrary I/O internally but MUST expose
/// a synchronous interface (spec.md §5): the engine calls these methods
/// from within a single-threaded evaluation and never awaits them.
pub trait Scanner {
    /// Resolve an import path (e.g. `"pkg/path"`) to package metadata,
    /// parsing and type-checking it if this is the first request for it.
    fn scan_package_by_import(&self, import_path: &str) -> Result<PackageMeta, ScanError>;

    /// Parse an explicit set of files into a single `PackageMeta`, used by
    /// hosts driving the engine over a file set rather than an import path
    /// (e.g. a single-file analysis without a full module).
    fn scan_files(&self, paths: &[&str]) -> Result<PackageMeta, ScanError>;

    /// List every module the scanner knows about (for tools that need to
    /// enumerate a whole workspace rather than following one import graph).
    fn modules(&self) -> Vec<ModuleInfo>;
}
