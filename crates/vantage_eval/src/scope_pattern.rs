//! Scope pattern grammar (spec.md §6): `exact` or `prefix/...`.

use std::rc::Rc;

#[derive(Clone, Debug)]
pub enum ScopePattern {
    Exact(Rc<str>),
    /// Matches `prefix` itself or any `prefix/<anything>`.
    Prefix(Rc<str>),
}

impl ScopePattern {
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix("/...") {
            Some(prefix) => ScopePattern::Prefix(Rc::from(prefix)),
            None => ScopePattern::Exact(Rc::from(pattern)),
        }
    }

    pub fn matches(&self, import_path: &str) -> bool {
        match self {
            ScopePattern::Exact(exact) => import_path == exact.as_ref(),
            ScopePattern::Prefix(prefix) => {
                import_path == prefix.as_ref()
                    || import_path
                        .strip_prefix(prefix.as_ref())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

/// Whether any pattern in `patterns` matches `import_path`. An empty
/// pattern list means "everything is in scope" (spec.md §4.6).
pub fn matches_any(patterns: &[ScopePattern], import_path: &str) -> bool {
    patterns.is_empty() || patterns.iter().any(|p| p.matches(import_path))
}
