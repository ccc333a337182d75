//! Fully-qualified function name formats (spec.md §6).
//!
//! These strings are the stable ABI between hosts and the engine for
//! intrinsic registration keys; the exact punctuation is load-bearing.

/// `"<import/path>.<FuncName>"` — a package-level function.
pub fn package_func(import_path: &str, func_name: &str) -> String {
    format!("{import_path}.{func_name}")
}

/// `"(<import/path>.<Type>).<Method>"` — a value-receiver method.
pub fn value_method(import_path: &str, type_name: &str, method_name: &str) -> String {
    format!("({import_path}.{type_name}).{method_name}")
}

/// `"(*<import/path>.<Type>).<Method>"` — a pointer-receiver method.
pub fn pointer_method(import_path: &str, type_name: &str, method_name: &str) -> String {
    format!("(*{import_path}.{type_name}).{method_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_match_spec_abi() {
        assert_eq!(package_func("pkg/path", "Func"), "pkg/path.Func");
        assert_eq!(
            value_method("pkg/path", "T", "Method"),
            "(pkg/path.T).Method"
        );
        assert_eq!(
            pointer_method("pkg/path", "T", "Method"),
            "(*pkg/path.T).Method"
        );
    }
}
