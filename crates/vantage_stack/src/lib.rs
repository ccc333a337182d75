//! Stack safety utilities for deep recursion.
//!
//! Symbolic evaluation still walks the analyzed program's call graph
//! recursively (function application re-enters the evaluator), and
//! user programs can be recursive many levels deep before their own
//! state brings them to a base case. This crate grows the host stack
//! on demand so that deep-but-finite recursion doesn't overflow before
//! the evaluator's own guards (step limit, runaway same-function
//! recursion depth) get a chance to fire.
//!
//! On WASM targets the closure just runs directly; WASM manages its
//! own stack and `stacker` isn't available there.

/// Ensure sufficient stack space is available before executing `f`.
///
/// On native targets, uses `stacker` to grow the stack if needed.
/// On WASM targets, just calls the closure directly.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    /// Minimum stack space to keep available (100KB red zone).
    const RED_ZONE: usize = 100 * 1024;

    /// Stack space to allocate when growing (1MB).
    const STACK_PER_RECURSION: usize = 1024 * 1024;

    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version - just call directly (WASM has its own stack management).
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
