//! Logging capability for the interpreter facade (spec.md §2/§4.6).
//!
//! A host supplies a `Logger` when building an `Interpreter`. Unlike
//! the `tracing` facade (which is a global subscriber the engine also
//! emits spans through, for ambient observability), `Logger` gives a
//! host a concrete, queryable event stream without installing a global
//! subscriber — useful for tools that want to assert on "package X was
//! rejected by scan policy" without parsing log lines.
//!
//! # Performance
//! Enum dispatch (not a trait object) keeps this on the same O(1)
//! static-dispatch footing as the teacher's print-handler design, since
//! the evaluator calls into this on hot paths (every package load,
//! every bounded-analysis branch).

use std::cell::RefCell;

/// A structured event a host may want to observe.
#[derive(Clone, Debug)]
pub enum LogEvent<'a> {
    /// A package was loaded from the scanner (cache miss).
    PackageLoaded { import_path: &'a str },
    /// A package was rejected by scan policy and left unresolved.
    PackageOutOfScope { import_path: &'a str },
    /// An import alias was corrected to the package's declared name.
    ImportNameCorrected {
        import_path: &'a str,
        alias: &'a str,
        declared_name: &'a str,
    },
    /// A branch of bounded analysis produced an error that was
    /// swallowed per spec.md §7 (sibling branches still evaluate).
    BranchErrorSwallowed { message: &'a str },
    /// A new struct↔interface implementer pair was discovered and
    /// pending calls were replayed against it.
    ImplementerDiscovered {
        interface: &'a str,
        implementer: &'a str,
    },
}

/// Logging capability a host implements to observe engine-internal events.
pub trait Logger {
    fn log(&self, event: &LogEvent<'_>);
}

/// Default logger: discards everything.
#[derive(Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _event: &LogEvent<'_>) {}
}

/// Forwards every event to the `tracing` facade at debug level.
#[derive(Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, event: &LogEvent<'_>) {
        match event {
            LogEvent::PackageLoaded { import_path } => {
                tracing::debug!(import_path, "package loaded");
            }
            LogEvent::PackageOutOfScope { import_path } => {
                tracing::debug!(import_path, "package out of scan-policy scope");
            }
            LogEvent::ImportNameCorrected {
                import_path,
                alias,
                declared_name,
            } => {
                tracing::debug!(import_path, alias, declared_name, "import alias corrected");
            }
            LogEvent::BranchErrorSwallowed { message } => {
                tracing::debug!(message, "bounded-analysis branch error swallowed");
            }
            LogEvent::ImplementerDiscovered {
                interface,
                implementer,
            } => {
                tracing::debug!(interface, implementer, "implementer discovered");
            }
        }
    }
}

/// Captures every event into an in-memory buffer, for test assertions.
#[derive(Default)]
pub struct BufferLogger {
    messages: RefCell<Vec<String>>,
}

impl BufferLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl Logger for BufferLogger {
    fn log(&self, event: &LogEvent<'_>) {
        self.messages.borrow_mut().push(format!("{event:?}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_logger_captures_events() {
        let logger = BufferLogger::new();
        logger.log(&LogEvent::PackageLoaded {
            import_path: "pkg/a",
        });
        assert_eq!(logger.messages().len(), 1);
        assert!(logger.messages()[0].contains("pkg/a"));
    }

    #[test]
    fn null_logger_discards_events() {
        let logger = NullLogger;
        logger.log(&LogEvent::PackageLoaded {
            import_path: "pkg/a",
        });
    }
}
