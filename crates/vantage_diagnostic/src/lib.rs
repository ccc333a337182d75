//! Vantage Diagnostic — diagnostic rendering and logging.
//!
//! The engine itself never renders anything; it only produces
//! `vantage_object::Error` values. This crate gives a host a shared
//! `Diagnostic` model and a `Logger` capability so engine-reported
//! errors and events can be surfaced the way a compiler front-end's own
//! diagnostics would be, without the engine depending on any rendering
//! surface.

mod diagnostic;
mod emitter;
mod error_code;
mod logger;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use emitter::{ColorMode, DiagnosticEmitter, JsonEmitter, TerminalEmitter};
pub use error_code::ErrorCode;
pub use logger::{BufferLogger, LogEvent, Logger, NullLogger, TracingLogger};
