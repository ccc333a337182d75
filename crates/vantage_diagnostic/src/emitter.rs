//! Diagnostic emitters: render `Diagnostic`s for a human or for tooling.

use std::io::{self, Write};

use crate::{Diagnostic, Severity};

/// Something that can render a stream of diagnostics.
pub trait DiagnosticEmitter {
    fn emit(&mut self, diagnostic: &Diagnostic) -> io::Result<()>;
}

/// ANSI color codes for terminal output.
mod colors {
    pub const ERROR: &str = "\x1b[1;31m";
    pub const WARNING: &str = "\x1b[1;33m";
    pub const NOTE: &str = "\x1b[1;36m";
    pub const BOLD: &str = "\x1b[1m";
    pub const RESET: &str = "\x1b[0m";
}

/// Color output mode for the terminal emitter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn should_use_colors(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

/// Human-readable diagnostic output with optional ANSI color support.
pub struct TerminalEmitter<W: Write> {
    writer: W,
    use_colors: bool,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn new(writer: W, color_mode: ColorMode, is_tty: bool) -> Self {
        TerminalEmitter {
            writer,
            use_colors: color_mode.should_use_colors(is_tty),
        }
    }

    fn severity_color(&self, severity: Severity) -> &'static str {
        if !self.use_colors {
            return "";
        }
        match severity {
            Severity::Error => colors::ERROR,
            Severity::Warning => colors::WARNING,
            Severity::Note => colors::NOTE,
        }
    }

    fn bold(&self) -> &'static str {
        if self.use_colors {
            colors::BOLD
        } else {
            ""
        }
    }

    fn reset(&self) -> &'static str {
        if self.use_colors {
            colors::RESET
        } else {
            ""
        }
    }
}

impl<W: Write> DiagnosticEmitter for TerminalEmitter<W> {
    fn emit(&mut self, diagnostic: &Diagnostic) -> io::Result<()> {
        writeln!(
            self.writer,
            "{}{}{}[{}]{}: {}{}{}",
            self.severity_color(diagnostic.severity),
            diagnostic.severity,
            self.reset(),
            diagnostic.code,
            self.reset(),
            self.bold(),
            diagnostic.message,
            self.reset(),
        )?;
        for label in &diagnostic.labels {
            writeln!(
                self.writer,
                "  --> {}:{}: {}",
                label.span.file, label.span.start, label.message
            )?;
        }
        for note in &diagnostic.notes {
            writeln!(self.writer, "  = note: {note}")?;
        }
        for (depth, frame) in diagnostic.call_stack.iter().enumerate() {
            writeln!(self.writer, "  {depth:>4}: {frame}")?;
        }
        Ok(())
    }
}

/// Line-delimited JSON diagnostic output, for tools that consume engine
/// output programmatically rather than rendering it for a human.
pub struct JsonEmitter<W: Write> {
    writer: W,
}

impl<W: Write> JsonEmitter<W> {
    pub fn new(writer: W) -> Self {
        JsonEmitter { writer }
    }

    fn escape(s: &str) -> String {
        s.replace('\\', "\\\\").replace('"', "\\\"")
    }
}

impl<W: Write> DiagnosticEmitter for JsonEmitter<W> {
    fn emit(&mut self, diagnostic: &Diagnostic) -> io::Result<()> {
        writeln!(
            self.writer,
            r#"{{"code":"{}","severity":"{}","message":"{}"}}"#,
            diagnostic.code,
            diagnostic.severity,
            Self::escape(&diagnostic.message),
        )
    }
}
