//! Intrinsic Registry (spec.md §4.5).

use rustc_hash::FxHashMap;
use std::rc::Rc;

use vantage_object::{EvalContext, Intrinsic, Object};

/// Stacked frames mapping fully-qualified function name → handler, plus
/// a default handler consulted when no specific match exists.
pub struct IntrinsicRegistry {
    frames: Vec<FxHashMap<Rc<str>, Intrinsic>>,
    default: Option<Intrinsic>,
}

impl IntrinsicRegistry {
    pub fn new() -> Self {
        let mut registry = IntrinsicRegistry {
            frames: vec![FxHashMap::default()],
            default: None,
        };
        registry.register(Intrinsic::new("fmt.Sprintf", sprintf_handler));
        registry
    }

    /// Push a fresh, empty frame on top of the stack.
    pub fn push(&mut self) {
        self.frames.push(FxHashMap::default());
    }

    /// Pop the top frame. The base frame (index 0) is never popped, so
    /// an unbalanced `pop` is a no-op rather than leaving no frames.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn register(&mut self, intrinsic: Intrinsic) {
        if let Some(top) = self.frames.last_mut() {
            top.insert(Rc::clone(&intrinsic.fq_name), intrinsic);
        }
    }

    pub fn register_default(&mut self, intrinsic: Intrinsic) {
        self.default = Some(intrinsic);
    }

    /// Search top to bottom; fall back to the default handler.
    pub fn lookup(&self, fq_name: &str) -> Option<Intrinsic> {
        for frame in self.frames.iter().rev() {
            if let Some(intrinsic) = frame.get(fq_name) {
                return Some(intrinsic.clone());
            }
        }
        self.default.clone()
    }

    /// Search top to bottom, ignoring the default — used by call
    /// dispatch to distinguish "a specific intrinsic matched" (which
    /// short-circuits the body, spec.md §4.3 state machine) from "only
    /// the default fired" (which happens at `RecordCall`, after body
    /// evaluation, per the same state machine).
    pub fn lookup_specific(&self, fq_name: &str) -> Option<Intrinsic> {
        for frame in self.frames.iter().rev() {
            if let Some(intrinsic) = frame.get(fq_name) {
                return Some(intrinsic.clone());
            }
        }
        None
    }

    pub fn default_handler(&self) -> Option<Intrinsic> {
        self.default.clone()
    }
}

impl Default for IntrinsicRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// `%s`/`%d`/`%v`/`%%` string formatting (spec.md §4.5). Symbolic
/// placeholders substitute their kind's zero-value rather than
/// propagating the placeholder into the formatted string.
fn sprintf_handler(ctx: &mut dyn EvalContext, args: &[Object]) -> Object {
    let _ = ctx;
    let Some(Object::String(format)) = args.first() else {
        return Object::string("");
    };
    let mut rest = args[1..].iter();
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('s') => out.push_str(&format_verb_s(rest.next())),
            Some('d') => out.push_str(&format_verb_d(rest.next())),
            Some('v') => out.push_str(&format_verb_v(rest.next())),
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }
    Object::string(out)
}

fn format_verb_s(value: Option<&Object>) -> String {
    match value {
        Some(Object::String(s)) => s.to_string(),
        Some(Object::SymbolicPlaceholder(_)) | None => String::new(),
        Some(other) => format!("{other:?}"),
    }
}

fn format_verb_d(value: Option<&Object>) -> String {
    match value {
        Some(Object::Int(i)) => i.to_string(),
        Some(Object::SymbolicPlaceholder(_)) | None => "0".to_string(),
        Some(other) => format!("{other:?}"),
    }
}

fn format_verb_v(value: Option<&Object>) -> String {
    match value {
        Some(Object::SymbolicPlaceholder(_)) | None => String::new(),
        Some(Object::String(s)) => s.to_string(),
        Some(Object::Int(i)) => i.to_string(),
        Some(other) => format!("{other:?}"),
    }
}
