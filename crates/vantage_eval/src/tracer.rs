//! Execution Tracer (spec.md §4.7).

use vantage_ir::Span;

/// Which syntactic category the traced node belongs to. Kept minimal
/// (no full AST clone) so emitting an event stays O(1) per node.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum NodeKind {
    Expr,
    Stmt,
}

/// One evaluation step, reported before the node is evaluated.
#[derive(Copy, Clone, Debug)]
pub struct TraceEvent {
    pub step: u64,
    pub kind: NodeKind,
    pub pos: Span,
}

/// Pluggable observer of evaluation steps. Implementations MUST return
/// promptly (spec.md §5: synchronous, no suspension points) and must
/// tolerate having their output ignored.
pub trait Tracer {
    fn trace(&self, event: &TraceEvent);
}

/// Default tracer: discards every event.
#[derive(Default)]
pub struct NullTracer;

impl Tracer for NullTracer {
    fn trace(&self, _event: &TraceEvent) {}
}

/// Captures every event for test assertions on step count and ordering
/// (Testable Property 3: deterministic tracer event sequences).
#[derive(Default)]
pub struct RecordingTracer {
    events: std::cell::RefCell<Vec<TraceEvent>>,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.borrow().clone()
    }
}

impl Tracer for RecordingTracer {
    fn trace(&self, event: &TraceEvent) {
        self.events.borrow_mut().push(*event);
    }
}
