//! Source location spans.

/// Source location span: a byte offset range within a single file.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Debug)]
pub struct Span {
    pub start: u32,
    pub end: u32,
    /// Index into the owning module's file table; `u32::MAX` for synthetic spans.
    pub file: u32,
}

impl Span {
    /// Dummy span for synthetic/symbolic objects that have no source location.
    pub const DUMMY: Span = Span {
        start: 0,
        end: 0,
        file: u32::MAX,
    };

    #[inline]
    pub const fn new(file: u32, start: u32, end: u32) -> Self {
        Span { start, end, file }
    }

    #[inline]
    pub const fn is_dummy(self) -> bool {
        self.file == u32::MAX
    }
}
