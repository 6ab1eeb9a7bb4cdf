//! Source location spans.

use std::fmt;

/// Identity of one source file within a compilation unit.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct FileId(u32);

impl FileId {
    /// File id used for synthesized declarations (builtins, generated members).
    pub const SYNTHETIC: FileId = FileId(u32::MAX);

    #[inline]
    pub const fn new(raw: u32) -> Self {
        FileId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_synthetic(self) -> bool {
        self.0 == u32::MAX
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_synthetic() {
            write!(f, "<synthetic>")
        } else {
            write!(f, "file#{}", self.0)
        }
    }
}

/// Source location span.
///
/// Layout: 12 bytes
/// - file: the [`FileId`] the offsets refer to
/// - start: byte offset from file start
/// - end: byte offset (exclusive)
///
/// Diagnostics compare spans by value, so two findings at the same place in
/// the same file are recognised as duplicates.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub file: FileId,
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Span for synthesized declarations that have no source text.
    pub const DUMMY: Span = Span {
        file: FileId::SYNTHETIC,
        start: 0,
        end: 0,
    };

    #[inline]
    pub const fn new(file: FileId, start: u32, end: u32) -> Self {
        Span { file, start, end }
    }

    /// Length of the span in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Whether this span stands for generated code.
    #[inline]
    pub const fn is_dummy(&self) -> bool {
        self.file.is_synthetic()
    }

    /// Check if another span is fully contained within this span.
    #[inline]
    pub fn contains_span(&self, other: Span) -> bool {
        self.file == other.file && self.start <= other.start && other.end <= self.end
    }

    /// Merge two spans to create one covering both.
    ///
    /// Spans from different files cannot be merged; `self` is returned as is.
    #[inline]
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        if self.file != other.file {
            return self;
        }

        Span {
            file: self.file,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Create a point span (zero-length).
    #[inline]
    pub const fn point(file: FileId, offset: u32) -> Span {
        Span {
            file,
            start: offset,
            end: offset,
        }
    }

    /// Merge all given spans, `None` if the iterator is empty.
    pub fn covering(spans: impl IntoIterator<Item = Span>) -> Option<Span> {
        spans.into_iter().reduce(Span::merge)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}..{}", self.file, self.start, self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dummy() {
            return write!(f, "<generated>");
        }
        write!(f, "{}:{}..{}", self.file.0, self.start, self.end)
    }
}
