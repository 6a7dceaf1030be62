use std::fmt::{self, Display, Formatter};

/// A span of offsets within one stream, in form of `[start, end)` in which
/// `start` is inclusive and `end` is exclusive.
///
/// If `start` == `end`, the range holds no valid offset and is treated as the
/// empty/invalid sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OffsetRange {
    stream_id: u64,

    /// The start offset, inclusive.
    start: u64,

    /// The end offset, exclusive.
    end: u64,
}

impl OffsetRange {
    pub fn new(stream_id: u64, start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "range start must not exceed its end");
        Self {
            stream_id,
            start,
            end,
        }
    }

    /// The empty sentinel: no valid offset at all.
    pub fn empty(stream_id: u64) -> Self {
        Self::new(stream_id, 0, 0)
    }

    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }

    /// Half-open overlap test against `[start, end)`.
    ///
    /// This is the single overlap convention of the whole crate: a range and
    /// a query intersect iff `self.start < end && self.end > start`. An
    /// offset equal to a range's end offset is outside of it.
    pub fn overlaps(&self, start: u64, end: u64) -> bool {
        self.start < end && self.end > start
    }

    pub fn stream_id(&self) -> u64 {
        self.stream_id
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of offsets covered by the range.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl Display for OffsetRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{stream-id={}}}=[{}, {})",
            self.stream_id, self.start, self.end
        )
    }
}
