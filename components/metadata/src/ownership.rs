use std::fmt::{self, Display, Formatter};

/// Record of which broker served writes for a stream during a given offset
/// span, in form of `[start, end)` in which `start` is inclusive and `end` is
/// exclusive.
///
/// At the beginning, `end` is `None` and the `limit` watermark grows as the
/// owning broker commits more data. Once the range is sealed, it becomes
/// immutable and its right boundary is fixed.
///
/// Ranges of one stream sorted by `index` ascending form the chronological
/// ownership timeline across failover and migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipRange {
    stream_id: u64,

    /// Monotonically increasing reassignment index.
    index: i32,

    /// Node ID of the owning broker.
    broker_id: i32,

    /// The start offset, inclusive.
    start: u64,

    /// Highest committed offset so far. Slots within `[start, limit)` hold
    /// valid records while the range is still open.
    limit: u64,

    /// The end of the range, exclusive. `None` until sealed.
    end: Option<u64>,
}

impl OwnershipRange {
    pub fn new(stream_id: u64, index: i32, broker_id: i32, start: u64, end: Option<u64>) -> Self {
        Self {
            stream_id,
            index,
            broker_id,
            start,
            limit: end.unwrap_or(start),
            end,
        }
    }

    /// Test if the given offset is within the range.
    pub fn contains(&self, offset: u64) -> bool {
        if self.start > offset {
            return false;
        }

        match self.end {
            None => true,
            Some(end) => offset < end,
        }
    }

    /// Half-open overlap test against `[start, end)`, treating an open right
    /// boundary as unbounded.
    pub fn overlaps(&self, start: u64, end: u64) -> bool {
        self.start < end && self.end.map_or(true, |e| e > start)
    }

    pub fn stream_id(&self) -> u64 {
        self.stream_id
    }

    pub fn index(&self) -> i32 {
        self.index
    }

    pub fn broker_id(&self) -> i32 {
        self.broker_id
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> Option<u64> {
        self.end
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Update `limit` of the range. Slots within `[start, limit)` shall hold
    /// valid records.
    ///
    /// Once a range is sealed, its `limit` no longer moves.
    pub fn set_limit(&mut self, limit: u64) {
        if self.end.is_none() && limit > self.limit {
            self.limit = limit;
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.end.is_some()
    }

    /// Seal the range at the current `limit`, freezing its right boundary.
    /// Sealing an already sealed range is a no-op returning the fixed end.
    pub fn seal(&mut self) -> u64 {
        match self.end {
            None => {
                self.end = Some(self.limit);
                self.limit
            }
            Some(offset) => offset,
        }
    }
}

impl Display for OwnershipRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{stream-id={}, index={}, broker-id={}}}=[{}, {}, {:?})",
            self.stream_id, self.index, self.broker_id, self.start, self.limit, self.end
        )
    }
}
