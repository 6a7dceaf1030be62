use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use crate::range::OffsetRange;

/// Timestamp sentinel for WAL objects whose creation time was not recorded.
pub const UNKNOWN_TS: i64 = -1;

/// Kind of backing object a resolved offset span lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    /// Broker-shared object holding interleaved recent data of many streams.
    Wal,

    /// Compacted object dedicated to exactly one stream.
    Stream,
}

/// An object written by one broker, holding interleaved data of many streams.
///
/// `order_id` defines the total commit order across all WAL objects of a
/// broker. When a batch of WAL objects is compacted into one, the compacted
/// object inherits the order id of the first object in the batch, so the
/// per-broker order stays dense in commit time.
#[derive(Debug, Clone, PartialEq)]
pub struct WalObject {
    object_id: u64,
    broker_id: i32,
    order_id: u64,
    created_at_ms: i64,

    /// Multiplexed index: stream id to the offset span this object holds for
    /// that stream.
    stream_index: HashMap<u64, OffsetRange>,
}

impl WalObject {
    pub fn new(
        object_id: u64,
        broker_id: i32,
        order_id: u64,
        created_at_ms: i64,
        stream_index: HashMap<u64, OffsetRange>,
    ) -> Self {
        Self {
            object_id,
            broker_id,
            order_id,
            created_at_ms,
            stream_index,
        }
    }

    pub fn object_id(&self) -> u64 {
        self.object_id
    }

    pub fn broker_id(&self) -> i32 {
        self.broker_id
    }

    pub fn order_id(&self) -> u64 {
        self.order_id
    }

    pub fn created_at_ms(&self) -> i64 {
        self.created_at_ms
    }

    pub fn stream_index(&self) -> &HashMap<u64, OffsetRange> {
        &self.stream_index
    }

    /// The offset span this object holds for the given stream, if any.
    pub fn index_of(&self, stream_id: u64) -> Option<&OffsetRange> {
        self.stream_index.get(&stream_id)
    }

    /// Whether this object holds data of `stream_id` within `[start, end)`,
    /// under the half-open overlap convention.
    pub fn intersects(&self, stream_id: u64, start: u64, end: u64) -> bool {
        self.index_of(stream_id)
            .map_or(false, |range| range.overlaps(start, end))
    }
}

/// A compacted object dedicated to exactly one stream.
///
/// Object ids increase with compaction order, so dedicated objects of a
/// stream sorted by id are also sorted by range start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamObject {
    object_id: u64,
    range: OffsetRange,
}

impl StreamObject {
    pub fn new(object_id: u64, range: OffsetRange) -> Self {
        Self { object_id, range }
    }

    pub fn object_id(&self) -> u64 {
        self.object_id
    }

    pub fn range(&self) -> &OffsetRange {
        &self.range
    }

    pub fn stream_id(&self) -> u64 {
        self.range.stream_id()
    }
}

/// The common shape the merge loop works with: any object contributing an
/// offset span to a stream, whichever side of the tiering it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedObject {
    object_id: u64,
    object_type: ObjectType,
    range: OffsetRange,
}

impl ResolvedObject {
    pub(crate) fn new(object_id: u64, object_type: ObjectType, range: OffsetRange) -> Self {
        Self {
            object_id,
            object_type,
            range,
        }
    }

    pub fn object_id(&self) -> u64 {
        self.object_id
    }

    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    pub fn range(&self) -> &OffsetRange {
        &self.range
    }
}

/// Answer of a range resolution: the objects covering `[start_offset,
/// end_offset)` of a stream, ordered by ascending offset.
///
/// `end_offset` is the highest contiguous offset actually reached from
/// `start_offset`. A caller that asked for more must retry from `end_offset`
/// once the snapshot advances. It may also exceed the requested end when the
/// last accepted object extends past it; the caller gets the whole object
/// either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRange {
    stream_id: u64,
    start_offset: u64,
    end_offset: u64,
    objects: Vec<ResolvedObject>,
}

impl ResolvedRange {
    pub(crate) fn new(
        stream_id: u64,
        start_offset: u64,
        end_offset: u64,
        objects: Vec<ResolvedObject>,
    ) -> Self {
        Self {
            stream_id,
            start_offset,
            end_offset,
            objects,
        }
    }

    pub fn stream_id(&self) -> u64 {
        self.stream_id
    }

    pub fn start_offset(&self) -> u64 {
        self.start_offset
    }

    pub fn end_offset(&self) -> u64 {
        self.end_offset
    }

    pub fn objects(&self) -> &[ResolvedObject] {
        &self.objects
    }

    pub fn into_objects(self) -> Vec<ResolvedObject> {
        self.objects
    }
}

impl Display for ResolvedRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{stream-id={}}}=[{}, {}), {} object(s)",
            self.stream_id,
            self.start_offset,
            self.end_offset,
            self.objects.len()
        )
    }
}
