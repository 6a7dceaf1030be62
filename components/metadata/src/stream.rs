use std::collections::BTreeMap;

use log::{error, trace, warn};

use crate::error::MetadataError;
use crate::object::StreamObject;
use crate::ownership::OwnershipRange;
use crate::range::OffsetRange;

/// Per-stream slice of a metadata snapshot: the truncation floor, the
/// chronological ownership timeline and the stream's dedicated objects.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamMetadata {
    stream_id: u64,

    /// Truncation floor. Offsets below it are gone for good and queries
    /// referencing them are rejected.
    start_offset: u64,

    /// Ownership ranges keyed by reassignment index; iteration order is the
    /// chronological timeline.
    ranges: BTreeMap<i32, OwnershipRange>,

    /// Dedicated objects keyed by object id; ids grow with compaction order,
    /// so iteration order is also range order.
    stream_objects: BTreeMap<u64, StreamObject>,
}

impl StreamMetadata {
    pub fn new(stream_id: u64, start_offset: u64) -> Self {
        Self {
            stream_id,
            start_offset,
            ranges: BTreeMap::new(),
            stream_objects: BTreeMap::new(),
        }
    }

    /// Build from fully-formed maps, for the metadata-log applier.
    pub fn with_contents(
        stream_id: u64,
        start_offset: u64,
        ranges: BTreeMap<i32, OwnershipRange>,
        stream_objects: BTreeMap<u64, StreamObject>,
    ) -> Self {
        Self {
            stream_id,
            start_offset,
            ranges,
            stream_objects,
        }
    }

    pub fn stream_id(&self) -> u64 {
        self.stream_id
    }

    pub fn start_offset(&self) -> u64 {
        self.start_offset
    }

    pub fn ranges(&self) -> &BTreeMap<i32, OwnershipRange> {
        &self.ranges
    }

    pub fn stream_objects(&self) -> &BTreeMap<u64, StreamObject> {
        &self.stream_objects
    }

    fn verify_stream_id(&self, stream_id: u64) -> Result<(), MetadataError> {
        if self.stream_id != stream_id {
            error!(
                "Stream-id mismatch, stream_id={}, record stream_id={}",
                self.stream_id, stream_id
            );
            return Err(MetadataError::StreamIdMismatch {
                expected: self.stream_id,
                actual: stream_id,
            });
        }
        Ok(())
    }

    pub fn create_range(&mut self, range: OwnershipRange) -> Result<(), MetadataError> {
        self.verify_stream_id(range.stream_id())?;

        if let Some(existing) = self.ranges.get(&range.index()) {
            if *existing == range {
                trace!("No-op, when creating range with same metadata");
                return Ok(());
            }
            error!(
                "Attempting to create inconsistent range. Prior range={}, attempted range={}",
                existing, range
            );
            return Err(MetadataError::RangeAlreadyExists(range.index()));
        }

        if let Some((last_index, _)) = self.ranges.iter().next_back() {
            if *last_index > range.index() {
                warn!(
                    "Creating range {} behind the latest index {} of stream {}",
                    range,
                    last_index,
                    self.stream_id
                );
            }
        }

        self.ranges.insert(range.index(), range);
        Ok(())
    }

    /// Seal the range at `index`, freezing its right boundary at the current
    /// watermark. Unknown indexes are ignored with a warning; the applier may
    /// legitimately replay a seal for a range this broker never hosted.
    pub fn seal_range(&mut self, index: i32) -> Option<u64> {
        match self.ranges.get_mut(&index) {
            Some(range) => Some(range.seal()),
            None => {
                warn!(
                    "Sealing unknown range index {} of stream {}",
                    index, self.stream_id
                );
                None
            }
        }
    }

    /// Advance the committed watermark of the open tail range.
    pub fn commit(&mut self, offset: u64) {
        if let Some((_, range)) = self.ranges.iter_mut().next_back() {
            range.set_limit(offset);
        }
    }

    pub fn add_stream_object(&mut self, object: StreamObject) -> Result<(), MetadataError> {
        self.verify_stream_id(object.stream_id())?;
        self.stream_objects.insert(object.object_id(), object);
        Ok(())
    }

    /// Raise the truncation floor. Trimming backwards would resurrect data
    /// that is already gone, so out-of-order trims are ignored.
    pub fn trim(&mut self, new_start_offset: u64) {
        if new_start_offset < self.start_offset {
            warn!(
                "Ignoring trim of stream {} to {}, floor is already {}",
                self.stream_id, new_start_offset, self.start_offset
            );
            return;
        }
        self.start_offset = new_start_offset;
    }

    /// Ownership ranges overlapping `[start, end)`, in chronological order.
    pub fn overlapping_ranges(
        &self,
        start: u64,
        end: u64,
    ) -> impl Iterator<Item = &OwnershipRange> {
        self.ranges
            .values()
            .filter(move |range| range.overlaps(start, end))
    }

    /// The stream's live offset span `[start_offset, end)`.
    ///
    /// The end is the latest range's sealed boundary, or its committed
    /// watermark while still open. A stream without any range yields the
    /// empty sentinel.
    pub fn offset_range(&self) -> OffsetRange {
        match self.ranges.values().next_back() {
            Some(range) => {
                let end = range.end().unwrap_or_else(|| range.limit());
                let end = end.max(self.start_offset);
                OffsetRange::new(self.stream_id, self.start_offset, end)
            }
            None => OffsetRange::empty(self.stream_id),
        }
    }
}
