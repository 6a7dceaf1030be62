use std::cmp::{max, min};
use std::collections::HashMap;

use itertools::Itertools;
use log::{trace, warn};

use crate::broker::BrokerWalIndex;
use crate::error::MetadataError;
use crate::object::{ResolvedRange, StreamObject, WalObject};
use crate::range::OffsetRange;
use crate::resolver::RangeResolver;
use crate::stream::StreamMetadata;

/// Point-in-time image of the whole tiered-storage metadata: the stream-id
/// counter, every stream's metadata and every broker's WAL index.
///
/// A snapshot is immutable once published. The metadata-log applier builds a
/// new one whenever the log advances and swaps it in atomically; in-flight
/// readers keep using the previous image, so queries never observe a snapshot
/// changing under them and need no locking. A snapshot is the unit of
/// consistent read: entities of two different snapshots must not be mixed in
/// one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataSnapshot {
    /// One past the highest stream id ever assigned, even across deletion.
    next_stream_id: u64,

    streams: HashMap<u64, StreamMetadata>,

    brokers: HashMap<i32, BrokerWalIndex>,
}

impl MetadataSnapshot {
    /// Build from fully-formed maps. `assigned_stream_id` is the highest id
    /// ever assigned, `None` when no stream was ever created.
    pub fn new(
        assigned_stream_id: Option<u64>,
        streams: HashMap<u64, StreamMetadata>,
        brokers: HashMap<i32, BrokerWalIndex>,
    ) -> Self {
        Self {
            next_stream_id: assigned_stream_id.map_or(0, |id| id + 1),
            streams,
            brokers,
        }
    }

    /// Next stream id to hand out. The id allocator reads this floor and
    /// persists the advanced counter back through the metadata log.
    pub fn next_stream_id(&self) -> u64 {
        self.next_stream_id
    }

    pub fn streams(&self) -> &HashMap<u64, StreamMetadata> {
        &self.streams
    }

    pub fn brokers(&self) -> &HashMap<i32, BrokerWalIndex> {
        &self.brokers
    }

    pub fn stream(&self, stream_id: u64) -> Option<&StreamMetadata> {
        self.streams.get(&stream_id)
    }

    pub fn broker(&self, broker_id: i32) -> Option<&BrokerWalIndex> {
        self.brokers.get(&broker_id)
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty() && self.brokers.is_empty()
    }

    /// Record a stream image while the applier is still building this
    /// snapshot, advancing the assigned-id floor.
    pub fn apply_stream(&mut self, stream: StreamMetadata) {
        self.next_stream_id = max(self.next_stream_id, stream.stream_id() + 1);
        self.streams.insert(stream.stream_id(), stream);
    }

    /// Record a WAL object into its broker's index while the applier is
    /// still building this snapshot.
    pub fn apply_wal_object(&mut self, object: WalObject) -> Result<(), MetadataError> {
        self.brokers
            .entry(object.broker_id())
            .or_insert_with(|| BrokerWalIndex::new(object.broker_id()))
            .apply(object)
    }

    /// Which backing objects hold offsets in `[start_offset, end_offset)` of
    /// the stream?
    ///
    /// The query is split by the stream's ownership timeline: only the broker
    /// owning a span back then can hold its WAL copies, so each overlapping
    /// ownership range gets its own resolver window, clipped to the
    /// intersection of the range and the query. Window outputs are
    /// concatenated in chronological order until the limit is spent, the
    /// requested end is reached, or a coverage gap halts the walk; a gap is
    /// never skipped, the contiguous prefix gathered so far is the answer.
    ///
    /// The returned end offset is the highest contiguous offset reached from
    /// `start_offset`. Anything short of `end_offset` means "partial answer,
    /// retry from there once the snapshot advances"; it may also overshoot
    /// `end_offset`, since an accepted object is always returned whole.
    pub fn resolve(
        &self,
        stream_id: u64,
        start_offset: u64,
        end_offset: u64,
        limit: usize,
    ) -> Result<ResolvedRange, MetadataError> {
        if limit == 0 {
            return Err(MetadataError::InvalidLimit);
        }
        let stream = self
            .stream(stream_id)
            .ok_or(MetadataError::StreamNotFound(stream_id))?;
        if start_offset < stream.start_offset() {
            warn!(
                "Query of stream {} starts at {}, below the truncation floor {}",
                stream_id,
                start_offset,
                stream.start_offset()
            );
            return Err(MetadataError::RangeTruncated {
                stream_id,
                start_offset,
                floor: stream.start_offset(),
            });
        }

        let mut objects = Vec::new();
        let mut achieved = start_offset;
        let mut remaining = limit;
        for range in stream.overlapping_ranges(start_offset, end_offset) {
            let clip_start = max(range.start(), start_offset);
            let clip_end = min(range.end().unwrap_or(u64::MAX), end_offset);
            if clip_start > achieved {
                // No broker owned [achieved, clip_start): an ownership gap is
                // as unresolvable as a coverage gap, never skipped.
                trace!(
                    "Ownership gap at offset {} of stream {}, next range {}",
                    achieved,
                    stream_id,
                    range
                );
                break;
            }
            // A window never re-reads coverage an earlier window achieved.
            let window_start = max(clip_start, achieved);
            let resolver =
                RangeResolver::new(self, stream_id, range.broker_id(), window_start, clip_end);
            let Some(resolved) = resolver.resolve_within(remaining) else {
                break;
            };
            remaining -= resolved.objects().len();
            achieved = max(achieved, resolved.end_offset());
            objects.extend(resolved.into_objects());
            if remaining == 0 || achieved >= end_offset {
                break;
            }
            if achieved < clip_end {
                // The window stopped short with limit to spare: a coverage
                // gap inside it.
                break;
            }
        }
        Ok(ResolvedRange::new(
            stream_id,
            start_offset,
            achieved,
            objects,
        ))
    }

    /// Dedicated objects of the stream overlapping `[start_offset,
    /// end_offset)`, ordered by range start, at most `limit` of them.
    ///
    /// Dedicated objects are stream-scoped regardless of broker, so no
    /// ownership range is consulted.
    pub fn stream_objects_in_range(
        &self,
        stream_id: u64,
        start_offset: u64,
        end_offset: u64,
        limit: usize,
    ) -> Result<Vec<StreamObject>, MetadataError> {
        if limit == 0 {
            return Err(MetadataError::InvalidLimit);
        }
        let stream = self
            .stream(stream_id)
            .ok_or(MetadataError::StreamNotFound(stream_id))?;
        Ok(stream
            .stream_objects()
            .values()
            .filter(|object| object.range().overlaps(start_offset, end_offset))
            .sorted_by(|a, b| a.range().cmp(b.range()))
            .take(limit)
            .copied()
            .collect())
    }

    /// The stream's live offset span `[start_offset, end)`, or `None` for an
    /// unknown stream.
    pub fn current_offset_range(&self, stream_id: u64) -> Option<OffsetRange> {
        self.stream(stream_id).map(|stream| stream.offset_range())
    }
}
