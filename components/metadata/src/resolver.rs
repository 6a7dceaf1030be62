use std::collections::VecDeque;

use log::trace;

use crate::object::{ObjectType, ResolvedObject, ResolvedRange};
use crate::snapshot::MetadataSnapshot;

/// Merge pass over one resolver window: the clipped `(stream, broker,
/// [start, end))` scope carved out of a query by a single ownership range.
///
/// Two freshly-built queues are merged by ascending range start: the broker's
/// WAL objects filtered to their per-stream sub-range, and the stream's
/// dedicated objects. The queues are private to one `resolve_within` call, so
/// concurrent queries over the same snapshot never alias.
pub(crate) struct RangeResolver<'a> {
    snapshot: &'a MetadataSnapshot,
    stream_id: u64,
    broker_id: i32,

    /// Window start, inclusive.
    start: u64,

    /// Window end, exclusive.
    end: u64,
}

impl<'a> RangeResolver<'a> {
    pub(crate) fn new(
        snapshot: &'a MetadataSnapshot,
        stream_id: u64,
        broker_id: i32,
        start: u64,
        end: u64,
    ) -> Self {
        Self {
            snapshot,
            stream_id,
            broker_id,
            start,
            end,
        }
    }

    /// WAL objects of the window's broker holding data of the stream within
    /// the window, in the broker's commit order.
    fn wal_candidates(&self) -> Option<VecDeque<ResolvedObject>> {
        let broker = self.snapshot.broker(self.broker_id)?;
        Some(
            broker
                .wal_objects()
                .filter_map(|object| {
                    object
                        .index_of(self.stream_id)
                        .filter(|range| range.overlaps(self.start, self.end))
                        .map(|range| {
                            ResolvedObject::new(object.object_id(), ObjectType::Wal, *range)
                        })
                })
                .collect(),
        )
    }

    /// Dedicated objects of the stream within the window, in compaction
    /// order, which equals range order.
    fn stream_candidates(&self) -> Option<VecDeque<ResolvedObject>> {
        let stream = self.snapshot.stream(self.stream_id)?;
        Some(
            stream
                .stream_objects()
                .values()
                .filter(|object| object.range().overlaps(self.start, self.end))
                .map(|object| {
                    ResolvedObject::new(object.object_id(), ObjectType::Stream, *object.range())
                })
                .collect(),
        )
    }

    /// Merge the window's candidates into an ordered, gap-checked answer.
    ///
    /// Returns `None` when the window cannot be searched at all: a zero
    /// limit, or a broker/stream absent from the snapshot. Otherwise the
    /// answer covers `[start, cursor)` where the cursor stopped at the first
    /// coverage gap, at limit exhaustion, or at the window end. The accepted
    /// prefix before a gap is still returned; deciding not to read past the
    /// gap is the caller's bookkeeping.
    pub(crate) fn resolve_within(&self, limit: usize) -> Option<ResolvedRange> {
        if limit == 0 {
            return None;
        }
        let mut wal = self.wal_candidates()?;
        let mut dedicated = self.stream_candidates()?;

        let mut accepted = Vec::new();
        let mut remaining = limit;
        let mut cursor = self.start;

        while remaining > 0 && cursor < self.end {
            // Head with the smaller range start wins; on a tie the WAL object
            // is the earliest-durable copy and takes precedence.
            let take_dedicated = match (wal.front(), dedicated.front()) {
                (Some(w), Some(d)) => d.range().start() < w.range().start(),
                (Some(_), None) => false,
                (None, Some(_)) => true,
                (None, None) => break,
            };
            let candidate = if take_dedicated {
                dedicated.pop_front()
            } else {
                wal.pop_front()
            };
            let Some(candidate) = candidate else {
                break;
            };

            if candidate.range().start() > cursor {
                // Nothing covers [cursor, candidate.start): the rest of this
                // window is unresolvable.
                trace!(
                    "Coverage gap at offset {} of stream {} on broker {}, next candidate {}",
                    cursor,
                    self.stream_id,
                    self.broker_id,
                    candidate.range()
                );
                break;
            }
            if candidate.range().end() <= cursor {
                // Fully superseded by already-accepted coverage.
                continue;
            }

            cursor = candidate.range().end();
            accepted.push(candidate);
            remaining -= 1;
        }

        Some(ResolvedRange::new(
            self.stream_id,
            self.start,
            cursor,
            accepted,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::error::Error;

    use super::*;
    use crate::object::{StreamObject, UNKNOWN_TS, WalObject};
    use crate::ownership::OwnershipRange;
    use crate::range::OffsetRange;
    use crate::snapshot::MetadataSnapshot;
    use crate::stream::StreamMetadata;

    const STREAM: u64 = 1;
    const BROKER: i32 = 7;

    /// One stream owned by one broker for its whole lifetime, with the given
    /// WAL spans and dedicated spans.
    fn snapshot(wal: &[(u64, u64)], dedicated: &[(u64, u64)]) -> MetadataSnapshot {
        let mut stream = StreamMetadata::new(STREAM, 0);
        stream
            .create_range(OwnershipRange::new(STREAM, 0, BROKER, 0, None))
            .expect("range record should apply");
        for (i, (start, end)) in dedicated.iter().enumerate() {
            stream
                .add_stream_object(StreamObject::new(
                    100 + i as u64,
                    OffsetRange::new(STREAM, *start, *end),
                ))
                .expect("stream object record should apply");
        }

        let mut snapshot = MetadataSnapshot::default();
        snapshot.apply_stream(stream);
        for (i, (start, end)) in wal.iter().enumerate() {
            let mut index = HashMap::new();
            index.insert(STREAM, OffsetRange::new(STREAM, *start, *end));
            snapshot
                .apply_wal_object(WalObject::new(
                    i as u64,
                    BROKER,
                    i as u64,
                    UNKNOWN_TS,
                    index,
                ))
                .expect("wal object record should apply");
        }
        snapshot
    }

    fn spans(resolved: &ResolvedRange) -> Vec<(u64, u64)> {
        resolved
            .objects()
            .iter()
            .map(|o| (o.range().start(), o.range().end()))
            .collect()
    }

    #[test]
    fn test_merge_orders_by_start() -> Result<(), Box<dyn Error>> {
        let snapshot = snapshot(&[(0, 100), (200, 300)], &[(100, 200)]);
        let resolver = RangeResolver::new(&snapshot, STREAM, BROKER, 0, 300);
        let resolved = resolver.resolve_within(10).expect("window is searchable");
        assert_eq!(spans(&resolved), vec![(0, 100), (100, 200), (200, 300)]);
        assert_eq!(resolved.end_offset(), 300);
        Ok(())
    }

    #[test]
    fn test_tie_prefers_wal() {
        let snapshot = snapshot(&[(0, 100)], &[(0, 80)]);
        let resolver = RangeResolver::new(&snapshot, STREAM, BROKER, 0, 100);
        let resolved = resolver.resolve_within(10).expect("window is searchable");
        // The WAL copy at the shared start wins; the dedicated object is then
        // fully superseded and does not count against the limit.
        assert_eq!(resolved.objects().len(), 1);
        assert_eq!(resolved.objects()[0].object_type(), ObjectType::Wal);
        assert_eq!(resolved.end_offset(), 100);
    }

    #[test]
    fn test_gap_halts_with_prefix() {
        let snapshot = snapshot(&[(0, 50)], &[(100, 150)]);
        let resolver = RangeResolver::new(&snapshot, STREAM, BROKER, 0, 150);
        let resolved = resolver.resolve_within(10).expect("window is searchable");
        assert_eq!(spans(&resolved), vec![(0, 50)]);
        assert_eq!(resolved.end_offset(), 50);
    }

    #[test]
    fn test_superseded_candidate_skipped_for_free() {
        // The second WAL object is buried inside the first one's span.
        let snapshot = snapshot(&[(0, 100), (20, 60)], &[(100, 120)]);
        let resolver = RangeResolver::new(&snapshot, STREAM, BROKER, 0, 120);
        // Limit 2 still suffices: the buried object is discarded, not counted.
        let resolved = resolver.resolve_within(2).expect("window is searchable");
        assert_eq!(spans(&resolved), vec![(0, 100), (100, 120)]);
    }

    #[test]
    fn test_limit_bounds_output() {
        let snapshot = snapshot(&[(0, 10), (10, 20), (20, 30)], &[]);
        let resolver = RangeResolver::new(&snapshot, STREAM, BROKER, 0, 30);
        let resolved = resolver.resolve_within(2).expect("window is searchable");
        assert_eq!(spans(&resolved), vec![(0, 10), (10, 20)]);
        assert_eq!(resolved.end_offset(), 20);
    }

    #[test]
    fn test_zero_limit_and_unknown_broker_are_invalid() {
        let snapshot = snapshot(&[(0, 10)], &[]);
        let resolver = RangeResolver::new(&snapshot, STREAM, BROKER, 0, 10);
        assert!(resolver.resolve_within(0).is_none());

        let resolver = RangeResolver::new(&snapshot, STREAM, BROKER + 1, 0, 10);
        assert!(resolver.resolve_within(10).is_none());
    }

    #[test]
    fn test_acceptance_overshoots_window_end() {
        let snapshot = snapshot(&[(0, 100)], &[]);
        let resolver = RangeResolver::new(&snapshot, STREAM, BROKER, 0, 50);
        let resolved = resolver.resolve_within(10).expect("window is searchable");
        // The whole candidate is accepted even though the window asked for
        // [0, 50) only.
        assert_eq!(spans(&resolved), vec![(0, 100)]);
        assert_eq!(resolved.end_offset(), 100);
    }
}
