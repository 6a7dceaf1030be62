//! Metadata-resolution core of a tiered log-storage engine.
//!
//! Given an immutable [`MetadataSnapshot`], this crate answers which backing
//! objects in remote storage hold offsets in `[start, end)` of an append-only
//! stream, merging broker-shared WAL objects with stream-dedicated compacted
//! objects along the stream's broker-ownership timeline. It performs no I/O:
//! the metadata-log applier builds snapshots, the object-storage layer
//! fetches the bytes the resolved object ids point at.

pub mod broker;
pub mod error;
pub mod object;
pub mod ownership;
pub mod range;
mod resolver;
pub mod snapshot;
pub mod stream;

pub use crate::broker::BrokerWalIndex;
pub use crate::error::MetadataError;
pub use crate::object::{ObjectType, ResolvedObject, ResolvedRange, StreamObject, WalObject};
pub use crate::ownership::OwnershipRange;
pub use crate::range::OffsetRange;
pub use crate::snapshot::MetadataSnapshot;
pub use crate::stream::StreamMetadata;
