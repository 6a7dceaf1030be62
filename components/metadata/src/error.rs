use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("Limit must be positive")]
    InvalidLimit,

    #[error("Stream {0} not found")]
    StreamNotFound(u64),

    #[error("Offset {start_offset} of stream {stream_id} precedes the truncation floor {floor}")]
    RangeTruncated {
        stream_id: u64,
        start_offset: u64,
        floor: u64,
    },

    #[error("Stream id does not match: expected {expected}, got {actual}")]
    StreamIdMismatch { expected: u64, actual: u64 },

    #[error("Broker id does not match: expected {expected}, got {actual}")]
    BrokerIdMismatch { expected: i32, actual: i32 },

    #[error("Range index {0} already holds a different range")]
    RangeAlreadyExists(i32),
}
