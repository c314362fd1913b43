//! Partition reader seam.
//!
//! Consume operations never talk to a broker client directly; they go
//! through [`PartitionReader`], which exposes exactly the primitives the
//! window retriever needs: watermark queries, timestamp lookup, seeking
//! and bounded polling. [`super::memory::MemoryFabric`] is the in-process
//! implementation; a wire-protocol client slots in behind the same trait.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::service::AppResult;

use super::record::TimestampKind;

/// Bridged topics are single-partition; every reader binds partition 0.
pub const PARTITION_ZERO: i32 = 0;

/// An undecoded message pulled from a partition.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub offset: i64,
    pub timestamp_kind: TimestampKind,
    pub timestamp_ms: i64,
    pub key: Option<Bytes>,
    pub value: Option<Bytes>,
}

/// One unit delivered by [`PartitionReader::poll`].
///
/// `EndOfPartition` is an informational marker some clients interleave
/// with records when the read position reaches the high watermark; it
/// carries no payload. `Failed` is a per-message transport error.
#[derive(Debug, Clone)]
pub enum RawMessage {
    Record(RawRecord),
    EndOfPartition,
    Failed(String),
}

/// A positioned reader over a single topic partition.
pub trait PartitionReader {
    /// Current `(low, high)` watermarks. `low` is the earliest retained
    /// offset, `high` is one past the last appended offset.
    fn watermark_offsets(&self, timeout: Duration) -> AppResult<(i64, i64)>;

    /// Offset of the first record with timestamp `>= ts_ms`, or `None`
    /// when no retained record is that recent.
    fn offset_for_timestamp(&self, ts_ms: i64, timeout: Duration) -> AppResult<Option<i64>>;

    /// Position the reader so the next poll starts at `offset`.
    fn seek(&mut self, offset: i64) -> AppResult<()>;

    /// Pull at most `max` messages, waiting up to `timeout` in total.
    fn poll(&mut self, max: usize, timeout: Duration) -> AppResult<Vec<RawMessage>>;

    /// Release the reader's partition assignment.
    fn close(self);
}

/// Opens readers for the retriever. Implemented by each fabric backend.
pub trait ReaderFactory {
    type Reader: PartitionReader;

    fn open(&self, topic: &str, partition: i32) -> AppResult<Self::Reader>;
}

impl<F: ReaderFactory> ReaderFactory for Arc<F> {
    type Reader = F::Reader;

    fn open(&self, topic: &str, partition: i32) -> AppResult<Self::Reader> {
        (**self).open(topic, partition)
    }
}
