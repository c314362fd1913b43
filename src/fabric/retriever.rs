// Copyright 2026 science-bridges contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bounded log-window retrieval.
//!
//! All four consume modes reduce to the same shape: resolve a start
//! offset from the partition watermarks, clamp the window so it never
//! reaches past the high watermark or before the low one, then fetch and
//! decode at most `num_msg` records. The reader is released on every
//! exit path, success or error.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::service::{AppError, AppResult};

use super::reader::{PartitionReader, RawMessage, RawRecord, ReaderFactory, PARTITION_ZERO};
use super::record::{to_safe_text, ConsumedRecord, MessageTimestamp};

/// Where the retrieval window starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    /// From the low watermark.
    Earliest,
    /// The last `num_msg` retained messages.
    Latest,
    /// From an absolute offset, snapped forward to the low watermark if
    /// the requested offset has been evicted.
    FromOffset(i64),
    /// From the first record at or after an epoch-ms timestamp.
    FromTimestamp(i64),
}

/// Result of one consume call.
///
/// `start_offset` is the offset the window actually began at after
/// clamping, or `None` when no window could be resolved at all (empty
/// partition, timestamp past the newest record). It can differ from a
/// caller-requested offset, which is how eviction-driven snapping stays
/// visible to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumeBatch {
    pub topic: String,
    pub partition: i32,
    pub start_offset: Option<i64>,
    pub records: Vec<ConsumedRecord>,
}

impl ConsumeBatch {
    fn empty(topic: &str, start_offset: Option<i64>) -> Self {
        ConsumeBatch {
            topic: topic.to_string(),
            partition: PARTITION_ZERO,
            start_offset,
            records: Vec::new(),
        }
    }
}

/// Retrieves bounded windows of records through a [`ReaderFactory`].
#[derive(Debug, Clone)]
pub struct WindowRetriever<F> {
    factory: F,
}

impl<F: ReaderFactory> WindowRetriever<F> {
    pub fn new(factory: F) -> Self {
        WindowRetriever { factory }
    }

    /// Retrieve at most `num_msg` records from `topic` per `mode`.
    ///
    /// `num_msg <= 0` short-circuits to an empty batch without opening a
    /// reader. Otherwise a reader is opened, the window resolved and
    /// fetched, and the reader closed whether or not the fetch succeeded.
    pub fn retrieve(
        &self,
        topic: &str,
        mode: WindowMode,
        num_msg: i64,
        timeout: Duration,
    ) -> AppResult<ConsumeBatch> {
        if num_msg <= 0 {
            return Ok(ConsumeBatch::empty(topic, None));
        }
        // Negative start points are treated like an impossible window, not
        // an error, matching the non-positive num_msg short-circuit.
        match mode {
            WindowMode::FromOffset(offset) if offset < 0 => {
                return Ok(ConsumeBatch::empty(topic, None));
            }
            WindowMode::FromTimestamp(ts_ms) if ts_ms < 0 => {
                return Ok(ConsumeBatch::empty(topic, None));
            }
            _ => {}
        }

        let mut reader = self.factory.open(topic, PARTITION_ZERO)?;
        let result = retrieve_window(&mut reader, topic, mode, num_msg, timeout);
        reader.close();
        result
    }
}

fn retrieve_window<R: PartitionReader>(
    reader: &mut R,
    topic: &str,
    mode: WindowMode,
    num_msg: i64,
    timeout: Duration,
) -> AppResult<ConsumeBatch> {
    let (start, to_fetch) = match mode {
        WindowMode::Earliest => {
            let (low, high) = reader.watermark_offsets(timeout)?;
            if high <= low {
                return Ok(ConsumeBatch::empty(topic, None));
            }
            (low, num_msg.min(high - low))
        }
        WindowMode::Latest => {
            let (low, high) = reader.watermark_offsets(timeout)?;
            if high <= low {
                return Ok(ConsumeBatch::empty(topic, None));
            }
            // Back off num_msg from the tail, but never before the low
            // watermark when retention has eaten into the window.
            (low.max(high - num_msg), num_msg.min(high - low))
        }
        WindowMode::FromOffset(offset) => {
            let (low, high) = reader.watermark_offsets(timeout)?;
            if high <= low {
                return Ok(ConsumeBatch::empty(topic, None));
            }
            let start = offset.max(low);
            if start >= high {
                // Requested range starts past everything retained.
                return Ok(ConsumeBatch::empty(topic, Some(start)));
            }
            (start, num_msg.min(high - start))
        }
        WindowMode::FromTimestamp(ts_ms) => {
            let Some(start) = reader.offset_for_timestamp(ts_ms, timeout)? else {
                return Ok(ConsumeBatch::empty(topic, None));
            };
            let (low, high) = reader.watermark_offsets(timeout)?;
            if high <= low || start >= high {
                return Ok(ConsumeBatch::empty(topic, None));
            }
            (start.max(low), num_msg.min(high - start.max(low)))
        }
    };

    debug!(
        topic,
        ?mode,
        start,
        to_fetch,
        "resolved retrieval window"
    );

    reader.seek(start)?;
    fetch_and_decode(reader, topic, start, to_fetch, timeout)
}

/// Poll up to `to_fetch` messages and decode them.
///
/// End-of-partition markers are skipped; a failed message aborts the
/// whole batch and discards everything decoded so far, so a batch is
/// never partially delivered.
fn fetch_and_decode<R: PartitionReader>(
    reader: &mut R,
    topic: &str,
    start: i64,
    to_fetch: i64,
    timeout: Duration,
) -> AppResult<ConsumeBatch> {
    let raw = reader.poll(to_fetch as usize, timeout)?;

    let mut records = Vec::with_capacity(raw.len());
    for message in raw {
        match message {
            RawMessage::EndOfPartition => continue,
            RawMessage::Failed(cause) => return Err(AppError::FetchAborted(cause)),
            RawMessage::Record(record) => records.push(decode_record(topic, record)),
        }
    }

    Ok(ConsumeBatch {
        topic: topic.to_string(),
        partition: PARTITION_ZERO,
        start_offset: Some(start),
        records,
    })
}

fn decode_record(topic: &str, raw: RawRecord) -> ConsumedRecord {
    ConsumedRecord {
        topic: topic.to_string(),
        partition: PARTITION_ZERO,
        offset: raw.offset,
        message_timestamp: MessageTimestamp::new(raw.timestamp_kind, raw.timestamp_ms),
        key: to_safe_text(raw.key.as_deref()),
        value: to_safe_text(raw.value.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use bytes::Bytes;

    use super::super::record::TimestampKind;
    use super::*;

    /// Scripted reader that records whether close ran.
    struct ScriptedReader {
        low: i64,
        high: i64,
        ts_offset: Option<i64>,
        messages: Vec<RawMessage>,
        position: Option<i64>,
        closed: Rc<RefCell<bool>>,
    }

    impl PartitionReader for ScriptedReader {
        fn watermark_offsets(&self, _timeout: Duration) -> AppResult<(i64, i64)> {
            Ok((self.low, self.high))
        }

        fn offset_for_timestamp(
            &self,
            _ts_ms: i64,
            _timeout: Duration,
        ) -> AppResult<Option<i64>> {
            Ok(self.ts_offset)
        }

        fn seek(&mut self, offset: i64) -> AppResult<()> {
            self.position = Some(offset);
            Ok(())
        }

        fn poll(&mut self, max: usize, _timeout: Duration) -> AppResult<Vec<RawMessage>> {
            Ok(self.messages.iter().take(max).cloned().collect())
        }

        fn close(self) {
            *self.closed.borrow_mut() = true;
        }
    }

    struct ScriptedFactory {
        low: i64,
        high: i64,
        ts_offset: Option<i64>,
        messages: Vec<RawMessage>,
        closed: Rc<RefCell<bool>>,
    }

    impl ReaderFactory for ScriptedFactory {
        type Reader = ScriptedReader;

        fn open(&self, _topic: &str, _partition: i32) -> AppResult<ScriptedReader> {
            Ok(ScriptedReader {
                low: self.low,
                high: self.high,
                ts_offset: self.ts_offset,
                messages: self.messages.clone(),
                position: None,
                closed: self.closed.clone(),
            })
        }
    }

    fn record_at(offset: i64) -> RawMessage {
        RawMessage::Record(RawRecord {
            offset,
            timestamp_kind: TimestampKind::CreateTime,
            timestamp_ms: 1_700_000_000_000 + offset,
            key: None,
            value: Some(Bytes::from(format!("m{}", offset))),
        })
    }

    fn factory(
        low: i64,
        high: i64,
        ts_offset: Option<i64>,
        messages: Vec<RawMessage>,
    ) -> (ScriptedFactory, Rc<RefCell<bool>>) {
        let closed = Rc::new(RefCell::new(false));
        (
            ScriptedFactory {
                low,
                high,
                ts_offset,
                messages,
                closed: closed.clone(),
            },
            closed,
        )
    }

    #[test]
    fn test_non_positive_num_msg_skips_reader_entirely() {
        let (f, closed) = factory(0, 10, None, vec![record_at(0)]);
        let retriever = WindowRetriever::new(f);

        let batch = retriever
            .retrieve("t", WindowMode::Latest, 0, Duration::from_secs(1))
            .unwrap();
        assert!(batch.records.is_empty());
        assert_eq!(batch.start_offset, None);
        // No reader was ever opened, so none was closed.
        assert!(!*closed.borrow());
    }

    #[test]
    fn test_latest_clamps_to_low_watermark() {
        let (f, closed) = factory(5, 8, None, (5..8).map(record_at).collect());
        let retriever = WindowRetriever::new(f);

        let batch = retriever
            .retrieve("t", WindowMode::Latest, 100, Duration::from_secs(1))
            .unwrap();
        assert_eq!(batch.start_offset, Some(5));
        assert_eq!(batch.records.len(), 3);
        assert!(*closed.borrow());
    }

    #[test]
    fn test_from_offset_snaps_forward_after_eviction() {
        let (f, _) = factory(50, 53, None, (50..53).map(record_at).collect());
        let retriever = WindowRetriever::new(f);

        let batch = retriever
            .retrieve("t", WindowMode::FromOffset(10), 10, Duration::from_secs(1))
            .unwrap();
        assert_eq!(batch.start_offset, Some(50));
        assert_eq!(batch.records.len(), 3);
    }

    #[test]
    fn test_from_offset_past_high_is_empty_but_reports_start() {
        let (f, _) = factory(0, 5, None, vec![]);
        let retriever = WindowRetriever::new(f);

        let batch = retriever
            .retrieve("t", WindowMode::FromOffset(9), 10, Duration::from_secs(1))
            .unwrap();
        assert!(batch.records.is_empty());
        assert_eq!(batch.start_offset, Some(9));
    }

    #[test]
    fn test_timestamp_without_match_yields_empty_batch() {
        let (f, closed) = factory(0, 5, None, vec![record_at(0)]);
        let retriever = WindowRetriever::new(f);

        let batch = retriever
            .retrieve(
                "t",
                WindowMode::FromTimestamp(2_000_000_000_000),
                10,
                Duration::from_secs(1),
            )
            .unwrap();
        assert!(batch.records.is_empty());
        assert_eq!(batch.start_offset, None);
        assert!(*closed.borrow());
    }

    #[test]
    fn test_end_of_partition_markers_are_skipped() {
        let (f, _) = factory(
            0,
            2,
            None,
            vec![record_at(0), RawMessage::EndOfPartition, record_at(1)],
        );
        let retriever = WindowRetriever::new(f);

        let batch = retriever
            .retrieve("t", WindowMode::Earliest, 10, Duration::from_secs(1))
            .unwrap();
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[0].offset, 0);
        assert_eq!(batch.records[1].offset, 1);
    }

    #[test]
    fn test_failed_message_aborts_and_still_closes_reader() {
        let (f, closed) = factory(
            0,
            3,
            None,
            vec![
                record_at(0),
                RawMessage::Failed("broker went away".to_string()),
                record_at(2),
            ],
        );
        let retriever = WindowRetriever::new(f);

        let err = retriever
            .retrieve("t", WindowMode::Earliest, 10, Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, AppError::FetchAborted(_)));
        assert!(*closed.borrow());
    }

    #[test]
    fn test_negative_start_points_yield_empty_batches() {
        let (f, closed) = factory(0, 3, None, vec![record_at(0)]);
        let retriever = WindowRetriever::new(f);

        let batch = retriever
            .retrieve("t", WindowMode::FromOffset(-1), 10, Duration::from_secs(1))
            .unwrap();
        assert!(batch.records.is_empty());
        assert!(!*closed.borrow());

        let batch = retriever
            .retrieve(
                "t",
                WindowMode::FromTimestamp(-5),
                10,
                Duration::from_secs(1),
            )
            .unwrap();
        assert!(batch.records.is_empty());
    }
}
