//! In-process event fabric.
//!
//! Backs the fabric bridge with a per-topic, single-partition log kept in
//! memory. Offsets are dense and monotonic, the low watermark moves only
//! via [`PartitionLog::truncate_before`], and the high watermark is one
//! past the last appended offset, so the retriever sees the same
//! watermark arithmetic a managed broker would expose.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

use crate::service::{AppError, AppResult};

use super::reader::{PartitionReader, RawMessage, RawRecord, ReaderFactory, PARTITION_ZERO};
use super::record::TimestampKind;

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub offset: i64,
    pub timestamp_ms: i64,
    pub key: Option<Bytes>,
    pub value: Bytes,
}

/// Acknowledgement for a synchronously produced message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProduceAck {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub timestamp: i64,
}

/// A single topic partition held in memory.
#[derive(Debug, Default)]
pub struct PartitionLog {
    records: VecDeque<StoredRecord>,
    log_start_offset: i64,
    high_watermark: i64,
}

impl PartitionLog {
    pub fn append(&mut self, key: Option<Bytes>, value: Bytes, timestamp_ms: i64) -> i64 {
        let offset = self.high_watermark;
        self.records.push_back(StoredRecord {
            offset,
            timestamp_ms,
            key,
            value,
        });
        self.high_watermark += 1;
        offset
    }

    /// Drop every record with offset `< offset` and advance the low
    /// watermark. The high watermark never moves backwards.
    pub fn truncate_before(&mut self, offset: i64) {
        while self
            .records
            .front()
            .is_some_and(|record| record.offset < offset)
        {
            self.records.pop_front();
        }
        if offset > self.log_start_offset {
            self.log_start_offset = offset.min(self.high_watermark);
        }
    }

    pub fn watermarks(&self) -> (i64, i64) {
        (self.log_start_offset, self.high_watermark)
    }

    /// Offset of the first retained record with timestamp `>= ts_ms`.
    pub fn offset_for_timestamp(&self, ts_ms: i64) -> Option<i64> {
        self.records
            .iter()
            .find(|record| record.timestamp_ms >= ts_ms)
            .map(|record| record.offset)
    }

    fn read_from(&self, offset: i64, max: usize) -> Vec<StoredRecord> {
        self.records
            .iter()
            .filter(|record| record.offset >= offset)
            .take(max)
            .cloned()
            .collect()
    }
}

/// Topic registry plus per-topic logs, shared across tool calls.
#[derive(Debug, Default)]
pub struct MemoryFabric {
    topics: DashMap<String, Arc<Mutex<PartitionLog>>>,
}

impl MemoryFabric {
    pub fn new() -> Self {
        MemoryFabric::default()
    }

    /// Register a topic. Returns `true` when newly created, `false` when
    /// it already existed.
    pub fn register_topic(&self, topic: &str) -> AppResult<bool> {
        if topic.trim().is_empty() {
            return Err(AppError::InvalidValue(
                "topic name must not be empty".to_string(),
            ));
        }
        let mut created = false;
        self.topics.entry(topic.to_string()).or_insert_with(|| {
            created = true;
            Arc::new(Mutex::new(PartitionLog::default()))
        });
        if created {
            info!(topic, "registered topic");
        }
        Ok(created)
    }

    /// Drop a topic and its log. Returns `true` when the topic existed.
    pub fn unregister_topic(&self, topic: &str) -> bool {
        let removed = self.topics.remove(topic).is_some();
        if removed {
            info!(topic, "unregistered topic");
        }
        removed
    }

    pub fn topic_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.topics.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn partition(&self, topic: &str) -> Option<Arc<Mutex<PartitionLog>>> {
        self.topics.get(topic).map(|e| e.value().clone())
    }

    /// Append one message to `topic`, stamping it with the current time.
    pub fn produce(
        &self,
        topic: &str,
        key: Option<Bytes>,
        value: Bytes,
    ) -> AppResult<ProduceAck> {
        let log = self.partition(topic).ok_or_else(|| {
            AppError::NotFound(format!(
                "topic '{}' is not registered; register it before producing",
                topic
            ))
        })?;
        let timestamp = now_ms();
        let offset = log.lock().append(key, value, timestamp);
        Ok(ProduceAck {
            topic: topic.to_string(),
            partition: PARTITION_ZERO,
            offset,
            timestamp,
        })
    }
}

impl ReaderFactory for MemoryFabric {
    type Reader = MemoryReader;

    fn open(&self, topic: &str, partition: i32) -> AppResult<MemoryReader> {
        if partition != PARTITION_ZERO {
            return Err(AppError::InvalidValue(format!(
                "partition {} does not exist; topics are single-partition",
                partition
            )));
        }
        let log = self.partition(topic).ok_or_else(|| {
            AppError::NotFound(format!(
                "cannot acquire a partition assignment for '{}'; the topic is not registered",
                topic
            ))
        })?;
        Ok(MemoryReader {
            log,
            position: None,
        })
    }
}

/// Reader over one in-memory partition.
///
/// An unseeked reader polls from the low watermark, matching the
/// earliest-offset reset policy the bridge configures on real consumers.
pub struct MemoryReader {
    log: Arc<Mutex<PartitionLog>>,
    position: Option<i64>,
}

impl PartitionReader for MemoryReader {
    fn watermark_offsets(&self, _timeout: Duration) -> AppResult<(i64, i64)> {
        Ok(self.log.lock().watermarks())
    }

    fn offset_for_timestamp(&self, ts_ms: i64, _timeout: Duration) -> AppResult<Option<i64>> {
        Ok(self.log.lock().offset_for_timestamp(ts_ms))
    }

    fn seek(&mut self, offset: i64) -> AppResult<()> {
        self.position = Some(offset);
        Ok(())
    }

    fn poll(&mut self, max: usize, _timeout: Duration) -> AppResult<Vec<RawMessage>> {
        let log = self.log.lock();
        let (low, high) = log.watermarks();
        let start = self.position.unwrap_or(low);
        let stored = log.read_from(start, max);

        let mut messages: Vec<RawMessage> = stored
            .into_iter()
            .map(|record| {
                RawMessage::Record(RawRecord {
                    offset: record.offset,
                    timestamp_kind: TimestampKind::CreateTime,
                    timestamp_ms: record.timestamp_ms,
                    key: record.key,
                    value: Some(record.value),
                })
            })
            .collect();

        let next = match messages.last() {
            Some(RawMessage::Record(record)) => record.offset + 1,
            _ => start.max(low),
        };
        self.position = Some(next);

        if next >= high {
            messages.push(RawMessage::EndOfPartition);
        }
        Ok(messages)
    }

    fn close(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(s: &str) -> Bytes {
        Bytes::from(s.to_string())
    }

    #[test]
    fn test_append_assigns_dense_offsets() {
        let mut log = PartitionLog::default();
        assert_eq!(log.append(None, bytes("a"), 10), 0);
        assert_eq!(log.append(None, bytes("b"), 20), 1);
        assert_eq!(log.watermarks(), (0, 2));
    }

    #[test]
    fn test_truncate_moves_low_watermark_only() {
        let mut log = PartitionLog::default();
        for i in 0..5 {
            log.append(None, bytes("x"), i * 10);
        }
        log.truncate_before(3);
        assert_eq!(log.watermarks(), (3, 5));
        assert_eq!(log.read_from(0, 10).len(), 2);

        // Truncating backwards is a no-op.
        log.truncate_before(1);
        assert_eq!(log.watermarks(), (3, 5));
    }

    #[test]
    fn test_offset_for_timestamp_finds_first_at_or_after() {
        let mut log = PartitionLog::default();
        log.append(None, bytes("a"), 100);
        log.append(None, bytes("b"), 200);
        log.append(None, bytes("c"), 300);
        assert_eq!(log.offset_for_timestamp(150), Some(1));
        assert_eq!(log.offset_for_timestamp(300), Some(2));
        assert_eq!(log.offset_for_timestamp(301), None);
    }

    #[test]
    fn test_register_is_idempotent() {
        let fabric = MemoryFabric::new();
        assert!(fabric.register_topic("events").unwrap());
        assert!(!fabric.register_topic("events").unwrap());
        assert_eq!(fabric.topic_names(), vec!["events".to_string()]);
        assert!(fabric.unregister_topic("events"));
        assert!(!fabric.unregister_topic("events"));
    }

    #[test]
    fn test_produce_requires_registration() {
        let fabric = MemoryFabric::new();
        let err = fabric.produce("ghost", None, bytes("v")).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        fabric.register_topic("events").unwrap();
        let ack = fabric.produce("events", None, bytes("v")).unwrap();
        assert_eq!(ack.offset, 0);
        assert_eq!(ack.partition, 0);
    }

    #[test]
    fn test_unseeked_reader_polls_from_low_watermark() {
        let fabric = MemoryFabric::new();
        fabric.register_topic("events").unwrap();
        for i in 0..4 {
            fabric
                .produce("events", None, bytes(&format!("m{}", i)))
                .unwrap();
        }
        fabric.partition("events").unwrap().lock().truncate_before(2);

        let mut reader = fabric.open("events", 0).unwrap();
        let messages = reader.poll(10, Duration::from_secs(1)).unwrap();
        let offsets: Vec<i64> = messages
            .iter()
            .filter_map(|m| match m {
                RawMessage::Record(r) => Some(r.offset),
                _ => None,
            })
            .collect();
        assert_eq!(offsets, vec![2, 3]);
        assert!(matches!(messages.last(), Some(RawMessage::EndOfPartition)));
    }

    #[test]
    fn test_open_unknown_topic_fails() {
        let fabric = MemoryFabric::new();
        assert!(matches!(
            fabric.open("nope", 0),
            Err(AppError::NotFound(_))
        ));
        fabric.register_topic("t").unwrap();
        assert!(matches!(
            fabric.open("t", 1),
            Err(AppError::InvalidValue(_))
        ));
    }
}
