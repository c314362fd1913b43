//! End-to-end retrieval tests against the in-memory fabric.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use rstest::rstest;
use science_bridges::fabric::{
    ConsumeBatch, MemoryFabric, WindowMode, WindowRetriever,
};
use science_bridges::facility::schemas::AlcfJob;
use science_bridges::facility::format::paginate;

const TOPIC: &str = "telemetry";

fn timeout() -> Duration {
    Duration::from_secs(1)
}

/// Fabric with one topic holding records at offsets `low..high`, where
/// the record at offset `i` has timestamp `base_ts + i` and value `m{i}`.
fn fabric_with_window(low: i64, high: i64, base_ts: i64) -> Arc<MemoryFabric> {
    let fabric = Arc::new(MemoryFabric::new());
    fabric.register_topic(TOPIC).unwrap();
    let log = fabric.partition(TOPIC).unwrap();
    {
        let mut log = log.lock();
        for i in 0..high {
            log.append(None, Bytes::from(format!("m{}", i)), base_ts + i);
        }
        log.truncate_before(low);
    }
    fabric
}

fn retriever(fabric: &Arc<MemoryFabric>) -> WindowRetriever<Arc<MemoryFabric>> {
    WindowRetriever::new(fabric.clone())
}

fn offsets(batch: &ConsumeBatch) -> Vec<i64> {
    batch.records.iter().map(|r| r.offset).collect()
}

#[rstest]
#[case(WindowMode::Earliest)]
#[case(WindowMode::Latest)]
#[case(WindowMode::FromOffset(3))]
#[case(WindowMode::FromTimestamp(1_000))]
fn test_non_positive_num_msg_is_empty_for_every_mode(#[case] mode: WindowMode) {
    let fabric = fabric_with_window(0, 5, 1_000);
    for num_msg in [0, -1, -100] {
        let batch = retriever(&fabric)
            .retrieve(TOPIC, mode, num_msg, timeout())
            .unwrap();
        assert!(batch.records.is_empty());
        assert_eq!(batch.start_offset, None);
    }
}

#[rstest]
#[case(1, 0, 10)]
#[case(3, 0, 10)]
#[case(10, 0, 10)]
#[case(50, 0, 10)]
#[case(4, 5, 12)]
fn test_latest_size_and_start_arithmetic(#[case] num_msg: i64, #[case] low: i64, #[case] high: i64) {
    let fabric = fabric_with_window(low, high, 1_000);
    let batch = retriever(&fabric)
        .retrieve(TOPIC, WindowMode::Latest, num_msg, timeout())
        .unwrap();

    let expected_len = num_msg.min(high - low) as usize;
    let expected_start = low.max(high - num_msg);
    assert_eq!(batch.records.len(), expected_len);
    assert_eq!(batch.records[0].offset, expected_start);
    assert_eq!(batch.start_offset, Some(expected_start));
    // Ascending, dense.
    let got = offsets(&batch);
    let expected: Vec<i64> = (expected_start..expected_start + expected_len as i64).collect();
    assert_eq!(got, expected);
}

#[test]
fn test_earliest_starts_at_low_watermark() {
    let fabric = fabric_with_window(4, 12, 1_000);
    let batch = retriever(&fabric)
        .retrieve(TOPIC, WindowMode::Earliest, 3, timeout())
        .unwrap();
    assert_eq!(offsets(&batch), vec![4, 5, 6]);
    assert_eq!(batch.start_offset, Some(4));
}

#[rstest]
#[case(0)]
#[case(2)]
#[case(3)]
fn test_from_offset_below_low_snaps_forward(#[case] requested: i64) {
    let fabric = fabric_with_window(4, 12, 1_000);
    let batch = retriever(&fabric)
        .retrieve(TOPIC, WindowMode::FromOffset(requested), 100, timeout())
        .unwrap();
    assert_eq!(batch.records[0].offset, 4);
    assert!(offsets(&batch).iter().all(|&o| o >= 4));
}

#[rstest]
#[case(4)]
#[case(7)]
#[case(11)]
fn test_from_offset_within_window_starts_exactly_there(#[case] requested: i64) {
    let fabric = fabric_with_window(4, 12, 1_000);
    let batch = retriever(&fabric)
        .retrieve(TOPIC, WindowMode::FromOffset(requested), 100, timeout())
        .unwrap();
    assert_eq!(batch.records[0].offset, requested);
    assert_eq!(batch.start_offset, Some(requested));
}

#[test]
fn test_from_timestamp_records_all_meet_threshold() {
    let fabric = fabric_with_window(0, 10, 1_000);
    let threshold = 1_006;
    let batch = retriever(&fabric)
        .retrieve(TOPIC, WindowMode::FromTimestamp(threshold), 100, timeout())
        .unwrap();
    assert!(!batch.records.is_empty());
    assert!(batch
        .records
        .iter()
        .all(|r| r.message_timestamp.timestamp >= threshold));
    // First record is the earliest qualifying one.
    assert_eq!(batch.records[0].offset, 6);
}

#[test]
fn test_idempotent_retrieval_on_unchanged_partition() {
    let fabric = fabric_with_window(2, 9, 1_000);
    let r = retriever(&fabric);
    let first = r
        .retrieve(TOPIC, WindowMode::Latest, 4, timeout())
        .unwrap();
    let second = r
        .retrieve(TOPIC, WindowMode::Latest, 4, timeout())
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_binary_and_utf8_values_round_trip() {
    let fabric = Arc::new(MemoryFabric::new());
    fabric.register_topic(TOPIC).unwrap();
    fabric
        .produce(TOPIC, None, Bytes::from_static(b"plain text"))
        .unwrap();
    fabric
        .produce(TOPIC, None, Bytes::from_static(&[0xff, 0xfe, 0x01]))
        .unwrap();
    fabric
        .produce(TOPIC, None, Bytes::from_static(b"base64:looks encoded"))
        .unwrap();

    let batch = retriever(&fabric)
        .retrieve(TOPIC, WindowMode::Earliest, 10, timeout())
        .unwrap();
    assert_eq!(batch.records[0].value.as_deref(), Some("plain text"));
    assert_eq!(batch.records[1].value.as_deref(), Some("base64://4B"));
    // Genuine UTF-8 that happens to start with the prefix stays verbatim.
    assert_eq!(
        batch.records[2].value.as_deref(),
        Some("base64:looks encoded")
    );
}

// End-to-end scenarios

#[test]
fn test_scenario_latest_three_of_hundred_window() {
    let fabric = fabric_with_window(100, 110, 10_000);
    let batch = retriever(&fabric)
        .retrieve(TOPIC, WindowMode::Latest, 3, timeout())
        .unwrap();
    assert_eq!(offsets(&batch), vec![107, 108, 109]);
}

#[test]
fn test_scenario_from_offset_below_retention_starts_at_hundred() {
    let fabric = fabric_with_window(100, 110, 10_000);
    let batch = retriever(&fabric)
        .retrieve(TOPIC, WindowMode::FromOffset(50), 5, timeout())
        .unwrap();
    assert_eq!(batch.records[0].offset, 100);
    assert_eq!(batch.start_offset, Some(100));
}

#[rstest]
#[case(WindowMode::Earliest)]
#[case(WindowMode::Latest)]
#[case(WindowMode::FromOffset(0))]
#[case(WindowMode::FromTimestamp(0))]
fn test_scenario_empty_partition_is_empty_not_error(#[case] mode: WindowMode) {
    let fabric = Arc::new(MemoryFabric::new());
    fabric.register_topic(TOPIC).unwrap();
    let batch = retriever(&fabric)
        .retrieve(TOPIC, mode, 10, timeout())
        .unwrap();
    assert!(batch.records.is_empty());
    assert_eq!(batch.start_offset, None);
}

#[test]
fn test_scenario_timestamp_past_newest_record_is_empty() {
    let fabric = fabric_with_window(0, 10, 1_000);
    let batch = retriever(&fabric)
        .retrieve(TOPIC, WindowMode::FromTimestamp(999_999), 10, timeout())
        .unwrap();
    assert!(batch.records.is_empty());
    assert_eq!(batch.start_offset, None);
}

#[test]
fn test_scenario_pagination_clamps_but_reports_total() {
    let jobs = vec![AlcfJob::default(); 7];
    let page = paginate(&jobs, 5, 3);
    assert_eq!(page.tasks.len(), 2);
    assert_eq!(page.total, 7);
}

// Eviction edge case: fully evicted request range vs empty partition.

#[test]
fn test_fully_evicted_range_is_distinguishable_from_empty_partition() {
    let fabric = fabric_with_window(0, 5, 1_000);
    // Requesting past the high watermark yields the clamped start offset.
    let evicted = retriever(&fabric)
        .retrieve(TOPIC, WindowMode::FromOffset(50), 10, timeout())
        .unwrap();
    assert!(evicted.records.is_empty());
    assert_eq!(evicted.start_offset, Some(50));

    let empty = Arc::new(MemoryFabric::new());
    empty.register_topic(TOPIC).unwrap();
    let empty_batch = retriever(&empty)
        .retrieve(TOPIC, WindowMode::FromOffset(50), 10, timeout())
        .unwrap();
    assert!(empty_batch.records.is_empty());
    assert_eq!(empty_batch.start_offset, None);
}

#[test]
fn test_consume_unknown_topic_is_an_error() {
    let fabric = Arc::new(MemoryFabric::new());
    let result = retriever(&fabric).retrieve("ghost", WindowMode::Earliest, 10, timeout());
    assert!(result.is_err());
}
