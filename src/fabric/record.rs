//! Decoded record shape returned by every consume operation.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Broker timestamp kinds, following the usual log convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampKind {
    NotAvailable,
    CreateTime,
    LogAppendTime,
}

impl TimestampKind {
    pub fn as_i32(self) -> i32 {
        match self {
            TimestampKind::NotAvailable => 0,
            TimestampKind::CreateTime => 1,
            TimestampKind::LogAppendTime => 2,
        }
    }
}

/// Typed message timestamp: `type` is 0=unavailable, 1=producer-assigned
/// creation time, 2=broker log-append time; `timestamp` is epoch ms (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTimestamp {
    pub r#type: i32,
    pub timestamp: i64,
}

impl MessageTimestamp {
    pub fn new(kind: TimestampKind, timestamp_ms: i64) -> Self {
        MessageTimestamp {
            r#type: kind.as_i32(),
            timestamp: timestamp_ms,
        }
    }
}

/// One decoded message consumed from a topic partition.
///
/// `key` and `value` are UTF-8 text when the raw bytes decode cleanly,
/// otherwise `"base64:" + base64(bytes)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumedRecord {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub message_timestamp: MessageTimestamp,
    pub key: Option<String>,
    pub value: Option<String>,
}

/// Decode bytes to UTF-8, or fall back to base64 with a `base64:` prefix.
///
/// A payload that is valid UTF-8 and itself begins with the literal text
/// `base64:` is returned verbatim (the decode succeeds first), so the
/// prefix alone does not prove the payload was re-encoded.
pub fn to_safe_text(data: Option<&[u8]>) -> Option<String> {
    let data = data?;
    match std::str::from_utf8(data) {
        Ok(text) => Some(text.to_string()),
        Err(_) => Some(format!("base64:{}", BASE64.encode(data))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_text_utf8_passthrough() {
        assert_eq!(to_safe_text(Some(b"hello")), Some("hello".to_string()));
        assert_eq!(to_safe_text(None), None);
    }

    #[test]
    fn test_safe_text_binary_fallback() {
        let raw = [0xffu8, 0xfe, 0x00, 0x01];
        let encoded = to_safe_text(Some(&raw)).unwrap();
        assert_eq!(encoded, format!("base64:{}", BASE64.encode(raw)));
    }

    #[test]
    fn test_safe_text_literal_prefix_is_not_reencoded() {
        // Valid UTF-8 starting with the literal prefix stays verbatim; only
        // the prefix distinguishes the two encodings on the wire.
        let tricky = b"base64:not actually encoded";
        assert_eq!(
            to_safe_text(Some(tricky)),
            Some("base64:not actually encoded".to_string())
        );
    }

    #[test]
    fn test_timestamp_kinds() {
        assert_eq!(TimestampKind::NotAvailable.as_i32(), 0);
        assert_eq!(TimestampKind::CreateTime.as_i32(), 1);
        assert_eq!(TimestampKind::LogAppendTime.as_i32(), 2);
    }
}
