//! Live telemetry message decoding
//!
//! Malformed fields are dropped individually; nothing here can fail the
//! connection except an explicit `error` payload.

use super::state::ZoneCounts;
use base64::Engine;
use serde_json::Value;

/// Raw frame received on the push channel
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelFrame {
    Text(String),
    Binary(Vec<u8>),
}

/// Decoded telemetry message
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryMessage {
    Frame(Vec<u8>),
    Counts(ZoneCounts),
    FrameAndCounts { frame: Vec<u8>, counts: ZoneCounts },
    /// Terminal application error
    Fatal(String),
    /// Nothing usable
    Empty,
}

impl From<ChannelFrame> for TelemetryMessage {
    fn from(frame: ChannelFrame) -> Self {
        match frame {
            ChannelFrame::Text(text) => Self::parse_text(&text),
            ChannelFrame::Binary(bytes) if bytes.is_empty() => Self::Empty,
            ChannelFrame::Binary(bytes) => Self::Frame(bytes),
        }
    }
}

impl TelemetryMessage {
    /// Decode a JSON text message
    pub fn parse_text(text: &str) -> Self {
        let value: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring non-JSON telemetry message");
                return Self::Empty;
            }
        };
        let Some(obj) = value.as_object() else {
            tracing::warn!("Ignoring non-object telemetry message");
            return Self::Empty;
        };

        if let Some(error) = obj.get("error").filter(|e| !e.is_null()) {
            let message = match error.as_str() {
                Some(s) => s.to_string(),
                None => error.to_string(),
            };
            return Self::Fatal(message);
        }

        let is_frame_type = obj
            .get("type")
            .and_then(Value::as_str)
            .map(|t| t == "frame")
            .unwrap_or(true);
        let frame = obj
            .get("frame")
            .filter(|_| is_frame_type)
            .and_then(decode_frame);
        let counts = obj.get("counts").and_then(parse_counts);

        match (frame, counts) {
            (Some(frame), Some(counts)) => Self::FrameAndCounts { frame, counts },
            (Some(frame), None) => Self::Frame(frame),
            (None, Some(counts)) => Self::Counts(counts),
            (None, None) => Self::Empty,
        }
    }
}

fn decode_frame(value: &Value) -> Option<Vec<u8>> {
    let encoded = value.as_str()?;
    // Tolerate data URLs
    let encoded = encoded
        .split_once("base64,")
        .map(|(_, data)| data)
        .unwrap_or(encoded);

    match base64::engine::general_purpose::STANDARD.decode(encoded) {
        Ok(bytes) if !bytes.is_empty() => Some(bytes),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "Dropping undecodable frame field");
            None
        }
    }
}

/// Parse a `{zoneId: count}` object. Any non-numeric or negative value drops
/// the whole field.
pub fn parse_counts(value: &Value) -> Option<ZoneCounts> {
    let Some(obj) = value.as_object() else {
        tracing::warn!("Dropping non-object counts field");
        return None;
    };

    let mut counts = ZoneCounts::new();
    for (zone_id, v) in obj {
        let count = v
            .as_u64()
            .or_else(|| {
                v.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.round() as u64)
            });
        match count {
            Some(c) => {
                counts.insert(zone_id.clone(), c);
            }
            None => {
                tracing::warn!(zone_id = %zone_id, value = %v, "Dropping malformed counts field");
                return None;
            }
        }
    }
    Some(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_and_counts() {
        let msg = TelemetryMessage::parse_text(
            r#"{"type":"frame","frame":"/9j/AA==","counts":{"door":3,"global":7}}"#,
        );
        match msg {
            TelemetryMessage::FrameAndCounts { frame, counts } => {
                assert_eq!(frame, vec![0xff, 0xd8, 0xff, 0x00]);
                assert_eq!(counts.get("door"), Some(&3));
                assert_eq!(counts.get("global"), Some(&7));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_error_payload_is_fatal() {
        assert_eq!(
            TelemetryMessage::parse_text(r#"{"error":"Task not found"}"#),
            TelemetryMessage::Fatal("Task not found".to_string())
        );
    }

    #[test]
    fn test_malformed_counts_dropped_frame_kept() {
        let msg = TelemetryMessage::parse_text(
            r#"{"type":"frame","frame":"/9j/AA==","counts":{"door":"three"}}"#,
        );
        assert!(matches!(msg, TelemetryMessage::Frame(_)));

        let msg = TelemetryMessage::parse_text(r#"{"counts":{"a":1,"b":-2}}"#);
        assert_eq!(msg, TelemetryMessage::Empty);
    }

    #[test]
    fn test_bad_base64_keeps_counts() {
        let msg = TelemetryMessage::parse_text(r#"{"type":"frame","frame":"%%%","counts":{"a":1}}"#);
        let expected: ZoneCounts = [("a".to_string(), 1)].into_iter().collect();
        assert_eq!(msg, TelemetryMessage::Counts(expected));
    }

    #[test]
    fn test_non_json_ignored() {
        assert_eq!(TelemetryMessage::parse_text("ping"), TelemetryMessage::Empty);
        assert_eq!(TelemetryMessage::parse_text("[1,2]"), TelemetryMessage::Empty);
    }

    #[test]
    fn test_binary_frame() {
        assert_eq!(
            TelemetryMessage::from(ChannelFrame::Binary(vec![1, 2, 3])),
            TelemetryMessage::Frame(vec![1, 2, 3])
        );
        assert_eq!(
            TelemetryMessage::from(ChannelFrame::Binary(Vec::new())),
            TelemetryMessage::Empty
        );
    }
}
