use serde::Deserialize;
use serde_json::Value;

use crate::error_handling::types::ParseError;
use crate::records::{AlertRecord, NetworkStats, PacketRecord};

pub const STATS_TYPE: &str = "network_stats";
pub const PACKET_TYPE: &str = "new_packet";
pub const ALERT_TYPE: &str = "new_alert";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Stats,
    Packet,
    Alert,
    Unknown,
}

/// A decoded stream message. Unrecognised `type` tags land in `Unknown` with
/// the tag kept for logging.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    Stats(NetworkStats),
    Packet(PacketRecord),
    Alert(AlertRecord),
    Unknown(String),
}

impl StreamMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            StreamMessage::Stats(_) => MessageKind::Stats,
            StreamMessage::Packet(_) => MessageKind::Packet,
            StreamMessage::Alert(_) => MessageKind::Alert,
            StreamMessage::Unknown(_) => MessageKind::Unknown,
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

/// Decodes one `{type, data}` envelope.
///
/// A value that is not an envelope is [`ParseError::Malformed`]; a known tag
/// whose `data` does not fit is [`ParseError::InvalidPayload`]. Unknown tags
/// are not errors.
pub fn decode(value: Value) -> Result<StreamMessage, ParseError> {
    let envelope: Envelope =
        serde_json::from_value(value).map_err(|e| ParseError::Malformed(e.to_string()))?;

    let invalid = |e: serde_json::Error| ParseError::InvalidPayload {
        kind: envelope.kind.clone(),
        reason: e.to_string(),
    };

    match envelope.kind.as_str() {
        STATS_TYPE => serde_json::from_value(envelope.data.clone())
            .map(StreamMessage::Stats)
            .map_err(invalid),
        PACKET_TYPE => serde_json::from_value(envelope.data.clone())
            .map(StreamMessage::Packet)
            .map_err(invalid),
        ALERT_TYPE => serde_json::from_value(envelope.data.clone())
            .map(StreamMessage::Alert)
            .map_err(invalid),
        _ => Ok(StreamMessage::Unknown(envelope.kind.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_each_known_kind() {
        let stats = decode(json!({
            "type": "network_stats",
            "data": {"packet_count": 5, "unique_src_ips": 1, "unique_dst_ips": 2, "total_bytes": 300}
        }))
        .unwrap();
        assert_eq!(stats.kind(), MessageKind::Stats);

        let packet = decode(json!({"type": "new_packet", "data": {"src_ip": "10.0.0.1", "protocol": "UDP"}})).unwrap();
        match packet {
            StreamMessage::Packet(p) => assert_eq!(p.protocol, "UDP"),
            other => panic!("unexpected {:?}", other),
        }

        let alert = decode(json!({"type": "new_alert", "data": {"is_malicious": true}})).unwrap();
        assert_eq!(alert.kind(), MessageKind::Alert);
    }

    #[test]
    fn unknown_tag_is_not_an_error() {
        assert_eq!(
            decode(json!({"type": "heartbeat", "data": 1})).unwrap(),
            StreamMessage::Unknown(String::from("heartbeat"))
        );
    }

    #[test]
    fn non_envelopes_are_malformed() {
        assert!(matches!(decode(json!([1, 2])), Err(ParseError::Malformed(_))));
        assert!(matches!(decode(json!({"data": {}})), Err(ParseError::Malformed(_))));
    }

    #[test]
    fn bad_payload_names_the_kind() {
        match decode(json!({"type": "network_stats", "data": {"packet_count": 1}})) {
            Err(ParseError::InvalidPayload { kind, .. }) => assert_eq!(kind, "network_stats"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            decode(json!({"type": "new_packet"})),
            Err(ParseError::InvalidPayload { .. })
        ));
    }
}
