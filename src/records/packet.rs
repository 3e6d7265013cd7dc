use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{null_as_default, FieldValue, Record, RecordId};
use crate::severity::{classify, Classification};

/// One captured packet, as returned by `/packets` and pushed as `new_packet`.
///
/// The backend encodes SQL NULLs as zero values (`""`, `0`), and some
/// producers send explicit `null`s; both decode to the field's default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketRecord {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub device_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub src_mac: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dst_mac: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub src_ip: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dst_ip: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub protocol: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub src_port: u16,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dst_port: u16,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ip_version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ttl: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tcp_flags: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payload_size: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_malicious: bool,
    #[serde(default)]
    pub threat_type: Option<String>,
}

impl PacketRecord {
    /// Threat type, with the backend's empty string treated as absent.
    pub fn threat_type(&self) -> Option<&str> {
        self.threat_type.as_deref().filter(|t| !t.is_empty())
    }

    pub fn classification(&self) -> Classification {
        classify(self.is_malicious, self.threat_type())
    }
}

impl Record for PacketRecord {
    const SEARCH_FIELDS: &'static [&'static str] = &[
        "src_ip",
        "dst_ip",
        "src_port",
        "dst_port",
        "protocol",
        "device_name",
        "threat_type",
    ];

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::from(&self.id),
            "timestamp" => FieldValue::Time(self.timestamp),
            "device_name" => FieldValue::text(&self.device_name),
            "src_mac" => FieldValue::text(&self.src_mac),
            "dst_mac" => FieldValue::text(&self.dst_mac),
            "src_ip" => FieldValue::text(&self.src_ip),
            "dst_ip" => FieldValue::text(&self.dst_ip),
            "protocol" => FieldValue::text(&self.protocol),
            "src_port" => FieldValue::Integer(i64::from(self.src_port)),
            "dst_port" => FieldValue::Integer(i64::from(self.dst_port)),
            "ip_version" => FieldValue::text(&self.ip_version),
            "ttl" => FieldValue::Integer(i64::from(self.ttl)),
            "tcp_flags" => FieldValue::text(&self.tcp_flags),
            "payload_size" | "bytes" => FieldValue::Integer(saturating_i64(self.payload_size)),
            "is_malicious" => FieldValue::Bool(self.is_malicious),
            "threat_type" => FieldValue::optional_text(self.threat_type()),
            _ => FieldValue::Missing,
        }
    }
}

/// An alert is a flagged packet; severity and title are derived on read and
/// exposed as the `severity` and `title` fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertRecord(pub PacketRecord);

impl AlertRecord {
    pub fn packet(&self) -> &PacketRecord {
        &self.0
    }

    pub fn classification(&self) -> Classification {
        self.0.classification()
    }
}

impl From<PacketRecord> for AlertRecord {
    fn from(packet: PacketRecord) -> Self {
        AlertRecord(packet)
    }
}

impl Record for AlertRecord {
    const SEARCH_FIELDS: &'static [&'static str] = PacketRecord::SEARCH_FIELDS;

    fn id(&self) -> &RecordId {
        self.0.id()
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.0.timestamp
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "severity" => FieldValue::text(self.classification().severity.as_str()),
            "title" => FieldValue::Text(self.classification().title),
            _ => self.0.field(name),
        }
    }
}

pub(crate) fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
