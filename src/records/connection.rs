use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::packet::saturating_i64;
use super::types::{null_as_default, FieldValue, Record, RecordId};

/// A tracked flow between two endpoints, as carried in the `connections`
/// array of a stats payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source_ip: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source_port: u16,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dest_ip: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dest_port: u16,
    #[serde(default, deserialize_with = "null_as_default")]
    pub protocol: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bytes: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub packets: u64,
    #[serde(default = "Utc::now")]
    pub start_time: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub application: Option<String>,
}

impl Record for ConnectionRecord {
    const SEARCH_FIELDS: &'static [&'static str] = &[
        "source_ip",
        "dest_ip",
        "source_port",
        "dest_port",
        "protocol",
        "application",
        "country",
    ];

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.start_time
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::from(&self.id),
            "source_ip" => FieldValue::text(&self.source_ip),
            "source_port" => FieldValue::Integer(i64::from(self.source_port)),
            "dest_ip" => FieldValue::text(&self.dest_ip),
            "dest_port" => FieldValue::Integer(i64::from(self.dest_port)),
            "protocol" => FieldValue::text(&self.protocol),
            "bytes" => FieldValue::Integer(saturating_i64(self.bytes)),
            "packets" => FieldValue::Integer(saturating_i64(self.packets)),
            "start_time" | "timestamp" => FieldValue::Time(self.start_time),
            "status" => FieldValue::text(&self.status),
            "country" => FieldValue::optional_text(self.country.as_deref()),
            "application" => FieldValue::optional_text(self.application.as_deref()),
            _ => FieldValue::Missing,
        }
    }
}
