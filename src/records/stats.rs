use serde::{Deserialize, Serialize};

use super::connection::ConnectionRecord;
use super::types::null_as_default;

/// Aggregate counters pushed as `network_stats` and served by `/stats`.
///
/// The four counters are required; a payload missing any of them is not a
/// stats payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    #[serde(deserialize_with = "null_as_default")]
    pub packet_count: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub unique_src_ips: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub unique_dst_ips: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_bytes: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub malicious_packets: u64,
    #[serde(default)]
    pub protocols: Option<Vec<ProtocolStats>>,
    #[serde(default)]
    pub top_sources: Option<Vec<SourceStats>>,
    #[serde(default)]
    pub top_destinations: Option<Vec<DestinationStats>>,
    #[serde(default)]
    pub connections: Option<Vec<ConnectionRecord>>,
    #[serde(default)]
    pub anomalies: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub protocol: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub packet_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceStats {
    pub src_ip: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub packet_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationStats {
    pub dst_ip: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub packet_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_bytes: u64,
}
