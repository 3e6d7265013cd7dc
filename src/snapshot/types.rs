use futures_util::future::BoxFuture;
use serde::Deserialize;

use crate::error_handling::types::FetchError;
use crate::query::types::{total_pages, FilterSpec, PageSpec};
use crate::records::{AlertRecord, NetworkStats, PacketRecord, Record};

/// Record kinds served by the snapshot query interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Packets,
    Alerts,
}

impl RecordKind {
    pub fn path(&self) -> &'static str {
        match self {
            RecordKind::Packets => "packets",
            RecordKind::Alerts => "alerts",
        }
    }

    /// Equality filters forwarded as query parameters.
    pub fn filter_params(&self) -> &'static [&'static str] {
        match self {
            RecordKind::Packets => &["src_ip", "dst_ip", "protocol"],
            RecordKind::Alerts => &["severity"],
        }
    }

    /// Whether the backend accepts a free-text `search` parameter.
    pub fn accepts_search(&self) -> bool {
        matches!(self, RecordKind::Alerts)
    }
}

/// Enumerations for populating filter controls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownValues {
    pub protocols: Vec<String>,
}

/// One authoritative page of records.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<R> {
    pub records: Vec<R>,
    pub total_count: u64,
    pub known_values: KnownValues,
}

impl<R: Record> Snapshot<R> {
    pub fn total_pages(&self, page_size: usize) -> usize {
        total_pages(usize::try_from(self.total_count).unwrap_or(usize::MAX), page_size)
    }
}

/// Wire shape of a snapshot response. The record array is keyed by kind
/// (`packets`, `alerts`); `total_count` is mandatory.
#[derive(Debug, Deserialize)]
pub(crate) struct SnapshotBody<R> {
    #[serde(alias = "packets", alias = "alerts", alias = "connections")]
    pub records: Option<Vec<R>>,
    pub total_count: u64,
    #[serde(default)]
    pub protocols: Option<Vec<String>>,
}

impl<R: Record> SnapshotBody<R> {
    /// Normalises the body. Without an explicit protocol list, the distinct
    /// non-empty protocols of the returned records are used, in first-seen
    /// order.
    pub fn into_snapshot(self) -> Snapshot<R> {
        let records = self.records.unwrap_or_default();
        let protocols = match self.protocols {
            Some(protocols) => protocols,
            None => {
                let mut seen: Vec<String> = Vec::new();
                for record in &records {
                    if let Some(protocol) = record.field("protocol").as_text() {
                        if !protocol.is_empty() && !seen.contains(&protocol) {
                            seen.push(protocol);
                        }
                    }
                }
                seen
            }
        };
        Snapshot {
            records,
            total_count: self.total_count,
            known_values: KnownValues { protocols },
        }
    }
}

/// Source of snapshots. [`SnapshotFetcher`](super::SnapshotFetcher) talks
/// HTTP; tests substitute an in-memory source.
///
/// No retry happens behind this seam: every call yields either a complete
/// snapshot or one typed error.
pub trait SnapshotSource: Send + Sync {
    fn fetch_packets<'a>(
        &'a self,
        filter: &'a FilterSpec,
        page: PageSpec,
    ) -> BoxFuture<'a, Result<Snapshot<PacketRecord>, FetchError>>;

    fn fetch_alerts<'a>(
        &'a self,
        filter: &'a FilterSpec,
        page: PageSpec,
    ) -> BoxFuture<'a, Result<Snapshot<AlertRecord>, FetchError>>;

    fn fetch_stats(&self) -> BoxFuture<'_, Result<NetworkStats, FetchError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocols_fall_back_to_record_values() {
        let body: SnapshotBody<PacketRecord> = serde_json::from_str(
            r#"{"packets":[{"id":1,"protocol":"TCP"},{"id":2,"protocol":""},
                {"id":3,"protocol":"UDP"},{"id":4,"protocol":"TCP"}],"total_count":4}"#,
        )
        .unwrap();

        let snapshot = body.into_snapshot();
        assert_eq!(snapshot.known_values.protocols, vec!["TCP", "UDP"]);
        assert_eq!(snapshot.records.len(), 4);
    }

    #[test]
    fn explicit_protocols_win_and_null_records_mean_empty() {
        let body: SnapshotBody<AlertRecord> = serde_json::from_str(
            r#"{"alerts":null,"total_count":0,"protocols":["ICMP"]}"#,
        )
        .unwrap();

        let snapshot = body.into_snapshot();
        assert!(snapshot.records.is_empty());
        assert_eq!(snapshot.known_values.protocols, vec!["ICMP"]);
        assert_eq!(snapshot.total_pages(20), 1);
    }

    #[test]
    fn missing_record_array_means_empty() {
        let body: SnapshotBody<AlertRecord> =
            serde_json::from_str(r#"{"total_count":7}"#).unwrap();

        let snapshot = body.into_snapshot();
        assert!(snapshot.records.is_empty());
        assert_eq!(snapshot.total_count, 7);
        assert!(snapshot.known_values.protocols.is_empty());
    }

    #[test]
    fn alerts_forward_only_severity_filter() {
        assert_eq!(RecordKind::Alerts.filter_params(), &["severity"]);
        assert!(RecordKind::Alerts.accepts_search());
        assert!(!RecordKind::Packets.accepts_search());
    }

    #[test]
    fn total_count_is_required() {
        assert!(serde_json::from_str::<SnapshotBody<PacketRecord>>(r#"{"packets":[]}"#).is_err());
    }

    #[test]
    fn total_pages_uses_total_count() {
        let snapshot: Snapshot<PacketRecord> = Snapshot {
            records: Vec::new(),
            total_count: 41,
            known_values: KnownValues::default(),
        };
        assert_eq!(snapshot.total_pages(20), 3);
    }
}
