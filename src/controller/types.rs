use std::time::Duration;

use crate::configuration::config::Config;
use crate::connection::ConnectionStatus;
use crate::error_handling::types::FetchError;
use crate::live_buffer::{LiveEntry, LiveTableBuffer};
use crate::query::types::{total_pages, FilterSpec, PageSpec};
use crate::records::{AlertRecord, ConnectionRecord, NetworkStats, PacketRecord, Record};
use crate::severity::SeverityCounts;

/// Query state of one snapshot-backed view.
///
/// `generation` numbers snapshot requests; only the response to the latest
/// request may be installed.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub filter: FilterSpec,
    pub page: PageSpec,
    pub total_count: u64,
    pub known_protocols: Vec<String>,
    pub error: Option<FetchError>,
    pub(crate) generation: u64,
}

impl ViewState {
    pub fn new(page_size: usize) -> Self {
        Self {
            filter: FilterSpec::default(),
            page: PageSpec::new(1, page_size),
            total_count: 0,
            known_protocols: Vec::new(),
            error: None,
            generation: 0,
        }
    }

    pub fn total_pages(&self) -> usize {
        total_pages(
            usize::try_from(self.total_count).unwrap_or(usize::MAX),
            self.page.size(),
        )
    }
}

/// Everything the stream and the snapshots write to, behind one lock.
#[derive(Debug)]
pub struct LiveState {
    pub packets: LiveTableBuffer<PacketRecord>,
    pub alerts: LiveTableBuffer<AlertRecord>,
    pub connections: LiveTableBuffer<ConnectionRecord>,
    pub stats: Option<NetworkStats>,
    pub stats_error: Option<FetchError>,
    pub packet_view: ViewState,
    pub alert_view: ViewState,
}

impl LiveState {
    pub fn new(config: &Config) -> Self {
        let ttl: Duration = config.highlight_ttl();
        Self {
            packets: LiveTableBuffer::new(config.buffer_capacity, ttl),
            alerts: LiveTableBuffer::new(config.buffer_capacity, ttl),
            connections: LiveTableBuffer::new(config.buffer_capacity, ttl),
            stats: None,
            stats_error: None,
            packet_view: ViewState::new(config.page_size),
            alert_view: ViewState::new(config.page_size),
        }
    }

    /// Installs pushed or fetched stats. A payload without a protocol
    /// breakdown keeps the previous one; one with connections replaces the
    /// connection table.
    pub fn apply_stats(&mut self, stats: &NetworkStats) {
        let mut stats = stats.clone();
        if stats.protocols.is_none() {
            stats.protocols = self.stats.as_ref().and_then(|s| s.protocols.clone());
        }
        if let Some(connections) = &stats.connections {
            self.connections.replace(connections.iter().cloned());
        }
        self.stats = Some(stats);
        self.stats_error = None;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow<R> {
    pub record: R,
    /// Arrived live within the highlight TTL.
    pub recent: bool,
}

impl<R: Record> TableRow<R> {
    pub(crate) fn from_entry(entry: &LiveEntry<R>) -> Self {
        Self {
            record: entry.record().clone(),
            recent: entry.is_recent(),
        }
    }
}

/// A rendered page of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView<R> {
    pub rows: Vec<TableRow<R>>,
    pub page: usize,
    pub total_pages: usize,
    pub total_count: u64,
    pub known_protocols: Vec<String>,
    /// Why the view is empty, when its snapshot failed.
    pub error: Option<FetchError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertFeed {
    pub table: TableView<AlertRecord>,
    pub counts: SeverityCounts,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub stats: Option<NetworkStats>,
    pub stats_error: Option<FetchError>,
    pub active_connections: usize,
    pub anomalies: usize,
    pub alerts: SeverityCounts,
    pub status: ConnectionStatus,
}
