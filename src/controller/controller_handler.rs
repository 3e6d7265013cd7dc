use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;

use super::types::{AlertFeed, DashboardSummary, LiveState, TableRow, TableView, ViewState};
use crate::charts::{
    protocol_distribution, ChartSeries, ChartSeriesBuilder, DistributionSlice, TimeRange,
};
use crate::configuration::config::Config;
use crate::connection::transport::{connector_for, Connector};
use crate::connection::{
    ConnectionEvent, ConnectionManager, ConnectionState, ConnectionStatus, Phase, RetryPolicy,
    Subscription,
};
use crate::dispatch::StreamDispatcher;
use crate::error_handling::types::{ControllerError, FetchError};
use crate::live_buffer::LiveTableBuffer;
use crate::query::{self, FilterSpec, PageSpec, SortSpec};
use crate::records::{ConnectionRecord, PacketRecord, Record};
use crate::severity::SeverityCounts;
use crate::snapshot::{Snapshot, SnapshotFetcher, SnapshotSource};

#[derive(Clone, Copy)]
enum View {
    Packets,
    Alerts,
}

/// Owns one instance of each component and keeps the live view consistent.
///
/// Stream messages flow `ConnectionManager -> StreamDispatcher -> LiveState`
/// through [`next_event`](Self::next_event); snapshots replace a view's
/// buffer through the `refresh_*` methods. Every mutation of [`LiveState`]
/// happens under its lock in one synchronous step, so readers never see a
/// half-applied update.
///
/// # Fields Overview
///
/// - `config`: the effective configuration
/// - `source`: snapshot query interface
/// - `connection`: streaming connection and its retry policy
/// - `events`: this controller's subscription to connection events
/// - `dispatcher`: routes decoded messages into `live`
/// - `live`: buffers, stats and per-view query state
pub struct Controller {
    pub config: Config,
    source: Arc<dyn SnapshotSource>,
    connection: ConnectionManager,
    events: Option<Subscription>,
    dispatcher: StreamDispatcher,
    live: Arc<Mutex<LiveState>>,
}

impl Controller {
    pub fn new(config: Config) -> Result<Self, ControllerError> {
        info!("Creating controller for {}", config.api_base_url);
        config.validate()?;

        let source = SnapshotFetcher::from_config(&config).map_err(|e| {
            error!("Unable to build the snapshot client: {}", e);
            ControllerError::InitializationFailed(e.to_string())
        })?;
        let connector = connector_for(&config.stream_endpoint()?);

        Ok(Self::with_parts(config, Arc::new(source), connector))
    }

    /// Builds a controller around explicit collaborators.
    pub fn with_parts(
        config: Config,
        source: Arc<dyn SnapshotSource>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let policy = RetryPolicy {
            max_retries: config.max_retries,
            delay: config.reconnect_delay(),
        };
        let connection = ConnectionManager::new(connector, policy);
        let live = Arc::new(Mutex::new(LiveState::new(&config)));

        let mut dispatcher = StreamDispatcher::new();
        let target = Arc::clone(&live);
        dispatcher.on_stats(move |stats| target.lock().apply_stats(stats));
        let target = Arc::clone(&live);
        dispatcher.on_packet(move |packet| target.lock().packets.insert_live(packet.clone()));
        let target = Arc::clone(&live);
        dispatcher.on_alert(move |alert| target.lock().alerts.insert_live(alert.clone()));

        Self {
            config,
            source,
            connection,
            events: None,
            dispatcher,
            live,
        }
    }

    /// Starts the stream and loads the initial snapshots. A failed initial
    /// load leaves its view empty with the error recorded.
    pub async fn start(&mut self) {
        info!("[{}] Starting controller", self.connection.id());
        if self.events.is_none() {
            self.events = Some(self.connection.subscribe());
        }
        self.connection.start();

        let (stats, packets, alerts) = tokio::join!(
            self.refresh_stats(),
            self.refresh_packets(),
            self.refresh_alerts()
        );
        for (what, result) in [("stats", stats), ("packets", packets), ("alerts", alerts)] {
            if let Err(e) = result {
                warn!("Initial {} load failed: {}", what, e);
            }
        }
    }

    /// Waits for the next connection event and applies it. Returns `false`
    /// once no more events can arrive.
    pub async fn next_event(&mut self) -> bool {
        let event = match self.events.as_mut() {
            Some(events) => events.recv().await,
            None => return false,
        };
        match event {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    pub fn handle_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::StatusChanged(state) => log_status(&state),
            ConnectionEvent::Message(value) => {
                // Dispatch errors are already logged by the dispatcher.
                let _ = self.dispatcher.dispatch(value);
            }
            ConnectionEvent::Error(e) => warn!("Stream message skipped: {}", e),
        }
    }

    /// Stops the stream. Safe to call more than once.
    pub async fn shutdown(&mut self) {
        info!("[{}] Shutting down controller", self.connection.id());
        self.connection.stop().await;
        self.events = None;
    }

    /// Restarts the stream after it gave up.
    pub fn reconnect(&mut self) {
        self.connection.start();
    }

    pub async fn refresh_stats(&self) -> Result<(), FetchError> {
        let result = self.source.fetch_stats().await;
        let mut live = self.live.lock();
        match result {
            Ok(stats) => {
                live.apply_stats(&stats);
                Ok(())
            }
            Err(e) => {
                live.stats_error = Some(e.clone());
                Err(e)
            }
        }
    }

    pub async fn refresh_packets(&self) -> Result<(), FetchError> {
        let (generation, filter, page) = self.begin_fetch(View::Packets);
        let result = self.source.fetch_packets(&filter, page).await;
        let mut guard = self.live.lock();
        let live = &mut *guard;
        install(&mut live.packets, &mut live.packet_view, generation, result, "packet")
    }

    pub async fn refresh_alerts(&self) -> Result<(), FetchError> {
        let (generation, filter, page) = self.begin_fetch(View::Alerts);
        let result = self.source.fetch_alerts(&filter, page).await;
        let mut guard = self.live.lock();
        let live = &mut *guard;
        install(&mut live.alerts, &mut live.alert_view, generation, result, "alert")
    }

    fn begin_fetch(&self, view: View) -> (u64, FilterSpec, PageSpec) {
        let mut live = self.live.lock();
        let state = match view {
            View::Packets => &mut live.packet_view,
            View::Alerts => &mut live.alert_view,
        };
        state.generation += 1;
        (state.generation, state.filter.clone(), state.page)
    }

    fn update_view<F>(&self, view: View, change: F)
    where
        F: FnOnce(&mut ViewState),
    {
        let mut live = self.live.lock();
        match view {
            View::Packets => change(&mut live.packet_view),
            View::Alerts => change(&mut live.alert_view),
        }
    }

    /// Applies a new packet filter and reloads from page 1.
    pub async fn set_packet_filter(&self, filter: FilterSpec) -> Result<(), FetchError> {
        self.update_view(View::Packets, |view| {
            view.filter = filter;
            view.page = view.page.with_page(1);
        });
        self.refresh_packets().await
    }

    /// Applies a new alert filter and reloads from page 1.
    pub async fn set_alert_filter(&self, filter: FilterSpec) -> Result<(), FetchError> {
        self.update_view(View::Alerts, |view| {
            view.filter = filter;
            view.page = view.page.with_page(1);
        });
        self.refresh_alerts().await
    }

    /// Moves to the next packet page; a no-op on the last page.
    pub async fn next_packet_page(&self) -> Result<(), FetchError> {
        let (current, last) = self.packet_page_bounds();
        if current >= last {
            return Ok(());
        }
        self.goto_packet_page(current + 1).await
    }

    /// Moves to the previous packet page; a no-op on page 1.
    pub async fn prev_packet_page(&self) -> Result<(), FetchError> {
        let (current, _) = self.packet_page_bounds();
        if current <= 1 {
            return Ok(());
        }
        self.goto_packet_page(current - 1).await
    }

    /// Jumps to `page`, clamped to the known page range.
    pub async fn goto_packet_page(&self, page: usize) -> Result<(), FetchError> {
        let (_, last) = self.packet_page_bounds();
        let page = page.clamp(1, last);
        self.update_view(View::Packets, |view| view.page = view.page.with_page(page));
        self.refresh_packets().await
    }

    fn packet_page_bounds(&self) -> (usize, usize) {
        let live = self.live.lock();
        (live.packet_view.page.page(), live.packet_view.total_pages())
    }

    /// Visible packet rows: the buffered page, narrowed by the current filter
    /// so live inserts that do not match it stay hidden.
    pub fn packet_table(&self, sort: Option<&SortSpec>) -> TableView<PacketRecord> {
        let live = self.live.lock();
        snapshot_table(&live.packets, &live.packet_view, sort)
    }

    pub fn alert_feed(&self, sort: Option<&SortSpec>) -> AlertFeed {
        let live = self.live.lock();
        AlertFeed {
            table: snapshot_table(&live.alerts, &live.alert_view, sort),
            counts: SeverityCounts::tally(live.alerts.records()),
        }
    }

    /// Connections are paged locally; the stream delivers them all at once.
    pub fn connection_table(
        &self,
        filter: &FilterSpec,
        sort: Option<&SortSpec>,
        page: PageSpec,
    ) -> TableView<ConnectionRecord> {
        let live = self.live.lock();
        let result = query::apply(live.connections.iter(), filter, sort, page);
        TableView {
            rows: result.rows.iter().map(|entry| TableRow::from_entry(entry)).collect(),
            page: result.page,
            total_pages: result.total_pages,
            total_count: result.total_matches as u64,
            known_protocols: Vec::new(),
            error: None,
        }
    }

    pub fn dashboard(&self) -> DashboardSummary {
        let live = self.live.lock();
        DashboardSummary {
            stats: live.stats.clone(),
            stats_error: live.stats_error.clone(),
            active_connections: live
                .stats
                .as_ref()
                .and_then(|s| s.connections.as_ref())
                .map_or(0, Vec::len),
            anomalies: live
                .stats
                .as_ref()
                .and_then(|s| s.anomalies.as_ref())
                .map_or(0, Vec::len),
            alerts: SeverityCounts::tally(live.alerts.records()),
            status: self.connection.status(),
        }
    }

    pub fn traffic_chart(&self, range: TimeRange, now: DateTime<Utc>) -> ChartSeries {
        let live = self.live.lock();
        ChartSeriesBuilder::build(range, live.packets.records(), now)
    }

    pub fn protocol_chart(&self) -> Vec<DistributionSlice> {
        let live = self.live.lock();
        live.stats
            .as_ref()
            .map(protocol_distribution)
            .unwrap_or_default()
    }

    /// Clears expired "recently arrived" markers in every table.
    pub fn sweep_highlights(&self) -> usize {
        let mut live = self.live.lock();
        live.packets.clear_expired_highlights()
            + live.alerts.clear_expired_highlights()
            + live.connections.clear_expired_highlights()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn packet_view(&self) -> ViewState {
        self.live.lock().packet_view.clone()
    }

    pub fn alert_view(&self) -> ViewState {
        self.live.lock().alert_view.clone()
    }
}

/// Installs a snapshot response unless a newer request superseded it. A
/// failed request empties the view and records the cause.
fn install<R: Record>(
    buffer: &mut LiveTableBuffer<R>,
    view: &mut ViewState,
    generation: u64,
    result: Result<Snapshot<R>, FetchError>,
    what: &str,
) -> Result<(), FetchError> {
    if view.generation != generation {
        debug!(
            "Discarding stale {} snapshot (generation {} < {})",
            what, generation, view.generation
        );
        return Ok(());
    }
    match result {
        Ok(snapshot) => {
            view.total_count = snapshot.total_count;
            view.known_protocols = snapshot.known_values.protocols;
            view.error = None;
            buffer.replace(snapshot.records);
            info!(
                "Installed {} snapshot: {} of {} record(s), page {}",
                what,
                buffer.len(),
                view.total_count,
                view.page.page()
            );
            Ok(())
        }
        Err(e) => {
            warn!("{} snapshot failed: {}", what, e);
            buffer.clear();
            view.total_count = 0;
            view.error = Some(e.clone());
            Err(e)
        }
    }
}

fn snapshot_table<R: Record>(
    buffer: &LiveTableBuffer<R>,
    view: &ViewState,
    sort: Option<&SortSpec>,
) -> TableView<R> {
    let result = query::apply(buffer.iter(), &view.filter, sort, PageSpec::all(buffer.len()));
    TableView {
        rows: result
            .rows
            .iter()
            .map(|entry| TableRow::from_entry(entry))
            .collect(),
        page: view.page.page(),
        total_pages: view.total_pages(),
        total_count: view.total_count,
        known_protocols: view.known_protocols.clone(),
        error: view.error.clone(),
    }
}

fn log_status(state: &ConnectionState) {
    match state.phase {
        Phase::Connected => info!("Stream connected"),
        Phase::Reconnecting => warn!(
            "Stream lost ({}), retry {}",
            state.last_error.as_deref().unwrap_or("unknown cause"),
            state.retries
        ),
        Phase::Failed => {
            if let Some(reason) = state.status().reason {
                error!("Stream disconnected: {}", reason);
            }
        }
        Phase::Connecting | Phase::Disconnected => debug!("Stream {:?}", state.phase),
    }
}
