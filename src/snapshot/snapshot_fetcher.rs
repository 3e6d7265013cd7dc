use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use log::{debug, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::types::{RecordKind, Snapshot, SnapshotBody, SnapshotSource};
use crate::configuration::config::Config;
use crate::error_handling::types::FetchError;
use crate::query::types::{FilterSpec, PageSpec};
use crate::records::{AlertRecord, NetworkStats, PacketRecord, ProtocolStats, Record};

/// HTTP client for the snapshot query interface.
///
/// # Fields Overview
///
/// - `client`: pooled reqwest client carrying the request timeout
/// - `base_url`: API root without a trailing slash, e.g. `http://host:8080/api`
#[derive(Debug, Clone)]
pub struct SnapshotFetcher {
    client: Client,
    base_url: String,
}

impl SnapshotFetcher {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Requests one page of `kind`.
    pub async fn fetch<R>(
        &self,
        kind: RecordKind,
        filter: &FilterSpec,
        page: PageSpec,
    ) -> Result<Snapshot<R>, FetchError>
    where
        R: Record + DeserializeOwned,
    {
        let params = query_params(kind, filter, page);
        let body: SnapshotBody<R> = self.get_json(kind.path(), &params).await?;
        let snapshot = body.into_snapshot();
        debug!(
            "Fetched {} {} of {} (page {})",
            snapshot.records.len(),
            kind.path(),
            snapshot.total_count,
            page.page()
        );
        Ok(snapshot)
    }

    /// Requests `/stats`, completing the protocol breakdown from
    /// `/protocols` when the stats lack one. A failing `/protocols` request
    /// only costs the breakdown.
    pub async fn stats(&self) -> Result<NetworkStats, FetchError> {
        let mut stats: NetworkStats = self.get_json("stats", &[]).await?;
        if stats.protocols.is_none() {
            match self.get_json::<Option<Vec<ProtocolStats>>>("protocols", &[]).await {
                Ok(protocols) => stats.protocols = protocols,
                Err(e) => warn!("Protocol breakdown unavailable: {}", e),
            }
        }
        Ok(stats)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                warn!("GET {} failed: {}", url, e);
                FetchError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("GET {} returned {}", url, status);
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| {
            warn!("GET {} returned an unreadable body: {}", url, e);
            FetchError::Parse(e.to_string())
        })
    }
}

/// `page` is 1-based; `offset` carries the same position for backends that
/// page by offset.
fn query_params(kind: RecordKind, filter: &FilterSpec, page: PageSpec) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("page", page.page().to_string()),
        ("limit", page.size().to_string()),
        ("offset", page.offset().to_string()),
    ];
    for field in kind.filter_params() {
        if let Some(value) = filter.equals_value(field) {
            params.push((*field, value.to_string()));
        }
    }
    if kind.accepts_search() {
        if let Some(term) = filter.search_term() {
            params.push(("search", term.to_string()));
        }
    }
    params
}

impl SnapshotSource for SnapshotFetcher {
    fn fetch_packets<'a>(
        &'a self,
        filter: &'a FilterSpec,
        page: PageSpec,
    ) -> BoxFuture<'a, Result<Snapshot<PacketRecord>, FetchError>> {
        self.fetch(RecordKind::Packets, filter, page).boxed()
    }

    fn fetch_alerts<'a>(
        &'a self,
        filter: &'a FilterSpec,
        page: PageSpec,
    ) -> BoxFuture<'a, Result<Snapshot<AlertRecord>, FetchError>> {
        self.fetch(RecordKind::Alerts, filter, page).boxed()
    }

    fn fetch_stats(&self) -> BoxFuture<'_, Result<NetworkStats, FetchError>> {
        self.stats().boxed()
    }
}
