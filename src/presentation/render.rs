//! Plain-text panels. Each panel is a `Display` wrapper over a controller
//! view, so the binary can print it directly.

use chrono::{DateTime, Utc};
use std::fmt;

use super::format::{format_bytes, format_number, time_ago, title_case};
use crate::charts::{ChartSeries, DistributionSlice};
use crate::controller::{AlertFeed, DashboardSummary, TableView};
use crate::records::PacketRecord;

const SPARK: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub struct DashboardPanel<'a>(pub &'a DashboardSummary);

impl fmt::Display for DashboardPanel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.0;
        match (&summary.status.reason, summary.status.connected) {
            (_, true) => writeln!(f, "Stream: connected")?,
            (Some(reason), false) => writeln!(f, "Stream: disconnected ({})", reason)?,
            (None, false) => writeln!(f, "Stream: connecting...")?,
        }

        match (&summary.stats, &summary.stats_error) {
            (Some(stats), _) => {
                writeln!(
                    f,
                    "Packets: {}   Traffic: {}   Sources: {}   Destinations: {}",
                    format_number(stats.packet_count),
                    format_bytes(stats.total_bytes),
                    format_number(stats.unique_src_ips),
                    format_number(stats.unique_dst_ips),
                )?;
                writeln!(
                    f,
                    "Malicious: {}   Active connections: {}   Anomalies: {}",
                    format_number(stats.malicious_packets),
                    summary.active_connections,
                    summary.anomalies,
                )?;
            }
            (None, Some(e)) => writeln!(f, "Stats unavailable: {}", e)?,
            (None, None) => writeln!(f, "Stats: waiting for data")?,
        }

        writeln!(
            f,
            "Alerts: {} (high {}, medium {}, low {})",
            summary.alerts.total, summary.alerts.high, summary.alerts.medium, summary.alerts.low
        )
    }
}

pub struct PacketTable<'a> {
    pub view: &'a TableView<PacketRecord>,
    pub now: DateTime<Utc>,
}

impl fmt::Display for PacketTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.view;
        writeln!(
            f,
            "  {:<16} {:<39} {:<39} {:<8} {:>6} {:>6} {:>10}",
            "Time", "Source", "Destination", "Proto", "SPort", "DPort", "Size"
        )?;
        if view.rows.is_empty() {
            match &view.error {
                Some(e) => writeln!(f, "  {}", e)?,
                None => writeln!(f, "  No packets found")?,
            }
        }
        for row in &view.rows {
            let p = &row.record;
            writeln!(
                f,
                "{} {:<16} {:<39} {:<39} {:<8} {:>6} {:>6} {:>10}",
                if row.recent { '*' } else { ' ' },
                time_ago(p.timestamp, self.now),
                p.src_ip,
                p.dst_ip,
                if p.protocol.is_empty() { "Unknown" } else { p.protocol.as_str() },
                port(p.src_port),
                port(p.dst_port),
                format_bytes(p.payload_size),
            )?;
        }
        writeln!(f, "Page {} of {}", view.page, view.total_pages)
    }
}

fn port(port: u16) -> String {
    if port == 0 {
        String::from("-")
    } else {
        port.to_string()
    }
}

pub struct AlertList<'a> {
    pub feed: &'a AlertFeed,
    pub now: DateTime<Utc>,
}

impl fmt::Display for AlertList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = &self.feed.table;
        if table.rows.is_empty() {
            return match &table.error {
                Some(e) => writeln!(f, "  {}", e),
                None => writeln!(f, "  No alerts found"),
            };
        }
        for row in &table.rows {
            let alert = &row.record;
            let classification = alert.classification();
            let packet = alert.packet();
            writeln!(
                f,
                "{} [{:<6}] {} {} -> {} ({})",
                if row.recent { '*' } else { ' ' },
                title_case(classification.severity.as_str()),
                classification.title,
                packet.src_ip,
                packet.dst_ip,
                time_ago(packet.timestamp, self.now),
            )?;
        }
        Ok(())
    }
}

/// One sparkline per series, scaled to the series maximum.
pub struct ChartPanel<'a>(pub &'a ChartSeries);

impl fmt::Display for ChartPanel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chart = self.0;
        let first = chart.labels.first().map(String::as_str).unwrap_or("");
        let last = chart.labels.last().map(String::as_str).unwrap_or("");
        writeln!(f, "Traffic ({}, {} .. {})", chart.range, first, last)?;
        for series in &chart.series {
            let max = series.values.iter().copied().max().unwrap_or(0);
            let line: String = series
                .values
                .iter()
                .map(|v| match max {
                    0 => SPARK[0],
                    _ => {
                        let level = u128::from(*v) * (SPARK.len() as u128 - 1) / u128::from(max);
                        SPARK[usize::try_from(level).unwrap_or(SPARK.len() - 1)]
                    }
                })
                .collect();
            writeln!(f, "{:<8} {} max {}", series.name, line, format_number(max))?;
        }
        Ok(())
    }
}

pub struct ProtocolPanel<'a>(pub &'a [DistributionSlice]);

impl fmt::Display for ProtocolPanel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total: u64 = self.0.iter().map(|s| s.value).sum();
        for slice in self.0 {
            let share = if total == 0 {
                0.0
            } else {
                slice.value as f64 * 100.0 / total as f64
            };
            writeln!(f, "  {:<10} {:>12} {:>5.1}%", slice.label, format_number(slice.value), share)?;
        }
        Ok(())
    }
}
