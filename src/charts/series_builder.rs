use chrono::{DateTime, Utc};
use log::trace;

use super::types::{ChartSeries, DistributionSlice, Series, TimeRange};
use crate::records::{FieldValue, NetworkStats, Record};

pub const PACKETS_SERIES: &str = "Packets";
pub const BYTES_SERIES: &str = "Bytes";

/// Buckets records into fixed windows ending at `now`.
///
/// Bucket `i` of `n` covers `(end_i - interval, end_i]` with
/// `end_i = now - (n - 1 - i) * interval`, so the last bucket ends at `now`
/// and timestamps increase strictly.
pub struct ChartSeriesBuilder;

impl ChartSeriesBuilder {
    pub fn build<'a, R, I>(range: TimeRange, records: I, now: DateTime<Utc>) -> ChartSeries
    where
        R: Record + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        Self::build_with_points(range, range.point_count(), records, now)
    }

    pub fn build_with_points<'a, R, I>(
        range: TimeRange,
        point_count: usize,
        records: I,
        now: DateTime<Utc>,
    ) -> ChartSeries
    where
        R: Record + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        let interval = range.interval();
        let interval_ms = interval.num_milliseconds().max(1);

        let timestamps: Vec<DateTime<Utc>> = (0..point_count)
            .map(|i| now - interval * ((point_count - 1 - i) as i32))
            .collect();
        let labels = timestamps.iter().map(|t| range.label(*t)).collect();

        let mut packets = vec![0u64; point_count];
        let mut bytes = vec![0u64; point_count];

        for record in records {
            let offset_ms = (now - record.timestamp()).num_milliseconds();
            if offset_ms < 0 {
                continue;
            }
            let steps_back = usize::try_from(offset_ms / interval_ms).unwrap_or(usize::MAX);
            if steps_back >= point_count {
                continue;
            }
            let index = point_count - 1 - steps_back;
            packets[index] = packets[index].saturating_add(1);
            if let FieldValue::Integer(n) = record.field("bytes") {
                bytes[index] = bytes[index].saturating_add(u64::try_from(n).unwrap_or(0));
            }
        }

        trace!(
            "built {} series with {} point(s)",
            range,
            point_count
        );

        ChartSeries {
            range,
            labels,
            timestamps,
            series: vec![
                Series { name: PACKETS_SERIES.to_string(), values: packets },
                Series { name: BYTES_SERIES.to_string(), values: bytes },
            ],
        }
    }
}

/// Protocol share of the latest stats, in the order the backend reports it.
pub fn protocol_distribution(stats: &NetworkStats) -> Vec<DistributionSlice> {
    stats
        .protocols
        .iter()
        .flatten()
        .map(|p| DistributionSlice {
            label: if p.protocol.is_empty() {
                String::from("Unknown")
            } else {
                p.protocol.clone()
            },
            value: p.packet_count,
        })
        .collect()
}
