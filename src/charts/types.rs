use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;

/// Chart window selectable by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeRange {
    OneHour,
    Day,
    Week,
    Month,
}

impl TimeRange {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "1h" => Some(TimeRange::OneHour),
            "24h" => Some(TimeRange::Day),
            "7d" => Some(TimeRange::Week),
            "30d" => Some(TimeRange::Month),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::OneHour => "1h",
            TimeRange::Day => "24h",
            TimeRange::Week => "7d",
            TimeRange::Month => "30d",
        }
    }

    pub fn point_count(&self) -> usize {
        match self {
            TimeRange::OneHour => 60,
            TimeRange::Day => 24,
            TimeRange::Week => 7,
            TimeRange::Month => 30,
        }
    }

    pub fn interval(&self) -> TimeDelta {
        match self {
            TimeRange::OneHour => TimeDelta::minutes(1),
            TimeRange::Day => TimeDelta::hours(1),
            TimeRange::Week | TimeRange::Month => TimeDelta::days(1),
        }
    }

    /// Time of day for sub-day buckets, calendar date otherwise.
    pub fn label(&self, at: DateTime<Utc>) -> String {
        match self {
            TimeRange::OneHour | TimeRange::Day => at.format("%H:%M").to_string(),
            TimeRange::Week | TimeRange::Month => at.format("%b %-d").to_string(),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub name: String,
    pub values: Vec<u64>,
}

/// Labels and the series aligned with them. Every series has exactly one
/// value per label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSeries {
    pub range: TimeRange,
    pub labels: Vec<String>,
    /// End of each bucket, oldest first.
    pub timestamps: Vec<DateTime<Utc>>,
    pub series: Vec<Series>,
}

impl ChartSeries {
    pub fn series(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionSlice {
    pub label: String,
    pub value: u64,
}
