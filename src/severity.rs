//! Alert severity classification.
//!
//! An ordered decision table over the packet's `is_malicious` flag and
//! `threat_type`; the first matching row wins:
//!
//! | is_malicious | threat_type | severity |
//! |--------------|-------------|----------|
//! | true         | present     | high     |
//! | true         | absent      | medium   |
//! | otherwise    |             | low      |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::records::AlertRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub severity: Severity,
    pub title: String,
}

/// Classifies an alert. Pure and total: the same attributes always give the
/// same result. An empty `threat_type` counts as absent.
pub fn classify(is_malicious: bool, threat_type: Option<&str>) -> Classification {
    let threat_type = threat_type.filter(|t| !t.is_empty());

    let severity = match (is_malicious, threat_type) {
        (true, Some(_)) => Severity::High,
        (true, None) => Severity::Medium,
        _ => Severity::Low,
    };

    let title = match threat_type {
        Some(threat) => format!("{} Detected", threat),
        None if is_malicious => String::from("Suspicious Activity Detected"),
        None => String::from("Network Alert"),
    };

    Classification { severity, title }
}

/// Per-severity tally over a set of alerts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    pub fn tally<'a, I>(alerts: I) -> Self
    where
        I: IntoIterator<Item = &'a AlertRecord>,
    {
        let mut counts = SeverityCounts::default();
        for alert in alerts {
            counts.total += 1;
            match alert.classification().severity {
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
            }
        }
        counts
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}
