//! Bounded, newest-first tables of records fed by snapshots and live pushes.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

use crate::records::{FieldValue, Record, RecordId};

/// A buffered record plus its display-only "recently arrived" marker.
///
/// The marker is never part of the record: identity, ordering and field
/// access all delegate to the wrapped record.
#[derive(Debug, Clone)]
pub struct LiveEntry<R> {
    record: R,
    highlight_until: Option<Instant>,
}

impl<R> LiveEntry<R> {
    pub fn record(&self) -> &R {
        &self.record
    }

    /// Whether the entry arrived live less than one TTL ago.
    pub fn is_recent(&self) -> bool {
        self.highlight_until
            .is_some_and(|until| Instant::now() < until)
    }
}

impl<R: Record> Record for LiveEntry<R> {
    const SEARCH_FIELDS: &'static [&'static str] = R::SEARCH_FIELDS;

    fn id(&self) -> &RecordId {
        self.record.id()
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.record.timestamp()
    }

    fn field(&self, name: &str) -> FieldValue {
        self.record.field(name)
    }
}

/// Ordered sequence of at most `capacity` records.
///
/// `replace` installs a snapshot verbatim; `insert_live` pushes one record at
/// the head and evicts from the tail. Nothing else changes the contents.
#[derive(Debug)]
pub struct LiveTableBuffer<R> {
    entries: VecDeque<LiveEntry<R>>,
    capacity: usize,
    highlight_ttl: Duration,
}

impl<R: Record> LiveTableBuffer<R> {
    pub fn new(capacity: usize, highlight_ttl: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            highlight_ttl,
        }
    }

    /// Discards the current contents and installs `records` in the given
    /// order. A snapshot larger than the capacity keeps its first `capacity`
    /// records.
    pub fn replace<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = R>,
    {
        self.entries.clear();
        let mut dropped = 0usize;
        for record in records {
            if self.entries.len() < self.capacity {
                self.entries.push_back(LiveEntry { record, highlight_until: None });
            } else {
                dropped += 1;
            }
        }
        if dropped > 0 {
            warn!(
                "Snapshot exceeded buffer capacity {}, dropped {} trailing record(s)",
                self.capacity, dropped
            );
        }
        debug!("Buffer replaced with {} record(s)", self.entries.len());
    }

    /// Inserts a live record at the head, marks it as recently arrived, and
    /// evicts the oldest entries beyond capacity.
    pub fn insert_live(&mut self, record: R) {
        let highlight_until = Instant::now() + self.highlight_ttl;
        self.entries.push_front(LiveEntry {
            record,
            highlight_until: Some(highlight_until),
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    /// Drops expired highlight markers and returns how many were cleared.
    pub fn clear_expired_highlights(&mut self) -> usize {
        let now = Instant::now();
        let mut cleared = 0;
        for entry in self.entries.iter_mut() {
            if entry.highlight_until.is_some_and(|until| until <= now) {
                entry.highlight_until = None;
                cleared += 1;
            }
        }
        cleared
    }

    /// Earliest pending highlight expiry, if any entry is still highlighted.
    pub fn next_highlight_expiry(&self) -> Option<Instant> {
        self.entries.iter().filter_map(|e| e.highlight_until).min()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &LiveEntry<R>> {
        self.entries.iter()
    }

    pub fn records(&self) -> impl Iterator<Item = &R> {
        self.entries.iter().map(LiveEntry::record)
    }
}
