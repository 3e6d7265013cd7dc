//! Pull side of the telemetry feed: paginated, filtered snapshot queries.
//!
//! Components:
//! - `types`: snapshot shapes and the [`SnapshotSource`] seam.
//! - `snapshot_fetcher`: the HTTP implementation of that seam.

pub mod snapshot_fetcher;
pub mod types;

pub use snapshot_fetcher::SnapshotFetcher;
pub use types::{KnownValues, RecordKind, Snapshot, SnapshotSource};
