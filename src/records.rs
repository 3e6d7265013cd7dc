//! Telemetry records and the field model used to filter and sort them.
//!
//! - `types`: [`Record`] trait, [`RecordId`] and [`FieldValue`].
//! - `packet`: [`PacketRecord`] and the [`AlertRecord`] view over it.
//! - `connection`: [`ConnectionRecord`].
//! - `stats`: [`NetworkStats`] aggregates and their breakdown rows.

pub mod connection;
pub mod packet;
pub mod stats;
pub mod types;

pub use connection::ConnectionRecord;
pub use packet::{AlertRecord, PacketRecord};
pub use stats::{DestinationStats, NetworkStats, ProtocolStats, SourceStats};
pub use types::{FieldValue, Record, RecordId};
