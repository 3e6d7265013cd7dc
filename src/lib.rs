pub mod configuration;
pub use configuration::{CliArgs, Config, StreamEndpoint};

pub mod error_handling;
pub use error_handling::{
    ConfigError, ConnectionError, ControllerError, FetchError, ParseError, TransportError,
};

pub mod records;
pub use records::{AlertRecord, ConnectionRecord, NetworkStats, PacketRecord, Record, RecordId};

pub mod severity;
pub mod query;
pub mod live_buffer;
pub mod charts;
pub mod snapshot;

pub mod connection;
pub use connection::{ConnectionManager, ConnectionState, ConnectionStatus, Phase};

pub mod dispatch;
pub use dispatch::StreamDispatcher;

pub mod controller;
pub use controller::Controller;

pub mod presentation;
