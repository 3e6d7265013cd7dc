//! Push side of the telemetry feed: the streaming connection and its
//! reconnection policy.
//!
//! Components:
//! - `state`: the connection state machine as plain data and pure transitions.
//! - `events`: status, message and error events and their subscriptions.
//! - `transport`: the `Connector` seam with WebSocket and line-delimited TCP
//!   implementations.
//! - `connection_manager`: the driver task tying the three together.

pub mod connection_manager;
pub mod events;
pub mod state;
pub mod transport;

#[cfg(test)]
pub(crate) mod integration_tests;

pub use connection_manager::ConnectionManager;
pub use events::{ConnectionEvent, EventBus, Subscription};
pub use state::{ConnectionState, ConnectionStatus, Phase, RetryPolicy, Transition};
pub use transport::{connector_for, Connector, FrameStream, TcpLineConnector, WebSocketConnector};
