//! Routing of inbound stream messages to the projections that consume them.
//!
//! Components:
//! - `envelope`: decoding of `{type, data}` envelopes into [`StreamMessage`].
//! - `stream_dispatcher`: per-kind handler registry and in-order dispatch.

pub mod envelope;
pub mod stream_dispatcher;

pub use envelope::{decode, MessageKind, StreamMessage};
pub use stream_dispatcher::{HandlerId, StreamDispatcher};
