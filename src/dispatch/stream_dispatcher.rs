use log::{debug, warn};
use serde_json::Value;

use super::envelope::{decode, MessageKind, StreamMessage};
use crate::error_handling::types::ParseError;
use crate::records::{AlertRecord, NetworkStats, PacketRecord};

/// Handle returned by a registration, used to remove the handler again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler<T> = Box<dyn FnMut(&T) + Send>;

struct Handlers<T> {
    entries: Vec<(HandlerId, Handler<T>)>,
}

impl<T> Default for Handlers<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T> Handlers<T> {
    fn call_all(&mut self, payload: &T) {
        for (_, handler) in self.entries.iter_mut() {
            handler(payload);
        }
    }

    fn remove(&mut self, id: HandlerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }
}

/// Decodes inbound messages and hands each to every handler registered for
/// its kind.
///
/// Dispatch is synchronous: [`dispatch`](Self::dispatch) returns only after
/// every handler ran, in registration order, so messages reach the handlers
/// in exactly the order they were dispatched.
#[derive(Default)]
pub struct StreamDispatcher {
    next_id: u64,
    stats: Handlers<NetworkStats>,
    packets: Handlers<PacketRecord>,
    alerts: Handlers<AlertRecord>,
}

impl StreamDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> HandlerId {
        self.next_id += 1;
        HandlerId(self.next_id)
    }

    pub fn on_stats<F>(&mut self, handler: F) -> HandlerId
    where
        F: FnMut(&NetworkStats) + Send + 'static,
    {
        let id = self.allocate_id();
        self.stats.entries.push((id, Box::new(handler)));
        id
    }

    pub fn on_packet<F>(&mut self, handler: F) -> HandlerId
    where
        F: FnMut(&PacketRecord) + Send + 'static,
    {
        let id = self.allocate_id();
        self.packets.entries.push((id, Box::new(handler)));
        id
    }

    pub fn on_alert<F>(&mut self, handler: F) -> HandlerId
    where
        F: FnMut(&AlertRecord) + Send + 'static,
    {
        let id = self.allocate_id();
        self.alerts.entries.push((id, Box::new(handler)));
        id
    }

    /// Unregisters a handler. Returns whether it was registered.
    pub fn remove_handler(&mut self, id: HandlerId) -> bool {
        self.stats.remove(id) || self.packets.remove(id) || self.alerts.remove(id)
    }

    pub fn handler_count(&self) -> usize {
        self.stats.entries.len() + self.packets.entries.len() + self.alerts.entries.len()
    }

    /// Decodes `value` and runs the matching handlers. Unknown kinds are
    /// logged and dropped; payloads that fail to decode are logged and
    /// returned as errors without reaching any handler.
    pub fn dispatch(&mut self, value: Value) -> Result<MessageKind, ParseError> {
        let message = decode(value).map_err(|e| {
            warn!("Skipping stream message: {}", e);
            e
        })?;
        let kind = message.kind();

        match message {
            StreamMessage::Stats(stats) => self.stats.call_all(&stats),
            StreamMessage::Packet(packet) => self.packets.call_all(&packet),
            StreamMessage::Alert(alert) => self.alerts.call_all(&alert),
            StreamMessage::Unknown(tag) => {
                warn!("Dropping stream message of unknown type '{}'", tag);
                return Ok(kind);
            }
        }
        debug!("Dispatched {:?} message", kind);
        Ok(kind)
    }
}
