use log::trace;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use super::state::ConnectionState;
use crate::error_handling::types::ParseError;

/// Everything a connection reports to its subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    StatusChanged(ConnectionState),
    /// One decoded inbound frame, in arrival order.
    Message(serde_json::Value),
    /// A frame that could not be decoded; the connection stays up.
    Error(ParseError),
}

type Senders = HashMap<Uuid, UnboundedSender<ConnectionEvent>>;

/// Fan-out of connection events to any number of subscribers.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Senders>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.subscribers.lock().insert(id, tx);
        trace!("subscriber {} registered", id);
        Subscription {
            id,
            rx,
            bus: Arc::downgrade(&self.subscribers),
        }
    }

    /// Delivers `event` to every live subscriber. Subscribers whose receiving
    /// end is gone are dropped.
    pub fn publish(&self, event: ConnectionEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|_, tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

/// Receiving end of an [`EventBus`] registration.
///
/// Dropping the subscription unregisters it; [`Subscription::unsubscribe`]
/// does the same explicitly.
#[derive(Debug)]
pub struct Subscription {
    id: Uuid,
    rx: UnboundedReceiver<ConnectionEvent>,
    bus: Weak<Mutex<Senders>>,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next event, or `None` once the bus is gone and the queue is drained.
    pub async fn recv(&mut self) -> Option<ConnectionEvent> {
        self.rx.recv().await
    }

    /// Next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<ConnectionEvent> {
        self.rx.try_recv().ok()
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.bus.upgrade() {
            subscribers.lock().remove(&self.id);
            trace!("subscriber {} removed", self.id);
        }
    }
}
