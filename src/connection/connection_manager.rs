use futures_util::StreamExt;
use log::{debug, error, info, trace, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::events::{ConnectionEvent, EventBus, Subscription};
use super::state::{ConnectionState, ConnectionStatus, Phase, RetryPolicy, Transition};
use super::transport::{connector_for, preview, Connector};
use crate::configuration::config::Config;
use crate::error_handling::types::{ConfigError, ParseError, TransportError};

/// State shared between the manager handle and its driver task.
struct Shared {
    id: Uuid,
    state: Mutex<ConnectionState>,
    bus: EventBus,
    policy: RetryPolicy,
}

impl Shared {
    /// Applies `transition` and publishes the new state if it changed.
    fn transition(&self, transition: Transition) -> ConnectionState {
        let next = {
            let mut state = self.state.lock();
            let next = state.apply(transition, &self.policy);
            if next == *state {
                return next;
            }
            *state = next.clone();
            next
        };
        debug!(
            "[{}] connection state {:?} (retries {})",
            self.id, next.phase, next.retries
        );
        self.bus.publish(ConnectionEvent::StatusChanged(next.clone()));
        next
    }

    fn handle_frame(&self, frame: &str) {
        trace!("[{}] frame: {}", self.id, preview(frame));
        match serde_json::from_str::<serde_json::Value>(frame) {
            Ok(value) => self.bus.publish(ConnectionEvent::Message(value)),
            Err(e) => {
                warn!("[{}] Dropping malformed message: {}", self.id, e);
                self.bus
                    .publish(ConnectionEvent::Error(ParseError::Malformed(e.to_string())));
            }
        }
    }
}

/// Owns the lifecycle of the streaming connection.
///
/// [`start`](Self::start) spawns a driver task that connects, forwards every
/// inbound frame as a [`ConnectionEvent::Message`], and reconnects after a
/// fixed delay when the connection ends, until the retry ceiling moves the
/// state to [`Phase::Failed`]. [`stop`](Self::stop) cancels the driver, and
/// with it any open connection or pending reconnect timer.
///
/// # Fields Overview
///
/// - `shared`: instance id, current state, event bus and retry policy
/// - `connector`: opens one connection per attempt
/// - `driver`: the running driver task, if any
pub struct ConnectionManager {
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    driver: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn Connector>, policy: RetryPolicy) -> Self {
        Self {
            shared: Arc::new(Shared {
                id: Uuid::new_v4(),
                state: Mutex::new(ConnectionState::default()),
                bus: EventBus::new(),
                policy,
            }),
            connector,
            driver: None,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let endpoint = config.stream_endpoint()?;
        let policy = RetryPolicy {
            max_retries: config.max_retries,
            delay: config.reconnect_delay(),
        };
        Ok(Self::new(connector_for(&endpoint), policy))
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state.lock().clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state().status()
    }

    pub fn subscribe(&self) -> Subscription {
        self.shared.bus.subscribe()
    }

    /// Begins connecting. A no-op while a driver is already running; from
    /// `Failed` it starts over with a fresh retry budget.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if let Some(driver) = self.driver.take() {
            // A driver that already published `Failed` may still be unwinding.
            if !driver.is_finished() && !self.state().is_terminal() {
                debug!("[{}] start() ignored, connection already running", self.shared.id);
                self.driver = Some(driver);
                return;
            }
            driver.abort();
        }

        self.shared.transition(Transition::Start);
        let shared = Arc::clone(&self.shared);
        let connector = Arc::clone(&self.connector);
        self.driver = Some(tokio::spawn(drive(shared, connector)));
    }

    /// Cancels the driver task and moves to `Disconnected`. Safe to call in
    /// any state and any number of times. When it returns, no connection,
    /// timer or reference held by the driver is left alive.
    pub async fn stop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
            let _ = driver.await;
        }
        if self.state().phase != Phase::Disconnected {
            self.shared.transition(Transition::Stop);
            info!("[{}] Connection stopped", self.shared.id);
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

async fn drive(shared: Arc<Shared>, connector: Arc<dyn Connector>) {
    loop {
        info!("[{}] Connecting to {}", shared.id, connector.describe());

        let cause = match connector.connect().await {
            Ok(mut frames) => {
                shared.transition(Transition::Opened);
                info!("[{}] Connected to {}", shared.id, connector.describe());
                loop {
                    match frames.next().await {
                        Some(Ok(frame)) => shared.handle_frame(&frame),
                        Some(Err(e)) => break e,
                        None => break TransportError::Closed,
                    }
                }
            }
            Err(e) => e,
        };

        warn!("[{}] {}", shared.id, cause);
        let state = shared.transition(Transition::Lost(cause.to_string()));
        if state.is_terminal() {
            if let Some(reason) = state.status().reason {
                error!("[{}] {}", shared.id, reason);
            }
            return;
        }

        info!(
            "[{}] Reconnecting in {:?} (attempt {}/{})",
            shared.id,
            shared.policy.delay,
            state.retries + 1,
            shared.policy.max_retries
        );
        tokio::time::sleep(shared.policy.delay).await;
        shared.transition(Transition::RetryDue);
    }
}
