//! Connection state machine.
//!
//! ```text
//! Disconnected --Start--> Connecting --Opened--> Connected
//!                              |                     |
//!                             Lost                  Lost
//!                              v                     v
//!       Connecting <--RetryDue-- Reconnecting   (or Failed once
//!                                                retries hit the max)
//! any --Stop--> Disconnected            Failed --Start--> Connecting
//! ```

use std::time::Duration;

use crate::error_handling::types::ConnectionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Failed,
}

/// Bounded reconnection policy with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            delay: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Start,
    Opened,
    Lost(String),
    RetryDue,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionState {
    pub phase: Phase,
    /// Failed attempts since the last successful connection.
    pub retries: u32,
    pub last_error: Option<String>,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            phase: Phase::Disconnected,
            retries: 0,
            last_error: None,
        }
    }
}

impl ConnectionState {
    /// Next state after `transition`. Transitions that make no sense in the
    /// current phase leave the state unchanged.
    pub fn apply(&self, transition: Transition, policy: &RetryPolicy) -> ConnectionState {
        use Phase::*;

        match (self.phase, transition) {
            (Disconnected | Failed, Transition::Start) => ConnectionState {
                phase: Connecting,
                retries: 0,
                last_error: None,
            },
            (Connecting, Transition::Opened) => ConnectionState {
                phase: Connected,
                retries: 0,
                last_error: None,
            },
            (Connecting | Connected, Transition::Lost(cause)) => {
                let retries = self.retries.saturating_add(1);
                let phase = if retries >= policy.max_retries {
                    Failed
                } else {
                    Reconnecting
                };
                ConnectionState {
                    phase,
                    retries,
                    last_error: Some(cause),
                }
            }
            (Reconnecting, Transition::RetryDue) => ConnectionState {
                phase: Connecting,
                ..self.clone()
            },
            (_, Transition::Stop) => ConnectionState::default(),
            _ => self.clone(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase == Phase::Failed
    }

    /// What the UI shows: connected or not, and why not once given up.
    pub fn status(&self) -> ConnectionStatus {
        let reason = match self.phase {
            Phase::Failed => Some(
                ConnectionError::ExhaustedRetries {
                    attempts: self.retries,
                    last_error: self
                        .last_error
                        .clone()
                        .unwrap_or_else(|| String::from("unknown")),
                }
                .to_string(),
            ),
            _ => None,
        };
        ConnectionStatus {
            connected: self.phase == Phase::Connected,
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub reason: Option<String>,
}
