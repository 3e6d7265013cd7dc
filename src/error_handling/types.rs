use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    InvalidUrl(String),
    NotInRange(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::InvalidUrl(e) => write!(f, "URL error: {}", e),
            ConfigError::NotInRange(e) => write!(f, "Value out of range: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

/// The streaming connection could not be established or was lost.
///
/// Never surfaced to callers as an error value: the connection manager turns
/// it into a status change and schedules a reconnection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    ConnectFailed(String),
    Io(String),
    Closed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::ConnectFailed(e) => write!(f, "Connection failed: {}", e),
            TransportError::Io(e) => write!(f, "Transport error: {}", e),
            TransportError::Closed => write!(f, "Connection closed by peer"),
        }
    }
}

impl std::error::Error for TransportError {}

/// A single inbound message could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The frame is not valid JSON, or not an envelope object.
    Malformed(String),
    /// The envelope is valid but its `data` does not fit the announced kind.
    InvalidPayload { kind: String, reason: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Malformed(e) => write!(f, "Malformed message: {}", e),
            ParseError::InvalidPayload { kind, reason } => {
                write!(f, "Invalid '{}' payload: {}", kind, reason)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Terminal connection failures reported through the connection status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    ExhaustedRetries { attempts: u32, last_error: String },
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::ExhaustedRetries {
                attempts,
                last_error,
            } => write!(
                f,
                "Gave up after {} failed connection attempts (last error: {})",
                attempts, last_error
            ),
        }
    }
}

impl std::error::Error for ConnectionError {}

/// A snapshot query failed. The three variants are the three failure classes
/// a caller has to tell apart: no response, a non-success status, and a body
/// that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    Transport(String),
    Status(u16),
    Parse(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(e) => write!(f, "Snapshot request failed: {}", e),
            FetchError::Status(code) => write!(f, "Snapshot request returned HTTP {}", code),
            FetchError::Parse(e) => write!(f, "Snapshot response could not be parsed: {}", e),
        }
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug)]
pub enum ControllerError {
    ConfigurationError(ConfigError),
    InitializationFailed(String),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::ConfigurationError(e) => write!(f, "Configuration error: {}", e),
            ControllerError::InitializationFailed(e) => write!(f, "Initialization failed: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<ConfigError> for ControllerError {
    fn from(err: ConfigError) -> Self {
        ControllerError::ConfigurationError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_retries_reason_names_attempts_and_cause() {
        let err = ConnectionError::ExhaustedRetries {
            attempts: 5,
            last_error: "Connection closed by peer".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("5 failed connection attempts"));
        assert!(text.contains("Connection closed by peer"));
    }

    #[test]
    fn fetch_error_classes_are_distinguishable() {
        assert_ne!(FetchError::Status(500), FetchError::Transport("500".into()));
        assert_eq!(
            FetchError::Status(404).to_string(),
            "Snapshot request returned HTTP 404"
        );
    }
}
