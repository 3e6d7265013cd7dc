use crate::error_handling::types::ConfigError;

/// Where the live stream comes from, derived from the configured URL scheme.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum StreamEndpoint {
    /// `ws://` or `wss://` URL, one JSON envelope per text frame.
    WebSocket(String),
    /// `tcp://host:port`, one JSON envelope per line.
    TcpLines(String),
}

impl StreamEndpoint {
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        let url = url.trim();
        if url.starts_with("ws://") || url.starts_with("wss://") {
            return Ok(StreamEndpoint::WebSocket(url.to_string()));
        }
        if let Some(addr) = url.strip_prefix("tcp://") {
            if addr.is_empty() || !addr.contains(':') {
                return Err(ConfigError::InvalidUrl(format!(
                    "'{}' must be of the form tcp://host:port",
                    url
                )));
            }
            return Ok(StreamEndpoint::TcpLines(addr.to_string()));
        }
        Err(ConfigError::InvalidUrl(format!(
            "unsupported stream scheme in '{}' (expected ws://, wss:// or tcp://)",
            url
        )))
    }
}

/// Checks that a snapshot API base URL is an http(s) URL.
pub fn validate_api_url(url: &str) -> Result<(), ConfigError> {
    match url.split_once("://") {
        Some(("http", rest)) | Some(("https", rest)) if !rest.is_empty() => Ok(()),
        _ => Err(ConfigError::InvalidUrl(format!(
            "'{}' is not an http(s) URL",
            url
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_websocket_and_tcp_endpoints() {
        assert_eq!(
            StreamEndpoint::parse("ws://localhost:8000/ws").unwrap(),
            StreamEndpoint::WebSocket("ws://localhost:8000/ws".to_string())
        );
        assert_eq!(
            StreamEndpoint::parse("tcp://10.0.0.2:9000").unwrap(),
            StreamEndpoint::TcpLines("10.0.0.2:9000".to_string())
        );
    }

    #[test]
    fn rejects_unknown_schemes() {
        assert!(StreamEndpoint::parse("http://localhost/ws").is_err());
        assert!(StreamEndpoint::parse("tcp://no-port").is_err());
        assert!(validate_api_url("ftp://host/api").is_err());
        assert!(validate_api_url("https://host/api").is_ok());
    }
}
