use futures_util::future::BoxFuture;
use futures_util::stream::{self, BoxStream};
use futures_util::{FutureExt, StreamExt};
use log::{debug, trace};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::TcpStream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::configuration::types::StreamEndpoint;
use crate::error_handling::types::TransportError;

/// Inbound text frames of one open connection. The stream ends when the peer
/// closes; an `Err` item means the connection was lost.
pub type FrameStream = BoxStream<'static, Result<String, TransportError>>;

/// Opens streaming connections. One call, one connection attempt.
pub trait Connector: Send + Sync {
    fn connect(&self) -> BoxFuture<'_, Result<FrameStream, TransportError>>;

    /// Endpoint description for logs.
    fn describe(&self) -> String;
}

/// Picks the connector matching the endpoint's scheme.
pub fn connector_for(endpoint: &StreamEndpoint) -> Arc<dyn Connector> {
    match endpoint {
        StreamEndpoint::WebSocket(url) => Arc::new(WebSocketConnector::new(url)),
        StreamEndpoint::TcpLines(addr) => Arc::new(TcpLineConnector::new(addr)),
    }
}

/// One JSON envelope per WebSocket text frame.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    url: String,
}

impl WebSocketConnector {
    pub fn new(url: &str) -> Self {
        Self { url: url.to_string() }
    }
}

impl Connector for WebSocketConnector {
    fn connect(&self) -> BoxFuture<'_, Result<FrameStream, TransportError>> {
        async move {
            let (socket, response) = connect_async(self.url.as_str())
                .await
                .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
            debug!("WebSocket handshake with {} answered {}", self.url, response.status());

            let frames = socket.filter_map(|message| async move {
                match message {
                    Ok(Message::Text(text)) => Some(Ok(text)),
                    Ok(Message::Binary(bytes)) => {
                        Some(Ok(String::from_utf8_lossy(&bytes).into_owned()))
                    }
                    // Control frames are answered by tungstenite itself.
                    Ok(_) => None,
                    Err(e) => Some(Err(TransportError::Io(e.to_string()))),
                }
            });
            Ok(frames.boxed())
        }
        .boxed()
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// One JSON envelope per line over a plain TCP socket.
#[derive(Debug, Clone)]
pub struct TcpLineConnector {
    addr: String,
}

impl TcpLineConnector {
    pub fn new(addr: &str) -> Self {
        Self { addr: addr.to_string() }
    }
}

impl Connector for TcpLineConnector {
    fn connect(&self) -> BoxFuture<'_, Result<FrameStream, TransportError>> {
        async move {
            let stream = TcpStream::connect(self.addr.as_str())
                .await
                .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
            debug!("TCP stream connected to {}", self.addr);
            Ok(line_frames(stream))
        }
        .boxed()
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.addr)
    }
}

/// Splits a byte stream into newline-delimited frames, skipping blank lines.
/// Lines that are not valid UTF-8 are decoded lossily and still yielded, so
/// the consumer reports them as malformed messages without dropping the
/// connection. The frame stream ends after the first read error.
pub fn line_frames<R>(reader: R) -> FrameStream
where
    R: AsyncRead + Send + Unpin + 'static,
{
    stream::unfold(Some(BufReader::new(reader)), |state| async move {
        let mut reader = state?;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => return None,
                Ok(_) => {
                    let line = decode_line(&buf);
                    if line.trim().is_empty() {
                        continue;
                    }
                    trace!("frame: {}", preview(&line));
                    return Some((Ok(line), Some(reader)));
                }
                Err(e) => return Some((Err(TransportError::Io(e.to_string())), None)),
            }
        }
    })
    .boxed()
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    match String::from_utf8(raw.to_vec()) {
        Ok(line) => line,
        Err(e) => {
            debug!("non UTF-8 frame of {} bytes", raw.len());
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

/// First 64 bytes of a frame, cut on a character boundary.
pub(crate) fn preview(frame: &str) -> &str {
    let mut end = frame.len().min(64);
    while !frame.is_char_boundary(end) {
        end -= 1;
    }
    &frame[..end]
}
