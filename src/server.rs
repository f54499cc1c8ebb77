//! TCP server for the line-delimited JSON echo protocol.
//!
//! Runs one listener task per configured port and one task per accepted
//! connection. Each decoded request is answered with its own key/value
//! pair tagged with a process-wide unique id.

use crate::config::Config;
use crate::ids::RequestIds;
use crate::protocol::{Request, Response};
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

/// Expected upper bound for a request line
const MAX_LINE_LENGTH: usize = 1024;

/// Server instance
pub struct Server {
    config: Config,
    ids: Arc<RequestIds>,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Self {
        Server {
            config,
            ids: Arc::new(RequestIds::new()),
        }
    }

    /// Start one listener per configured port and supervise them.
    ///
    /// Every listener runs an unbounded accept loop, so under normal
    /// operation this never completes; it returns only once all
    /// listeners have terminated on unrecoverable bind failures.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let mut listeners = Vec::with_capacity(self.config.ports.len());

        for &port in &self.config.ports {
            let ids = Arc::clone(&self.ids);

            listeners.push(tokio::spawn(async move {
                if let Err(e) = listen_on_port(port, ids).await {
                    error!(port, error = %e, "Listener terminated");
                }
            }));
        }

        for listener in listeners {
            listener.await?;
        }

        Ok(())
    }
}

/// A port listener failure; binding is the only unrecoverable condition
#[derive(Debug)]
pub enum ListenError {
    Bind(u16, std::io::Error),
}

impl std::fmt::Display for ListenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenError::Bind(port, e) => {
                write!(f, "failed to listen on port {}: {}", port, e)
            }
        }
    }
}

impl std::error::Error for ListenError {}

/// Accept connections on one port for the life of the process.
///
/// Each accepted connection is handled on its own task, so acceptance
/// never waits on a slow peer. Accept errors are logged and the loop
/// keeps going; a bind failure terminates this listener only.
async fn listen_on_port(port: u16, ids: Arc<RequestIds>) -> Result<(), ListenError> {
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| ListenError::Bind(port, e))?;

    info!(port, "Listening");

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                debug!(port, peer = %addr, "New connection");

                let ids = Arc::clone(&ids);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, addr, ids).await {
                        debug!(peer = %addr, error = %e, "Connection error");
                    }
                });
            }
            Err(e) => {
                error!(port, error = %e, "Failed to accept connection");
            }
        }
    }
}

/// Handle a single client connection.
///
/// Reads newline-delimited JSON records and answers each in arrival
/// order. A record that fails to decode gets no reply and leaves the
/// connection open; a read or write failure ends the connection. The
/// socket is dropped on every exit path.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    ids: Arc<RequestIds>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::with_capacity(MAX_LINE_LENGTH);

    loop {
        line.clear();

        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            // EOF
            break;
        }

        let request: Request = match serde_json::from_str(line.trim_end()) {
            Ok(request) => request,
            Err(e) => {
                warn!(peer = %peer, error = %e, "Dropping malformed request");
                continue;
            }
        };

        debug!(peer = %peer, key = %request.key, "Request received");

        let response = Response {
            id: ids.next_id(),
            key: request.key,
            value: request.value,
        };

        let encoded = match serde_json::to_vec(&response) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(peer = %peer, error = %e, "Dropping unencodable response");
                continue;
            }
        };

        let mut out = BytesMut::with_capacity(encoded.len() + 1);
        out.extend_from_slice(&encoded);
        out.extend_from_slice(b"\n");
        writer.write_all(&out).await?;
    }

    Ok(())
}
