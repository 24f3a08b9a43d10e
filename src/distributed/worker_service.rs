//! Worker service
//!
//! Runs on each worker host and serves the cut transform to coordinators.
//! The service:
//! - Listens for coordinator connections
//! - Handles every connection on its own task
//! - Answers one `Transform` request per connection with the cut records
//! - Rejects unexpected messages and protocol version mismatches with an
//!   `Error` reply

use crate::distributed::protocol::*;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tracing::Instrument;

/// How long a connected coordinator has to send its request
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Worker service bound to a listening socket
pub struct WorkerService {
    listener: TcpListener,

    /// Node identifier (hostname)
    node_id: String,

    read_timeout: Duration,
}

impl WorkerService {
    /// Bind on all interfaces at `listen_port`
    pub async fn new(listen_port: u16) -> Result<Self> {
        Self::bind(SocketAddr::from(([0, 0, 0, 0], listen_port))).await
    }

    /// Bind on a specific address (port 0 picks a free port)
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind worker service on {}", addr))?;

        Ok(Self {
            listener,
            node_id: get_node_id(),
            read_timeout: DEFAULT_READ_TIMEOUT,
        })
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().context("Failed to read local address")
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Accept and serve connections until the task is dropped
    pub async fn run(self) -> Result<()> {
        tracing::info!(
            addr = %self.local_addr()?,
            node_id = %self.node_id,
            "worker service listening"
        );

        loop {
            let (stream, peer) = self
                .listener
                .accept()
                .await
                .context("Failed to accept connection")?;

            let node_id = self.node_id.clone();
            let read_timeout = self.read_timeout;
            let span = tracing::info_span!("connection", %peer);

            tokio::spawn(
                async move {
                    if let Err(e) = handle_connection(stream, &node_id, read_timeout).await {
                        tracing::warn!(error = %format!("{:#}", e), "connection failed");
                    }
                }
                .instrument(span),
            );
        }
    }
}

/// Serve one request on `stream`
async fn handle_connection(
    mut stream: TcpStream,
    node_id: &str,
    read_timeout: Duration,
) -> Result<()> {
    let read = tokio::time::timeout(read_timeout, read_message(&mut stream))
        .await
        .unwrap_or_else(|_| {
            Err(anyhow::anyhow!(
                "No request within {}ms",
                read_timeout.as_millis()
            ))
        });

    let msg = match read {
        Ok(msg) => msg,
        Err(e) => {
            let reply = error_reply(node_id, String::new(), format!("{:#}", e));
            // Best effort; the peer may already be gone
            let _ = write_message(&mut stream, &reply).await;
            return Err(e.context("Failed to read request"));
        }
    };

    let reply = handle_message(msg, node_id);
    write_message(&mut stream, &reply)
        .await
        .context("Failed to send reply")?;

    Ok(())
}

/// Build the reply for one request
pub fn handle_message(msg: Message, node_id: &str) -> Message {
    let request = match msg {
        Message::Transform(request) => request,
        other => {
            tracing::warn!(message = ?other, "expected TRANSFORM");
            return error_reply(node_id, String::new(), "expected TRANSFORM message".to_string());
        }
    };

    let span = tracing::info_span!("transform", request_id = %request.request_id);
    let _guard = span.enter();

    if request.protocol_version != PROTOCOL_VERSION {
        tracing::warn!(
            coordinator = request.protocol_version,
            worker = PROTOCOL_VERSION,
            "protocol version mismatch"
        );
        return error_reply(
            node_id,
            request.request_id,
            format!(
                "Protocol version mismatch: coordinator={}, worker={}",
                request.protocol_version, PROTOCOL_VERSION
            ),
        );
    }

    if let Err(e) = request.args.validate() {
        tracing::warn!(error = %e, "invalid cut arguments");
        return error_reply(node_id, request.request_id, format!("Invalid cut arguments: {}", e));
    }

    tracing::info!(records = request.records.len(), "received request");
    let records = request.args.cut_records(&request.records);
    tracing::info!(records = records.len(), "request processed");

    Message::Transformed(TransformResponse {
        request_id: request.request_id,
        records,
    })
}

fn error_reply(node_id: &str, request_id: String, error: String) -> Message {
    Message::Error(ErrorMessage {
        node_id: node_id.to_string(),
        request_id,
        error,
    })
}

/// Get node identifier (hostname)
fn get_node_id() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}
