//! Remote worker client
//!
//! [`RemoteWorker`] is the TCP implementation of [`WorkerExecutor`]. Each call
//! opens a fresh connection to the worker service, sends one `Transform`
//! message and waits for the reply. Everything that can go wrong on the way
//! (connect, framing, decoding, an error reply, the timeout) becomes a
//! [`WorkerError`].

use crate::cut::CutArgs;
use crate::dispatch::{WorkerEndpoint, WorkerError, WorkerExecutor};
use crate::distributed::protocol::*;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

/// Default bound on one shard round trip
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for one worker service
#[derive(Debug, Clone)]
pub struct RemoteWorker {
    endpoint: WorkerEndpoint,
    request_timeout: Duration,
}

impl RemoteWorker {
    pub fn new(endpoint: WorkerEndpoint) -> Self {
        Self {
            endpoint,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    async fn round_trip(&self, request: TransformRequest) -> Result<Vec<String>, WorkerError> {
        let addr = self.endpoint.to_string();
        let mut stream = TcpStream::connect(&addr)
            .await
            .map_err(|source| WorkerError::Connect {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        let request_id = request.request_id.clone();
        write_message(&mut stream, &Message::Transform(request))
            .await
            .map_err(|e| WorkerError::Io(format!("{:#}", e)))?;

        // An undecodable or truncated reply is the worker's fault, not ours
        let reply = read_message(&mut stream)
            .await
            .map_err(|e| WorkerError::Malformed(format!("{:#}", e)))?;

        match reply {
            Message::Transformed(resp) if resp.request_id == request_id => Ok(resp.records),
            Message::Transformed(resp) => Err(WorkerError::Malformed(format!(
                "reply for request {} while waiting for {}",
                resp.request_id, request_id
            ))),
            Message::Error(err) => Err(WorkerError::Remote(format!("{}: {}", err.node_id, err.error))),
            other => Err(WorkerError::Malformed(format!("unexpected message {:?}", other))),
        }
    }
}

#[async_trait]
impl WorkerExecutor for RemoteWorker {
    type Record = String;
    type Params = CutArgs;

    fn endpoint(&self) -> &WorkerEndpoint {
        &self.endpoint
    }

    async fn transform(
        &self,
        shard: Vec<String>,
        params: Arc<CutArgs>,
    ) -> Result<Vec<String>, WorkerError> {
        let request = TransformRequest {
            protocol_version: PROTOCOL_VERSION,
            request_id: uuid::Uuid::new_v4().to_string(),
            records: shard,
            args: (*params).clone(),
        };

        tracing::debug!(
            endpoint = %self.endpoint,
            request_id = %request.request_id,
            records = request.records.len(),
            "sending transform request"
        );

        match tokio::time::timeout(self.request_timeout, self.round_trip(request)).await {
            Ok(result) => result,
            Err(_) => Err(WorkerError::Timeout(self.request_timeout.as_millis() as u64)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn args() -> Arc<CutArgs> {
        Arc::new(CutArgs::new("1", ",", false).unwrap())
    }

    async fn listener() -> (TcpListener, WorkerEndpoint) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, WorkerEndpoint::new("127.0.0.1", port))
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to get a port nobody listens on
        let (listener, endpoint) = listener().await;
        drop(listener);

        let err = RemoteWorker::new(endpoint)
            .transform(vec!["a".to_string()], args())
            .await
            .unwrap_err();

        assert!(matches!(err, WorkerError::Connect { .. }));
    }

    #[tokio::test]
    async fn test_error_reply_is_remote_failure() {
        let (listener, endpoint) = listener().await;

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request_id = match read_message(&mut stream).await.unwrap() {
                Message::Transform(req) => req.request_id,
                other => panic!("unexpected {:?}", other),
            };
            let reply = Message::Error(ErrorMessage {
                node_id: "w1".to_string(),
                request_id,
                error: "bad input".to_string(),
            });
            write_message(&mut stream, &reply).await.unwrap();
        });

        let err = RemoteWorker::new(endpoint)
            .transform(vec!["a".to_string()], args())
            .await
            .unwrap_err();

        assert!(matches!(err, WorkerError::Remote(ref m) if m.contains("bad input")));
    }

    #[tokio::test]
    async fn test_garbage_reply_is_malformed() {
        use tokio::io::AsyncWriteExt;

        let (listener, endpoint) = listener().await;

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let _ = read_message(&mut stream).await.unwrap();
            stream.write_all(&2u32.to_le_bytes()).await.unwrap();
            stream.write_all(&[0xc1, 0xc1]).await.unwrap();
        });

        let err = RemoteWorker::new(endpoint)
            .transform(vec!["a".to_string()], args())
            .await
            .unwrap_err();

        assert!(matches!(err, WorkerError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_silent_worker_times_out() {
        let (listener, endpoint) = listener().await;

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(stream);
        });

        let err = RemoteWorker::new(endpoint)
            .with_request_timeout(Duration::from_millis(100))
            .transform(vec!["a".to_string()], args())
            .await
            .unwrap_err();

        assert!(matches!(err, WorkerError::Timeout(100)));
        server.abort();
    }
}
