//! Mock worker for testing
//!
//! [`MockWorker`] implements [`WorkerExecutor`] in-process. It applies the real
//! cut transform to the shard it receives, so results match what a worker
//! service would return, but its behaviour can be scripted to fail, stall or
//! never answer. Every received shard is recorded for later inspection.
//!
//! # Example
//!
//! ```
//! use quorumcut::dispatch::mock::{MockBehavior, MockWorker};
//! use quorumcut::dispatch::WorkerExecutor;
//! use std::time::Duration;
//!
//! let slow = MockWorker::new(0).with_behavior(MockBehavior::Delay(Duration::from_millis(50)));
//! let broken = MockWorker::new(1).with_behavior(MockBehavior::Fail("disk full".to_string()));
//! assert_eq!(slow.calls(), 0);
//! assert_eq!(broken.endpoint().port, 1);
//! ```

use super::executor::{WorkerEndpoint, WorkerError, WorkerExecutor};
use crate::cut::CutArgs;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How a mock worker answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBehavior {
    /// Cut the shard and return it immediately
    Respond,
    /// Wait, then cut and return the shard
    Delay(Duration),
    /// Return `WorkerError::Remote` with this message
    Fail(String),
    /// Wait, then fail
    FailAfter(Duration, String),
    /// Never answer
    Hang,
}

/// Scriptable in-process worker
#[derive(Clone)]
pub struct MockWorker {
    endpoint: WorkerEndpoint,
    behavior: MockBehavior,

    /// Shards received, in call order
    received: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockWorker {
    /// Mock worker at `mock:<id>`
    pub fn new(id: u16) -> Self {
        Self {
            endpoint: WorkerEndpoint::new("mock", id),
            behavior: MockBehavior::Respond,
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_behavior(mut self, behavior: MockBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Number of transform calls seen so far
    pub fn calls(&self) -> usize {
        self.received.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Copy of every shard received so far
    pub fn received(&self) -> Vec<Vec<String>> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl WorkerExecutor for MockWorker {
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
        if let Ok(mut received) = self.received.lock() {
            received.push(shard.clone());
        }

        match &self.behavior {
            MockBehavior::Respond => Ok(params.cut_records(&shard)),
            MockBehavior::Delay(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(params.cut_records(&shard))
            }
            MockBehavior::Fail(msg) => Err(WorkerError::Remote(msg.clone())),
            MockBehavior::FailAfter(delay, msg) => {
                tokio::time::sleep(*delay).await;
                Err(WorkerError::Remote(msg.clone()))
            }
            MockBehavior::Hang => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Arc<CutArgs> {
        Arc::new(CutArgs::new("1", ",", false).unwrap())
    }

    #[tokio::test]
    async fn test_mock_responds_with_cut() {
        let worker = MockWorker::new(1);
        let out = worker
            .transform(vec!["a,b".to_string(), "c,d".to_string()], args())
            .await
            .unwrap();

        assert_eq!(out, vec!["a".to_string(), "c".to_string()]);
        assert_eq!(worker.calls(), 1);
        assert_eq!(worker.received()[0].len(), 2);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let worker = MockWorker::new(2).with_behavior(MockBehavior::Fail("Test error".to_string()));
        let err = worker.transform(vec!["x".to_string()], args()).await.unwrap_err();

        assert!(matches!(err, WorkerError::Remote(ref m) if m == "Test error"));
        assert_eq!(worker.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_hang_never_answers() {
        let worker = MockWorker::new(3).with_behavior(MockBehavior::Hang);
        let res = tokio::time::timeout(
            Duration::from_secs(3600),
            worker.transform(vec!["x".to_string()], args()),
        )
        .await;

        assert!(res.is_err());
    }
}
