//! Worker executor abstraction
//!
//! A worker executor is the remote capability the dispatcher fans out to: it
//! receives one shard plus the shared parameters and returns the transformed
//! shard or an error. The dispatcher does not know how the call reaches the
//! worker; `distributed::remote::RemoteWorker` implements it over TCP and
//! `dispatch::mock::MockWorker` implements it in-process for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Address of one worker
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerEndpoint {
    pub host: String,
    pub port: u16,
}

impl WorkerEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse `host:port`
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let (host, port) = s
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| anyhow::anyhow!("Invalid worker address '{}': expected host:port", s))?;

        let port: u16 = port
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid port in worker address '{}'", s))?;

        Ok(Self::new(host, port))
    }
}

impl fmt::Display for WorkerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Failure of a single shard call
///
/// Worker errors never reach the caller of `execute`; the collector counts
/// them against the quorum and logs them.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: WorkerEndpoint,
        #[source]
        source: std::io::Error,
    },

    #[error("transport error: {0}")]
    Io(String),

    #[error("no reply within {0}ms")]
    Timeout(u64),

    #[error("worker reported error: {0}")]
    Remote(String),

    #[error("malformed reply: {0}")]
    Malformed(String),
}

/// Result of one dispatched shard
///
/// Carries no shard identity; the collector only sees what arrived, not where
/// it came from.
#[derive(Debug)]
pub enum Outcome<R> {
    Success(Vec<R>),
    Failure(WorkerError),
}

impl<R> From<Result<Vec<R>, WorkerError>> for Outcome<R> {
    fn from(result: Result<Vec<R>, WorkerError>) -> Self {
        match result {
            Ok(records) => Outcome::Success(records),
            Err(err) => Outcome::Failure(err),
        }
    }
}

/// Remote transform capability for one worker
///
/// Implementations must be stateless with respect to shards: every call is
/// independent and may run concurrently with calls on other workers.
#[async_trait]
pub trait WorkerExecutor: Send + Sync + 'static {
    /// Unit of the dataset
    type Record: Send + 'static;

    /// Parameters shared by every shard of an invocation
    type Params: Send + Sync + 'static;

    /// Endpoint this executor talks to
    fn endpoint(&self) -> &WorkerEndpoint;

    /// Transform one shard
    async fn transform(
        &self,
        shard: Vec<Self::Record>,
        params: Arc<Self::Params>,
    ) -> Result<Vec<Self::Record>, WorkerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint() {
        let ep = WorkerEndpoint::parse("10.0.1.10:8081").unwrap();
        assert_eq!(ep, WorkerEndpoint::new("10.0.1.10", 8081));
        assert_eq!(ep.to_string(), "10.0.1.10:8081");

        assert!(WorkerEndpoint::parse("no-port").is_err());
        assert!(WorkerEndpoint::parse("host:99999").is_err());
    }

    #[test]
    fn test_outcome_from_result() {
        let ok: Outcome<u32> = Ok(vec![1, 2]).into();
        assert!(matches!(ok, Outcome::Success(ref v) if v == &[1, 2]));

        let err: Outcome<u32> = Err(WorkerError::Timeout(10)).into();
        assert!(matches!(err, Outcome::Failure(WorkerError::Timeout(10))));
    }
}
