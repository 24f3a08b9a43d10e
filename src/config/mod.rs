//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.

pub mod cli;
pub mod toml;
pub mod validator;

use crate::dispatch::WorkerEndpoint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Upper bound on the number of workers a coordinator may use
pub const MAX_WORKERS: usize = 20;

/// Complete coordinator configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Worker endpoints, in shard assignment order
    #[serde(default)]
    pub workers: Vec<WorkerEndpoint>,
    /// Number of workers to use (defaults to all listed)
    #[serde(default)]
    pub worker_count: Option<usize>,
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
}

impl Config {
    /// Number of workers a dispatch will use
    pub fn effective_worker_count(&self) -> usize {
        self.worker_count.unwrap_or(self.workers.len())
    }

    /// Endpoints a dispatch will use
    ///
    /// Only meaningful after validation, which guarantees enough are listed.
    pub fn active_workers(&self) -> &[WorkerEndpoint] {
        let count = self.effective_worker_count().min(self.workers.len());
        &self.workers[..count]
    }
}

/// Coordinator timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Deadline for a whole dispatch, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Bound on one worker round trip, in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl CoordinatorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Workers: {} of {} listed", self.effective_worker_count(), self.workers.len())?;
        for (i, worker) in self.active_workers().iter().enumerate() {
            writeln!(f, "  [{}] {}", i, worker)?;
        }
        writeln!(f, "Quorum: {}", crate::dispatch::partition::required_quorum(self.effective_worker_count()))?;
        writeln!(f, "Timeout: {}s", self.coordinator.timeout_secs)?;
        write!(f, "Request timeout: {}ms", self.coordinator.request_timeout_ms)
    }
}
