//! quorumcut - cut(1) over a quorum of remote workers
//!
//! quorumcut splits line-oriented input into shards, sends each shard to a
//! remote worker for field selection, and prints the result as soon as a
//! majority of workers has answered.
//!
//! # Architecture
//!
//! - **Quorum dispatch**: partitioning, per-shard fan-out, majority fan-in and
//!   deadline/cancellation handling, generic over the worker capability
//! - **Cut transform**: the per-line field selection workers apply
//! - **Distributed mode**: TCP protocol, remote worker client, worker service
//! - **Configuration**: CLI flags, TOML files, validation

pub mod config;
pub mod cut;
pub mod dispatch;
pub mod distributed;

// Re-export commonly used types
pub use config::Config;
pub use cut::CutArgs;
pub use dispatch::{CancelScope, DispatchError, QuorumDispatcher, WorkerExecutor};

/// Result type used throughout quorumcut
pub type Result<T> = anyhow::Result<T>;
