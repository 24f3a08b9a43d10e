//! Quorum-based scatter-gather dispatch
//!
//! This module implements the core of quorumcut: split an ordered dataset into
//! shards, send each shard to its own worker concurrently, and accept the
//! result once a majority of workers has answered successfully.
//!
//! # Architecture
//!
//! ```text
//! records ──▶ partition ──▶ one task per shard ──▶ mpsc(outcomes) ──▶ collect ──▶ result
//!                             (WorkerExecutor)                          ▲
//!                                                          CancelScope ─┘
//! ```
//!
//! - `partition`: near-equal contiguous shards, remainder in the last one
//! - `dispatcher`: fan-out over a bounded channel sized to the shard count
//! - `quorum`: fan-in state machine (success, unreachable, cancelled)
//! - `cancel`: deadline plus explicit cancellation
//! - `executor`: the worker capability trait and shared types
//! - `mock`: in-process worker for tests

pub mod cancel;
pub mod dispatcher;
pub mod executor;
pub mod mock;
pub mod partition;
pub mod quorum;

pub use cancel::{CancelReason, CancelScope};
pub use dispatcher::QuorumDispatcher;
pub use executor::{Outcome, WorkerEndpoint, WorkerError, WorkerExecutor};
pub use quorum::{DispatchError, QuorumState};
