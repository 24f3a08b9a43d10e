//! Networked workers
//!
//! # Architecture
//!
//! quorumcut uses a coordinator-worker architecture:
//!
//! - **Coordinator**: reads the input, runs the quorum dispatcher with one
//!   `RemoteWorker` per configured endpoint, prints the result
//! - **Worker service**: runs on each worker host and applies the cut
//!   transform to the shards it receives
//!
//! # Modules
//!
//! - `protocol`: Message definitions and framing
//! - `remote`: `WorkerExecutor` over TCP (coordinator side)
//! - `worker_service`: TCP server (worker side)

pub mod protocol;
pub mod remote;
pub mod worker_service;

// Re-export key types
pub use protocol::{
    ErrorMessage,
    Message,
    TransformRequest,
    TransformResponse,
    PROTOCOL_VERSION,
};

pub use remote::RemoteWorker;
pub use worker_service::WorkerService;
