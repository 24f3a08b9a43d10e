//! Quorum collection
//!
//! The collector consumes shard outcomes in arrival order and stops as soon as
//! the result is decided:
//!
//! ```text
//!            Success, successes >= quorum
//!   Running ─────────────────────────────▶ Succeeded
//!      │
//!      ├── Failure, remaining < quorum ──▶ Failed(QuorumUnreachable)
//!      │
//!      └── scope fired ──────────────────▶ Failed(Cancelled)
//! ```
//!
//! Quorum counters live in a [`QuorumState`] owned by the single collecting
//! task. Producers only ever send outcomes; they never see the counters.

use super::cancel::{CancelReason, CancelScope};
use super::executor::Outcome;
use super::partition::required_quorum;
use thiserror::Error;
use tokio::sync::mpsc;

/// Terminal errors of a dispatch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Too many shards failed for a majority to remain possible
    #[error("no quorum: {failed} of {total} workers failed, {succeeded} succeeded, {required} required")]
    QuorumUnreachable {
        succeeded: usize,
        failed: usize,
        total: usize,
        required: usize,
    },

    /// The cancel scope fired before quorum was reached
    #[error("dispatch aborted before quorum: {0}")]
    Cancelled(CancelReason),
}

/// Decision after recording one outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Pending,
    Reached,
    Unreachable,
}

/// Quorum counters for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuorumState {
    initial_workers: usize,
    remaining_workers: usize,
    success_count: usize,
    required_quorum: usize,
}

impl QuorumState {
    /// Counters for `workers` dispatched shards; the quorum is fixed here
    pub fn new(workers: usize) -> Self {
        Self {
            initial_workers: workers,
            remaining_workers: workers,
            success_count: 0,
            required_quorum: required_quorum(workers),
        }
    }

    pub fn required_quorum(&self) -> usize {
        self.required_quorum
    }

    pub fn remaining_workers(&self) -> usize {
        self.remaining_workers
    }

    pub fn success_count(&self) -> usize {
        self.success_count
    }

    pub fn failure_count(&self) -> usize {
        self.initial_workers - self.remaining_workers
    }

    /// Count a successful shard
    pub fn record_success(&mut self) -> Progress {
        self.success_count += 1;
        if self.success_count >= self.required_quorum {
            Progress::Reached
        } else {
            Progress::Pending
        }
    }

    /// Count a failed shard
    pub fn record_failure(&mut self) -> Progress {
        self.remaining_workers = self.remaining_workers.saturating_sub(1);
        if self.remaining_workers < self.required_quorum {
            Progress::Unreachable
        } else {
            Progress::Pending
        }
    }

    /// Give up on every worker that has not answered yet
    fn abandon_outstanding(&mut self) {
        self.remaining_workers = self.success_count;
    }

    fn unreachable(&self) -> DispatchError {
        DispatchError::QuorumUnreachable {
            succeeded: self.success_count,
            failed: self.failure_count(),
            total: self.initial_workers,
            required: self.required_quorum,
        }
    }
}

/// Collect outcomes until quorum is decided or `scope` fires
///
/// `workers` is the number of shards that were dispatched. Successful shards
/// are appended in arrival order. Returns without draining the channel; late
/// outcomes land in the channel buffer and are dropped with it.
pub async fn collect<R>(
    mut outcomes: mpsc::Receiver<Outcome<R>>,
    workers: usize,
    scope: &CancelScope,
) -> Result<Vec<R>, DispatchError> {
    let mut state = QuorumState::new(workers);
    let mut accumulated = Vec::new();

    tracing::debug!(
        workers,
        required = state.required_quorum(),
        "collecting shard outcomes"
    );

    loop {
        let outcome = tokio::select! {
            reason = scope.fired() => {
                tracing::warn!(
                    %reason,
                    succeeded = state.success_count(),
                    required = state.required_quorum(),
                    "dispatch cancelled before quorum"
                );
                return Err(DispatchError::Cancelled(reason));
            }
            outcome = outcomes.recv() => outcome,
        };

        let progress = match outcome {
            Some(Outcome::Success(mut records)) => {
                accumulated.append(&mut records);
                state.record_success()
            }
            Some(Outcome::Failure(err)) => {
                tracing::warn!(error = %err, "shard failed");
                state.record_failure()
            }
            None => {
                // Every producer is gone; nothing else can arrive
                tracing::warn!("outcome channel closed before quorum");
                state.abandon_outstanding();
                Progress::Unreachable
            }
        };

        match progress {
            Progress::Pending => continue,
            Progress::Reached => {
                tracing::info!(
                    succeeded = state.success_count(),
                    failed = state.failure_count(),
                    outstanding = workers - state.success_count() - state.failure_count(),
                    records = accumulated.len(),
                    "quorum reached"
                );
                return Ok(accumulated);
            }
            Progress::Unreachable => {
                let err = state.unreachable();
                tracing::info!(error = %err, "quorum unreachable");
                return Err(err);
            }
        }
    }
}
