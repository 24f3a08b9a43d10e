//! Quorum dispatcher
//!
//! Ties the pieces together: partition the records, start one task per shard,
//! then hand the outcome channel to the collector.
//!
//! The channel is bounded to the number of dispatched shards. Each task sends
//! exactly one outcome, so a send can never wait, even after the collector has
//! returned and nobody reads the channel anymore.

use super::cancel::CancelScope;
use super::executor::{Outcome, WorkerEndpoint, WorkerExecutor};
use super::partition::partition;
use super::quorum::{collect, DispatchError};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Scatter-gather dispatcher over a fixed set of workers
pub struct QuorumDispatcher<E: WorkerExecutor> {
    workers: Vec<Arc<E>>,
}

impl<E: WorkerExecutor> QuorumDispatcher<E> {
    /// Create a dispatcher; worker order decides shard assignment
    pub fn new(workers: Vec<E>) -> Result<Self> {
        if workers.is_empty() {
            anyhow::bail!("No workers specified for dispatch");
        }

        Ok(Self {
            workers: workers.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &WorkerEndpoint> {
        self.workers.iter().map(|w| w.endpoint())
    }

    /// Transform `records` on the workers and return once a majority replied
    ///
    /// The result holds the records of the successful shards in the order the
    /// shards arrived, which is not necessarily input order. Shards that had
    /// not answered when quorum was reached are left out.
    pub async fn execute(
        &self,
        records: Vec<E::Record>,
        params: E::Params,
        scope: &CancelScope,
    ) -> Result<Vec<E::Record>, DispatchError> {
        let shards = partition(records, self.workers.len());
        if shards.is_empty() {
            tracing::debug!("no records, nothing to dispatch");
            return Ok(Vec::new());
        }

        let count = shards.len();
        let (tx, rx) = mpsc::channel(count);
        let params = Arc::new(params);

        tracing::debug!(shards = count, workers = self.workers.len(), "dispatching shards");

        for (shard, worker) in shards.into_iter().zip(&self.workers) {
            let worker = Arc::clone(worker);
            let params = Arc::clone(&params);
            let tx = tx.clone();

            tokio::spawn(async move {
                let endpoint = worker.endpoint().clone();
                let shard_len = shard.len();
                tracing::debug!(%endpoint, records = shard_len, "sending shard");

                let outcome: Outcome<E::Record> = worker.transform(shard, params).await.into();
                if let Outcome::Failure(ref err) = outcome {
                    tracing::debug!(%endpoint, error = %err, "shard call failed");
                }

                // Err only means the collector is done with this dispatch
                if tx.send(outcome).await.is_err() {
                    tracing::debug!(%endpoint, "outcome arrived after dispatch finished");
                }
            });
        }

        // Keep only the task-held senders so a closed channel means every task is gone
        drop(tx);

        collect(rx, count, scope).await
    }
}
