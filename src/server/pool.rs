//! Bounded worker pool.
//!
//! A fixed number of worker tasks share the receiving end of a bounded
//! queue. Each worker takes one job at a time and runs it to completion, so
//! at most `size` connections are served concurrently and at most
//! `queue_depth` more wait their turn.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

/// A unit of work: serving one connection.
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// What to do with a new connection when the queue is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Stop accepting until a slot frees up.
    #[default]
    Block,
    /// Close the new connection immediately.
    Reject,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("connection queue is full")]
    Full,
    #[error("worker pool is shut down")]
    Closed,
}

pub struct WorkerPool {
    sender: mpsc::Sender<Job>,
    workers: Vec<JoinHandle<()>>,
    policy: OverflowPolicy,
}

impl WorkerPool {
    /// Spawns `size` workers behind a queue of `queue_depth` pending jobs.
    /// Both are raised to at least one.
    pub fn new(size: usize, queue_depth: usize, policy: OverflowPolicy) -> Self {
        let (sender, receiver) = mpsc::channel(queue_depth.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size.max(1))
            .map(|id| tokio::spawn(worker_loop(id, Arc::clone(&receiver))))
            .collect();

        Self {
            sender,
            workers,
            policy,
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Queues a job according to the overflow policy.
    ///
    /// A rejected job is dropped, which closes whatever connection it owns.
    pub async fn submit(&self, job: Job) -> Result<(), SubmitError> {
        match self.policy {
            OverflowPolicy::Block => self
                .sender
                .send(job)
                .await
                .map_err(|_| SubmitError::Closed),
            OverflowPolicy::Reject => self.sender.try_send(job).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => SubmitError::Full,
                mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
            }),
        }
    }

    /// Closes the queue and waits for queued and running jobs to finish.
    pub async fn shutdown(self) {
        drop(self.sender);
        for worker in self.workers {
            if let Err(e) = worker.await {
                tracing::error!(error = %e, "Worker exited abnormally");
            }
        }
    }
}

async fn worker_loop(id: usize, receiver: Arc<Mutex<mpsc::Receiver<Job>>>) {
    loop {
        // Hold the lock only while waiting for the next job.
        let job = { receiver.lock().await.recv().await };

        match job {
            Some(job) => {
                // Run on a separate task so a panic only loses this connection.
                if let Err(e) = tokio::spawn(job).await {
                    tracing::error!(worker = id, error = %e, "Connection task failed");
                }
            }
            None => {
                tracing::debug!(worker = id, "Queue closed, worker exiting");
                break;
            }
        }
    }
}
