// File: src/jobs/mod.rs
//
// Outbound dispatch queue: at-least-once execution of typed job payloads
// with per-job retry policy. Enqueue never blocks the caller; a single
// worker task drains the queue and drives each job through the injected
// handler (the auto-reply worker, webhook sender, campaign sender).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use chatdesk_common::models::{JobOptions, JobPayload};

use crate::Error;

/// Consumes job payloads. Implementations dispatch on the payload variant.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, payload: &JobPayload) -> Result<(), Error>;
}

#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub payload: JobPayload,
    pub options: JobOptions,
}

pub struct JobQueue {
    tx: mpsc::UnboundedSender<QueuedJob>,
    /// Jobs that exhausted their retries with `remove_on_fail = false`.
    failed: Arc<Mutex<Vec<QueuedJob>>>,
    worker: JoinHandle<()>,
}

impl JobQueue {
    /// Starts the worker task and returns the queue handle.
    pub fn spawn(handler: Arc<dyn JobHandler>) -> Arc<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<QueuedJob>();
        let failed: Arc<Mutex<Vec<QueuedJob>>> = Arc::new(Mutex::new(Vec::new()));

        let failed_for_task = Arc::clone(&failed);
        let worker = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                run_job(handler.as_ref(), &job, &failed_for_task).await;
            }
            info!("Job queue worker exited.");
        });

        Arc::new(Self { tx, failed, worker })
    }

    /// Non-blocking: the caller never awaits job completion.
    pub fn enqueue(&self, payload: JobPayload, options: JobOptions) -> Result<(), Error> {
        self.tx
            .send(QueuedJob { payload, options })
            .map_err(|e| Error::Dispatch(format!("job queue closed: {}", e)))
    }

    /// Failed jobs retained for inspection (campaign/schedule sends).
    pub async fn failed_jobs(&self) -> Vec<QueuedJob> {
        self.failed.lock().await.clone()
    }

    pub fn shutdown(&self) {
        self.worker.abort();
    }
}

async fn run_job(handler: &dyn JobHandler, job: &QueuedJob, failed: &Mutex<Vec<QueuedJob>>) {
    let attempts = job.options.attempts.max(1);
    for attempt in 1..=attempts {
        match handler.handle(&job.payload).await {
            Ok(()) => return,
            Err(e) => {
                warn!(
                    "{} job failed (attempt {}/{}): {:?}",
                    job.payload.kind(),
                    attempt,
                    attempts,
                    e
                );
                if attempt < attempts {
                    let delay = job.options.backoff.delay_ms(attempt);
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
            }
        }
    }

    if job.options.remove_on_fail {
        error!(
            "{} job dropped after {} attempt(s)",
            job.payload.kind(),
            attempts
        );
    } else {
        error!(
            "{} job kept for inspection after {} attempt(s)",
            job.payload.kind(),
            attempts
        );
        failed.lock().await.push(job.clone());
    }
}
