//! In-memory job registry
//!
//! Every job is stored behind a `watch` channel so that pollers read a
//! consistent snapshot without blocking, and `wait` can sleep until the job
//! finishes. Each entry is written only by the task running that job.

use super::status::{JobSnapshot, JobStatus};
use chrono::Utc;
use dashmap::DashMap;
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Opaque job identifier
pub type JobId = Uuid;

struct JobEntry {
    state: watch::Sender<JobSnapshot>,

    /// Supervisor task, retained once the job is spawned
    handle: Option<JoinHandle<()>>,
}

/// Registry of crawl jobs, shared by the service surface and the crawl tasks
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<DashMap<JobId, JobEntry>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new `Running` job at 0% and returns its id
    pub fn create(&self, domain: &str) -> JobId {
        let id = Uuid::new_v4();
        let (state, _) = watch::channel(JobSnapshot::running(domain));
        self.jobs.insert(id, JobEntry { state, handle: None });
        tracing::debug!("Created job {} for {}", id, domain);
        id
    }

    /// Raises the progress of a running job
    ///
    /// Lower values than the current progress, updates to finished jobs and
    /// unknown ids are ignored.
    pub fn update(&self, id: JobId, progress: u8) {
        let progress = progress.min(100);
        self.modify(id, |snapshot| {
            if snapshot.status != JobStatus::Running || progress <= snapshot.progress {
                return false;
            }
            snapshot.progress = progress;
            true
        });
    }

    /// Marks a job `Done` at 100%
    pub fn complete(&self, id: JobId) {
        self.finish(id, None);
    }

    /// Marks a job `Done` at 100%, recording why its crawl task died
    pub fn fail(&self, id: JobId, message: impl Into<String>) {
        self.finish(id, Some(message.into()));
    }

    /// Current snapshot of a job; `NotFound` at 0% for unknown ids
    pub fn get(&self, id: JobId) -> JobSnapshot {
        self.jobs
            .get(&id)
            .map(|entry| entry.state.borrow().clone())
            .unwrap_or_else(JobSnapshot::not_found)
    }

    /// `(status, progress)` of a job
    pub fn status(&self, id: JobId) -> (JobStatus, u8) {
        let snapshot = self.get(id);
        (snapshot.status, snapshot.progress)
    }

    /// Resolves once the job is `Done`, returning its final snapshot
    pub async fn wait(&self, id: JobId) -> JobSnapshot {
        let receiver = self.jobs.get(&id).map(|entry| entry.state.subscribe());
        let Some(mut receiver) = receiver else {
            return JobSnapshot::not_found();
        };

        let finished = receiver
            .wait_for(|snapshot| snapshot.status.is_done())
            .await
            .map(|snapshot| snapshot.clone());
        finished.unwrap_or_else(|_| receiver.borrow().clone())
    }

    /// Runs `crawl` in the background under a supervisor
    ///
    /// The supervisor drives the job to `Done` when the crawl returns. If the
    /// crawl task panics, the panic message is recorded on the job and it is
    /// still marked `Done`.
    pub fn spawn<F>(&self, id: JobId, crawl: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let registry = self.clone();
        let supervisor = tokio::spawn(async move {
            match tokio::spawn(crawl).await {
                Ok(()) => registry.complete(id),
                Err(e) if e.is_panic() => {
                    let message = panic_message(e.into_panic());
                    tracing::error!("Crawl job {} panicked: {}", id, message);
                    registry.fail(id, message);
                }
                Err(e) => {
                    tracing::error!("Crawl job {} did not finish: {}", id, e);
                    registry.fail(id, e.to_string());
                }
            }
        });

        if let Some(mut entry) = self.jobs.get_mut(&id) {
            entry.handle = Some(supervisor);
        }
    }

    /// Number of known jobs
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Number of jobs still running
    pub fn running(&self) -> usize {
        self.jobs
            .iter()
            .filter(|entry| entry.state.borrow().status == JobStatus::Running)
            .count()
    }

    fn finish(&self, id: JobId, error: Option<String>) {
        let finished = self.modify(id, |snapshot| {
            if snapshot.status.is_done() {
                return false;
            }
            snapshot.status = JobStatus::Done;
            snapshot.progress = 100;
            snapshot.error = error;
            snapshot.finished_at = Some(Utc::now());
            true
        });
        if finished {
            tracing::info!("Job {} done", id);
        }
    }

    fn modify(&self, id: JobId, change: impl FnOnce(&mut JobSnapshot) -> bool) -> bool {
        match self.jobs.get(&id) {
            Some(entry) => entry.state.send_if_modified(change),
            None => false,
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "crawl task panicked".to_string()
    }
}
