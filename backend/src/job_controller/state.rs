//! Tracks the state of background certificate batch exports.
//!
//! Exporting a whole sheet renders one PDF per row and can take a while, so it runs
//! outside the request/response cycle (see `services::certificates::batch`).
//!
//! The main components are:
//! - `JobsState`: a clonable, thread-safe holder of every job's latest status. It is
//!   injected into the Actix application state in `main.rs`.
//! - `JobUpdate`: the message a running job sends to report a status change.
//! - `start_job_updater`: a long-running task draining `JobUpdate`s from an MPSC channel
//!   into `JobsState`.

use common::jobs::JobStatus;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};

/// A thread-safe, shareable container for the state of all background jobs.
#[derive(Clone)]
pub struct JobsState {
    /// Job id to latest status. Read by `GET /api/certificates/status/{job_id}`,
    /// written by `start_job_updater` and by `register`.
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,

    /// Sender handed to running jobs so they can report progress without holding the
    /// `jobs` lock themselves.
    pub tx: mpsc::Sender<JobUpdate>,
}

impl JobsState {
    /// Builds the state together with the receiving end for `start_job_updater`.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(buffer);
        let state = JobsState {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }

    /// Registers a new job as `Pending` and returns its id.
    pub async fn register(&self) -> String {
        let job_id = uuid::Uuid::new_v4().to_string();
        self.jobs
            .write()
            .await
            .insert(job_id.clone(), JobStatus::Pending);
        job_id
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }
}

/// A status change for one background job.
#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

/// Applies incoming `JobUpdate`s to the shared `JobsState` until every sender is gone.
///
/// Spawned once from `main.rs`.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        jobs.insert(update.job_id.clone(), update.status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn updates_overwrite_the_registered_status() {
        let (state, rx) = JobsState::new(8);
        tokio::spawn(start_job_updater(state.clone(), rx));

        let job_id = state.register().await;
        assert_eq!(state.status(&job_id).await, Some(JobStatus::Pending));

        state
            .tx
            .send(JobUpdate {
                job_id: job_id.clone(),
                status: JobStatus::InProgress(50),
            })
            .await
            .unwrap();

        for _ in 0..100 {
            if state.status(&job_id).await != Some(JobStatus::Pending) {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(state.status(&job_id).await, Some(JobStatus::InProgress(50)));
        assert_eq!(state.status("missing").await, None);
    }
}
