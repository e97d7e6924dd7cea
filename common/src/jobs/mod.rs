use serde::{Deserialize, Serialize};

/// Lifecycle of a background job, as reported by `GET /api/certificates/status/{job_id}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    /// Percentage of rows exported so far.
    InProgress(u32),
    Completed(String),
    Failed(String),
}
