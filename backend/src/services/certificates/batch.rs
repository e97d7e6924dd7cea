//! # Batch Export Service
//!
//! `POST /api/certificates/batch` renders one certificate per row of a sheet as a
//! background job; `GET /api/certificates/status/{job_id}` reports its progress.
//!
//! ## Workflow
//!
//! 1.  **HTTP Request**: `process` receives a `BatchExportRequest` naming the sheet. The
//!     active template, the dataset and the sheet are checked and snapshotted before the
//!     job exists, so a bad request fails synchronously.
//! 2.  **Job Scheduling**: the job is registered as `Pending` in `JobsState` and its id
//!     is returned immediately.
//! 3.  **Background Processing**: `export_rows` runs under `spawn_blocking`. Fonts are
//!     loaded once; every row becomes the selected record of its own layout and is
//!     written to `<output_dir>/<job_id>/certificate-<row number>.pdf`.
//! 4.  **Progress Reporting**: after each row the worker sends an `InProgress`
//!     percentage through the job controller's channel, then `Completed` or `Failed`.

use actix_web::{web, HttpResponse, Responder};
use common::jobs::JobStatus;
use common::model::dataset::{Dataset, Sheet};
use common::model::selection::SelectedRecord;
use common::model::template::Template;
use common::requests::{BatchExportRequest, JobStartedResponse};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::error::{ExportError, ValidationError};
use crate::job_controller::state::{JobUpdate, JobsState};
use crate::services::certificates::export::{layout_families, write_certificate};
use crate::services::certificates::pdf::FontSet;
use crate::services::certificates::render::layout;
use crate::services::certificates::resolve::SheetBinding;
use crate::session::state::SessionState;

/// Everything a batch job needs, captured when the request arrives.
struct BatchInput {
    template: Template,
    dataset: Arc<Dataset>,
    sheet_name: String,
    mode: SheetBinding,
    fonts_dir: PathBuf,
    output_dir: PathBuf,
}

impl BatchInput {
    fn sheet(&self) -> Option<&Sheet> {
        self.dataset.sheet(&self.sheet_name)
    }
}

/// Actix web handler for `POST /api/certificates/batch`.
pub(crate) async fn process(
    jobs: web::Data<JobsState>,
    session: web::Data<SessionState>,
    config: web::Data<Config>,
    payload: web::Json<BatchExportRequest>,
) -> impl Responder {
    let Some(template) = session.active_template().await else {
        return HttpResponse::NotFound().body(ExportError::NoTemplate.to_string());
    };
    let Some(dataset) = session.dataset().await else {
        return HttpResponse::BadRequest().body(ValidationError::NoDataset.to_string());
    };
    let sheet_name = payload.into_inner().sheet_name;
    if dataset.sheet(&sheet_name).is_none() {
        return HttpResponse::NotFound().body(ValidationError::UnknownSheet(sheet_name).to_string());
    }

    let input = BatchInput {
        template,
        dataset,
        sheet_name,
        mode: config.sheet_binding(),
        fonts_dir: config.fonts_dir.clone(),
        output_dir: config.output_dir.clone(),
    };
    let job_id = schedule_batch_job(&jobs, input).await;
    HttpResponse::Accepted().json(JobStartedResponse { job_id })
}

/// Actix web handler for `GET /api/certificates/status/{job_id}`.
pub(crate) async fn status(
    jobs: web::Data<JobsState>,
    job_id: web::Path<String>,
) -> impl Responder {
    match jobs.status(&job_id).await {
        Some(status) => HttpResponse::Ok().json(status),
        None => HttpResponse::NotFound().body(format!("Job not found: {}", job_id)),
    }
}

async fn schedule_batch_job(jobs: &JobsState, input: BatchInput) -> String {
    let job_id = jobs.register().await;
    let tx = jobs.tx.clone();
    let id = job_id.clone();

    tokio::spawn(async move {
        let worker_tx = tx.clone();
        let worker_id = id.clone();
        let handle =
            tokio::task::spawn_blocking(move || export_rows(&worker_tx, &worker_id, &input));

        let status = match handle.await {
            Ok(Ok(count)) => {
                info!("Batch {} exported {} certificate(s)", id, count);
                JobStatus::Completed(format!("Exported {} certificate(s)", count))
            }
            Ok(Err(e)) => {
                error!("Batch {} failed: {}", id, e);
                JobStatus::Failed(e)
            }
            Err(e) => JobStatus::Failed(format!("Task join error: {}", e)),
        };
        let _ = tx.send(JobUpdate { job_id: id, status }).await;
    });

    job_id
}

/// Percentage of `done` out of `total`, rounded down.
fn progress(done: usize, total: usize) -> u32 {
    if total == 0 {
        100
    } else {
        (done * 100 / total) as u32
    }
}

/// Renders every row of the requested sheet. Returns how many certificates were written.
fn export_rows(
    tx: &mpsc::Sender<JobUpdate>,
    job_id: &str,
    input: &BatchInput,
) -> Result<usize, String> {
    let report = |status: JobStatus| {
        let _ = tx.blocking_send(JobUpdate {
            job_id: job_id.to_string(),
            status,
        });
    };
    report(JobStatus::InProgress(0));

    let sheet = input
        .sheet()
        .ok_or_else(|| ValidationError::UnknownSheet(input.sheet_name.clone()).to_string())?;
    let job_dir = job_directory(&input.output_dir, job_id);

    let empty = layout(&input.template, None, input.mode);
    let fonts =
        FontSet::load(&input.fonts_dir, layout_families(&empty)).map_err(|e| e.to_string())?;

    let total = sheet.rows.len();
    for (row_index, data) in sheet.rows.iter().enumerate() {
        let record = SelectedRecord {
            sheet_name: sheet.name.clone(),
            row_index,
            data: data.clone(),
        };
        let page = layout(&input.template, Some(&record), input.mode);
        write_certificate(&page, &fonts, &job_dir, &row_file_name(row_index))
            .map_err(|e| format!("Row {}: {}", row_index + 1, e))?;
        report(JobStatus::InProgress(progress(row_index + 1, total)));
    }
    Ok(total)
}

fn row_file_name(row_index: usize) -> String {
    format!("certificate-{}.pdf", row_index + 1)
}

/// Directory a batch job writes to.
pub fn job_directory(output_dir: &Path, job_id: &str) -> PathBuf {
    output_dir.join(job_id)
}
