//! Certificate rendering: field resolution, layout, PDF painting and export.
//!
//! - `resolve`: what text each field shows for the selected record.
//! - `render`: the format-independent paint list (`CertificateLayout`).
//! - `pdf`: paints a layout into a single-page PDF with `genpdf`.
//! - `export`: single certificate export to the output directory.
//! - `batch`: one certificate per row of a sheet, as a background job.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod batch;
pub mod export;
pub mod pdf;
pub mod render;
pub mod resolve;

const API_PATH: &str = "/api/certificates";

/// Configures and returns the Actix `Scope` for all certificate routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/preview", get().to(render::preview))
        .route("/export", post().to(export::process))
        .route("/batch", post().to(batch::process))
        .route("/status/{job_id}", get().to(batch::status))
}
