//! Spreadsheet data source: upload, inspection, search and record selection.
//!
//! The provided routes are:
//! - `POST /api/data_sources/spreadsheet/upload`: multipart upload with a `file` part.
//!   The file is parsed by `load` and, on success, replaces the active dataset (and
//!   clears the selected record). A failed parse leaves everything as it was.
//! - `GET /api/data_sources/spreadsheet`: summary of the active dataset, with inferred
//!   column kinds and a first-row sample per column.
//! - `GET /api/data_sources/spreadsheet/sheets/{sheet}`: rows of one sheet.
//! - `POST /api/data_sources/spreadsheet/search`: substring search across all sheets.
//! - `POST /api/data_sources/spreadsheet/select`: select a row by sheet and index.
//! - `POST /api/data_sources/spreadsheet/select_sheet/{sheet}`: select a sheet's first row.
//! - `GET /api/data_sources/spreadsheet/selected`: the currently selected record.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

pub mod load;
pub mod search;
pub mod select;
pub mod summary;
mod upload;

const API_PATH: &str = "/api/data_sources/spreadsheet";

/// Configures and returns the Actix scope for spreadsheet data source routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(summary::process))
        .route("/upload", post().to(upload::process))
        .route("/sheets/{sheet}", get().to(summary::sheet_rows))
        .route("/search", post().to(search::process))
        .route("/select", post().to(select::process))
        .route("/select_sheet/{sheet}", post().to(select::select_sheet_process))
        .route("/selected", get().to(select::selected_process))
}
