//! Free-text search across every cell of the active dataset.
//!
//! A row matches when any of its values, as text, contains the query case-insensitively.
//! Results come back in sheet order and then row order; there is no ranking. Rows of one
//! sheet are scanned in parallel with rayon, and the indexed collect keeps them in row
//! order, so the output is the same as a sequential scan.

use actix_web::{web, HttpResponse, Responder};
use common::model::dataset::{Dataset, Row};
use common::model::selection::SearchResult;
use common::requests::SearchRequest;
use log::debug;
use rayon::prelude::*;

use crate::session::state::SessionState;

/// `POST /api/data_sources/spreadsheet/search`
pub(crate) async fn process(
    session: web::Data<SessionState>,
    req: web::Json<SearchRequest>,
) -> impl Responder {
    match session.dataset().await {
        Some(dataset) => {
            let results = search(&dataset, &req.query);
            debug!("Search '{}' matched {} row(s)", req.query, results.len());
            HttpResponse::Ok().json(results)
        }
        None => HttpResponse::NotFound().body("No dataset loaded"),
    }
}

/// Returns every row containing `query`. An empty or whitespace-only query matches
/// nothing.
pub fn search(dataset: &Dataset, query: &str) -> Vec<SearchResult> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();

    dataset
        .sheets
        .iter()
        .flat_map(|sheet| {
            sheet
                .rows
                .par_iter()
                .enumerate()
                .filter(|(_, row)| row_matches(row, &needle))
                .map(|(row_index, row)| SearchResult {
                    sheet_name: sheet.name.clone(),
                    row_index,
                    data: row.clone(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn row_matches(row: &Row, needle: &str) -> bool {
    row.values()
        .any(|value| value.as_text().to_lowercase().contains(needle))
}
