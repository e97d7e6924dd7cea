use actix_web::{web, HttpResponse, Responder};
use common::model::column::{ColumnCheck, ColumnKind, DatasetSummary, SheetSummary};
use common::model::dataset::{CellValue, Dataset, Sheet};

use crate::session::state::SessionState;

const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

/// `GET /api/data_sources/spreadsheet`: overview of the active dataset.
pub(crate) async fn process(session: web::Data<SessionState>) -> impl Responder {
    match session.dataset().await {
        Some(dataset) => HttpResponse::Ok().json(summarize(&dataset)),
        None => HttpResponse::NotFound().body("No dataset loaded"),
    }
}

/// `GET /api/data_sources/spreadsheet/sheets/{sheet}`: every row of one sheet.
pub(crate) async fn sheet_rows(
    sheet_name: web::Path<String>,
    session: web::Data<SessionState>,
) -> impl Responder {
    let Some(dataset) = session.dataset().await else {
        return HttpResponse::NotFound().body("No dataset loaded");
    };
    match dataset.sheet(&sheet_name) {
        Some(sheet) => HttpResponse::Ok().json(sheet),
        None => HttpResponse::NotFound().body(format!("Sheet not found: {}", sheet_name)),
    }
}

pub fn summarize(dataset: &Dataset) -> DatasetSummary {
    DatasetSummary {
        file_name: dataset.file_name.clone(),
        md5: dataset.md5.clone(),
        sheets: dataset.sheets.iter().map(summarize_sheet).collect(),
    }
}

fn summarize_sheet(sheet: &Sheet) -> SheetSummary {
    let first = sheet.rows.first();
    let columns = sheet
        .columns
        .iter()
        .map(|title| {
            let sample = first.and_then(|row| row.get(title));
            ColumnCheck {
                title: title.clone(),
                kind: sample.map(infer_kind).unwrap_or(ColumnKind::Text),
                first_row: sample.map(|v| v.to_string()),
            }
        })
        .collect();

    SheetSummary {
        name: sheet.name.clone(),
        row_count: sheet.rows.len(),
        columns,
    }
}

/// Guesses what a column holds from one sample value.
fn infer_kind(value: &CellValue) -> ColumnKind {
    let text = match value {
        CellValue::Number(_) => return ColumnKind::Number,
        CellValue::Text(s) => s.trim(),
    };
    if text.contains('@') && text.contains('.') {
        ColumnKind::Email
    } else if text.chars().any(|ch| CURRENCY_SYMBOLS.contains(&ch)) {
        ColumnKind::Currency
    } else if text.parse::<f64>().is_ok() {
        ColumnKind::Number
    } else {
        ColumnKind::Text
    }
}
