use actix_web::{web, HttpResponse, Responder};
use common::model::dataset::Dataset;
use common::model::selection::SelectedRecord;
use common::requests::SelectRowRequest;
use log::debug;

use crate::error::ValidationError;
use crate::session::state::SessionState;

/// `POST /api/data_sources/spreadsheet/select`: makes one row the selected record.
pub(crate) async fn process(
    session: web::Data<SessionState>,
    req: web::Json<SelectRowRequest>,
) -> impl Responder {
    let result = match session.dataset().await {
        Some(dataset) => select_row(&dataset, &req.sheet_name, req.row_index),
        None => Err(ValidationError::NoDataset),
    };
    match result {
        Ok(record) => {
            debug!("Selected row {} of '{}'", record.row_index, record.sheet_name);
            session.select(record.clone()).await;
            HttpResponse::Ok().json(record)
        }
        Err(e) => HttpResponse::NotFound().body(e.to_string()),
    }
}

/// `POST /api/data_sources/spreadsheet/select_sheet/{sheet}`: selects the first row of a
/// sheet. An empty sheet leaves the current selection alone and answers `204`.
pub(crate) async fn select_sheet_process(
    sheet_name: web::Path<String>,
    session: web::Data<SessionState>,
) -> impl Responder {
    let result = match session.dataset().await {
        Some(dataset) => select_sheet(&dataset, &sheet_name),
        None => Err(ValidationError::NoDataset),
    };
    match result {
        Ok(Some(record)) => {
            session.select(record.clone()).await;
            HttpResponse::Ok().json(record)
        }
        Ok(None) => HttpResponse::NoContent().finish(),
        Err(e) => HttpResponse::NotFound().body(e.to_string()),
    }
}

/// `GET /api/data_sources/spreadsheet/selected`
pub(crate) async fn selected_process(session: web::Data<SessionState>) -> impl Responder {
    match session.selected().await {
        Some(record) => HttpResponse::Ok().json(record),
        None => HttpResponse::NotFound().body("No record selected"),
    }
}

/// Snapshots row `row_index` of `sheet_name`.
pub fn select_row(
    dataset: &Dataset,
    sheet_name: &str,
    row_index: usize,
) -> Result<SelectedRecord, ValidationError> {
    let sheet = dataset
        .sheet(sheet_name)
        .ok_or_else(|| ValidationError::UnknownSheet(sheet_name.to_string()))?;
    let row = sheet
        .row(row_index)
        .ok_or_else(|| ValidationError::RowOutOfRange {
            sheet_name: sheet_name.to_string(),
            row_index,
        })?;
    Ok(SelectedRecord {
        sheet_name: sheet.name.clone(),
        row_index,
        data: row.clone(),
    })
}

/// First row of `sheet_name`, or `None` when the sheet has no data rows.
pub fn select_sheet(
    dataset: &Dataset,
    sheet_name: &str,
) -> Result<Option<SelectedRecord>, ValidationError> {
    let sheet = dataset
        .sheet(sheet_name)
        .ok_or_else(|| ValidationError::UnknownSheet(sheet_name.to_string()))?;
    if sheet.rows.is_empty() {
        return Ok(None);
    }
    select_row(dataset, sheet_name, 0).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::dataset::{CellValue, Row, Sheet};

    fn dataset() -> Dataset {
        let mut row = Row::new();
        row.insert("Name".to_string(), CellValue::from("Ana"));
        Dataset {
            file_name: "d.xlsx".to_string(),
            md5: String::new(),
            sheets: vec![
                Sheet {
                    name: "Students".to_string(),
                    columns: vec!["Name".to_string()],
                    rows: vec![row],
                },
                Sheet {
                    name: "Teachers".to_string(),
                    columns: vec!["Name".to_string()],
                    rows: vec![],
                },
            ],
        }
    }

    #[test]
    fn selecting_a_row_snapshots_its_data() {
        let record = select_row(&dataset(), "Students", 0).unwrap();
        assert_eq!(record.sheet_name, "Students");
        assert_eq!(record.data["Name"], CellValue::from("Ana"));
    }

    #[test]
    fn invalid_selections_are_rejected() {
        assert_eq!(
            select_row(&dataset(), "Students", 1),
            Err(ValidationError::RowOutOfRange {
                sheet_name: "Students".to_string(),
                row_index: 1
            })
        );
        assert_eq!(
            select_row(&dataset(), "Parents", 0),
            Err(ValidationError::UnknownSheet("Parents".to_string()))
        );
    }

    #[test]
    fn selecting_a_sheet_picks_its_first_row() {
        let record = select_sheet(&dataset(), "Students").unwrap().unwrap();
        assert_eq!(record.row_index, 0);
        assert_eq!(select_sheet(&dataset(), "Teachers"), Ok(None));
    }
}
