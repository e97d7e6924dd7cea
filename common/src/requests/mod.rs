use crate::model::column::DatasetSummary;
use serde::{Deserialize, Serialize};

/// Payload of `POST /api/templates/new`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTemplateRequest {
    pub name: String,
}

/// Payload of `POST /api/templates/active/fields/{field_id}/move`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MoveFieldRequest {
    pub x: f64,
    pub y: f64,
}

/// Payload of `POST /api/data_sources/spreadsheet/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

/// Payload of `POST /api/data_sources/spreadsheet/select`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectRowRequest {
    pub sheet_name: String,
    pub row_index: usize,
}

/// Payload of `POST /api/certificates/batch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchExportRequest {
    pub sheet_name: String,
}

/// Response of `POST /api/data_sources/spreadsheet/upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// `true` when the uploaded bytes hash to the same MD5 as the previous upload.
    pub unchanged: bool,
    pub summary: DatasetSummary,
}

/// Response of `POST /api/certificates/batch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStartedResponse {
    pub job_id: String,
}

/// One entry of `GET /api/templates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateListItem {
    pub id: String,
    pub name: String,
    pub field_count: usize,
}
