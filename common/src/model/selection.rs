use crate::model::dataset::Row;
use serde::{Deserialize, Serialize};

/// A row found by the dataset search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub sheet_name: String,
    /// 0-based index of the row within its sheet (header excluded).
    pub row_index: usize,
    pub data: Row,
}

/// The one row currently driving field resolution.
///
/// `data` is a snapshot taken at selection time; it stays valid even if the dataset it
/// came from is replaced by a new upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedRecord {
    pub sheet_name: String,
    pub row_index: usize,
    pub data: Row,
}

impl From<SearchResult> for SelectedRecord {
    fn from(result: SearchResult) -> Self {
        SelectedRecord {
            sheet_name: result.sheet_name,
            row_index: result.row_index,
            data: result.data,
        }
    }
}
