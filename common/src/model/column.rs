use serde::{Deserialize, Serialize};

/// Kind of data a column appears to hold, guessed from its first data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Text,
    Number,
    Currency,
    Email,
}

/// Represents the inferred profile of a single sheet column.
///
/// When a spreadsheet is uploaded, the backend (`data_sources::spreadsheet::summary`)
/// looks at the header and the first data row of every sheet to guess what each column
/// holds. Clients use it to offer sensible columns when binding a field, and to show the
/// user a concrete sample value next to each column name.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ColumnCheck {
    /// The column header exactly as it appears in the sheet.
    pub title: String,
    /// Kind inferred from the first data row.
    pub kind: ColumnKind,
    /// The value of this column in the first data row, if the sheet has one.
    pub first_row: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct SheetSummary {
    pub name: String,
    pub row_count: usize,
    pub columns: Vec<ColumnCheck>,
}

/// Overview of the active dataset returned by `GET /api/data_sources/spreadsheet`.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct DatasetSummary {
    pub file_name: String,
    pub md5: String,
    pub sheets: Vec<SheetSummary>,
}
