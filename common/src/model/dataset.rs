//! In-memory representation of an uploaded spreadsheet.
//!
//! A `Dataset` is produced by the backend loader (`services::data_sources::spreadsheet::load`)
//! and is never mutated afterwards: a new upload replaces it wholesale. Sheets keep the
//! workbook order, rows keep the file order, and every row of a sheet carries exactly the
//! columns named by that sheet's header row.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// A single cell value.
///
/// Spreadsheet cells are either text or numbers. Keeping the variant explicit makes the
/// conversion to display text deterministic: text is returned as-is, numbers use Rust's
/// shortest round-trip formatting (`90.0` becomes `"90"`, `90.5` stays `"90.5"`).
///
/// Serialized untagged, so JSON clients see a bare string or number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn empty() -> Self {
        CellValue::Text(String::new())
    }

    /// Text form of the value, borrowing when the cell already holds text.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Text(s) => Cow::Borrowed(s.as_str()),
            CellValue::Number(n) => Cow::Owned(n.to_string()),
        }
    }

    /// `true` for an empty text cell. Numbers are never blank.
    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.is_empty())
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::empty()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// One data row, keyed by column name.
pub type Row = HashMap<String, CellValue>;

/// A named grid of rows. `columns` is the header row in file order and is authoritative
/// for display order, even when duplicate names collapse into a single row key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }
}

/// All sheets of one uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Original upload name, used for format detection and display.
    pub file_name: String,
    /// Hex MD5 of the uploaded bytes.
    pub md5: String,
    pub sheets: Vec<Sheet>,
}

impl Dataset {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }

    /// Header order of a sheet.
    pub fn columns(&self, sheet: &str) -> Option<&[String]> {
        self.sheet(sheet).map(|s| s.columns.as_slice())
    }

    pub fn row(&self, sheet: &str, index: usize) -> Option<&Row> {
        self.sheet(sheet).and_then(|s| s.row(index))
    }

    pub fn total_rows(&self) -> usize {
        self.sheets.iter().map(|s| s.rows.len()).sum()
    }
}
