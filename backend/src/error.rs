//! Error types for loading, validating, storing and exporting.
//!
//! Every error is handled at the HTTP boundary that triggered it (see the `process`
//! handlers under `services`). None of them leaves partial state behind: a failed load
//! keeps the previous dataset, a failed export writes no file, a failed validation leaves
//! the active template as it was.

use thiserror::Error;

/// The uploaded file could not be turned into a `Dataset`.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("The file could not be read as a spreadsheet: {0}")]
    Parse(String),
    #[error("The file does not contain any sheet with a header row")]
    Empty,
    #[error("The upload exceeds the limit of {0} bytes")]
    TooLarge(usize),
}

impl From<calamine::Error> for LoadError {
    fn from(err: calamine::Error) -> Self {
        LoadError::Parse(err.to_string())
    }
}

impl From<csv::Error> for LoadError {
    fn from(err: csv::Error) -> Self {
        LoadError::Parse(err.to_string())
    }
}

/// A user request was rejected before any state changed.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Template name must not be empty")]
    EmptyName,
    #[error("No active template")]
    NoActiveTemplate,
    #[error("Template not found: {0}")]
    UnknownTemplate(String),
    #[error("Field not found: {0}")]
    UnknownField(String),
    #[error("No dataset loaded")]
    NoDataset,
    #[error("Sheet not found: {0}")]
    UnknownSheet(String),
    #[error("Row {row_index} is out of range for sheet '{sheet_name}'")]
    RowOutOfRange { sheet_name: String, row_index: usize },
    #[error("Invalid color '{0}', expected #rgb or #rrggbb")]
    InvalidColor(String),
    #[error("Invalid size: {0}")]
    InvalidSize(String),
}

/// Rendering or writing a certificate failed.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No active template to export")]
    NoTemplate,
    #[error("No usable font found in {0}")]
    Font(String),
    #[error("Background image could not be used: {0}")]
    Background(String),
    #[error("PDF rendering failed: {0}")]
    Render(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<genpdf::error::Error> for ExportError {
    fn from(err: genpdf::error::Error) -> Self {
        ExportError::Render(err.to_string())
    }
}

impl From<image::ImageError> for ExportError {
    fn from(err: image::ImageError) -> Self {
        ExportError::Background(err.to_string())
    }
}

impl From<png::EncodingError> for ExportError {
    fn from(err: png::EncodingError) -> Self {
        ExportError::Render(err.to_string())
    }
}

/// The template database failed.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Stored template is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Template store lock poisoned")]
    Poisoned,
}
