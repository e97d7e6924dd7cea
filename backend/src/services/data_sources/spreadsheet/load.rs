//! # Dataset Loader
//!
//! Turns the bytes of an uploaded file into a `Dataset`.
//!
//! ## Formats
//!
//! - **Workbooks** (`xlsx`, `xlsm`, `xlsb`, `xls`, `ods`, or no extension at all) are read
//!   with `calamine`, which sniffs the container format from the bytes.
//! - **Delimited text** (`csv`, `tsv`, `txt`) is read with the `csv` crate. The delimiter is
//!   whichever of `,` `;` `\t` `|` appears most often in the header line. The single
//!   resulting sheet is named after the file stem.
//!
//! ## Sheet shape
//!
//! Row 0 of each sheet is its header. Every following row is zipped positionally against
//! the header names into a `Row`; a header with no cell gets an empty text value, and when
//! two header cells share a name the later column wins. Sheets with a header but no data
//! are kept (their names stay selectable); sheets without even a header are skipped, and a
//! file where every sheet is skipped is rejected with `LoadError::Empty`.

use crate::error::LoadError;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use common::model::dataset::{CellValue, Dataset, Row, Sheet};
use log::debug;
use std::io::Cursor;
use std::path::Path;

const WORKBOOK_EXTENSIONS: [&str; 7] = ["xlsx", "xlsm", "xlsb", "xls", "xla", "xlam", "ods"];
const DELIMITED_EXTENSIONS: [&str; 3] = ["csv", "tsv", "txt"];
const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Parses `bytes` into a `Dataset`. Nothing is returned unless the whole file parsed.
pub fn load(file_name: &str, bytes: &[u8]) -> Result<Dataset, LoadError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let sheets = match extension.as_deref() {
        Some(ext) if DELIMITED_EXTENSIONS.contains(&ext) => vec![load_delimited(file_name, bytes)?],
        Some(ext) if WORKBOOK_EXTENSIONS.contains(&ext) => load_workbook(bytes)?,
        None => load_workbook(bytes)?,
        Some(ext) => return Err(LoadError::UnsupportedFormat(ext.to_string())),
    };

    let sheets: Vec<Sheet> = sheets.into_iter().flatten().collect();
    if sheets.is_empty() {
        return Err(LoadError::Empty);
    }

    debug!(
        "Loaded '{}': {} sheet(s), {} row(s)",
        file_name,
        sheets.len(),
        sheets.iter().map(|s| s.rows.len()).sum::<usize>()
    );

    Ok(Dataset {
        file_name: file_name.to_string(),
        md5: format!("{:x}", md5::compute(bytes)),
        sheets,
    })
}

/// Reads every sheet of a workbook, in workbook order.
fn load_workbook(bytes: &[u8]) -> Result<Vec<Option<Sheet>>, LoadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let names = workbook.sheet_names().to_owned();

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name)?;
        let grid: Vec<Vec<CellValue>> = range
            .rows()
            .map(|row| row.iter().map(cell_value).collect())
            .collect();
        sheets.push(build_sheet(name, grid));
    }
    Ok(sheets)
}

/// Reads a delimited text file as a single sheet. Cells stay text, so identifiers such as
/// `007` keep their leading zeroes.
fn load_delimited(file_name: &str, bytes: &[u8]) -> Result<Option<Sheet>, LoadError> {
    let header_line = bytes
        .split(|&b| b == b'\n')
        .next()
        .map(String::from_utf8_lossy)
        .unwrap_or_default();
    let delimiter = detect_delimiter(&header_line);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(bytes);

    let mut grid = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        grid.push(
            record
                .iter()
                .map(|field| CellValue::Text(String::from_utf8_lossy(field).into_owned()))
                .collect(),
        );
    }

    let name = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("Sheet1")
        .to_string();
    Ok(build_sheet(name, grid))
}

/// Picks the candidate delimiter that occurs most often in `header_line`.
/// Ties go to the earlier candidate; a line with none of them falls back to `,`.
pub(crate) fn detect_delimiter(header_line: &str) -> u8 {
    let mut best = (b',', 0usize);
    for candidate in CANDIDATE_DELIMITERS {
        let count = header_line.bytes().filter(|&b| b == candidate).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}

/// Header names keep their original spelling apart from surrounding whitespace and
/// non-breaking spaces.
fn normalize_header(cell: &CellValue) -> String {
    cell.as_text().replace('\u{00A0}', " ").trim().to_string()
}

/// Builds a sheet from a cell grid whose first row is the header. `None` when the grid
/// has no rows at all.
fn build_sheet(name: String, grid: Vec<Vec<CellValue>>) -> Option<Sheet> {
    let mut rows = grid.into_iter();
    let header = rows.next()?;
    let columns: Vec<String> = header.iter().map(normalize_header).collect();

    let rows = rows
        .map(|cells| {
            let mut row = Row::with_capacity(columns.len());
            for (index, title) in columns.iter().enumerate() {
                let value = cells.get(index).cloned().unwrap_or_default();
                row.insert(title.clone(), value);
            }
            row
        })
        .collect();

    Some(Sheet {
        name,
        columns,
        rows,
    })
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::empty(),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        other => CellValue::Text(other.to_string()),
    }
}
