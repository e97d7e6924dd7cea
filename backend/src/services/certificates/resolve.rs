//! Field value resolution.
//!
//! Decides what text each field of a template shows for the selected record. Resolution
//! is pure: the same field, record and mode always give the same string.
//!
//! - An unbound field, or any field while no record is selected, shows its literal text.
//! - A bound field shows the record's value for the bound column, as text, when that
//!   value exists and is not empty. Otherwise it shows its literal text, so blank cells
//!   never produce a visibly empty field.
//! - Whether the field's own sheet must match the record's sheet depends on
//!   `SheetBinding`.

use common::model::selection::SelectedRecord;
use common::model::template::{Template, TextField};

/// How a field's `sheet_mapping` relates to the selected record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetBinding {
    /// The bound column is looked up in whatever record is selected, regardless of the
    /// sheet it came from.
    #[default]
    Lenient,
    /// A field bound to a sheet only resolves against records from that sheet; records
    /// from any other sheet yield the literal text. Fields without a sheet behave as in
    /// `Lenient`.
    Strict,
}

pub fn resolve(field: &TextField, selected: Option<&SelectedRecord>, mode: SheetBinding) -> String {
    let (Some(record), Some(column)) = (selected, field.bound_column()) else {
        return field.text.clone();
    };

    if mode == SheetBinding::Strict {
        if let Some(sheet) = field.bound_sheet() {
            if sheet != record.sheet_name {
                return field.text.clone();
            }
        }
    }

    match record.data.get(column) {
        Some(value) if !value.is_blank() => value.to_string(),
        _ => field.text.clone(),
    }
}

/// Resolves every field of `template`, in paint order.
pub fn resolve_all(
    template: &Template,
    selected: Option<&SelectedRecord>,
    mode: SheetBinding,
) -> Vec<String> {
    template
        .text_fields
        .iter()
        .map(|field| resolve(field, selected, mode))
        .collect()
}
