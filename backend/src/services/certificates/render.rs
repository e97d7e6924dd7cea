//! # Certificate Layout
//!
//! Computes what a certificate looks like for the selected record, independently of
//! the output format. `layout` resolves every field (see `resolve`), parses colors and
//! carries the geometry over; the PDF writer in `pdf.rs` only has to paint the result.
//!
//! All geometry is in layout units, which are CSS pixels: the editor canvas is measured
//! in them and the exported page is exactly `width x height` of them.

use actix_web::{web, HttpResponse, Responder};
use common::model::selection::SelectedRecord;
use common::model::template::{FontWeight, Orientation, Template, TextAlign};
use log::warn;
use regex::Regex;
use serde::Serialize;
use std::ops::{Add, Div, Sub};
use std::sync::LazyLock;

use crate::config::Config;
use crate::error::ValidationError;
use crate::services::certificates::resolve::{resolve_all, SheetBinding};
use crate::session::state::SessionState;

/// Millimetres per layout unit (96 units per inch).
pub const UNIT_TO_MM: f64 = 25.4 / 96.0;
/// Points per layout unit.
pub const UNIT_TO_PT: f64 = 0.75;
/// Horizontal inner padding of a field box.
pub const FIELD_PADDING: f64 = 8.0;

/// Paper color; a plain white background needs no painting.
pub const WHITE: Rgb = Rgb(255, 255, 255);
const BLACK: Rgb = Rgb(0, 0, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// A field ready to paint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedField {
    pub id: String,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub font_size: u32,
    pub font_family: String,
    pub bold: bool,
    pub color: Rgb,
    pub align: TextAlign,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateLayout {
    pub template_id: String,
    pub width: u32,
    pub height: u32,
    pub orientation: Orientation,
    pub background: Rgb,
    pub background_image: Option<String>,
    pub fields: Vec<PlacedField>,
}

impl CertificateLayout {
    pub fn width_mm(&self) -> f64 {
        self.width as f64 * UNIT_TO_MM
    }

    pub fn height_mm(&self) -> f64 {
        self.height as f64 * UNIT_TO_MM
    }
}

/// `GET /api/certificates/preview`: layout of the active template for the selected
/// record, with every field already resolved.
pub(crate) async fn preview(
    session: web::Data<SessionState>,
    config: web::Data<Config>,
) -> impl Responder {
    let Some(template) = session.active_template().await else {
        return HttpResponse::NotFound().body(ValidationError::NoActiveTemplate.to_string());
    };
    let selected = session.selected().await;
    HttpResponse::Ok().json(layout(&template, selected.as_ref(), config.sheet_binding()))
}

pub fn layout(
    template: &Template,
    selected: Option<&SelectedRecord>,
    mode: SheetBinding,
) -> CertificateLayout {
    let fields = template
        .text_fields
        .iter()
        .zip(resolve_all(template, selected, mode))
        .map(|(field, text)| PlacedField {
            id: field.id.clone(),
            text,
            x: field.x,
            y: field.y,
            width: field.width,
            height: field.height,
            font_size: field.font_size,
            font_family: field.font_family.clone(),
            bold: field.font_weight == FontWeight::Bold,
            color: color_or(&field.color, BLACK),
            align: field.text_align,
        })
        .collect();

    CertificateLayout {
        template_id: template.id.clone(),
        width: template.canvas_width,
        height: template.canvas_height,
        orientation: template.orientation(),
        background: color_or(&template.background_color, WHITE),
        background_image: template.background_image.clone(),
        fields,
    }
}

fn color_or(value: &str, fallback: Rgb) -> Rgb {
    parse_color(value).unwrap_or_else(|| {
        warn!("Unparsable color '{}', using fallback", value);
        fallback
    })
}

/// Parses `#rgb` or `#rrggbb` (case-insensitive).
pub fn parse_color(value: &str) -> Option<Rgb> {
    let hex = value.trim().strip_prefix('#')?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut digits = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
            Some(Rgb(digits.next()??, digits.next()??, digits.next()??))
        }
        6 if hex.is_ascii() => Some(Rgb(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        _ => None,
    }
}

static COLOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("color pattern is a valid regex")
});

/// Rejects colors that `parse_color` would not understand.
pub fn validate_color(value: &str) -> Result<(), ValidationError> {
    if COLOR_PATTERN.is_match(value.trim()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidColor(value.to_string()))
    }
}

/// Left edge of a text run of `text_width` inside a box at `x` of `width`.
///
/// Generic over the unit so the same rule serves layout units and PDF millimetres.
pub fn aligned_x<T>(x: T, width: T, text_width: T, padding: T, align: TextAlign) -> T
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Div<f64, Output = T>,
{
    match align {
        TextAlign::Left => x + padding,
        TextAlign::Center => x + (width - text_width) / 2.0,
        TextAlign::Right => x + width - padding - text_width,
    }
}

/// Top edge of a line of `line_height` centered vertically in a box at `y` of `height`.
pub fn centered_y<T>(y: T, height: T, line_height: T) -> T
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Div<f64, Output = T>,
{
    y + (height - line_height) / 2.0
}

/// Breaks `text` into lines whose `measure` stays within `max_width`.
///
/// Newlines in the text always start a new line (a trailing `\r` is dropped) and blank
/// lines are kept. Words are joined by single spaces; a word wider than `max_width` gets a
/// line of its own rather than being split.
pub fn wrap_lines<T, F>(text: &str, max_width: T, measure: F) -> Vec<String>
where
    T: PartialOrd,
    F: Fn(&str) -> T,
{
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.strip_suffix('\r').unwrap_or(paragraph);
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{} {}", current, word);
            if measure(&candidate) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::dataset::{CellValue, Row};
    use common::model::template::TextField;
    use pretty_assertions::assert_eq;

    #[test]
    fn colors_parse_in_short_and_long_form() {
        assert_eq!(parse_color("#ffffff"), Some(Rgb(255, 255, 255)));
        assert_eq!(parse_color("#1A2b3C"), Some(Rgb(0x1a, 0x2b, 0x3c)));
        assert_eq!(parse_color("#f80"), Some(Rgb(255, 136, 0)));
        assert_eq!(parse_color("red"), None);
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#gggggg"), None);
    }

    #[test]
    fn color_validation_matches_parsing() {
        for ok in ["#000", "#abcdef", "#ABCDEF"] {
            assert!(validate_color(ok).is_ok(), "{ok}");
            assert!(parse_color(ok).is_some(), "{ok}");
        }
        assert_eq!(
            validate_color("blue"),
            Err(ValidationError::InvalidColor("blue".to_string()))
        );
    }

    #[test]
    fn alignment_inside_the_box() {
        let pad = FIELD_PADDING;
        assert_eq!(aligned_x(100.0, 200.0, 50.0, pad, TextAlign::Left), 108.0);
        assert_eq!(aligned_x(100.0, 200.0, 50.0, pad, TextAlign::Center), 175.0);
        assert_eq!(aligned_x(100.0, 200.0, 50.0, pad, TextAlign::Right), 242.0);
        assert_eq!(centered_y(50.0_f64, 40.0, 20.0), 60.0);
    }

    #[test]
    fn long_text_wraps_at_the_box_width() {
        let chars = |s: &str| s.chars().count();
        assert_eq!(
            wrap_lines("awarded to the best student", 12, chars),
            vec!["awarded to", "the best", "student"]
        );
        assert_eq!(wrap_lines("short", 12, chars), vec!["short"]);
        assert_eq!(
            wrap_lines("a supercalifragilistic word", 6, chars),
            vec!["a", "supercalifragilistic", "word"]
        );
    }

    #[test]
    fn newlines_break_lines() {
        let chars = |s: &str| s.chars().count();
        assert_eq!(
            wrap_lines("Ana Lopez\r\n\nFaculty of Arts", 40, chars),
            vec!["Ana Lopez", "", "Faculty of Arts"]
        );
    }

    #[test]
    fn layout_resolves_fields_and_keeps_geometry() {
        let name = TextField {
            id: "name".to_string(),
            x: 10.0,
            y: 20.0,
            color: "not-a-color".to_string(),
            column_mapping: Some("Name".to_string()),
            text: "Student".to_string(),
            font_weight: FontWeight::Bold,
            ..TextField::new()
        };
        let mut template = Template::new("Diploma").with_field_added(name);
        template.background_color = "#000".to_string();

        let mut data = Row::new();
        data.insert("Name".to_string(), CellValue::from("Ana"));
        let record = SelectedRecord {
            sheet_name: "Students".to_string(),
            row_index: 0,
            data,
        };

        let layout = layout(&template, Some(&record), SheetBinding::Lenient);
        assert_eq!(layout.orientation, Orientation::Landscape);
        assert_eq!((layout.width, layout.height), (800, 600));
        assert_eq!(layout.background, Rgb(0, 0, 0));

        let field = &layout.fields[0];
        assert_eq!(field.text, "Ana");
        assert_eq!((field.x, field.y), (10.0, 20.0));
        assert!(field.bold);
        assert_eq!(field.color, Rgb(0, 0, 0));
    }

    #[test]
    fn page_size_converts_units_to_millimetres() {
        let layout = layout(&Template::new("A"), None, SheetBinding::Lenient);
        assert!((layout.width_mm() - 211.666).abs() < 0.01);
        assert!((layout.height_mm() - 158.75).abs() < 0.01);
    }
}
