//! Certificate layout model and its editing commands.
//!
//! A `Template` is a canvas with an ordered list of positioned `TextField`s. Editing never
//! mutates a template in place: every command (`with_field_added`, `with_field_updated`,
//! `with_field_moved`, ...) returns a new `Template`, which the backend then swaps into the
//! active-template slot. Keeping old values around makes undo a matter of holding on to
//! the previous `Template`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_CANVAS_WIDTH: u32 = 800;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 600;
/// Largest accepted canvas side, in canvas units.
pub const MAX_CANVAS_SIZE: u32 = 10_000;
pub const DEFAULT_BACKGROUND_COLOR: &str = "#ffffff";

/// Smallest part of a field that must stay on the canvas when it is dragged.
pub const MOVE_MARGIN_X: f64 = 50.0;
pub const MOVE_MARGIN_Y: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
    Lighter,
}

/// Page orientation of an exported certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Landscape only when strictly wider than tall; squares are portrait.
    pub fn of(width: u32, height: u32) -> Self {
        if width > height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// A positioned, styled text element.
///
/// `text` is the literal fallback shown when the field is unbound or its bound column has
/// no value for the selected record. The `(sheet_mapping, column_mapping)` pair is a plain
/// copy of names, not a reference into a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextField {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub font_size: u32,
    pub font_family: String,
    pub font_weight: FontWeight,
    pub color: String,
    pub text: String,
    pub text_align: TextAlign,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_mapping: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_mapping: Option<String>,
}

impl TextField {
    /// A new field with the editor defaults.
    pub fn new() -> Self {
        TextField {
            id: format!("field-{}", Uuid::new_v4()),
            x: 50.0,
            y: 50.0,
            width: 200.0,
            height: 40.0,
            font_size: 16,
            font_family: "Arial".to_string(),
            font_weight: FontWeight::Normal,
            color: "#000000".to_string(),
            text: "New Text Field".to_string(),
            text_align: TextAlign::Left,
            sheet_mapping: None,
            column_mapping: None,
        }
    }

    /// Bound column name, if any. An empty name counts as unbound.
    pub fn bound_column(&self) -> Option<&str> {
        self.column_mapping.as_deref().filter(|c| !c.is_empty())
    }

    pub fn bound_sheet(&self) -> Option<&str> {
        self.sheet_mapping.as_deref().filter(|s| !s.is_empty())
    }
}

impl Default for TextField {
    fn default() -> Self {
        Self::new()
    }
}

/// Partial update of a `TextField`. Absent members leave the field untouched.
///
/// For `sheet_mapping` and `column_mapping` an empty string clears the binding. Changing
/// the sheet clears the column too, unless the same patch also names a column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub font_size: Option<u32>,
    pub font_family: Option<String>,
    pub font_weight: Option<FontWeight>,
    pub color: Option<String>,
    pub text: Option<String>,
    pub text_align: Option<TextAlign>,
    pub sheet_mapping: Option<String>,
    pub column_mapping: Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl FieldPatch {
    pub fn apply(&self, field: &TextField) -> TextField {
        let mut next = field.clone();
        if let Some(x) = self.x {
            next.x = x;
        }
        if let Some(y) = self.y {
            next.y = y;
        }
        if let Some(width) = self.width {
            next.width = width;
        }
        if let Some(height) = self.height {
            next.height = height;
        }
        if let Some(size) = self.font_size {
            next.font_size = size;
        }
        if let Some(family) = &self.font_family {
            next.font_family = family.clone();
        }
        if let Some(weight) = self.font_weight {
            next.font_weight = weight;
        }
        if let Some(color) = &self.color {
            next.color = color.clone();
        }
        if let Some(text) = &self.text {
            next.text = text.clone();
        }
        if let Some(align) = self.text_align {
            next.text_align = align;
        }
        if let Some(sheet) = &self.sheet_mapping {
            next.sheet_mapping = non_empty(sheet);
            next.column_mapping = None;
        }
        if let Some(column) = &self.column_mapping {
            next.column_mapping = non_empty(column);
        }
        next
    }
}

/// Partial update of the canvas properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasPatch {
    pub canvas_width: Option<u32>,
    pub canvas_height: Option<u32>,
    pub background_color: Option<String>,
    /// An empty string removes the background image.
    pub background_image: Option<String>,
}

/// A named, reusable certificate layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub background_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    /// Creation order, which is also paint order.
    #[serde(default)]
    pub text_fields: Vec<TextField>,
}

impl Template {
    /// A blank template with the default canvas. The caller validates `name`.
    pub fn new(name: &str) -> Self {
        Template {
            id: format!("template-{}", Uuid::new_v4()),
            name: name.trim().to_string(),
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            background_image: None,
            text_fields: Vec::new(),
        }
    }

    pub fn field(&self, field_id: &str) -> Option<&TextField> {
        self.text_fields.iter().find(|f| f.id == field_id)
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::of(self.canvas_width, self.canvas_height)
    }

    pub fn with_field_added(&self, field: TextField) -> Template {
        let mut next = self.clone();
        next.text_fields.push(field);
        next
    }

    /// Applies `patch` to the field `field_id`. `None` when no such field exists.
    pub fn with_field_updated(&self, field_id: &str, patch: &FieldPatch) -> Option<Template> {
        self.map_field(field_id, |field| patch.apply(field))
    }

    /// Repositions a field, keeping at least `MOVE_MARGIN_X` x `MOVE_MARGIN_Y` of it on
    /// the canvas. `None` when no such field exists.
    pub fn with_field_moved(&self, field_id: &str, x: f64, y: f64) -> Option<Template> {
        let max_x = (self.canvas_width as f64 - MOVE_MARGIN_X).max(0.0);
        let max_y = (self.canvas_height as f64 - MOVE_MARGIN_Y).max(0.0);
        let x = x.min(max_x).max(0.0);
        let y = y.min(max_y).max(0.0);
        self.map_field(field_id, |field| TextField {
            x,
            y,
            ..field.clone()
        })
    }

    pub fn with_field_removed(&self, field_id: &str) -> Option<Template> {
        self.field(field_id)?;
        let mut next = self.clone();
        next.text_fields.retain(|f| f.id != field_id);
        Some(next)
    }

    pub fn with_canvas(&self, patch: &CanvasPatch) -> Template {
        let mut next = self.clone();
        if let Some(width) = patch.canvas_width {
            next.canvas_width = width;
        }
        if let Some(height) = patch.canvas_height {
            next.canvas_height = height;
        }
        if let Some(color) = &patch.background_color {
            next.background_color = color.clone();
        }
        if let Some(image) = &patch.background_image {
            next.background_image = non_empty(image);
        }
        next
    }

    fn map_field<F>(&self, field_id: &str, f: F) -> Option<Template>
    where
        F: FnOnce(&TextField) -> TextField,
    {
        let position = self.text_fields.iter().position(|t| t.id == field_id)?;
        let mut next = self.clone();
        next.text_fields[position] = f(&self.text_fields[position]);
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn template_with_field() -> (Template, String) {
        let field = TextField::new();
        let id = field.id.clone();
        (Template::new("Diploma").with_field_added(field), id)
    }

    #[test]
    fn new_template_uses_editor_defaults() {
        let template = Template::new("  Diploma ");
        assert_eq!(template.name, "Diploma");
        assert_eq!((template.canvas_width, template.canvas_height), (800, 600));
        assert_eq!(template.background_color, "#ffffff");
        assert!(template.text_fields.is_empty());
        assert!(template.id.starts_with("template-"));
    }

    #[test]
    fn orientation_follows_canvas_proportions() {
        assert_eq!(Orientation::of(800, 600), Orientation::Landscape);
        assert_eq!(Orientation::of(600, 800), Orientation::Portrait);
        assert_eq!(Orientation::of(500, 500), Orientation::Portrait);
        assert_eq!(Template::new("x").orientation(), Orientation::Landscape);
    }

    #[test]
    fn commands_leave_the_original_untouched() {
        let (template, id) = template_with_field();
        let moved = template.with_field_moved(&id, 120.0, 80.0).unwrap();

        assert_eq!(template.field(&id).unwrap().x, 50.0);
        assert_eq!(moved.field(&id).unwrap().x, 120.0);
        assert_eq!(moved.field(&id).unwrap().y, 80.0);
    }

    #[test]
    fn moves_are_clamped_to_the_canvas() {
        let (template, id) = template_with_field();

        let far = template.with_field_moved(&id, 5000.0, 5000.0).unwrap();
        assert_eq!(far.field(&id).unwrap().x, 750.0);
        assert_eq!(far.field(&id).unwrap().y, 570.0);

        let negative = template.with_field_moved(&id, -10.0, -1.0).unwrap();
        assert_eq!(negative.field(&id).unwrap().x, 0.0);
        assert_eq!(negative.field(&id).unwrap().y, 0.0);
    }

    #[test]
    fn unknown_field_ids_yield_none() {
        let (template, _) = template_with_field();
        assert!(template.with_field_moved("nope", 1.0, 1.0).is_none());
        assert!(template.with_field_updated("nope", &FieldPatch::default()).is_none());
        assert!(template.with_field_removed("nope").is_none());
    }

    #[test]
    fn patch_only_touches_named_properties() {
        let (template, id) = template_with_field();
        let patch = FieldPatch {
            text: Some("Awarded to".to_string()),
            font_weight: Some(FontWeight::Bold),
            text_align: Some(TextAlign::Center),
            ..FieldPatch::default()
        };
        let updated = template.with_field_updated(&id, &patch).unwrap();
        let field = updated.field(&id).unwrap();

        assert_eq!(field.text, "Awarded to");
        assert_eq!(field.font_weight, FontWeight::Bold);
        assert_eq!(field.text_align, TextAlign::Center);
        assert_eq!(field.font_size, 16);
        assert_eq!(field.color, "#000000");
    }

    #[test]
    fn changing_the_sheet_clears_the_column() {
        let (template, id) = template_with_field();
        let bound = template
            .with_field_updated(
                &id,
                &FieldPatch {
                    sheet_mapping: Some("Students".to_string()),
                    column_mapping: Some("Score".to_string()),
                    ..FieldPatch::default()
                },
            )
            .unwrap();
        assert_eq!(bound.field(&id).unwrap().bound_column(), Some("Score"));

        let resheeted = bound
            .with_field_updated(
                &id,
                &FieldPatch {
                    sheet_mapping: Some("Teachers".to_string()),
                    ..FieldPatch::default()
                },
            )
            .unwrap();
        let field = resheeted.field(&id).unwrap();
        assert_eq!(field.bound_sheet(), Some("Teachers"));
        assert_eq!(field.bound_column(), None);

        let cleared = resheeted
            .with_field_updated(
                &id,
                &FieldPatch {
                    sheet_mapping: Some(String::new()),
                    ..FieldPatch::default()
                },
            )
            .unwrap();
        assert_eq!(cleared.field(&id).unwrap().sheet_mapping, None);
    }

    #[test]
    fn removing_keeps_the_order_of_remaining_fields() {
        let first = TextField::new();
        let second = TextField::new();
        let third = TextField::new();
        let ids = [first.id.clone(), second.id.clone(), third.id.clone()];
        let template = Template::new("t")
            .with_field_added(first)
            .with_field_added(second)
            .with_field_added(third);

        let removed = template.with_field_removed(&ids[1]).unwrap();
        let remaining: Vec<&str> = removed.text_fields.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(remaining, vec![ids[0].as_str(), ids[2].as_str()]);
    }

    #[test]
    fn canvas_patch_can_drop_the_background_image() {
        let template = Template::new("t").with_canvas(&CanvasPatch {
            background_image: Some("data:image/png;base64,AAAA".to_string()),
            canvas_height: Some(1000),
            ..CanvasPatch::default()
        });
        assert_eq!(template.canvas_height, 1000);
        assert!(template.background_image.is_some());

        let cleared = template.with_canvas(&CanvasPatch {
            background_image: Some(String::new()),
            ..CanvasPatch::default()
        });
        assert_eq!(cleared.background_image, None);
        assert_eq!(cleared.canvas_width, 800);
    }

    #[test]
    fn persisted_layout_uses_snake_case_and_lowercase_enums() {
        let mut field = TextField::new();
        field.id = "field-1".to_string();
        field.text_align = TextAlign::Right;
        field.column_mapping = Some("Name".to_string());
        let json = serde_json::to_value(&field).unwrap();

        assert_eq!(json["text_align"], "right");
        assert_eq!(json["font_weight"], "normal");
        assert_eq!(json["column_mapping"], "Name");
        assert!(json.get("sheet_mapping").is_none());

        let back: TextField = serde_json::from_value(json).unwrap();
        assert_eq!(back, field);
    }
}
