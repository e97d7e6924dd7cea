//! # Active Template Editing
//!
//! Handlers for creating the active template and applying editor commands to it. Each
//! command validates its input first, then produces a new `Template` through
//! `SessionState::edit_template`; a rejected command leaves the active template as it was.
//!
//! ## Validation
//!
//! - Names must contain something other than whitespace.
//! - Colors must be `#rgb` or `#rrggbb`.
//! - Canvas sides must lie in `1..=MAX_CANVAS_SIZE`.
//! - Field sizes must be positive and finite; font sizes at least 1.

use actix_web::{web, HttpResponse, Responder};
use common::model::template::{CanvasPatch, FieldPatch, Template, TextField, MAX_CANVAS_SIZE};
use common::requests::{CreateTemplateRequest, MoveFieldRequest};
use log::{debug, info};

use crate::error::ValidationError;
use crate::services::certificates::render::validate_color;
use crate::session::state::SessionState;

/// Maps a rejected command to its HTTP status: lookups that miss are `404`, everything
/// else is a bad request.
pub(crate) fn validation_response(err: ValidationError) -> HttpResponse {
    match err {
        ValidationError::NoActiveTemplate
        | ValidationError::UnknownTemplate(_)
        | ValidationError::UnknownField(_)
        | ValidationError::UnknownSheet(_) => HttpResponse::NotFound().body(err.to_string()),
        _ => HttpResponse::BadRequest().body(err.to_string()),
    }
}

fn respond(result: Result<Template, ValidationError>) -> HttpResponse {
    match result {
        Ok(template) => HttpResponse::Ok().json(template),
        Err(e) => validation_response(e),
    }
}

/// `POST /api/templates/new`
pub(crate) async fn create(
    session: web::Data<SessionState>,
    req: web::Json<CreateTemplateRequest>,
) -> impl Responder {
    match create_template(&req.name) {
        Ok(template) => {
            info!("Created template {} ('{}')", template.id, template.name);
            session.set_active_template(template.clone()).await;
            HttpResponse::Created().json(template)
        }
        Err(e) => validation_response(e),
    }
}

/// `GET /api/templates/active`
pub(crate) async fn active(session: web::Data<SessionState>) -> impl Responder {
    match session.active_template().await {
        Some(template) => HttpResponse::Ok().json(template),
        None => validation_response(ValidationError::NoActiveTemplate),
    }
}

/// `PUT /api/templates/active`: replaces the active template wholesale.
pub(crate) async fn replace_active(
    session: web::Data<SessionState>,
    template: web::Json<Template>,
) -> impl Responder {
    let template = template.into_inner();
    match validate_template(&template) {
        Ok(()) => {
            session.set_active_template(template.clone()).await;
            HttpResponse::Ok().json(template)
        }
        Err(e) => validation_response(e),
    }
}

/// `POST /api/templates/active/canvas`
pub(crate) async fn update_canvas(
    session: web::Data<SessionState>,
    patch: web::Json<CanvasPatch>,
) -> impl Responder {
    respond(
        session
            .edit_template(|template| apply_canvas(template, &patch))
            .await,
    )
}

/// `POST /api/templates/active/fields`: appends a field with the editor defaults.
pub(crate) async fn add_field(session: web::Data<SessionState>) -> impl Responder {
    let result = session
        .edit_template(|template| Ok(template.with_field_added(TextField::new())))
        .await;
    if let Ok(template) = &result {
        if let Some(field) = template.text_fields.last() {
            debug!("Added field {} to {}", field.id, template.id);
        }
    }
    respond(result)
}

/// `POST /api/templates/active/fields/{field_id}`
pub(crate) async fn update_field(
    session: web::Data<SessionState>,
    field_id: web::Path<String>,
    patch: web::Json<FieldPatch>,
) -> impl Responder {
    respond(
        session
            .edit_template(|template| apply_field_patch(template, &field_id, &patch))
            .await,
    )
}

/// `POST /api/templates/active/fields/{field_id}/move`
pub(crate) async fn move_field(
    session: web::Data<SessionState>,
    field_id: web::Path<String>,
    req: web::Json<MoveFieldRequest>,
) -> impl Responder {
    respond(
        session
            .edit_template(|template| {
                if !req.x.is_finite() || !req.y.is_finite() {
                    return Err(ValidationError::InvalidSize("position".to_string()));
                }
                template
                    .with_field_moved(&field_id, req.x, req.y)
                    .ok_or_else(|| ValidationError::UnknownField(field_id.to_string()))
            })
            .await,
    )
}

/// `DELETE /api/templates/active/fields/{field_id}`
pub(crate) async fn remove_field(
    session: web::Data<SessionState>,
    field_id: web::Path<String>,
) -> impl Responder {
    respond(
        session
            .edit_template(|template| {
                template
                    .with_field_removed(&field_id)
                    .ok_or_else(|| ValidationError::UnknownField(field_id.to_string()))
            })
            .await,
    )
}

pub fn create_template(name: &str) -> Result<Template, ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(Template::new(name))
}

pub fn apply_canvas(template: &Template, patch: &CanvasPatch) -> Result<Template, ValidationError> {
    for (label, value) in [
        ("canvas_width", patch.canvas_width),
        ("canvas_height", patch.canvas_height),
    ] {
        if let Some(side) = value {
            check_canvas_side(label, side)?;
        }
    }
    if let Some(color) = &patch.background_color {
        validate_color(color)?;
    }
    Ok(template.with_canvas(patch))
}

pub fn apply_field_patch(
    template: &Template,
    field_id: &str,
    patch: &FieldPatch,
) -> Result<Template, ValidationError> {
    for (label, value) in [("width", patch.width), ("height", patch.height)] {
        if let Some(v) = value {
            check_dimension(label, v)?;
        }
    }
    for (label, value) in [("x", patch.x), ("y", patch.y)] {
        if value.is_some_and(|v| !v.is_finite()) {
            return Err(ValidationError::InvalidSize(label.to_string()));
        }
    }
    if patch.font_size == Some(0) {
        return Err(ValidationError::InvalidSize("font_size".to_string()));
    }
    if let Some(color) = &patch.color {
        validate_color(color)?;
    }
    template
        .with_field_updated(field_id, patch)
        .ok_or_else(|| ValidationError::UnknownField(field_id.to_string()))
}

/// Checks a whole template coming from the client.
pub fn validate_template(template: &Template) -> Result<(), ValidationError> {
    if template.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    check_canvas_side("canvas_width", template.canvas_width)?;
    check_canvas_side("canvas_height", template.canvas_height)?;
    validate_color(&template.background_color)?;
    for field in &template.text_fields {
        check_dimension("width", field.width)?;
        check_dimension("height", field.height)?;
        if field.font_size == 0 {
            return Err(ValidationError::InvalidSize("font_size".to_string()));
        }
        validate_color(&field.color)?;
    }
    Ok(())
}

fn check_canvas_side(label: &str, value: u32) -> Result<(), ValidationError> {
    if (1..=MAX_CANVAS_SIZE).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidSize(label.to_string()))
    }
}

fn check_dimension(label: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidSize(label.to_string()))
    }
}
