//! Read and delete access to stored templates.

use actix_web::{web, HttpResponse, Responder};
use common::model::template::Template;
use common::requests::TemplateListItem;

use crate::error::ValidationError;
use crate::services::templates::edit::validation_response;
use crate::services::templates::save::store_error_response;
use crate::services::templates::store::TemplateStore;

/// `GET /api/templates`
pub(crate) async fn list(store: web::Data<TemplateStore>) -> impl Responder {
    match store.list() {
        Ok(templates) => HttpResponse::Ok().json(list_items(&templates)),
        Err(e) => store_error_response(e),
    }
}

/// `GET /api/templates/{template_id}`
pub(crate) async fn process(
    store: web::Data<TemplateStore>,
    template_id: web::Path<String>,
) -> impl Responder {
    match store.get(&template_id) {
        Ok(Some(template)) => HttpResponse::Ok().json(template),
        Ok(None) => validation_response(ValidationError::UnknownTemplate(template_id.to_string())),
        Err(e) => store_error_response(e),
    }
}

/// `DELETE /api/templates/{template_id}`. The active template is not affected.
pub(crate) async fn delete(
    store: web::Data<TemplateStore>,
    template_id: web::Path<String>,
) -> impl Responder {
    match store.delete(&template_id) {
        Ok(true) => HttpResponse::NoContent().finish(),
        Ok(false) => {
            validation_response(ValidationError::UnknownTemplate(template_id.to_string()))
        }
        Err(e) => store_error_response(e),
    }
}

pub fn list_items(templates: &[Template]) -> Vec<TemplateListItem> {
    templates
        .iter()
        .map(|t| TemplateListItem {
            id: t.id.clone(),
            name: t.name.clone(),
            field_count: t.text_fields.len(),
        })
        .collect()
}
