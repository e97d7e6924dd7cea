//! Moving templates between the active slot and the template store.
//!
//! - `POST /api/templates/save` persists the active template (insert or update).
//! - `POST /api/templates/load/{template_id}` makes a stored template the active one.

use actix_web::{web, HttpResponse, Responder};
use common::model::template::Template;
use log::{error, info};

use crate::error::{StoreError, ValidationError};
use crate::services::templates::edit::validation_response;
use crate::services::templates::store::TemplateStore;
use crate::session::state::SessionState;

pub(crate) fn store_error_response(err: StoreError) -> HttpResponse {
    error!("Template store error: {}", err);
    HttpResponse::ServiceUnavailable().body(err.to_string())
}

/// `POST /api/templates/save`
pub(crate) async fn process(
    session: web::Data<SessionState>,
    store: web::Data<TemplateStore>,
) -> impl Responder {
    let Some(template) = session.active_template().await else {
        return validation_response(ValidationError::NoActiveTemplate);
    };
    match save_template(&store, &template) {
        Ok(()) => HttpResponse::Ok().json(template),
        Err(e) => store_error_response(e),
    }
}

/// `POST /api/templates/load/{template_id}`
pub(crate) async fn load(
    session: web::Data<SessionState>,
    store: web::Data<TemplateStore>,
    template_id: web::Path<String>,
) -> impl Responder {
    match store.get(&template_id) {
        Ok(Some(template)) => {
            info!("Loaded template {} ('{}')", template.id, template.name);
            session.set_active_template(template.clone()).await;
            HttpResponse::Ok().json(template)
        }
        Ok(None) => validation_response(ValidationError::UnknownTemplate(template_id.to_string())),
        Err(e) => store_error_response(e),
    }
}

pub fn save_template(store: &TemplateStore, template: &Template) -> Result<(), StoreError> {
    store.save(template)?;
    info!("Template {} saved", template.id);
    Ok(())
}
