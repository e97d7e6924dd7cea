//! # Template Service Module
//!
//! Routes everything under `/api/templates`: editing the active template and moving
//! templates in and out of the template store.
//!
//! ## Sub-modules:
//! - `edit`: creation of the active template and the editor commands applied to it.
//! - `save`: persisting the active template and loading a stored one.
//! - `get`: listing, fetching and deleting stored templates.
//! - `store`: the SQLite-backed `TemplateStore`.

mod edit;
mod get;
mod save;
pub mod store;

use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/templates";

/// Configures and returns the Actix `Scope` for all template-related routes.
///
/// Fixed paths are registered before `/{template_id}` so they are never taken for ids.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(get::list))
        .route("/new", post().to(edit::create))
        .route("/active", get().to(edit::active))
        .route("/active", put().to(edit::replace_active))
        .route("/active/canvas", post().to(edit::update_canvas))
        .route("/active/fields", post().to(edit::add_field))
        .route("/active/fields/{field_id}", post().to(edit::update_field))
        .route("/active/fields/{field_id}", delete().to(edit::remove_field))
        .route("/active/fields/{field_id}/move", post().to(edit::move_field))
        .route("/save", post().to(save::process))
        .route("/load/{template_id}", post().to(save::load))
        .route("/{template_id}", get().to(get::process))
        .route("/{template_id}", delete().to(get::delete))
}
