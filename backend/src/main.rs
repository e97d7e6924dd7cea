mod config;
mod error;
mod job_controller;
mod services;
mod session;

use crate::config::Config;
use crate::job_controller::state::JobsState;
use crate::services::templates::store::TemplateStore;
use crate::session::state::SessionState;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use env_logger::Env;
use log::{error, info};
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let config = Config::parse();

    std::fs::create_dir_all(&config.output_dir)?;
    let store = TemplateStore::open(&config.database).map_err(|e| {
        error!("Cannot open template database {}: {}", config.database.display(), e);
        io::Error::other(e.to_string())
    })?;

    // Initialize job controller state
    let (jobs_state, rx) = JobsState::new(100);

    // Start job updater task
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        job_controller::state::start_job_updater(updater_state, rx).await;
    });

    let session = SessionState::new();
    let body_limit = config.body_limit();
    let bind = (config.host.clone(), config.port);
    info!(
        "Server running at http://{}:{} (templates: {}, output: {}, fonts: {}, sheet binding: {:?})",
        bind.0,
        bind.1,
        config.database.display(),
        config.output_dir.display(),
        config.fonts_dir.display(),
        config.sheet_binding()
    );

    let config = web::Data::new(config);
    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(body_limit))
            .app_data(web::PayloadConfig::new(body_limit))
            .app_data(web::Data::new(jobs_state.clone()))
            .app_data(web::Data::new(session.clone()))
            .app_data(web::Data::new(store.clone()))
            .app_data(config.clone())
            .service(services::templates::configure_routes())
            .service(services::data_sources::spreadsheet::configure_routes())
            .service(services::certificates::configure_routes())
            .service(actix_files::Files::new("/exports", &config.output_dir))
    })
    .bind(bind)?
    .run()
    .await
}
