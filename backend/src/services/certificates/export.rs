//! # Certificate Export Service
//!
//! Provides `POST /api/certificates/export`, which turns the active template and the
//! selected record into a PDF file.
//!
//! ## Workflow
//!
//! 1.  **Snapshot**: the handler reads the active template and the selected record from
//!     `SessionState` and computes the `CertificateLayout`. Later edits do not affect an
//!     export already in flight.
//! 2.  **Rendering**: `export_certificate` runs on the blocking pool. It loads the fonts
//!     the layout needs and renders the PDF into memory with `pdf::render_pdf`.
//! 3.  **Writing**: the bytes go to a temporary file inside the output directory, which is
//!     then renamed to `certificate-<unix millis>.pdf`. A failed export leaves no file.
//! 4.  **Response**: the PDF is returned as an attachment.

use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse, Responder};
use log::{error, info};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::config::Config;
use crate::error::ExportError;
use crate::services::certificates::pdf::{render_pdf, FontSet};
use crate::services::certificates::render::{layout, CertificateLayout};
use crate::session::state::SessionState;

/// A certificate written to disk.
pub struct ExportedCertificate {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Actix web handler for `POST /api/certificates/export`.
pub(crate) async fn process(
    session: web::Data<SessionState>,
    config: web::Data<Config>,
) -> impl Responder {
    let Some(template) = session.active_template().await else {
        return error_response(ExportError::NoTemplate);
    };
    let selected = session.selected().await;
    let layout = layout(&template, selected.as_ref(), config.sheet_binding());

    let fonts_dir = config.fonts_dir.clone();
    let output_dir = config.output_dir.clone();
    let result = web::block(move || {
        let file_name = certificate_file_name();
        export_certificate(&layout, &fonts_dir, &output_dir, &file_name)
    })
    .await;

    match result {
        Ok(Ok(exported)) => {
            let file_name = exported
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            HttpResponse::Ok()
                .content_type("application/pdf")
                .insert_header(ContentDisposition {
                    disposition: DispositionType::Attachment,
                    parameters: vec![DispositionParam::Filename(file_name)],
                })
                .body(exported.bytes)
        }
        Ok(Err(e)) => error_response(e),
        Err(e) => {
            error!("Export task failed: {}", e);
            HttpResponse::InternalServerError().body(e.to_string())
        }
    }
}

pub(crate) fn error_response(err: ExportError) -> HttpResponse {
    match err {
        ExportError::NoTemplate => HttpResponse::NotFound().body(err.to_string()),
        ExportError::Io(_) => {
            error!("Export failed: {}", err);
            HttpResponse::InternalServerError().body(err.to_string())
        }
        _ => {
            error!("Export failed: {}", err);
            HttpResponse::ServiceUnavailable().body(err.to_string())
        }
    }
}

/// `certificate-<unix millis>.pdf`.
pub fn certificate_file_name() -> String {
    format!("certificate-{}.pdf", chrono::Utc::now().timestamp_millis())
}

/// Renders `layout` and writes it as `output_dir/file_name`.
pub fn export_certificate(
    layout: &CertificateLayout,
    fonts_dir: &Path,
    output_dir: &Path,
    file_name: &str,
) -> Result<ExportedCertificate, ExportError> {
    let fonts = FontSet::load(fonts_dir, layout_families(layout))?;
    write_certificate(layout, &fonts, output_dir, file_name)
}

/// Like `export_certificate`, with fonts that were already loaded.
pub fn write_certificate(
    layout: &CertificateLayout,
    fonts: &FontSet,
    output_dir: &Path,
    file_name: &str,
) -> Result<ExportedCertificate, ExportError> {
    let bytes = render_pdf(layout, fonts)?;
    let path = write_atomically(output_dir, file_name, &bytes)?;
    info!("Exported {}", path.display());
    Ok(ExportedCertificate { path, bytes })
}

pub(crate) fn layout_families(layout: &CertificateLayout) -> impl Iterator<Item = &str> {
    layout.fields.iter().map(|field| field.font_family.as_str())
}

fn write_atomically(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    let path = dir.join(file_name);
    tmp.persist(&path).map_err(|e| ExportError::Io(e.error))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test as actix_test, App};
    use common::model::dataset::{CellValue, Row};
    use common::model::selection::SelectedRecord;
    use common::model::template::{FontWeight, Template, TextField};
    use regex::bytes::Regex;

    fn fixture_fonts() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/fonts")
    }

    fn points(captures: &regex::bytes::Captures<'_>, group: usize) -> f64 {
        std::str::from_utf8(&captures[group]).unwrap().parse().unwrap()
    }

    #[test]
    fn file_names_carry_a_millisecond_timestamp() {
        let name = certificate_file_name();
        let millis = name
            .strip_prefix("certificate-")
            .and_then(|rest| rest.strip_suffix(".pdf"))
            .unwrap();
        assert!(millis.parse::<i64>().unwrap() > 1_600_000_000_000);
    }

    #[test]
    fn atomic_write_leaves_only_the_final_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_atomically(dir.path(), "certificate-1.pdf", b"%PDF").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF");
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn failed_export_writes_nothing() {
        let fonts = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let layout = layout(&Template::new("Diploma"), None, Default::default());

        let result = export_certificate(&layout, fonts.path(), out.path(), "certificate-1.pdf");
        assert!(matches!(result, Err(ExportError::Font(_))));
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn export_renders_a_single_page_of_the_canvas_size() {
        let name = TextField {
            column_mapping: Some("Name".to_string()),
            font_family: "DejaVu Sans".to_string(),
            font_weight: FontWeight::Bold,
            width: 200.0,
            ..TextField::new()
        };
        let motto = TextField {
            text: "For outstanding work\nthroughout the whole academic year".to_string(),
            y: 300.0,
            ..TextField::new()
        };
        let mut template = Template::new("Diploma")
            .with_field_added(name)
            .with_field_added(motto);
        template.background_color = "#f5f0e1".to_string();

        let mut data = Row::new();
        data.insert("Name".to_string(), CellValue::from("Ana Lopez"));
        let record = SelectedRecord {
            sheet_name: "Students".to_string(),
            row_index: 0,
            data,
        };
        let layout = layout(&template, Some(&record), Default::default());

        let out = tempfile::tempdir().unwrap();
        let exported =
            export_certificate(&layout, &fixture_fonts(), out.path(), "certificate-1.pdf").unwrap();

        assert!(exported.path.ends_with("certificate-1.pdf"));
        assert!(exported.path.exists());
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 1);
        assert!(exported.bytes.starts_with(b"%PDF"));

        let pages = Regex::new(r"/Type\s*/Page\b").unwrap();
        assert_eq!(pages.find_iter(&exported.bytes).count(), 1);

        let media_box =
            Regex::new(r"/MediaBox\s*\[\s*[\d.]+\s+[\d.]+\s+([\d.]+)\s+([\d.]+)\s*\]").unwrap();
        let captures = media_box.captures(&exported.bytes).unwrap();
        assert!((points(&captures, 1) - 600.0).abs() < 0.1);
        assert!((points(&captures, 2) - 450.0).abs() < 0.1);
    }

    #[actix_web::test]
    async fn export_without_active_template_is_not_found() {
        let config = <Config as clap::Parser>::parse_from(["certgen"]);
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(SessionState::new()))
                .app_data(web::Data::new(config))
                .route("/export", web::post().to(process)),
        )
        .await;

        let req = actix_test::TestRequest::post().uri("/export").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }
}
