use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use common::requests::UploadResponse;
use futures_util::StreamExt;
use log::{info, warn};

use crate::config::Config;
use crate::error::LoadError;
use crate::services::data_sources::spreadsheet::{load, summary};
use crate::session::state::SessionState;

/// HTTP handler wrapper that converts the upload result into an `HttpResponse`.
///
/// - On success: `200 OK` with an `UploadResponse`.
/// - On failure: `400 Bad Request` with the error message. The active dataset is kept.
///
/// Multipart bodies are streamed, so `--max-upload-mb` is enforced here while reading.
pub async fn process(
    payload: Multipart,
    session: web::Data<SessionState>,
    config: web::Data<Config>,
) -> impl Responder {
    match upload_spreadsheet(payload, &session, config.body_limit()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            warn!("Spreadsheet upload rejected: {}", e);
            HttpResponse::BadRequest().body(format!("Error: {}", e))
        }
    }
}

/// Reads the `file` part of a multipart upload, parses it off the async runtime and, only
/// if parsing succeeded, swaps it in as the active dataset. Stops reading as soon as the
/// file exceeds `limit` bytes.
pub async fn upload_spreadsheet(
    mut payload: Multipart,
    session: &SessionState,
    limit: usize,
) -> Result<UploadResponse, Box<dyn std::error::Error>> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        if name.as_deref() != Some("file") {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
            .unwrap_or_default();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            if bytes.len().saturating_add(chunk.len()) > limit {
                return Err(LoadError::TooLarge(limit).into());
            }
            bytes.extend_from_slice(&chunk);
        }
        upload = Some((filename, bytes));
    }

    let (filename, bytes) = upload.ok_or("Missing file")?;
    let dataset = web::block(move || load::load(&filename, &bytes))
        .await
        .map_err(|e| LoadError::Parse(e.to_string()))??;

    let summary = summary::summarize(&dataset);
    let previous = session.replace_dataset(dataset).await;
    let unchanged = previous.is_some_and(|p| p.md5 == summary.md5);

    info!(
        "Loaded dataset '{}' with {} sheet(s){}",
        summary.file_name,
        summary.sheets.len(),
        if unchanged { " (same content as before)" } else { "" }
    );

    Ok(UploadResponse { unchanged, summary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::data_sources::spreadsheet::select;
    use actix_web::http::StatusCode;
    use actix_web::{test as actix_test, App};
    use clap::Parser;
    use common::model::selection::SelectedRecord;
    use common::requests::SelectRowRequest;
    use pretty_assertions::assert_eq;

    const BOUNDARY: &str = "certgen-test-boundary";
    const STUDENTS: &[u8] = b"Name,Course\nAna,Math\nLuis,Art\n";

    fn multipart_body(file_name: &str, bytes: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n",
            BOUNDARY, file_name
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn upload_request(file_name: &str, bytes: &[u8]) -> actix_test::TestRequest {
        actix_test::TestRequest::post()
            .uri("/upload")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(multipart_body(file_name, bytes))
    }

    fn config(args: &[&str]) -> web::Data<Config> {
        web::Data::new(Config::parse_from(std::iter::once("certgen").chain(args.iter().copied())))
    }

    #[actix_web::test]
    async fn uploads_replace_the_dataset_only_when_they_parse() {
        let session = SessionState::new();
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(session.clone()))
                .app_data(config(&[]))
                .route("/upload", web::post().to(process))
                .route("/select", web::post().to(select::process)),
        )
        .await;

        let req = upload_request("students.csv", STUDENTS).to_request();
        let first: UploadResponse = actix_test::call_and_read_body_json(&app, req).await;
        assert!(!first.unchanged);
        assert_eq!(first.summary.file_name, "students.csv");

        let req = upload_request("students.csv", STUDENTS).to_request();
        let again: UploadResponse = actix_test::call_and_read_body_json(&app, req).await;
        assert!(again.unchanged);
        assert_eq!(again.summary.md5, first.summary.md5);

        let req = actix_test::TestRequest::post()
            .uri("/select")
            .set_json(SelectRowRequest {
                sheet_name: "students".to_string(),
                row_index: 1,
            })
            .to_request();
        let selected: SelectedRecord = actix_test::call_and_read_body_json(&app, req).await;

        let req = upload_request("book.xlsx", b"PK\x03\x04 not really a workbook").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        assert_eq!(session.dataset().await.unwrap().file_name, "students.csv");
        assert_eq!(session.selected().await, Some(selected));
    }

    #[actix_web::test]
    async fn uploads_over_the_limit_are_rejected() {
        let session = SessionState::new();
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(session.clone()))
                .app_data(config(&["--max-upload-mb", "0"]))
                .route("/upload", web::post().to(process)),
        )
        .await;

        let req = upload_request("students.csv", STUDENTS).to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = actix_test::read_body(resp).await;
        assert!(String::from_utf8_lossy(&body).contains("exceeds the limit"));
        assert!(session.dataset().await.is_none());
    }
}
