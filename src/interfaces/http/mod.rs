use crate::application::use_cases::report_pipeline::ReportPipeline;
use crate::domain::error::AppError;
use crate::domain::upload::{validate_filename, UploadedFile};
use crate::infrastructure::config::AppConfig;
use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::http::header::{
    ContentDisposition, ContentType, DispositionParam, DispositionType,
};
use actix_web::http::StatusCode;
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder, ResponseError};
use chrono::Local;
use futures_util::stream::StreamExt as _;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

const MAX_LOG_ENTRIES: usize = 100;
const REPORT_DOWNLOAD_NAME: &str = "report.html";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub pipeline: Arc<ReportPipeline>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
    pub max_upload_bytes: usize,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            err if err.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::MissingOutput => self.to_string(),
            err if err.is_client_error() => err.to_string(),
            err => format!("An error occurred: {}", err),
        };
        HttpResponse::build(self.status_code())
            .content_type(ContentType::plaintext())
            .body(body)
    }
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <title>Automated EDA Report</title>
  <style>
    body { font-family: Arial, Helvetica, sans-serif; margin: 48px; color: #222; }
    form { margin-top: 24px; }
    input[type=submit] { margin-top: 16px; padding: 6px 14px; }
  </style>
</head>
<body>
  <h1>Upload a CSV or Excel file</h1>
  <p>An exploratory data analysis report is generated and downloaded.</p>
  <form action="/upload" method="post" enctype="multipart/form-data">
    <input type="file" name="file" accept=".csv,.xlsx"/>
    <br/>
    <input type="submit" value="Upload and Generate Report"/>
  </form>
</body>
</html>
"#;

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(INDEX_HTML)
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

#[post("/upload")]
async fn upload(
    data: web::Data<HttpState>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let file = match read_upload(payload, data.max_upload_bytes).await {
        Ok(file) => file,
        Err(err) => {
            add_log(&data.logs, "WARN", "Upload", &format!("Upload rejected: {}", err));
            return Err(err);
        }
    };

    add_log(
        &data.logs,
        "INFO",
        "Upload",
        &format!("Received {} ({} bytes)", file.filename, file.bytes.len()),
    );

    let pipeline = data.pipeline.clone();
    let filename = file.filename.clone();
    let outcome = web::block(move || pipeline.execute(&file))
        .await
        .map_err(|e| AppError::Internal(format!("Report worker failed: {}", e)))
        .and_then(|result| result);

    let report_path = match outcome {
        Ok(path) => path,
        Err(err) => {
            let level = if err.is_client_error() { "WARN" } else { "ERROR" };
            add_log(
                &data.logs,
                level,
                "Upload",
                &format!("Report for {} failed: {}", filename, err),
            );
            return Err(err);
        }
    };

    let response = serve_report(&report_path).await?;
    add_log(
        &data.logs,
        "INFO",
        "Upload",
        &format!("Report for {} served", filename),
    );
    Ok(response)
}

#[get("/api/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = lock_logs(&data.logs);
    HttpResponse::Ok().json(&*logs)
}

/// Collect the `file` part of the form, enforcing the size limit while streaming.
///
/// The filename is checked before any content is read. A part named `file`
/// without a filename parameter is a plain form field, not a file part.
async fn read_upload(mut payload: Multipart, max_bytes: usize) -> Result<UploadedFile, AppError> {
    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(field) => field,
            Err(err) => {
                debug!(error = %err, "Malformed multipart body");
                break;
            }
        };

        let disposition = field.content_disposition();
        if disposition.get_name() != Some("file") {
            continue;
        }
        let filename = match disposition.get_filename() {
            Some(name) => name.to_string(),
            None => continue,
        };
        validate_filename(&filename)?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::Internal(format!("Failed to read upload: {}", e)))?;
            if bytes.len() + chunk.len() > max_bytes {
                return Err(AppError::PayloadTooLarge(max_bytes));
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok(UploadedFile::new(filename, bytes));
    }

    Err(AppError::MissingFile)
}

/// Read the rendered report back and wrap it as a download
async fn serve_report(path: &Path) -> Result<HttpResponse, AppError> {
    let body = tokio::fs::read(path).await.map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            error!(path = %path.display(), "Report missing after generation");
            AppError::MissingOutput
        } else {
            AppError::from(err)
        }
    })?;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(
                REPORT_DOWNLOAD_NAME.to_string(),
            )],
        })
        .body(body))
}

fn lock_logs(logs: &Mutex<Vec<LogEntry>>) -> std::sync::MutexGuard<'_, Vec<LogEntry>> {
    logs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    match level {
        "ERROR" => error!(source, "{}", message),
        "WARN" => warn!(source, "{}", message),
        "DEBUG" => debug!(source, "{}", message),
        _ => info!(source, "{}", message),
    }

    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = lock_logs(logs);
    logs.push(entry);
    if logs.len() > MAX_LOG_ENTRIES {
        logs.remove(0);
    }
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(upload)
        .service(health)
        .service(get_logs);
}

pub fn start_server(
    config: &AppConfig,
    pipeline: Arc<ReportPipeline>,
    logs: Arc<Mutex<Vec<LogEntry>>>,
) -> std::io::Result<Server> {
    let state = web::Data::new(HttpState {
        pipeline,
        logs,
        max_upload_bytes: config.max_upload_bytes,
    });

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Allow all origins for local tool

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(routes)
    })
    .bind(config.bind_address())?
    .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::profiling::Profiler;
    use actix_web::http::header;
    use actix_web::test as actix_test;
    use rust_xlsxwriter::Workbook;
    use tempfile::TempDir;

    const BOUNDARY: &str = "----autoedaTestBoundary";

    fn state(dir: &TempDir, max_upload_bytes: usize) -> web::Data<HttpState> {
        let pipeline = ReportPipeline::new(
            dir.path().join("uploads"),
            dir.path().join("reports").join("report.html"),
            Profiler::default(),
        );
        web::Data::new(HttpState {
            pipeline: Arc::new(pipeline),
            logs: Arc::new(Mutex::new(Vec::new())),
            max_upload_bytes,
        })
    }

    fn multipart_body(name: &str, filename: Option<&str>, content: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn upload_request(body: Vec<u8>) -> actix_test::TestRequest {
        actix_test::TestRequest::post()
            .uri("/upload")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(body)
    }

    async fn post(state: web::Data<HttpState>, body: Vec<u8>) -> (StatusCode, String, Option<String>) {
        let app = actix_test::init_service(App::new().app_data(state).configure(routes)).await;
        let resp = actix_test::call_service(&app, upload_request(body).to_request()).await;
        let status = resp.status();
        let disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = actix_test::read_body(resp).await;
        (status, String::from_utf8_lossy(&body).to_string(), disposition)
    }

    fn staged_files(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path().join("uploads"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[actix_web::test]
    async fn test_index_has_upload_form() {
        let app = actix_test::init_service(App::new().configure(routes)).await;
        let req = actix_test::TestRequest::get().uri("/").to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        let html = String::from_utf8_lossy(&body);
        assert!(html.contains("enctype=\"multipart/form-data\""));
        assert!(html.contains("name=\"file\""));
        assert!(html.contains("Upload and Generate Report"));
    }

    #[actix_web::test]
    async fn test_health() {
        let app = actix_test::init_service(App::new().configure(routes)).await;
        let req = actix_test::TestRequest::get().uri("/health").to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        assert_eq!(body, "ok");
    }

    #[actix_web::test]
    async fn test_missing_file_part() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body, _) = post(state(&dir, 1024), multipart_body("other", None, b"x")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "No file part");
    }

    #[actix_web::test]
    async fn test_file_field_without_filename_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body, _) = post(state(&dir, 1024), multipart_body("file", None, b"a\n1\n")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "No file part");
    }

    #[actix_web::test]
    async fn test_empty_filename() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body, _) = post(state(&dir, 1024), multipart_body("file", Some(""), b"")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "No selected file");
    }

    #[actix_web::test]
    async fn test_disallowed_extension() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body, _) =
            post(state(&dir, 1024), multipart_body("file", Some("data.pdf"), b"%PDF")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("not allowed"));
        assert_eq!(staged_files(&dir), 0);
    }

    #[actix_web::test]
    async fn test_disallowed_extension_checked_before_size() {
        let dir = tempfile::tempdir().unwrap();
        let content = vec![b'%'; 64];
        let (status, body, _) =
            post(state(&dir, 16), multipart_body("file", Some("data.pdf"), &content)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("not allowed"));
        assert_eq!(staged_files(&dir), 0);
    }

    #[actix_web::test]
    async fn test_oversize_upload() {
        let dir = tempfile::tempdir().unwrap();
        let content = vec![b'a'; 64];
        let (status, body, _) =
            post(state(&dir, 16), multipart_body("file", Some("big.csv"), &content)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body.contains("16 bytes"));
        assert_eq!(staged_files(&dir), 0);
    }

    #[actix_web::test]
    async fn test_csv_upload_returns_report() {
        let dir = tempfile::tempdir().unwrap();
        let csv = b"name,score\nAnn,1\nBob,2\nCid,3\n";
        let (status, body, disposition) =
            post(state(&dir, 1024), multipart_body("file", Some("scores.csv"), csv)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Profiling Report"));
        assert!(body.contains("Overview"));
        let disposition = disposition.unwrap();
        assert!(disposition.starts_with("attachment"));
        assert!(disposition.contains("report.html"));
        assert_eq!(staged_files(&dir), 0);
    }

    #[actix_web::test]
    async fn test_xlsx_upload_returns_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "item").unwrap();
        sheet.write_string(0, 1, "qty").unwrap();
        sheet.write_string(1, 0, "bolt").unwrap();
        sheet.write_number(1, 1, 4.0).unwrap();
        sheet.write_string(2, 0, "nut").unwrap();
        sheet.write_number(2, 1, 9.0).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let (status, body, _) =
            post(state(&dir, 1 << 20), multipart_body("file", Some("Stock.XLSX"), &bytes)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Profiling Report"));
        assert_eq!(staged_files(&dir), 0);
    }

    #[actix_web::test]
    async fn test_processing_failures_are_500() {
        let cases: [(&str, &[u8]); 3] = [
            ("broken.xlsx", b"definitely not a zip"),
            ("header_only.csv", b"a,b\n"),
            ("ragged.csv", b"a,b\n1,2\n3,4,5\n"),
        ];
        for (filename, content) in cases {
            let dir = tempfile::tempdir().unwrap();
            let (status, body, _) =
                post(state(&dir, 1024), multipart_body("file", Some(filename), content)).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{filename}");
            assert!(body.starts_with("An error occurred: "), "{filename}: {body}");
            assert_eq!(staged_files(&dir), 0, "{filename}");
        }
    }

    #[actix_web::test]
    async fn test_missing_report_at_serve_time() {
        let dir = tempfile::tempdir().unwrap();
        let err = serve_report(&dir.path().join("gone.html")).await.unwrap_err();
        assert!(matches!(err, AppError::MissingOutput));

        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(body, "Report file not found");
    }

    #[actix_web::test]
    async fn test_upload_activity_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir, 1024);
        let app = actix_test::init_service(App::new().app_data(state.clone()).configure(routes)).await;

        let body = multipart_body("file", Some("data.pdf"), b"x");
        actix_test::call_service(&app, upload_request(body).to_request()).await;

        let req = actix_test::TestRequest::get().uri("/api/logs").to_request();
        let logs: Vec<LogEntry> = actix_test::call_and_read_body_json(&app, req).await;
        assert!(logs
            .iter()
            .any(|entry| entry.level == "WARN" && entry.message.contains("rejected")));
    }

    #[test]
    fn test_log_ring_is_bounded() {
        let logs = Mutex::new(Vec::new());
        for i in 0..(MAX_LOG_ENTRIES + 5) {
            add_log(&logs, "INFO", "Test", &format!("entry {}", i));
        }
        let logs = logs.lock().unwrap();
        assert_eq!(logs.len(), MAX_LOG_ENTRIES);
        assert_eq!(logs[0].message, "entry 5");
    }
}
