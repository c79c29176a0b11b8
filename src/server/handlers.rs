use super::types::{
    DebugResponse, OcrFailureResponse, StreamMessage, StreamResult, UploadError, UploadQuery,
    PROCESSING_FAILED,
};
use super::AppState;
use crate::domain::model::{DocumentKind, OcrMode, ProgressEvent, ScanReport};
use crate::domain::ports::LogProgress;
use crate::utils::error::ScanError;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{ConnectInfo, Multipart, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::sse::{KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

/// The multipart `file` field of an upload.
#[derive(Debug)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

pub async fn health() -> &'static str {
    "ok"
}

fn log_upload(connect: Option<&ConnectInfo<SocketAddr>>, headers: &HeaderMap) {
    let ip = connect
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let length = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info!(
        "📨 [{}] Upload attempt from {} (content-length: {})",
        chrono::Local::now().to_rfc3339(),
        ip,
        length
    );
}

fn multipart_error(error: MultipartError, limit_mb: u64) -> UploadError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge { limit_mb }
    } else {
        UploadError::Multipart(error.body_text())
    }
}

/// Pulls the `file` field out of the request, enforcing the size limit.
pub async fn receive_file(
    multipart: Result<Multipart, MultipartRejection>,
    state: &AppState,
) -> Result<UploadedFile, UploadError> {
    let mut multipart = multipart.map_err(|_| UploadError::NoFile)?;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(UploadError::NoFile),
            Err(e) => return Err(multipart_error(e, state.max_file_mb)),
        };

        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, state.max_file_mb))?;

        if bytes.len() as u64 > state.max_file_bytes {
            tracing::warn!("🚫 {} rejected: {} bytes", name, bytes.len());
            return Err(UploadError::TooLarge {
                limit_mb: state.max_file_mb,
            });
        }

        return Ok(UploadedFile {
            name,
            bytes: bytes.to_vec(),
        });
    }
}

// 伺服器只接受 PDF 與試算表
fn accepted_kind(file_name: &str) -> Result<DocumentKind, UploadError> {
    match DocumentKind::from_file_name(file_name) {
        Some(kind @ (DocumentKind::Pdf | DocumentKind::Spreadsheet)) => Ok(kind),
        _ => Err(UploadError::UnsupportedType),
    }
}

fn ocr_mode(query: &UploadQuery) -> OcrMode {
    if query.force_ocr() {
        OcrMode::Force
    } else {
        OcrMode::Auto
    }
}

fn scan_failure(file_name: &str, error: ScanError) -> UploadError {
    match error {
        ScanError::UnsupportedFormat { .. } => UploadError::UnsupportedType,
        other => {
            tracing::error!("❌ Processing {} failed: {}", file_name, other);
            UploadError::Failed
        }
    }
}

fn domains_response(report: &ScanReport) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=domains.txt"),
        ],
        report.domains.to_text(),
    )
        .into_response()
}

pub async fn upload(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    log_upload(connect.as_ref(), &headers);

    let file = match receive_file(multipart, &state).await {
        Ok(file) => file,
        Err(e) => return e.into_response(),
    };
    if let Err(e) = accepted_kind(&file.name) {
        return e.into_response();
    }

    let UploadedFile { name, bytes } = file;
    let report = match state
        .scanner
        .scan(&name, bytes, ocr_mode(&query), &LogProgress)
        .await
    {
        Ok(report) => report,
        Err(e) => return scan_failure(&name, e).into_response(),
    };

    tracing::info!("✅ {}: {} domains", name, report.domains.len());

    if query.force_ocr() && query.debug() {
        if let Some(reason) = report.ocr.as_ref().and_then(|ocr| ocr.outcome.reason()) {
            return Json(OcrFailureResponse {
                ok: false,
                reason: reason.to_string(),
            })
            .into_response();
        }
    }

    if query.debug() {
        return Json(DebugResponse::from(&report)).into_response();
    }

    domains_response(&report)
}

/// Same upload as [`upload`], answered as Server-Sent Events: `progress`
/// events while the document is scanned, then one `result` or `error`.
pub async fn upload_stream(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    log_upload(connect.as_ref(), &headers);

    let file = match receive_file(multipart, &state).await {
        Ok(file) => file,
        Err(e) => return e.into_response(),
    };
    if let Err(e) = accepted_kind(&file.name) {
        return e.into_response();
    }

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let scanner = state.scanner.clone();
    let mode = ocr_mode(&query);

    tokio::spawn(async move {
        let UploadedFile { name, bytes } = file;
        let progress_tx = tx.clone();
        let progress = move |event: ProgressEvent| {
            let _ = progress_tx.send(StreamMessage::Progress(event));
        };

        let message = match scanner.scan(&name, bytes, mode, &progress).await {
            Ok(report) => StreamMessage::Result(StreamResult {
                file: report.file_name,
                domains: report.domains.to_vec(),
            }),
            Err(e) => {
                tracing::error!("❌ Processing {} failed: {}", name, e);
                StreamMessage::Error(PROCESSING_FAILED.to_string())
            }
        };
        let _ = tx.send(message);
    });

    let events = UnboundedReceiverStream::new(rx)
        .map(|message: StreamMessage| Ok::<_, Infallible>(message.into_event()));

    Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_kinds() {
        assert_eq!(accepted_kind("a.pdf"), Ok(DocumentKind::Pdf));
        assert_eq!(accepted_kind("a.XLS"), Ok(DocumentKind::Spreadsheet));
        assert_eq!(accepted_kind("a.txt"), Err(UploadError::UnsupportedType));
        assert_eq!(accepted_kind(""), Err(UploadError::UnsupportedType));
    }

    #[test]
    fn test_scan_failure_mapping() {
        let error = ScanError::UnsupportedFormat {
            extension: ".docx".to_string(),
        };
        assert_eq!(scan_failure("a.docx", error), UploadError::UnsupportedType);

        let error = ScanError::SpreadsheetError {
            message: "Cannot detect file format".to_string(),
        };
        assert_eq!(scan_failure("old.xls", error), UploadError::Failed);
    }
}
