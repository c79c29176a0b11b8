use crate::domain::model::{DocumentKind, OcrReport, ProgressEvent, ScanReport};
use axum::http::StatusCode;
use axum::response::sse::Event;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

pub const MAX_DEBUG_URLS: usize = 500;
pub const PROCESSING_FAILED: &str = "Failed to process the file";

/// `?ocr=1` forces the OCR pass, `?debug=1` answers with JSON.
#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    pub ocr: Option<String>,
    pub debug: Option<String>,
}

impl UploadQuery {
    pub fn force_ocr(&self) -> bool {
        is_set(&self.ocr)
    }

    pub fn debug(&self) -> bool {
        is_set(&self.debug)
    }
}

fn is_set(flag: &Option<String>) -> bool {
    matches!(flag.as_deref(), Some("1") | Some("true"))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugResponse {
    pub file: String,
    pub ext: String,
    pub extracted_text_preview: String,
    pub urls_found: Vec<String>,
    pub domains: Vec<String>,
    pub ocr: Option<OcrReport>,
}

impl From<&ScanReport> for DebugResponse {
    fn from(report: &ScanReport) -> Self {
        Self {
            file: report.file_name.clone(),
            ext: DocumentKind::extension_of(&report.file_name),
            extracted_text_preview: report.text_preview.clone(),
            urls_found: report.urls_found.iter().take(MAX_DEBUG_URLS).cloned().collect(),
            domains: report.domains.to_vec(),
            ocr: report.ocr.clone(),
        }
    }
}

/// Body of `?ocr=1&debug=1` when the OCR pass did not succeed.
#[derive(Debug, Serialize)]
pub struct OcrFailureResponse {
    pub ok: bool,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct StreamResult {
    pub file: String,
    pub domains: Vec<String>,
}

/// One message of the `/upload/stream` event stream.
#[derive(Debug)]
pub enum StreamMessage {
    Progress(ProgressEvent),
    Result(StreamResult),
    Error(String),
}

impl StreamMessage {
    pub fn into_event(self) -> Event {
        let event = match self {
            StreamMessage::Progress(progress) => Event::default().event("progress").json_data(&progress),
            StreamMessage::Result(result) => Event::default().event("result").json_data(&result),
            StreamMessage::Error(message) => Ok(Event::default().event("error").data(message)),
        };
        event.unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
    }
}

/// Every way an upload can be turned down before or during processing.
#[derive(Debug, PartialEq, Eq)]
pub enum UploadError {
    NoFile,
    TooLarge { limit_mb: u64 },
    Multipart(String),
    UnsupportedType,
    Failed,
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            UploadError::NoFile => (StatusCode::BAD_REQUEST, "No file uploaded".to_string()),
            UploadError::TooLarge { limit_mb } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("File too large. Limit: {}MB", limit_mb),
            ),
            UploadError::Multipart(message) => {
                (StatusCode::BAD_REQUEST, format!("Upload error: {}", message))
            }
            UploadError::UnsupportedType => (
                StatusCode::BAD_REQUEST,
                "Unsupported file type. Send a PDF or XLS/XLSX file.".to_string(),
            ),
            UploadError::Failed => (StatusCode::INTERNAL_SERVER_ERROR, PROCESSING_FAILED.to_string()),
        };
        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::DomainSet;

    #[test]
    fn test_query_flags() {
        let query = UploadQuery {
            ocr: Some("1".to_string()),
            debug: Some("0".to_string()),
        };
        assert!(query.force_ocr());
        assert!(!query.debug());
        assert!(!UploadQuery::default().debug());
    }

    #[test]
    fn test_debug_response_caps_urls() {
        let report = ScanReport {
            file_name: "Links.XLSX".to_string(),
            kind: DocumentKind::Spreadsheet,
            urls_found: (0..600).map(|i| format!("http://host{}.com", i)).collect(),
            domains: DomainSet::new(),
            text_preview: String::new(),
            ocr: None,
        };

        let response = DebugResponse::from(&report);
        assert_eq!(response.ext, ".xlsx");
        assert_eq!(response.urls_found.len(), MAX_DEBUG_URLS);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("extractedTextPreview").is_some());
        assert!(json["ocr"].is_null());
    }
}
