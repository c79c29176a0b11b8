use crate::domain::model::DocumentKind;
use crate::utils::error::{Result, ScanError};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::path::Path;

/// Status, headers and body of an upload, exactly as the server returned them.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

fn mime_for(file_name: &str) -> &'static str {
    match DocumentKind::extension_of(file_name).as_str() {
        ".pdf" => "application/pdf",
        ".xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ".xls" => "application/vnd.ms-excel",
        ".txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Posts `path` as the multipart field `file` to `url`.
pub async fn post_file(client: &Client, url: &str, path: &Path) -> Result<ProbeResponse> {
    let data = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ScanError::InputNotFound {
            path: path.display().to_string(),
        },
        _ => ScanError::IoError(e),
    })?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.bin".to_string());

    tracing::debug!("Uploading {} ({} bytes) to {}", file_name, data.len(), url);

    let part = Part::bytes(data)
        .file_name(file_name.clone())
        .mime_str(mime_for(&file_name))?;
    let form = Form::new().part("file", part);

    let response = client.post(url).multipart(form).send().await?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let body = response.text().await?;

    Ok(ProbeResponse {
        status,
        headers,
        body,
    })
}
