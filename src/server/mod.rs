//! HTTP upload service: `POST /upload`, `POST /upload/stream`, `GET /health`
//! and the static upload page.

pub mod handlers;
pub mod types;

use crate::adapters::ocr::TesseractOcr;
use crate::config::toml_config::AppConfig;
use crate::core::scan::DocumentScanner;
use crate::domain::ports::OcrEngine;
use crate::utils::error::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and headers on top of the file itself, so an
/// oversized file is caught by the explicit size check and answered with 413.
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub scanner: DocumentScanner,
    pub max_file_mb: u64,
    pub max_file_bytes: u64,
}

impl AppState {
    pub fn new(scanner: DocumentScanner, max_file_mb: u64) -> Self {
        Self {
            scanner,
            max_file_mb,
            max_file_bytes: max_file_mb.saturating_mul(1024 * 1024),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            DocumentScanner::from_config(&config.ocr),
            config.server.max_file_mb,
        )
    }

    fn body_limit(&self) -> usize {
        usize::try_from(self.max_file_bytes)
            .unwrap_or(usize::MAX)
            .saturating_add(BODY_LIMIT_SLACK)
    }
}

pub fn router(state: AppState, static_dir: &str) -> Router {
    let body_limit = state.body_limit();

    Router::new()
        .route("/upload", post(handlers::upload))
        .route("/upload/stream", post(handlers::upload_stream))
        .route("/health", get(handlers::health))
        .fallback_service(ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: AppConfig) -> Result<()> {
    if config.ocr.enabled {
        let tesseract = TesseractOcr::from_config(&config.ocr);
        if !tesseract.is_available() {
            tracing::warn!("⚠️ {} not found, OCR fallback will report failures", tesseract.name());
        }
        let converters: Vec<String> = config
            .ocr
            .converters
            .iter()
            .filter(|c| c.is_installed())
            .map(|c| c.to_string())
            .collect();
        if converters.is_empty() {
            tracing::warn!("⚠️ No PDF converter found on PATH");
        } else {
            tracing::info!("🖼️ PDF converters available: {}", converters.join(", "));
        }
    }

    let state = AppState::from_config(&config);
    let app = router(state, &config.server.static_dir);

    let listener = tokio::net::TcpListener::bind(config.server.bind_address()).await?;
    tracing::info!(
        "🚀 Server running on http://{} (max upload {}MB)",
        listener.local_addr()?,
        config.server.max_file_mb
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
