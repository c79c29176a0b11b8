use crate::domain::model::{ExtractedDocument, OcrMode, OcrOutcome, ProgressEvent, ScanReport};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn ocr_mode(&self) -> OcrMode;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ExtractedDocument>;
    async fn transform(&self, document: ExtractedDocument) -> Result<ScanReport>;
    async fn load(&self, report: ScanReport) -> Result<String>;
}

/// Page images produced by a [`Rasterizer`], already in page order.
#[derive(Debug, Clone)]
pub struct RenderedPages {
    pub converter: String,
    pub images: Vec<PathBuf>,
}

/// Turns a PDF into one PNG per page inside `out_dir`.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn render(&self, pdf: &Path, out_dir: &Path) -> Result<RenderedPages>;
}

/// Recognizes the text of a single page image.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;
    fn is_available(&self) -> bool;
    async fn recognize(&self, image: &Path) -> OcrOutcome;
}

/// Receives progress for one scan. Passed per call, never registered globally.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: ProgressEvent) {
        self(event)
    }
}

impl ProgressSink for tokio::sync::mpsc::UnboundedSender<ProgressEvent> {
    fn emit(&self, event: ProgressEvent) {
        // receiver gone means nobody is listening anymore
        let _ = self.send(event);
    }
}

pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Writes every event to the log at debug level (info for OCR milestones).
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn emit(&self, event: ProgressEvent) {
        match &event {
            ProgressEvent::OcrStarted { reason } => tracing::info!("🔎 OCR started: {}", reason),
            ProgressEvent::PageRecognized { page, total, .. } => {
                tracing::info!("📄 OCR page {}/{}", page, total)
            }
            ProgressEvent::PageFailed {
                page,
                total,
                reason,
            } => tracing::warn!("⚠️ OCR page {}/{} failed: {}", page, total, reason),
            _ => tracing::debug!("{:?}", event),
        }
    }
}
