use crate::adapters::ocr::{CommandRasterizer, TesseractOcr};
use crate::adapters::{pdf, spreadsheet};
use crate::config::toml_config::OcrConfig;
use crate::core::extractor::{extract_domains, scan_text};
use crate::core::ocr::PageOcr;
use crate::domain::model::{
    DocumentKind, ExtractedDocument, OcrMode, OcrReport, ProgressEvent, ScanReport,
};
use crate::domain::ports::{OcrEngine, ProgressSink, Rasterizer};
use crate::utils::error::{Result, ScanError};
use std::sync::Arc;

pub const TEXT_PREVIEW_CHARS: usize = 2000;

/// Reads uploaded documents and turns them into domain reports.
///
/// Holds no per-request state: every call gets its own temporary directory and
/// its own progress sink, so one scanner can serve concurrent uploads.
#[derive(Clone)]
pub struct DocumentScanner {
    ocr: PageOcr,
    ocr_enabled: bool,
}

impl DocumentScanner {
    pub fn new(rasterizer: Arc<dyn Rasterizer>, engine: Arc<dyn OcrEngine>) -> Self {
        Self {
            ocr: PageOcr::new(rasterizer, engine),
            ocr_enabled: true,
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        let mut scanner = Self::new(
            Arc::new(CommandRasterizer::from_config(config)),
            Arc::new(TesseractOcr::from_config(config)),
        );
        scanner.ocr_enabled = config.enabled;
        scanner
    }

    pub fn with_ocr_enabled(mut self, enabled: bool) -> Self {
        self.ocr_enabled = enabled;
        self
    }

    pub async fn read_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        mode: OcrMode,
        progress: &dyn ProgressSink,
    ) -> Result<ExtractedDocument> {
        let kind = DocumentKind::from_file_name(file_name).ok_or_else(|| {
            ScanError::UnsupportedFormat {
                extension: DocumentKind::extension_of(file_name),
            }
        })?;

        tracing::info!("📥 Reading {} ({:?}, {} bytes)", file_name, kind, bytes.len());

        let document = match kind {
            DocumentKind::Pdf => {
                let (bytes, pdf) = tokio::task::spawn_blocking(move || {
                    let pdf = pdf::read_pdf(&bytes);
                    (bytes, pdf)
                })
                .await
                .map_err(|e| ScanError::ProcessingError {
                    message: format!("PDF reader task failed: {}", e),
                })?;

                let mut document = ExtractedDocument {
                    file_name: file_name.to_string(),
                    kind,
                    native_text: pdf.text,
                    page_count: pdf.page_count,
                    ocr: None,
                };
                progress.emit(ProgressEvent::NativeTextExtracted {
                    chars: document.native_text.chars().count(),
                    pages: document.page_count,
                });

                if let Some(reason) = self.ocr_reason(mode, &document.native_text) {
                    tracing::info!("🔎 Falling back to OCR for {}: {}", file_name, reason);
                    progress.emit(ProgressEvent::OcrStarted {
                        reason: reason.to_string(),
                    });
                    document.ocr = Some(self.run_ocr(&bytes, progress).await);
                }
                document
            }
            DocumentKind::Spreadsheet => {
                let cells = tokio::task::spawn_blocking(move || spreadsheet::read_cells(&bytes))
                    .await
                    .map_err(|e| ScanError::ProcessingError {
                        message: format!("spreadsheet reader task failed: {}", e),
                    })??;

                ExtractedDocument {
                    file_name: file_name.to_string(),
                    kind,
                    native_text: cells.join("\n"),
                    page_count: 0,
                    ocr: None,
                }
            }
            DocumentKind::Text => ExtractedDocument {
                file_name: file_name.to_string(),
                kind,
                native_text: String::from_utf8_lossy(&bytes).into_owned(),
                page_count: 0,
                ocr: None,
            },
        };

        if kind != DocumentKind::Pdf {
            progress.emit(ProgressEvent::NativeTextExtracted {
                chars: document.native_text.chars().count(),
                pages: document.page_count,
            });
        }

        Ok(document)
    }

    fn ocr_reason(&self, mode: OcrMode, native_text: &str) -> Option<&'static str> {
        if !self.ocr_enabled {
            return None;
        }
        match mode {
            OcrMode::Off => None,
            OcrMode::Force => Some("OCR requested"),
            OcrMode::Auto if extract_domains(native_text).is_empty() => {
                Some("no domains in the PDF text layer")
            }
            OcrMode::Auto => None,
        }
    }

    /// OCR of a PDF held in memory. The copy on disk and every rendered page
    /// live in a temporary directory removed when this returns.
    pub async fn run_ocr(&self, pdf_bytes: &[u8], progress: &dyn ProgressSink) -> OcrReport {
        let work_dir = match tempfile::Builder::new().prefix("doc-domains-").tempdir() {
            Ok(dir) => dir,
            Err(e) => return OcrReport::failed(format!("Could not create work directory: {}", e)),
        };

        let pdf_path = work_dir.path().join("input.pdf");
        if let Err(e) = tokio::fs::write(&pdf_path, pdf_bytes).await {
            return OcrReport::failed(format!("Could not stage PDF for OCR: {}", e));
        }

        let report = match self.ocr.recognize_pdf(&pdf_path, work_dir.path(), progress).await {
            Ok(document) => OcrReport {
                outcome: document.outcome(),
                pages_total: document.pages.len(),
                pages_recognized: document.pages_recognized(),
            },
            Err(e) => {
                tracing::warn!("⚠️ OCR fallback failed: {}", e);
                let reason = match e {
                    ScanError::OcrUnavailable { reason } => reason,
                    other => other.to_string(),
                };
                progress.emit(ProgressEvent::OcrFinished {
                    success: false,
                    pages_recognized: 0,
                });
                OcrReport::failed(reason)
            }
        };

        if let Err(e) = work_dir.close() {
            tracing::debug!("Could not remove OCR work directory: {}", e);
        }
        report
    }

    /// Domains and debug details for an extracted document.
    pub fn report(&self, document: &ExtractedDocument, progress: &dyn ProgressSink) -> ScanReport {
        let text = document.combined_text();
        let matches = scan_text(&text);
        progress.emit(ProgressEvent::DomainsExtracted {
            count: matches.domains.len(),
        });

        ScanReport {
            file_name: document.file_name.clone(),
            kind: document.kind,
            urls_found: matches.urls,
            domains: matches.domains,
            text_preview: text.chars().take(TEXT_PREVIEW_CHARS).collect(),
            ocr: document.ocr.clone(),
        }
    }

    pub async fn scan(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        mode: OcrMode,
        progress: &dyn ProgressSink,
    ) -> Result<ScanReport> {
        let document = self.read_document(file_name, bytes, mode, progress).await?;
        Ok(self.report(&document, progress))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::OcrOutcome;
    use crate::domain::ports::{NoProgress, RenderedPages};
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    const NOT_A_PDF: &[u8] = b"%PDF-1.4 scanned pages only";

    /// Records the work directory it was handed so tests can check cleanup.
    #[derive(Default)]
    struct RecordingRasterizer {
        seen_dirs: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl Rasterizer for RecordingRasterizer {
        async fn render(&self, pdf: &Path, out_dir: &Path) -> Result<RenderedPages> {
            assert!(pdf.exists());
            self.seen_dirs.lock().unwrap().push(out_dir.to_path_buf());
            let image = out_dir.join("page-1.png");
            std::fs::write(&image, b"png")?;
            Ok(RenderedPages {
                converter: "fake".to_string(),
                images: vec![image],
            })
        }
    }

    struct FixedEngine(&'static str);

    #[async_trait]
    impl OcrEngine for FixedEngine {
        fn name(&self) -> &str {
            "fixed"
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn recognize(&self, _image: &Path) -> OcrOutcome {
            OcrOutcome::Success {
                text: self.0.to_string(),
            }
        }
    }

    fn scanner(rasterizer: Arc<RecordingRasterizer>) -> DocumentScanner {
        DocumentScanner::new(rasterizer, Arc::new(FixedEngine("Visit https://scanned.example.org/")))
    }

    #[tokio::test]
    async fn test_text_document_report() {
        let scanner = scanner(Arc::default());
        let report = scanner
            .scan(
                "notes.txt",
                b"see www.Example.com and mail bob@corp.io".to_vec(),
                OcrMode::Auto,
                &NoProgress,
            )
            .await
            .unwrap();

        assert_eq!(report.domains.to_vec(), vec!["example.com"]);
        assert_eq!(report.urls_found, vec!["http://Example.com"]);
        assert_eq!(report.kind, DocumentKind::Text);
        assert!(report.ocr.is_none());
    }

    #[tokio::test]
    async fn test_pdf_without_domains_falls_back_to_ocr() {
        let rasterizer = Arc::new(RecordingRasterizer::default());
        let scanner = scanner(rasterizer.clone());
        let events = Mutex::new(Vec::new());
        let sink = |e: ProgressEvent| events.lock().unwrap().push(e);

        let report = scanner
            .scan("scan.pdf", NOT_A_PDF.to_vec(), OcrMode::Auto, &sink)
            .await
            .unwrap();

        assert_eq!(report.domains.to_vec(), vec!["scanned.example.org"]);
        let ocr = report.ocr.unwrap();
        assert!(ocr.outcome.is_success());
        assert_eq!(ocr.pages_recognized, 1);

        let dirs = rasterizer.seen_dirs.lock().unwrap();
        assert_eq!(dirs.len(), 1);
        assert!(!dirs[0].exists());

        let events = events.into_inner().unwrap();
        assert!(matches!(events[0], ProgressEvent::NativeTextExtracted { .. }));
        assert!(matches!(events[1], ProgressEvent::OcrStarted { .. }));
        assert_eq!(events.last(), Some(&ProgressEvent::DomainsExtracted { count: 1 }));
    }

    #[tokio::test]
    async fn test_ocr_off_skips_fallback() {
        let rasterizer = Arc::new(RecordingRasterizer::default());
        let report = scanner(rasterizer.clone())
            .scan("scan.pdf", NOT_A_PDF.to_vec(), OcrMode::Off, &NoProgress)
            .await
            .unwrap();

        assert!(report.domains.is_empty());
        assert!(report.ocr.is_none());
        assert!(rasterizer.seen_dirs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_scanner_never_runs_ocr() {
        let rasterizer = Arc::new(RecordingRasterizer::default());
        let report = scanner(rasterizer.clone())
            .with_ocr_enabled(false)
            .scan("scan.pdf", NOT_A_PDF.to_vec(), OcrMode::Force, &NoProgress)
            .await
            .unwrap();

        assert!(report.ocr.is_none());
        assert!(rasterizer.seen_dirs.lock().unwrap().is_empty());
    }

    #[test]
    fn test_ocr_reason_by_mode() {
        let scanner = scanner(Arc::default());
        assert!(scanner.ocr_reason(OcrMode::Auto, "").is_some());
        assert!(scanner.ocr_reason(OcrMode::Auto, "https://found.example.com").is_none());
        assert!(scanner.ocr_reason(OcrMode::Force, "https://found.example.com").is_some());
        assert!(scanner.ocr_reason(OcrMode::Off, "").is_none());
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let err = scanner(Arc::default())
            .scan("deck.pptx", vec![], OcrMode::Auto, &NoProgress)
            .await
            .unwrap_err();

        match err {
            ScanError::UnsupportedFormat { extension } => assert_eq!(extension, ".pptx"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_preview_is_truncated() {
        let scanner = scanner(Arc::default());
        let document = ExtractedDocument {
            file_name: "big.txt".to_string(),
            kind: DocumentKind::Text,
            native_text: "é".repeat(TEXT_PREVIEW_CHARS + 10),
            page_count: 0,
            ocr: None,
        };
        let report = scanner.report(&document, &NoProgress);
        assert_eq!(report.text_preview.chars().count(), TEXT_PREVIEW_CHARS);
    }
}
