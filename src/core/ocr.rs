use crate::domain::model::{OcrOutcome, ProgressEvent};
use crate::domain::ports::{OcrEngine, ProgressSink, Rasterizer};
use crate::utils::error::{Result, ScanError};
use std::path::Path;
use std::sync::Arc;

/// Text recognized from a whole PDF, page by page.
#[derive(Debug, Clone)]
pub struct OcrDocument {
    pub converter: String,
    /// Recognized pages joined in page order, each followed by a newline.
    pub text: String,
    pub pages: Vec<OcrOutcome>,
}

impl OcrDocument {
    pub fn pages_recognized(&self) -> usize {
        self.pages.iter().filter(|p| p.is_success()).count()
    }

    /// Document-level outcome: success when at least one page was recognized.
    pub fn outcome(&self) -> OcrOutcome {
        if self.pages_recognized() > 0 {
            return OcrOutcome::Success {
                text: self.text.clone(),
            };
        }

        let reason = self
            .pages
            .iter()
            .rev()
            .find_map(|p| p.reason())
            .unwrap_or("no page could be recognized")
            .to_string();
        OcrOutcome::Failure { reason }
    }
}

/// Renders a PDF to page images and recognizes them one at a time.
#[derive(Clone)]
pub struct PageOcr {
    rasterizer: Arc<dyn Rasterizer>,
    engine: Arc<dyn OcrEngine>,
}

impl PageOcr {
    pub fn new(rasterizer: Arc<dyn Rasterizer>, engine: Arc<dyn OcrEngine>) -> Self {
        Self { rasterizer, engine }
    }

    /// Page images are written to `work_dir` and removed as soon as each page
    /// has been processed. A failing page is reported and skipped.
    pub async fn recognize_pdf(
        &self,
        pdf: &Path,
        work_dir: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<OcrDocument> {
        if !self.engine.is_available() {
            return Err(ScanError::OcrUnavailable {
                reason: "Tesseract not found on this system.".to_string(),
            });
        }

        let rendered = self.rasterizer.render(pdf, work_dir).await?;
        let total = rendered.images.len();
        if total == 0 {
            return Err(ScanError::NoImagesRendered);
        }

        tracing::info!("🖼️ {} rendered {} page images", rendered.converter, total);
        progress.emit(ProgressEvent::PagesRendered {
            converter: rendered.converter.clone(),
            pages: total,
        });

        let mut text = String::new();
        let mut pages = Vec::with_capacity(total);

        for (index, image) in rendered.images.iter().enumerate() {
            let page = index + 1;
            tracing::debug!("OCR: {}", image.display());

            let outcome = self.engine.recognize(image).await;
            match &outcome {
                OcrOutcome::Success { text: page_text } => {
                    text.push_str(page_text);
                    text.push('\n');
                    progress.emit(ProgressEvent::PageRecognized {
                        page,
                        total,
                        chars: page_text.chars().count(),
                    });
                }
                OcrOutcome::Failure { reason } => {
                    progress.emit(ProgressEvent::PageFailed {
                        page,
                        total,
                        reason: reason.clone(),
                    });
                }
            }
            pages.push(outcome);

            if let Err(e) = tokio::fs::remove_file(image).await {
                tracing::debug!("Could not remove {}: {}", image.display(), e);
            }
        }

        let document = OcrDocument {
            converter: rendered.converter,
            text,
            pages,
        };

        progress.emit(ProgressEvent::OcrFinished {
            success: document.pages_recognized() > 0,
            pages_recognized: document.pages_recognized(),
        });

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::RenderedPages;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct FakeRasterizer {
        pages: usize,
    }

    #[async_trait]
    impl Rasterizer for FakeRasterizer {
        async fn render(&self, _pdf: &Path, out_dir: &Path) -> Result<RenderedPages> {
            let images: Vec<PathBuf> = (1..=self.pages)
                .map(|n| out_dir.join(format!("page-{}.png", n)))
                .collect();
            for image in &images {
                std::fs::write(image, b"png")?;
            }
            Ok(RenderedPages {
                converter: "fake".to_string(),
                images,
            })
        }
    }

    struct FakeEngine {
        available: bool,
        fail_pages: Vec<usize>,
    }

    #[async_trait]
    impl OcrEngine for FakeEngine {
        fn name(&self) -> &str {
            "fake"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn recognize(&self, image: &Path) -> OcrOutcome {
            let stem = image.file_stem().unwrap().to_string_lossy().into_owned();
            let page: usize = stem.trim_start_matches("page-").parse().unwrap();
            if self.fail_pages.contains(&page) {
                OcrOutcome::Failure {
                    reason: format!("page {} unreadable", page),
                }
            } else {
                OcrOutcome::Success {
                    text: format!("page{}.example.com", page),
                }
            }
        }
    }

    fn runner(pages: usize, available: bool, fail_pages: Vec<usize>) -> PageOcr {
        PageOcr::new(
            Arc::new(FakeRasterizer { pages }),
            Arc::new(FakeEngine {
                available,
                fail_pages,
            }),
        )
    }

    #[tokio::test]
    async fn test_pages_joined_in_order_and_images_removed() {
        let dir = tempfile::tempdir().unwrap();
        let events = Mutex::new(Vec::new());
        let sink = |e: ProgressEvent| events.lock().unwrap().push(e);

        let doc = runner(3, true, vec![])
            .recognize_pdf(Path::new("in.pdf"), dir.path(), &sink)
            .await
            .unwrap();

        assert_eq!(doc.text, "page1.example.com\npage2.example.com\npage3.example.com\n");
        assert_eq!(doc.pages_recognized(), 3);
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());

        let events = events.into_inner().unwrap();
        assert_eq!(
            events.first(),
            Some(&ProgressEvent::PagesRendered {
                converter: "fake".to_string(),
                pages: 3
            })
        );
        assert_eq!(
            events.last(),
            Some(&ProgressEvent::OcrFinished {
                success: true,
                pages_recognized: 3
            })
        );
    }

    #[tokio::test]
    async fn test_failed_page_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let doc = runner(3, true, vec![2])
            .recognize_pdf(Path::new("in.pdf"), dir.path(), &crate::domain::ports::NoProgress)
            .await
            .unwrap();

        assert_eq!(doc.pages_recognized(), 2);
        assert_eq!(doc.text, "page1.example.com\npage3.example.com\n");
        assert!(doc.outcome().is_success());
    }

    #[tokio::test]
    async fn test_all_pages_failing_reports_last_reason() {
        let dir = tempfile::tempdir().unwrap();
        let doc = runner(2, true, vec![1, 2])
            .recognize_pdf(Path::new("in.pdf"), dir.path(), &crate::domain::ports::NoProgress)
            .await
            .unwrap();

        assert_eq!(
            doc.outcome(),
            OcrOutcome::Failure {
                reason: "page 2 unreadable".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_engine_checked_before_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let err = runner(2, false, vec![])
            .recognize_pdf(Path::new("in.pdf"), dir.path(), &crate::domain::ports::NoProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, ScanError::OcrUnavailable { .. }));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
