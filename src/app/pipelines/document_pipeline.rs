use crate::core::scan::DocumentScanner;
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{ExtractedDocument, ScanReport};
use crate::domain::ports::LogProgress;
use crate::utils::error::{Result, ScanError};

/// 讀取單一文件、擷取網域並寫成純文字清單
pub struct DocumentPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    scanner: DocumentScanner,
}

impl<S: Storage, C: ConfigProvider> DocumentPipeline<S, C> {
    pub fn new(storage: S, config: C, scanner: DocumentScanner) -> Self {
        Self {
            storage,
            config,
            scanner,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for DocumentPipeline<S, C> {
    async fn extract(&self) -> Result<ExtractedDocument> {
        let input = self.config.input_path();
        tracing::debug!("Reading input file: {}", input);

        let bytes = self.storage.read_file(input).await.map_err(|e| match e {
            ScanError::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
                ScanError::InputNotFound {
                    path: input.to_string(),
                }
            }
            other => other,
        })?;

        self.scanner
            .read_document(input, bytes, self.config.ocr_mode(), &LogProgress)
            .await
    }

    async fn transform(&self, document: ExtractedDocument) -> Result<ScanReport> {
        Ok(self.scanner.report(&document, &LogProgress))
    }

    async fn load(&self, report: ScanReport) -> Result<String> {
        let output_path = self.config.output_path();

        // 即使沒有找到網域也寫出空檔案
        self.storage
            .write_file(output_path, report.domains.to_text().as_bytes())
            .await?;

        Ok(output_path.to_string())
    }
}
