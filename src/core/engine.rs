use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::ScanMonitor;

/// Runs a [`Pipeline`] end to end: read the document, extract domains, write them.
pub struct ScanEngine<P: Pipeline> {
    pipeline: P,
    monitor: ScanMonitor,
}

impl<P: Pipeline> ScanEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: ScanMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting document scan");
        self.monitor.log_stats("Start");

        // Extract
        let document = self.pipeline.extract().await?;
        tracing::info!(
            "📄 Read {} characters from {}",
            document.native_text.chars().count(),
            document.file_name
        );
        if let Some(ocr) = &document.ocr {
            tracing::info!(
                "🔎 OCR recognized {}/{} pages",
                ocr.pages_recognized,
                ocr.pages_total
            );
        }
        self.monitor.log_stats("Extract");

        // Transform
        let report = self.pipeline.transform(document).await?;
        tracing::info!(
            "🌐 Found {} domains in {} candidate URLs",
            report.domains.len(),
            report.urls_found.len()
        );
        self.monitor.log_stats("Transform");

        // Load
        let output_path = self.pipeline.load(report).await?;
        tracing::info!("💾 Domains saved to: {}", output_path);
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
