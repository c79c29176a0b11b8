use crate::config::toml_config::OcrConfig;
use crate::domain::model::OcrMode;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_file_extension, validate_path, Validate};
use clap::Parser;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "xlsx", "xls", "txt"];

#[derive(Debug, Clone, Parser)]
#[command(name = "doc-domains")]
#[command(about = "Extract the domains referenced by a PDF, spreadsheet or text file")]
pub struct CliConfig {
    /// Document to scan (.pdf, .xlsx, .xls or .txt)
    pub input: String,

    #[arg(short, long, default_value = "domains.txt")]
    pub output_path: String,

    /// Run OCR even when the PDF text layer already has domains
    #[arg(long, conflicts_with = "no_ocr")]
    pub force_ocr: bool,

    /// Never fall back to OCR
    #[arg(long)]
    pub no_ocr: bool,

    #[arg(long, default_value = "300")]
    pub dpi: u32,

    /// Tesseract language code
    #[arg(long, default_value = "eng")]
    pub lang: String,

    /// Only render the first N pages for OCR
    #[arg(long)]
    pub max_pages: Option<u32>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

impl CliConfig {
    pub fn ocr_config(&self) -> OcrConfig {
        OcrConfig {
            enabled: !self.no_ocr,
            dpi: self.dpi,
            language: self.lang.clone(),
            max_pages: self.max_pages,
            ..OcrConfig::default()
        }
    }
}

impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn ocr_mode(&self) -> OcrMode {
        if self.no_ocr {
            OcrMode::Off
        } else if self.force_ocr {
            OcrMode::Force
        } else {
            OcrMode::Auto
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input", &self.input)?;
        validate_file_extension("input", &self.input, SUPPORTED_EXTENSIONS)?;
        validate_path("output_path", &self.output_path)?;
        self.ocr_config().validate()
    }
}
